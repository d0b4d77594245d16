//! Keyboards offered alongside replies.

use torrelay_client::TorrentRecord;
use torrelay_config::Category;

use crate::reply::{Button, Keyboard};
use crate::token::{CallbackToken, LifecycleVerb};

/// Buttons per row on the category keyboard.
const CATEGORY_ROW_WIDTH: usize = 4;
/// Longest torrent name shown on a list button.
const MAX_LABEL_CHARS: usize = 30;
const ELLIPSIS: &str = "...";

/// One button per configured category, in configuration order.
#[must_use]
pub fn category_keyboard(categories: &[Category]) -> Keyboard {
    Keyboard {
        rows: categories
            .chunks(CATEGORY_ROW_WIDTH)
            .map(|row| {
                row.iter()
                    .map(|category| Button::new(&category.label, &category.key))
                    .collect()
            })
            .collect(),
    }
}

/// Lifecycle actions for one torrent, with a way back to the list page it came from.
#[must_use]
pub fn action_keyboard(hash: &str, back_to_page: Option<usize>) -> Keyboard {
    let action = |label: &str, verb| {
        Button::new(
            label,
            CallbackToken::Action {
                verb,
                hash: hash.to_string(),
            },
        )
    };

    let mut rows = vec![
        vec![
            action("⏸ Pause", LifecycleVerb::Pause),
            action("▶️ Resume", LifecycleVerb::Resume),
        ],
        vec![action("ℹ️ Info", LifecycleVerb::Info)],
        vec![
            action("🗑 Delete Torrent", LifecycleVerb::Delete),
            action("🗑 Delete with Files", LifecycleVerb::DeleteWithData),
        ],
    ];
    if let Some(page) = back_to_page {
        rows.push(vec![Button::new(
            "⬅️ Back to list",
            CallbackToken::List { page },
        )]);
    }
    Keyboard { rows }
}

/// Number of pages needed for `total` items.
#[must_use]
pub const fn page_count(total: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    total.div_ceil(per_page)
}

/// Clamp `page` into the valid range for `total` items.
#[must_use]
pub fn clamp_page(page: usize, total: usize, per_page: usize) -> usize {
    page.min(page_count(total, per_page).saturating_sub(1))
}

/// One button per torrent on `page`, followed by previous/next buttons.
#[must_use]
pub fn list_keyboard(records: &[TorrentRecord], per_page: usize, page: usize) -> Keyboard {
    if per_page == 0 || records.is_empty() {
        return Keyboard::default();
    }
    let page = clamp_page(page, records.len(), per_page);
    let pages = page_count(records.len(), per_page);

    let mut rows: Vec<Vec<Button>> = records
        .iter()
        .skip(page * per_page)
        .take(per_page)
        .map(|record| {
            vec![Button::new(
                truncate_label(&record.name),
                CallbackToken::Manage {
                    hash: record.hash.clone(),
                    page: Some(page),
                },
            )]
        })
        .collect();

    let mut paging = Vec::new();
    if page > 0 {
        paging.push(Button::new(
            "⬅️ Previous",
            CallbackToken::List { page: page - 1 },
        ));
    }
    if page + 1 < pages {
        paging.push(Button::new("Next ➡️", CallbackToken::List { page: page + 1 }));
    }
    if !paging.is_empty() {
        rows.push(paging);
    }
    Keyboard { rows }
}

fn truncate_label(name: &str) -> String {
    if name.chars().count() <= MAX_LABEL_CHARS {
        return name.to_string();
    }
    let keep = MAX_LABEL_CHARS - ELLIPSIS.len();
    let mut label: String = name.chars().take(keep).collect();
    label.push_str(ELLIPSIS);
    label
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(count: usize) -> Vec<TorrentRecord> {
        (0..count)
            .map(|n| TorrentRecord {
                name: format!("torrent {n}"),
                hash: format!("h{n}"),
                ..TorrentRecord::default()
            })
            .collect()
    }

    #[test]
    fn category_buttons_carry_keys() {
        let categories: Vec<Category> = ["Movies.", "TV Shows.", "Games.", "AudioBooks.", "MANGA."]
            .iter()
            .map(|key| Category {
                key: (*key).into(),
                label: key.trim_end_matches('.').into(),
                save_path: String::new(),
            })
            .collect();
        let keyboard = category_keyboard(&categories);
        assert_eq!(keyboard.rows.len(), 2);
        let tokens: Vec<&str> = keyboard.buttons().map(|b| b.token.as_str()).collect();
        assert_eq!(tokens, ["Movies.", "TV Shows.", "Games.", "AudioBooks.", "MANGA."]);
    }

    #[test]
    fn action_keyboard_encodes_hash() {
        let keyboard = action_keyboard("abc", Some(2));
        let tokens: Vec<&str> = keyboard.buttons().map(|b| b.token.as_str()).collect();
        assert_eq!(
            tokens,
            [
                "pause:abc",
                "resume:abc",
                "info:abc",
                "delete:abc",
                "deletewithdata:abc",
                "list:page:2"
            ]
        );
        assert_eq!(action_keyboard("abc", None).rows.len(), 3);
    }

    #[test]
    fn list_keyboard_pages_and_links() {
        let keyboard = list_keyboard(&records(25), 10, 1);
        assert_eq!(keyboard.rows.len(), 11);
        assert_eq!(keyboard.rows[0][0].token, "manage:h10:page:1");
        let paging: Vec<&str> = keyboard.rows[10].iter().map(|b| b.token.as_str()).collect();
        assert_eq!(paging, ["list:page:0", "list:page:2"]);

        let last = list_keyboard(&records(25), 10, 9);
        assert_eq!(last.rows.len(), 6);
        assert_eq!(last.rows[5].len(), 1);
        assert_eq!(last.rows[5][0].token, "list:page:1");
    }

    #[test]
    fn single_page_has_no_paging_row() {
        let keyboard = list_keyboard(&records(3), 20, 0);
        assert_eq!(keyboard.rows.len(), 3);
        assert!(list_keyboard(&[], 20, 0).is_empty());
    }

    #[test]
    fn long_names_are_truncated() {
        let long = "A".repeat(31);
        assert_eq!(truncate_label(&long), format!("{}...", "A".repeat(27)));
        let exact = "Б".repeat(30);
        assert_eq!(truncate_label(&exact), exact);
    }
}
