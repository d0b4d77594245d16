//! Span helpers for the application lifetime and for individual inbound events.

use tracing::{Span, span::Entered};
use uuid::Uuid;

use crate::init::release;

/// Guard that keeps the application-level span entered for the lifetime of the process.
pub struct GlobalContextGuard {
    _guard: Entered<'static>,
}

impl GlobalContextGuard {
    /// Enter the application-level tracing span for the lifetime of the guard.
    #[must_use]
    pub fn new(mode: impl Into<String>) -> Self {
        let mode = mode.into();
        let span: &'static Span = Box::leak(Box::new(
            tracing::info_span!("app", mode = %mode, release = %release()),
        ));
        let guard = span.enter();
        Self { _guard: guard }
    }
}

/// Build the span wrapping the handling of one inbound chat event.
///
/// Every event gets a fresh identifier so concurrent handlers for the same
/// requester can be told apart in the logs.
#[must_use]
pub fn event_span(kind: &'static str, requester: i64) -> Span {
    tracing::info_span!(
        "event",
        event_id = %Uuid::new_v4(),
        kind,
        requester,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_span_can_be_entered() {
        let span = event_span("callback", 42);
        let _entered = span.enter();
    }
}
