//! Reconnect-and-retry policy shared by the clients and the conversation layer.
//!
//! The policy is a pure function over the failure class and the zero-based
//! index of the attempt that failed, so it can be exercised without a transport:
//!
//! attempt → classify failure → reconnect if eligible → retry once → fail.

use reqwest::StatusCode;

/// Number of reconnects allowed for a single logical call.
pub const MAX_RECONNECTS: u32 = 1;

/// Shape of a failed remote attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The request never produced a response.
    Transport,
    /// The remote answered 401/403 or rejected the login.
    Unauthorized,
    /// Any other non-success status; points at bad input, not a stale session.
    Status,
    /// The response arrived but its content was unusable.
    Content,
}

impl FailureClass {
    /// Classify a non-success HTTP status.
    #[must_use]
    pub fn from_status(status: StatusCode) -> Self {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Self::Unauthorized
        } else {
            Self::Status
        }
    }
}

/// What to do after an attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Replace the session and repeat the attempt.
    ReconnectAndRetry,
    /// Surface the failure to the caller.
    Fail,
}

/// Decide whether the failed attempt `attempt` (zero-based) earns a reconnect.
///
/// Only session-shaped failures are retried, and only while fewer than
/// [`MAX_RECONNECTS`] reconnects have been spent.
#[must_use]
pub const fn decide(class: FailureClass, attempt: u32) -> RetryDecision {
    match class {
        FailureClass::Transport | FailureClass::Unauthorized if attempt < MAX_RECONNECTS => {
            RetryDecision::ReconnectAndRetry
        }
        _ => RetryDecision::Fail,
    }
}

/// Reconnects spent within one logical call, counted separately per failure class.
///
/// A transport failure and a 401 on the same call each earn their own reconnect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryBudget {
    transport: u32,
    unauthorized: u32,
}

impl RetryBudget {
    /// Reconnects already spent on `class`.
    #[must_use]
    pub const fn spent(&self, class: FailureClass) -> u32 {
        match class {
            FailureClass::Transport => self.transport,
            FailureClass::Unauthorized => self.unauthorized,
            FailureClass::Status | FailureClass::Content => 0,
        }
    }

    /// Run [`decide`] against this class's count, charging the reconnect when granted.
    pub fn consume(&mut self, class: FailureClass) -> RetryDecision {
        let decision = decide(class, self.spent(class));
        if decision == RetryDecision::ReconnectAndRetry {
            match class {
                FailureClass::Transport => self.transport += 1,
                FailureClass::Unauthorized => self.unauthorized += 1,
                FailureClass::Status | FailureClass::Content => {}
            }
        }
        decision
    }
}
