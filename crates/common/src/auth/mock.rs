//! Mock token validator for tests.
//!
//! Available under `#[cfg(test)]` and with the `test-utils` feature.

use crate::auth::validator::{TokenValidator, ValidationError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Scripted validator answer.
#[derive(Debug, Clone)]
enum MockBehavior {
    Accept,
    Reject(u16),
    Unavailable,
}

/// Validator with a fixed answer that records every call.
#[derive(Debug)]
pub struct MockTokenValidator {
    behavior: MockBehavior,
    calls: AtomicUsize,
    last_token: Mutex<Option<String>>,
}

impl MockTokenValidator {
    fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            last_token: Mutex::new(None),
        }
    }

    /// Accept every token.
    #[must_use]
    pub fn accepting() -> Self {
        Self::with_behavior(MockBehavior::Accept)
    }

    /// Reject every token as if the identity service returned `status`.
    #[must_use]
    pub fn rejecting(status: u16) -> Self {
        Self::with_behavior(MockBehavior::Reject(status))
    }

    /// Fail every call as if the identity service were unreachable.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::with_behavior(MockBehavior::Unavailable)
    }

    /// Number of `validate` calls so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Token passed to the most recent call.
    #[must_use]
    pub fn last_token(&self) -> Option<String> {
        self.last_token.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl TokenValidator for MockTokenValidator {
    async fn validate(&self, token: &str) -> Result<(), ValidationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_token.lock() {
            *guard = Some(token.to_string());
        }

        match &self.behavior {
            MockBehavior::Accept => Ok(()),
            MockBehavior::Reject(status) => Err(ValidationError::Rejected { status: *status }),
            MockBehavior::Unavailable => Err(ValidationError::Unavailable(
                "mock validator unavailable".to_string(),
            )),
        }
    }
}
