//! Error types for the night engine
//!
//! Every variant is a user-recoverable condition: it is reported as a status
//! pulse and the night state is left untouched.

use thiserror::Error;
use uuid::Uuid;

use crate::models::WindowId;

/// Result type for night operations
pub type NightResult<T> = Result<T, NightError>;

/// Scope in which a duplicate name was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateScope {
    /// Already in the signup list
    Signups,
    /// Already occupying a slot in either window
    Assignments,
}

/// Night engine errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NightError {
    /// Empty or missing required field
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Signup cooldown has not elapsed
    #[error("Signup cooldown active, retry in {retry_after_secs}s")]
    Throttled { retry_after_secs: i64 },

    /// Name collision
    #[error("Duplicate name '{name}' in {scope:?}")]
    Duplicate { name: String, scope: DuplicateScope },

    /// Male-ish cap for the window is already met
    #[error("Cap of {cap} reached for {window} window")]
    CapExceeded { window: WindowId, cap: usize },

    /// Nobody eligible for the requested operation
    #[error("No eligible candidates for {window} window")]
    NoCandidates { window: WindowId },

    /// No signups at all
    #[error("No signups to draw from for {window} window")]
    EmptyPool { window: WindowId },

    /// Slot id is not part of the window
    #[error("Slot {slot_id} not found in {window} window")]
    SlotNotFound { window: WindowId, slot_id: Uuid },

    /// Admin PIN mismatch
    #[error("Admin PIN rejected")]
    Unauthorized,
}

impl NightError {
    /// Create a validation error
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a duplicate error
    pub fn duplicate(name: impl Into<String>, scope: DuplicateScope) -> Self {
        Self::Duplicate {
            name: name.into(),
            scope,
        }
    }

    /// Human-readable message for the status line
    pub fn status_message(&self) -> String {
        match self {
            Self::Validation { field, .. } if field == "name" => {
                "Enter a name first.".to_string()
            }
            Self::Validation { field, .. } if field == "category" => {
                "Pick a category first.".to_string()
            }
            Self::Validation { reason, .. } => reason.clone(),
            Self::Throttled { .. } => "Please wait a minute before the next sign-up.".to_string(),
            Self::Duplicate {
                scope: DuplicateScope::Signups,
                ..
            } => "That name is already signed up.".to_string(),
            Self::Duplicate {
                scope: DuplicateScope::Assignments,
                ..
            } => "That name already has a slot tonight.".to_string(),
            Self::CapExceeded { cap, .. } => {
                format!("Cap reached: at most {cap} male/duo sets in this window.")
            }
            Self::NoCandidates { .. } => "No remaining eligible names to pick from.".to_string(),
            Self::EmptyPool { .. } => "No sign-ups yet.".to_string(),
            Self::SlotNotFound { .. } => "That slot no longer exists.".to_string(),
            Self::Unauthorized => "Wrong PIN".to_string(),
        }
    }

    /// Check if the error is recoverable by the user
    pub fn is_recoverable(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = NightError::validation("name", "Name cannot be empty");
        assert!(err.to_string().contains("name"));
        assert_eq!(err.status_message(), "Enter a name first.");
    }

    #[test]
    fn test_duplicate_messages_differ_by_scope() {
        let signup = NightError::duplicate("dj x", DuplicateScope::Signups);
        let slot = NightError::duplicate("dj x", DuplicateScope::Assignments);
        assert_ne!(signup.status_message(), slot.status_message());
        assert!(signup.to_string().contains("dj x"));
    }

    #[test]
    fn test_cap_message_mentions_cap() {
        let err = NightError::CapExceeded {
            window: WindowId::First,
            cap: 2,
        };
        assert!(err.status_message().contains('2'));
        assert!(err.to_string().contains("first"));
    }

    #[test]
    fn test_all_recoverable() {
        assert!(NightError::Unauthorized.is_recoverable());
        assert!(NightError::Throttled { retry_after_secs: 10 }.is_recoverable());
    }
}
