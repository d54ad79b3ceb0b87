//! Tracked expenses: an [`ExpenseRecord`] plus its processing status.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::expense::ExpenseRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    /// File accepted, extraction not finished
    Pending,
    Extracted,
    /// Modified by the user after extraction
    Edited,
    Syncing,
    Synced,
    Error,
}

impl ExpenseStatus {
    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// pending -> extracted | error
    /// error -> extracted (re-extraction) | syncing (retry)
    /// extracted | edited -> syncing
    /// syncing -> synced | error
    /// anything but syncing -> edited
    pub fn can_transition_to(self, next: ExpenseStatus) -> bool {
        use ExpenseStatus::*;
        match (self, next) {
            (Syncing, Synced) | (Syncing, Error) => true,
            (Syncing, _) => false,
            (_, Edited) => true,
            (Pending, Extracted) | (Pending, Error) => true,
            (Error, Extracted) => true,
            (Extracted, Syncing) | (Edited, Syncing) | (Error, Syncing) => true,
            _ => false,
        }
    }

    /// Ready to be pushed by a "sync all" sweep.
    pub fn is_syncable(self) -> bool {
        matches!(self, ExpenseStatus::Extracted | ExpenseStatus::Edited)
    }

    /// Short label for list output.
    pub fn label(self, sync_enabled: bool) -> &'static str {
        match self {
            ExpenseStatus::Pending => "Waiting...",
            ExpenseStatus::Extracted if sync_enabled => "Ready to sync",
            ExpenseStatus::Extracted => "Processed",
            ExpenseStatus::Edited => "Modified",
            ExpenseStatus::Syncing => "Syncing...",
            ExpenseStatus::Synced => "Synced",
            ExpenseStatus::Error => "Error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedExpense {
    pub id: String,
    #[serde(flatten)]
    pub record: ExpenseRecord,
    pub status: ExpenseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TrackedExpense {
    /// New pending entry with a fresh random id.
    pub fn pending(record: ExpenseRecord) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            record,
            status: ExpenseStatus::Pending,
            error: None,
        }
    }

    pub fn source_file(&self) -> Option<&str> {
        self.record.source_file.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ExpenseStatus::*;

    #[test]
    fn test_lifecycle_edges() {
        assert!(Pending.can_transition_to(Extracted));
        assert!(Pending.can_transition_to(Error));
        assert!(Extracted.can_transition_to(Edited));
        assert!(Edited.can_transition_to(Syncing));
        assert!(Syncing.can_transition_to(Synced));
        assert!(Syncing.can_transition_to(Error));
        assert!(Error.can_transition_to(Syncing));
        assert!(Synced.can_transition_to(Edited));

        assert!(!Pending.can_transition_to(Syncing));
        assert!(!Syncing.can_transition_to(Edited));
        assert!(!Synced.can_transition_to(Syncing));
        assert!(!Extracted.can_transition_to(Synced));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Syncing).unwrap(), "\"syncing\"");
    }

    #[test]
    fn test_labels() {
        assert_eq!(Extracted.label(true), "Ready to sync");
        assert_eq!(Extracted.label(false), "Processed");
    }
}
