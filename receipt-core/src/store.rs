//! ExpenseStore: the in-memory list of tracked expenses for one session.
//!
//! Every mutation builds a fresh list from the previous snapshot and swaps it
//! in whole; nothing is edited in place. Readers hold an immutable
//! `Arc<[TrackedExpense]>` snapshot, so concurrent extraction units never
//! observe a half-applied update.

use chrono::NaiveDate;
use std::sync::{Arc, RwLock};
use thiserror::Error;

use crate::expense::ExpenseRecord;
use crate::tracked::{ExpenseStatus, TrackedExpense};

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("no expense with id {0}")]
    NotFound(String),

    #[error("expense {id}: cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        id: String,
        from: ExpenseStatus,
        to: ExpenseStatus,
    },

    #[error("amount must be a non-negative number, got {0}")]
    InvalidAmount(f64),
}

#[derive(Debug, Default)]
pub struct ExpenseStore {
    items: RwLock<Arc<[TrackedExpense]>>,
}

impl ExpenseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current list, in insertion order.
    pub fn snapshot(&self) -> Arc<[TrackedExpense]> {
        self.items
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    pub fn get(&self, id: &str) -> Option<TrackedExpense> {
        self.snapshot().iter().find(|e| e.id == id).cloned()
    }

    /// Register an accepted file as a pending expense and return its id.
    pub fn add_pending(&self, file_name: &str, today: NaiveDate) -> String {
        let entry = TrackedExpense::pending(ExpenseRecord::placeholder(file_name, today));
        let id = entry.id.clone();
        self.replace(|prev| {
            let mut next = prev.to_vec();
            next.push(entry);
            next
        });
        tracing::debug!(%id, file = file_name, "accepted file");
        id
    }

    /// Store the extraction result. The entry keeps its id and source file.
    pub fn mark_extracted(&self, id: &str, record: ExpenseRecord) -> Result<(), StoreError> {
        self.transition(id, ExpenseStatus::Extracted, |prev| {
            let mut record = record;
            if prev.record.source_file.is_some() {
                record.source_file = prev.record.source_file.clone();
            }
            TrackedExpense {
                id: prev.id.clone(),
                record,
                status: ExpenseStatus::Extracted,
                error: None,
            }
        })
    }

    /// Extraction failed, or a sync attempt was rejected.
    pub fn mark_failed(&self, id: &str, message: impl Into<String>) -> Result<(), StoreError> {
        let message = message.into();
        self.transition(id, ExpenseStatus::Error, |prev| TrackedExpense {
            status: ExpenseStatus::Error,
            error: Some(message),
            ..prev.clone()
        })
    }

    /// Apply a user edit.
    pub fn edit(&self, id: &str, record: ExpenseRecord) -> Result<(), StoreError> {
        if !record.amount.is_finite() || record.amount < 0.0 {
            return Err(StoreError::InvalidAmount(record.amount));
        }
        self.transition(id, ExpenseStatus::Edited, |prev| {
            let mut record = record;
            record.source_file = prev.record.source_file.clone();
            TrackedExpense {
                id: prev.id.clone(),
                record,
                status: ExpenseStatus::Edited,
                error: None,
            }
        })
    }

    /// Move an entry to `syncing` and hand back the record to push.
    pub fn begin_sync(&self, id: &str) -> Result<ExpenseRecord, StoreError> {
        self.transition(id, ExpenseStatus::Syncing, |prev| TrackedExpense {
            status: ExpenseStatus::Syncing,
            error: None,
            ..prev.clone()
        })?;
        self.get(id)
            .map(|e| e.record)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub fn mark_synced(&self, id: &str) -> Result<(), StoreError> {
        self.transition(id, ExpenseStatus::Synced, |prev| TrackedExpense {
            status: ExpenseStatus::Synced,
            error: None,
            ..prev.clone()
        })
    }

    /// Delete an entry. Returns false when the id is unknown.
    pub fn remove(&self, id: &str) -> bool {
        let mut removed = false;
        self.replace(|prev| {
            let next: Vec<TrackedExpense> = prev.iter().filter(|e| e.id != id).cloned().collect();
            removed = next.len() != prev.len();
            next
        });
        removed
    }

    /// Ids of entries a "sync all" sweep should push, in list order.
    pub fn syncable_ids(&self) -> Vec<String> {
        self.snapshot()
            .iter()
            .filter(|e| e.status.is_syncable())
            .map(|e| e.id.clone())
            .collect()
    }

    pub fn count_by_status(&self, status: ExpenseStatus) -> usize {
        self.snapshot().iter().filter(|e| e.status == status).count()
    }

    fn replace(&self, f: impl FnOnce(&[TrackedExpense]) -> Vec<TrackedExpense>) {
        let mut guard = self
            .items
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let next: Arc<[TrackedExpense]> = f(&guard).into();
        *guard = next;
    }

    fn transition(
        &self,
        id: &str,
        to: ExpenseStatus,
        f: impl FnOnce(&TrackedExpense) -> TrackedExpense,
    ) -> Result<(), StoreError> {
        let mut outcome = Ok(());
        self.replace(|prev| {
            let Some(current) = prev.iter().find(|e| e.id == id) else {
                outcome = Err(StoreError::NotFound(id.to_string()));
                return prev.to_vec();
            };
            if !current.status.can_transition_to(to) {
                outcome = Err(StoreError::InvalidTransition {
                    id: id.to_string(),
                    from: current.status,
                    to,
                });
                return prev.to_vec();
            }
            let updated = f(current);
            prev.iter()
                .map(|e| if e.id == id { updated.clone() } else { e.clone() })
                .collect()
        });
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expense::Category;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn extracted() -> ExpenseRecord {
        ExpenseRecord::new("Swiggy order", 412.0, Category::FoodAndDrink, today())
    }

    #[test]
    fn test_add_pending_uses_placeholder() {
        let store = ExpenseStore::new();
        let id = store.add_pending("r1.png", today());
        let e = store.get(&id).unwrap();
        assert_eq!(e.status, ExpenseStatus::Pending);
        assert_eq!(e.record.description, "r1.png");
        assert_eq!(e.record.amount, 0.0);
        assert_eq!(e.record.category, Category::FoodAndDrink);
        assert_eq!(e.source_file(), Some("r1.png"));
    }

    #[test]
    fn test_extracted_keeps_id_and_source_file() {
        let store = ExpenseStore::new();
        let id = store.add_pending("r1.png", today());
        store.mark_extracted(&id, extracted()).unwrap();
        let e = store.get(&id).unwrap();
        assert_eq!(e.status, ExpenseStatus::Extracted);
        assert_eq!(e.record.description, "Swiggy order");
        assert_eq!(e.source_file(), Some("r1.png"));
    }

    #[test]
    fn test_snapshot_is_not_mutated_by_later_updates() {
        let store = ExpenseStore::new();
        let id = store.add_pending("r1.png", today());
        let before = store.snapshot();
        store.mark_extracted(&id, extracted()).unwrap();
        assert_eq!(before[0].status, ExpenseStatus::Pending);
        assert_eq!(store.snapshot()[0].status, ExpenseStatus::Extracted);
    }

    #[test]
    fn test_sync_cycle_and_retry() {
        let store = ExpenseStore::new();
        let id = store.add_pending("r1.png", today());
        store.mark_extracted(&id, extracted()).unwrap();

        let rec = store.begin_sync(&id).unwrap();
        assert_eq!(rec.description, "Swiggy order");
        assert_eq!(store.get(&id).unwrap().status, ExpenseStatus::Syncing);

        store.mark_failed(&id, "Failed to sync with Notion").unwrap();
        let e = store.get(&id).unwrap();
        assert_eq!(e.status, ExpenseStatus::Error);
        assert_eq!(e.error.as_deref(), Some("Failed to sync with Notion"));

        store.begin_sync(&id).unwrap();
        store.mark_synced(&id).unwrap();
        assert_eq!(store.get(&id).unwrap().status, ExpenseStatus::Synced);
        assert!(store.get(&id).unwrap().error.is_none());
    }

    #[test]
    fn test_pending_cannot_sync() {
        let store = ExpenseStore::new();
        let id = store.add_pending("r1.png", today());
        let err = store.begin_sync(&id).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
    }

    #[test]
    fn test_edit_rejects_negative_amount() {
        let store = ExpenseStore::new();
        let id = store.add_pending("r1.png", today());
        store.mark_extracted(&id, extracted()).unwrap();
        let mut bad = extracted();
        bad.amount = -3.0;
        assert_eq!(store.edit(&id, bad), Err(StoreError::InvalidAmount(-3.0)));

        let mut good = extracted();
        good.amount = 99.5;
        store.edit(&id, good).unwrap();
        let e = store.get(&id).unwrap();
        assert_eq!(e.status, ExpenseStatus::Edited);
        assert_eq!(e.record.amount, 99.5);
        assert_eq!(e.source_file(), Some("r1.png"));
    }

    #[test]
    fn test_syncable_ids_and_remove() {
        let store = ExpenseStore::new();
        let a = store.add_pending("a.png", today());
        let b = store.add_pending("b.png", today());
        let c = store.add_pending("c.png", today());
        store.mark_extracted(&a, extracted()).unwrap();
        store.mark_failed(&b, "Failed to extract data from image").unwrap();
        store.mark_extracted(&c, extracted()).unwrap();
        store.edit(&c, extracted()).unwrap();

        assert_eq!(store.syncable_ids(), vec![a.clone(), c.clone()]);
        assert!(store.remove(&a));
        assert!(!store.remove(&a));
        assert_eq!(store.len(), 2);
        assert_eq!(store.count_by_status(ExpenseStatus::Error), 1);
    }

    #[test]
    fn test_unknown_id() {
        let store = ExpenseStore::new();
        assert_eq!(
            store.mark_synced("nope"),
            Err(StoreError::NotFound("nope".to_string()))
        );
    }
}
