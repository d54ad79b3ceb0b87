//! receipt-core: expense model, session store and the bounded wave runner

pub mod expense;
pub mod store;
pub mod time;
pub mod tracked;
pub mod waves;

pub use expense::{Category, ExpenseRecord, UnknownCategory, sanitize_amount};
pub use store::{ExpenseStore, StoreError};
pub use tracked::{ExpenseStatus, TrackedExpense};
pub use waves::{DEFAULT_WAVE_SIZE, run_in_waves};
