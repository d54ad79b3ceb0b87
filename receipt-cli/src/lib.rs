//! receipt-cli: configuration, HTTP API and batch processing behind the `receipts` binary

pub mod config;
pub mod export;
pub mod logging;
pub mod review;
pub mod server;
pub mod session;
pub mod state;
