//! Mirrors each new response into a Google Sheets tab.

pub mod client;
pub mod sync;
pub mod worker;

pub use sync::run_sync;
pub use worker::SyncWorker;
