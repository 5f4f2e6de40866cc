use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use super::sync::run_sync;
use crate::error::SyncError;
use crate::settings::SheetCredentials;
use crate::store::Store;

/// Background thread that runs one job per "response created" event, in
/// arrival order. Dropping every sender ends the loop.
pub struct SyncWorker {
    sender: Sender<String>,
    handle: JoinHandle<()>,
}

impl SyncWorker {
    pub fn spawn<F>(mut job: F) -> std::io::Result<Self>
    where
        F: FnMut(&str) + Send + 'static,
    {
        let (sender, receiver): (Sender<String>, Receiver<String>) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("sheet-sync".to_string())
            .spawn(move || {
                for response_id in receiver {
                    job(&response_id);
                }
                tracing::debug!("sync worker stopped");
            })?;
        Ok(Self { sender, handle })
    }

    /// Worker that mirrors each response into the configured sheet. Every
    /// event opens its own store connection.
    pub fn for_sheets(
        database: PathBuf,
        credentials: Option<SheetCredentials>,
    ) -> std::io::Result<Self> {
        Self::spawn(move |response_id| {
            let result = Store::open(&database)
                .map_err(SyncError::from)
                .and_then(|store| run_sync(&store, credentials.as_ref(), response_id));
            if let Err(err) = result {
                tracing::error!(response = response_id, error = %err, "sheet sync failed");
            }
        })
    }

    pub fn sender(&self) -> Sender<String> {
        self.sender.clone()
    }

    /// Stops accepting events and waits for queued jobs to finish.
    pub fn shutdown(self) {
        drop(self.sender);
        if self.handle.join().is_err() {
            tracing::error!("sync worker panicked");
        }
    }
}
