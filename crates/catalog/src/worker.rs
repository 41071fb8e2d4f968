//! Background fetch thread.
//!
//! The UI thread never blocks on the network: jobs go down a channel, the
//! worker runs them one at a time and sends outcomes back. Record jobs carry
//! the ticket they were submitted under; the consumer discards outcomes whose
//! ticket is no longer current, so a slow response can never overwrite the
//! state of a later request.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use openshelf_core::BookRecord;

use crate::{CatalogClient, Source};

#[derive(Debug)]
pub enum FetchJob {
    Records { ticket: u64, source: Source },
    Cover { cover_id: u64 },
}

#[derive(Debug)]
pub enum FetchOutcome {
    Records {
        ticket: u64,
        result: Result<Vec<BookRecord>, String>,
    },
    Cover {
        cover_id: u64,
        result: Result<Vec<u8>, String>,
    },
}

#[derive(Debug)]
pub struct CatalogWorker {
    jobs: Sender<FetchJob>,
    outcomes: Receiver<FetchOutcome>,
}

impl CatalogWorker {
    /// Spawns the worker thread. The thread exits on its own once the
    /// `CatalogWorker` (and with it the job sender) is dropped.
    pub fn spawn(client: CatalogClient) -> Self {
        let (jobs_tx, jobs_rx) = mpsc::channel::<FetchJob>();
        let (outcomes_tx, outcomes_rx) = mpsc::channel::<FetchOutcome>();

        thread::spawn(move || {
            while let Ok(job) = jobs_rx.recv() {
                let outcome = match job {
                    FetchJob::Records { ticket, source } => FetchOutcome::Records {
                        ticket,
                        result: client
                            .fetch_records(&source)
                            .map_err(|err| format!("{err:#}")),
                    },
                    FetchJob::Cover { cover_id } => FetchOutcome::Cover {
                        cover_id,
                        result: client
                            .fetch_cover(cover_id)
                            .map_err(|err| format!("{err:#}")),
                    },
                };
                if outcomes_tx.send(outcome).is_err() {
                    break;
                }
            }
        });

        Self {
            jobs: jobs_tx,
            outcomes: outcomes_rx,
        }
    }

    pub fn submit(&self, job: FetchJob) {
        // A dead worker means we are shutting down; nothing to report.
        let _ = self.jobs.send(job);
    }

    pub fn try_recv(&self) -> Option<FetchOutcome> {
        match self.outcomes.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}
