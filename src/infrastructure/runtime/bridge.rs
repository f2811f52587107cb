//! Runtime bridge - connects the sync TUI thread with the async Tokio runtime
//!
//! The UI thread owns the session controller. It hands the worker a
//! [`FetchTicket`] snapshot and later receives one event per query, each
//! tagged with the ticket's epoch so stale results can be dropped.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use anyhow::Context;
use tokio::runtime::Runtime;

use crate::domain::{Amount, ChainClient, FetchError, FetchTicket};
use crate::infrastructure::runtime::worker::run_async_worker;

/// Commands sent from the TUI to the async worker
#[derive(Debug, Clone)]
pub enum RuntimeCommand {
    /// Run balance, gas price and block height queries for a ticket
    Fetch { ticket: FetchTicket },
    /// Shutdown the worker
    Shutdown,
}

/// Events sent from the async worker to the TUI
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    BalanceReady {
        epoch: u64,
        result: Result<Amount, FetchError>,
    },
    GasPriceReady {
        epoch: u64,
        result: Result<Amount, FetchError>,
    },
    BlockHeightReady {
        epoch: u64,
        result: Result<u64, FetchError>,
    },
    /// Worker-level failure (not tied to a query)
    Error { message: String },
}

/// Bridge between sync TUI thread and async Tokio runtime
pub struct RuntimeBridge {
    cmd_tx: Sender<RuntimeCommand>,
    evt_rx: Receiver<RuntimeEvent>,
}

impl RuntimeBridge {
    /// Spawn the worker thread with its own Tokio runtime
    pub fn new(client: Arc<dyn ChainClient>) -> anyhow::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<RuntimeCommand>();
        let (evt_tx, evt_rx) = mpsc::channel::<RuntimeEvent>();

        let rt = Runtime::new().context("Failed to create Tokio runtime")?;
        thread::Builder::new()
            .name("walletscope-rpc".into())
            .spawn(move || {
                rt.block_on(async {
                    if let Err(err) = run_async_worker(client, cmd_rx, evt_tx.clone()).await {
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!("Worker exited: {:#}", err),
                        });
                    }
                });
            })
            .context("Failed to spawn RPC worker thread")?;

        Ok(Self { cmd_tx, evt_rx })
    }

    /// Send a command to the async worker
    pub fn send(&self, cmd: RuntimeCommand) -> anyhow::Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| anyhow::anyhow!("Worker channel closed"))
    }

    /// Poll for events (non-blocking)
    pub fn poll_events(&self) -> Vec<RuntimeEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.evt_rx.try_recv() {
            events.push(evt);
        }
        events
    }

    /// Wait for the next event (blocking); `None` once the worker is gone
    pub fn recv(&self) -> Option<RuntimeEvent> {
        self.evt_rx.recv().ok()
    }
}

impl Drop for RuntimeBridge {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(RuntimeCommand::Shutdown);
    }
}
