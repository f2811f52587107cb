//! Async worker - runs in Tokio runtime and handles RPC operations

use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::interval;

use crate::domain::{ChainClient, FetchTicket};
use crate::infrastructure::runtime::bridge::{RuntimeCommand, RuntimeEvent};

/// Run the async worker loop until shutdown or the command channel closes
pub async fn run_async_worker(
    client: Arc<dyn ChainClient>,
    cmd_rx: Receiver<RuntimeCommand>,
    evt_tx: Sender<RuntimeEvent>,
) -> Result<()> {
    let mut poll_interval = interval(Duration::from_millis(50));

    loop {
        loop {
            match cmd_rx.try_recv() {
                Ok(RuntimeCommand::Shutdown) => return Ok(()),
                Ok(RuntimeCommand::Fetch { ticket }) => {
                    tracing::debug!(
                        epoch = ticket.epoch,
                        network_id = ticket.network.id,
                        "fetch requested"
                    );
                    let client = Arc::clone(&client);
                    let evt_tx = evt_tx.clone();
                    tokio::spawn(async move {
                        run_fetch(client.as_ref(), ticket, &evt_tx).await;
                    });
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }

        poll_interval.tick().await;
    }
}

/// Run the three queries of a ticket concurrently and report each result
pub async fn run_fetch(client: &dyn ChainClient, ticket: FetchTicket, evt_tx: &Sender<RuntimeEvent>) {
    let epoch = ticket.epoch;
    let (balance, gas_price, block_height) = futures::join!(
        ticket.balance(client),
        ticket.gas_price(client),
        ticket.block_height(client),
    );

    // The UI may have quit already; nothing to do then.
    let _ = evt_tx.send(RuntimeEvent::BalanceReady {
        epoch,
        result: balance,
    });
    let _ = evt_tx.send(RuntimeEvent::GasPriceReady {
        epoch,
        result: gas_price,
    });
    let _ = evt_tx.send(RuntimeEvent::BlockHeightReady {
        epoch,
        result: block_height,
    });
}
