//! Data bridge — connects [`Showroom`] streams to TUI actions.
//!
//! Runs as a background task: connects the facade, then subscribes to the
//! catalogue streams, identity, and connection state, forwarding every
//! change as an [`Action`] through the TUI's action channel. Shuts down
//! cleanly on cancellation; after that, no action is ever sent.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use showroom_core::{ConnectionState, Showroom};

use crate::action::{Action, Notification};

/// Spawn the data bridge connecting [`Showroom`] reactive streams to the TUI.
pub async fn spawn_data_bridge(
    showroom: Showroom,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let _ = action_tx.send(Action::Reconnecting);

    if let Err(e) = showroom.connect().await {
        warn!(error = %e, "failed to connect to backend");
        let _ = action_tx.send(Action::Disconnected(format!("{e}")));
        return;
    }

    let _ = action_tx.send(Action::Connected);

    // Surface any warnings from connect (e.g. a gated collection fetch)
    for warning in showroom.take_warnings().await {
        let _ = action_tx.send(Action::Notify(Notification::warning(warning)));
    }

    // Subscribe to catalogue streams and identity
    let mut cars = showroom.cars();
    let mut reviews = showroom.reviews();
    let mut profiles = showroom.profiles();
    let mut identity = showroom.identity(cancel.child_token());
    let mut conn_state = showroom.connection_state();

    // Push initial snapshots so screens have data immediately
    let _ = action_tx.send(Action::CarsUpdated(cars.current().clone()));
    let _ = action_tx.send(Action::ReviewsUpdated(reviews.current().clone()));
    let _ = action_tx.send(Action::ProfilesUpdated(profiles.current().clone()));
    let _ = action_tx.send(Action::IdentityChanged(identity.current()));

    // Stream loop — forward every change until cancelled
    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Some(c) = cars.changed() => {
                let _ = action_tx.send(Action::CarsUpdated(c));
            }
            Some(r) = reviews.changed() => {
                let _ = action_tx.send(Action::ReviewsUpdated(r));
            }
            Some(p) = profiles.changed() => {
                let _ = action_tx.send(Action::ProfilesUpdated(p));
            }
            Some(i) = identity.changed() => {
                let _ = action_tx.send(Action::IdentityChanged(i));
            }
            Ok(()) = conn_state.changed() => {
                let state = conn_state.borrow_and_update().clone();
                match state {
                    ConnectionState::Connected => {
                        let _ = action_tx.send(Action::Connected);
                    }
                    ConnectionState::Disconnected => {
                        let _ = action_tx.send(Action::Disconnected("disconnected".into()));
                    }
                    ConnectionState::Failed => {
                        let _ = action_tx.send(Action::Disconnected("connection failed".into()));
                    }
                    ConnectionState::Connecting => {}
                }
            }
        }
    }

    identity.shutdown().await;
    showroom.disconnect().await;
    debug!("data bridge shut down");
}
