//! The single document-root listener
//!
//! Interactions arrive on an unbounded channel and are handled one at a time,
//! in arrival order, on a tokio task. The task stops when its cancellation
//! token fires or every sender has been dropped.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::dispatch::{DispatchTable, Dispatcher, EventOutcome, Interaction};
use crate::document::SharedDocument;
use crate::error::AttachError;

/// Feeds interactions to the attached listener
pub type InteractionSender = mpsc::UnboundedSender<Interaction>;

/// Handles returned by [`Dispatcher::attach`]
#[derive(Debug)]
pub struct Listener {
    pub sender: InteractionSender,
    /// Every processed interaction with its outcome, in processing order
    pub outcomes: mpsc::UnboundedReceiver<(Interaction, EventOutcome)>,
    pub task: JoinHandle<()>,
}

impl<T: DispatchTable> Dispatcher<T> {
    /// Start the listener for `document`
    ///
    /// Only one listener may ever be attached to a dispatcher.
    pub fn attach(
        self: Arc<Self>,
        document: SharedDocument,
        cancel: CancellationToken,
    ) -> Result<Listener, AttachError> {
        let runtime = Handle::try_current().map_err(|_| AttachError::NoRuntime)?;
        if self.attached.swap(true, Ordering::AcqRel) {
            return Err(AttachError::AlreadyAttached);
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<Interaction>();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        let task = runtime.spawn(async move {
            info!("dispatch listener attached");
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        info!("dispatch listener cancelled");
                        break;
                    }
                    interaction = rx.recv() => {
                        let Some(interaction) = interaction else {
                            debug!("interaction channel closed, stopping listener");
                            break;
                        };
                        let outcome = self.handle(&document, interaction);
                        debug!(status = ?outcome.status, "interaction processed");
                        // Nobody watching outcomes is fine
                        let _ = outcome_tx.send((interaction, outcome));
                    }
                }
            }
        });

        Ok(Listener {
            sender: tx,
            outcomes: outcome_rx,
            task,
        })
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }
}
