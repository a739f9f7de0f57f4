//! Inbound message routing.
//!
//! Every `message` event the host window receives goes through
//! [`EmbedController::handle_message`]. Three filters apply, in order:
//!
//! 1. the payload must carry a `type` in the picker namespace, otherwise it is someone
//!    else's message and is dropped without a trace;
//! 2. the sender origin must be exactly the picker's origin, otherwise it is dropped with a
//!    warning: this is the authentication boundary;
//! 3. the kind must be one this crate knows.
//!
//! Callbacks run after the controller's internal borrows are released, so a callback may
//! call back into the controller (to open another integration, say).

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::controller::EmbedController;
use crate::dom::Dom;
use crate::options::IntegrationKind;
use crate::protocol::{namespaced_kind, InboundMessage, MediaEvent, Rejected};
use crate::storage::KeyValueStore;

/// What the router did with a message. Mostly useful in tests and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// Not a picker message.
    Foreign,
    /// A picker message from the wrong origin.
    Untrusted,
    /// Unknown kind or malformed fields.
    Ignored,
    /// Acted upon.
    Handled,
}

impl<D: Dom, S: KeyValueStore> EmbedController<D, S> {
    /// Route one cross-document message. Never fails; see the module docs for filtering.
    pub fn handle_message(&self, origin: &str, data: &Value) -> Routed {
        let Some(kind) = namespaced_kind(data) else {
            return Routed::Foreign;
        };
        if origin != self.trusted_origin() {
            warn!(origin, kind, "dropping picker message from untrusted origin");
            return Routed::Untrusted;
        }
        trace!(%data, "picker message");

        match InboundMessage::decode(data) {
            Ok(message) => {
                self.route(message);
                Routed::Handled
            }
            Err(Rejected::Foreign) => Routed::Foreign,
            Err(Rejected::UnknownKind(kind)) => {
                debug!(%kind, "ignoring unknown picker message");
                Routed::Ignored
            }
            Err(Rejected::Malformed { kind, reason }) => {
                debug!(%kind, %reason, "ignoring malformed picker message");
                Routed::Ignored
            }
        }
    }

    /// Act on an already authenticated message. Only reachable through `handle_message`.
    pub(crate) fn route(&self, message: InboundMessage) {
        match message {
            InboundMessage::Closed { id } => self.desactivate(Some(id)),
            InboundMessage::UsernameSelected { username } => {
                self.set_username(&username);
            }
            InboundMessage::UsernameCleared => self.clear_username(),
            InboundMessage::MediaCopy { id, media } => {
                let callback = self
                    .with_options(id, |options| options.copy_callback().cloned())
                    .flatten();
                match callback {
                    Some(callback) => callback.call(&MediaEvent {
                        id,
                        kind: id.kind(),
                        media,
                    }),
                    None => debug!(%id, "media copied with no copy callback registered"),
                }
            }
            InboundMessage::MediaSelected { id, media } => {
                let Some((callback, kind)) = self.with_options(id, |options| {
                    (options.on_select_media.clone(), options.kind())
                }) else {
                    debug!(%id, "media selected for an unknown integration");
                    return;
                };
                callback.call(&MediaEvent { id, kind, media });
                if matches!(kind, IntegrationKind::Overlay | IntegrationKind::Modal) {
                    self.desactivate(Some(id));
                }
            }
        }
    }
}

#[cfg(feature = "tokio")]
pub use pump::{channel, event_loop, MessageReceiver, MessageSender, PostedMessage};

#[cfg(feature = "tokio")]
mod pump {
    use serde_json::Value;
    use tokio::sync::mpsc;
    use tracing::debug;

    use crate::controller::EmbedController;
    use crate::dom::Dom;
    use crate::storage::KeyValueStore;

    /// A `message` event as the host window saw it.
    #[derive(Debug, Clone)]
    pub struct PostedMessage {
        pub origin: String,
        pub data: Value,
    }

    /// Cloneable handle for queueing messages. Posting never blocks.
    #[derive(Debug, Clone)]
    pub struct MessageSender {
        tx: mpsc::UnboundedSender<PostedMessage>,
    }

    impl MessageSender {
        /// Queue a message. Returns `false` once the loop has stopped.
        pub fn post(&self, origin: impl Into<String>, data: Value) -> bool {
            self.tx
                .send(PostedMessage {
                    origin: origin.into(),
                    data,
                })
                .is_ok()
        }
    }

    #[derive(Debug)]
    pub struct MessageReceiver {
        rx: mpsc::UnboundedReceiver<PostedMessage>,
    }

    pub fn channel() -> (MessageSender, MessageReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (MessageSender { tx }, MessageReceiver { rx })
    }

    /// Route queued messages one at a time, each to completion, until every sender is gone.
    ///
    /// Returns how many messages were taken off the queue.
    pub async fn event_loop<D, S>(
        controller: &EmbedController<D, S>,
        mut receiver: MessageReceiver,
    ) -> usize
    where
        D: Dom,
        S: KeyValueStore,
    {
        let mut processed = 0;
        while let Some(message) = receiver.rx.recv().await {
            let routed = controller.handle_message(&message.origin, &message.data);
            debug!(?routed, "message routed");
            processed += 1;
        }
        processed
    }
}
