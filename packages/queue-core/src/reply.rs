//! The opaque reply-channel handle synchronous submitters are carried in
//! the pending queue as.

use tokio::sync::oneshot;

use crate::error::QueueError;

/// A client's reply channel. Handed to a worker at dispatch time so the
/// worker can reply directly — the manager never proxies the reply and
/// is never blocked waiting on it.
#[derive(Debug)]
pub struct ReplyTo<Resp>(oneshot::Sender<Result<Resp, QueueError>>);

impl<Resp> ReplyTo<Resp> {
    pub(crate) fn new(tx: oneshot::Sender<Result<Resp, QueueError>>) -> Self {
        Self(tx)
    }

    /// Whether the submitter is still waiting on this reply.
    ///
    /// Used at match time to detect a submitter that has died (dropped
    /// its receiver) before a worker became available.
    pub fn is_alive(&self) -> bool {
        !self.0.is_closed()
    }

    /// Deliver a reply. Consumes the handle; a dropped receiver on the
    /// other end (submitter gone) makes this a silent no-op, matching
    /// the "never fails" tone of the rest of the submission surface.
    pub fn reply(self, result: Result<Resp, QueueError>) {
        let _ = self.0.send(result);
    }
}
