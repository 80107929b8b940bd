//! Components that own state and react to messages.
//!
//! The grid manager serializes host notifications and commands under one
//! lock; the tray, occupancy scanner and config watcher run on their own
//! threads or tasks and talk to it over channels.

pub mod config_watcher;
pub mod grid_manager;
pub mod hotkeys;
pub mod occupancy;
pub mod reactor;
pub mod tray;

use tokio::sync::mpsc;

/// Unbounded sender that carries the sender's tracing span along with each
/// message, so the receiving side logs inside the span that caused it.
#[derive(Debug)]
pub struct Sender<E>(mpsc::UnboundedSender<(tracing::Span, E)>);

pub type Receiver<E> = mpsc::UnboundedReceiver<(tracing::Span, E)>;

pub fn channel<E>() -> (Sender<E>, Receiver<E>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Sender(tx), rx)
}

impl<E> Clone for Sender<E> {
    fn clone(&self) -> Self { Sender(self.0.clone()) }
}

impl<E> Sender<E> {
    /// Sends, dropping the message if the receiver has gone away.
    pub fn send(&self, event: E) { _ = self.try_send(event); }

    pub fn try_send(&self, event: E) -> Result<(), mpsc::error::SendError<(tracing::Span, E)>> {
        self.0.send((tracing::Span::current(), event))
    }

    pub fn is_closed(&self) -> bool { self.0.is_closed() }
}
