//! A best-effort trace channel for human-readable cache activity messages,
//! separate from the ambient `log` crate usage. At most one subscriber is
//! supported per filesystem instance.

use std::sync::mpsc;

#[derive(Clone)]
pub struct Notifier {
    sender: Option<mpsc::SyncSender<String>>,
}

impl Notifier {
    pub fn disconnected() -> Self {
        Self { sender: None }
    }

    /// Creates a rendezvous (`bound = 0`) channel; returns the notifier to
    /// hand to the cache and the receiver for the single subscriber.
    pub fn channel() -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::sync_channel(0);
        (Self { sender: Some(tx) }, rx)
    }

    /// Emits a trace message. Never blocks the caller: if no subscriber is
    /// reading, the message is dropped rather than stalling the emitter.
    pub fn emit(&self, message: impl Into<String>) {
        if let Some(sender) = &self.sender {
            let _ = sender.try_send(message.into());
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::disconnected()
    }
}
