//! Connection close notification.
//!
//! The transport owns a [`CloseHandle`] and every in-flight pipeline holds a
//! [`CloseSignal`] it races its work against. Dropping the handle counts as
//! closing the connection.

use tokio::sync::watch;

/// Creates a linked handle and signal for one connection.
#[must_use]
pub fn close_signal() -> (CloseHandle, CloseSignal) {
    let (sender, receiver) = watch::channel(false);
    (CloseHandle { sender }, CloseSignal { receiver })
}

/// Transport-side half used to announce the connection has gone away.
#[derive(Debug)]
pub struct CloseHandle {
    sender: watch::Sender<bool>,
}

impl CloseHandle {
    /// Marks the connection as closed and wakes every waiting signal.
    pub fn close(&self) {
        self.sender.send_replace(true);
    }

    /// Creates another signal observing this handle.
    #[must_use]
    pub fn signal(&self) -> CloseSignal {
        CloseSignal {
            receiver: self.sender.subscribe(),
        }
    }
}

/// Pipeline-side half that resolves once the connection closes.
#[derive(Debug, Clone)]
pub struct CloseSignal {
    receiver: watch::Receiver<bool>,
}

impl CloseSignal {
    /// Resolves when the connection is closed or its handle is dropped.
    pub async fn closed(&mut self) {
        loop {
            if *self.receiver.borrow_and_update() {
                return;
            }
            if self.receiver.changed().await.is_err() {
                return;
            }
        }
    }

    /// Returns `true` if the connection has already closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.receiver.borrow() || self.receiver.has_changed().is_err()
    }
}
