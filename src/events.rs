// src/events.rs

//! Change events and the queue that carries them from the watcher thread
//! into the scheduler.
//!
//! The watcher side holds a [`ChangeSender`] and calls [`ChangeSender::push`]
//! from the notify callback; the scheduler side holds the matching
//! [`ChangeReceiver`] and empties it once per tick with
//! [`ChangeReceiver::drain`]. Both operations are non-blocking and the queue
//! preserves arrival order.

use tokio::sync::mpsc;

/// What kind of filesystem change produced an event.
///
/// Deletions and pure renames are filtered out at the watcher; tasks react
/// to content appearing or changing, not to it going away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
}

/// A single filesystem change, with the path relative to the watch root
/// (forward slashes on every platform).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: String,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(path: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Create a connected sender/receiver pair for change events.
pub fn channel() -> (ChangeSender, ChangeReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChangeSender { tx }, ChangeReceiver { rx })
}

/// Producer half of the change queue. Cheap to clone; safe to call from the
/// watcher callback thread.
#[derive(Debug, Clone)]
pub struct ChangeSender {
    tx: mpsc::UnboundedSender<ChangeEvent>,
}

impl ChangeSender {
    /// Append one event to the queue without blocking.
    ///
    /// A send failure means the receiver (and therefore the whole runtime)
    /// is gone, so the event is silently dropped.
    pub fn push(&self, event: ChangeEvent) {
        let _ = self.tx.send(event);
    }
}

/// Consumer half of the change queue, owned by the scheduler.
#[derive(Debug)]
pub struct ChangeReceiver {
    rx: mpsc::UnboundedReceiver<ChangeEvent>,
}

impl ChangeReceiver {
    /// Remove and return everything queued so far, in arrival order.
    ///
    /// Returns an empty vec when nothing is queued; never waits for more
    /// events to arrive.
    pub fn drain(&mut self) -> Vec<ChangeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}
