#![forbid(unsafe_code)]

//! Hand-off channel from worker threads to the UI thread.
//!
//! The notifier bus and event queues are single-threaded. Background jobs
//! post their notices and timer fires through a [`RemoteSender`]; the window
//! manager drains the channel on the UI thread in
//! [`WindowManager::pump_remote`](crate::wm::WindowManager::pump_remote).
//!
//! ```
//! use kwm_runtime::notifier::{NC_SCENE, ND_FRAME};
//! use kwm_runtime::wm::WindowManager;
//!
//! let mut wm = WindowManager::new();
//! let sender = wm.remote_sender();
//! std::thread::spawn(move || sender.add_notifier(NC_SCENE | ND_FRAME, None))
//!     .join()
//!     .ok();
//! assert_eq!(wm.pump_remote(), 1);
//! assert_eq!(wm.notifiers().len(), 1);
//! ```

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use kwm_core::event::TimerId;
use kwm_core::input::WindowId;
use thiserror::Error;

use crate::notifier::{NotifierRef, is_valid_notifier};

/// One message from a worker thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteMessage {
    Notifier {
        value: u32,
        reference: Option<NotifierRef>,
        window: Option<WindowId>,
    },
    TimerFire {
        window: WindowId,
        timer: TimerId,
    },
    /// Raise the break flag.
    Break,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("window manager is gone")]
    Disconnected,
    #[error("invalid notifier value {0:#010x}")]
    InvalidNotifier(u32),
}

/// Cloneable, `Send` handle for posting to the UI thread.
#[derive(Debug, Clone)]
pub struct RemoteSender {
    tx: Sender<RemoteMessage>,
}

impl RemoteSender {
    pub fn send(&self, message: RemoteMessage) -> Result<(), RemoteError> {
        if let RemoteMessage::Notifier { value, .. } = message
            && !is_valid_notifier(value)
        {
            return Err(RemoteError::InvalidNotifier(value));
        }
        self.tx.send(message).map_err(|_| RemoteError::Disconnected)
    }

    /// Post a global notifier.
    pub fn add_notifier(&self, value: u32, reference: Option<NotifierRef>) -> Result<(), RemoteError> {
        self.send(RemoteMessage::Notifier {
            value,
            reference,
            window: None,
        })
    }

    /// Post a notifier raised from `window`.
    pub fn add_window_notifier(
        &self,
        window: WindowId,
        value: u32,
        reference: Option<NotifierRef>,
    ) -> Result<(), RemoteError> {
        self.send(RemoteMessage::Notifier {
            value,
            reference,
            window: Some(window),
        })
    }

    pub fn fire_timer(&self, window: WindowId, timer: TimerId) -> Result<(), RemoteError> {
        self.send(RemoteMessage::TimerFire { window, timer })
    }

    pub fn request_break(&self) -> Result<(), RemoteError> {
        self.send(RemoteMessage::Break)
    }
}

/// Receiving end owned by the window manager.
#[derive(Debug)]
pub(crate) struct RemoteInbox {
    tx: Sender<RemoteMessage>,
    rx: Receiver<RemoteMessage>,
}

impl Default for RemoteInbox {
    fn default() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }
}

impl RemoteInbox {
    pub(crate) fn sender(&self) -> RemoteSender {
        RemoteSender {
            tx: self.tx.clone(),
        }
    }

    /// Every message posted so far, in send order.
    pub(crate) fn drain(&self) -> Vec<RemoteMessage> {
        let mut out = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(msg) => out.push(msg),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::{NC_OBJECT, ND_TRANSFORM};

    #[test]
    fn messages_arrive_in_order() {
        let inbox = RemoteInbox::default();
        let a = inbox.sender();
        let b = a.clone();
        assert!(a.add_notifier(NC_OBJECT | ND_TRANSFORM, None).is_ok());
        assert!(b.fire_timer(WindowId(2), TimerId(9)).is_ok());
        assert!(a.request_break().is_ok());
        assert_eq!(
            inbox.drain(),
            vec![
                RemoteMessage::Notifier {
                    value: NC_OBJECT | ND_TRANSFORM,
                    reference: None,
                    window: None
                },
                RemoteMessage::TimerFire {
                    window: WindowId(2),
                    timer: TimerId(9)
                },
                RemoteMessage::Break,
            ]
        );
        assert!(inbox.drain().is_empty());
    }

    #[test]
    fn invalid_notifiers_are_rejected_at_the_sender() {
        let inbox = RemoteInbox::default();
        let s = inbox.sender();
        assert_eq!(s.add_notifier(0, None), Err(RemoteError::InvalidNotifier(0)));
        assert!(inbox.drain().is_empty());
    }

    #[test]
    fn send_after_drop_is_disconnected() {
        let s = RemoteInbox::default().sender();
        assert_eq!(s.add_notifier(NC_OBJECT, None), Err(RemoteError::Disconnected));
    }

    #[test]
    fn sender_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<RemoteSender>();
    }
}
