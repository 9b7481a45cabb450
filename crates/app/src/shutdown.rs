//! Process-wide cooperative shutdown.
//!
//! Background loops hold a [`ShutdownSignal`] and select on
//! [`ShutdownSignal::wait`] every iteration.

use tokio::sync::watch;

/// Owner side of the shutdown signal.
#[derive(Debug)]
pub struct Shutdown {
    sender: watch::Sender<bool>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    /// Hand out a receiver to a background loop.
    #[must_use]
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: self.sender.subscribe(),
        }
    }

    /// Ask every loop to stop.
    pub fn trigger(&self) {
        tracing::info!("shutdown requested");
        self.sender.send_replace(true);
    }
}

/// Receiver side of the shutdown signal.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolve once shutdown has been triggered or the owner is gone.
    pub async fn wait(&mut self) {
        let _ = self.receiver.wait_for(|stopped| *stopped).await;
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }
}
