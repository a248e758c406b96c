//! In-memory notification sink that records every delivered signal.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::workflow::ports::{Notification, NotificationError, NotificationSink};

/// Sink that appends every notification to an in-memory log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    delivered: Arc<RwLock<Vec<Notification>>>,
}

impl RecordingSink {
    /// Creates an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything delivered so far, in order.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError`] when the log's lock is poisoned.
    pub fn delivered(&self) -> Result<Vec<Notification>, NotificationError> {
        let log = self
            .delivered
            .read()
            .map_err(|err| NotificationError::delivery(std::io::Error::other(err.to_string())))?;
        Ok(log.clone())
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, notification: Notification) -> Result<(), NotificationError> {
        let mut log = self
            .delivered
            .write()
            .map_err(|err| NotificationError::delivery(std::io::Error::other(err.to_string())))?;
        log.push(notification);
        Ok(())
    }
}
