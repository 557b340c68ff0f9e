//! Presentation boundary.

use crate::error::PresentError;
use crate::protocol::Outbound;
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// Delivers render instructions to a transport.
#[async_trait]
pub trait Presenter: Send + Sync {
    /// Renders one reply.
    async fn render(&self, outbound: &Outbound) -> Result<(), PresentError>;
}

/// Renders `replies` in order and returns how many succeeded.
///
/// State is already committed when replies exist, so a failed render is
/// logged and skipped.
pub async fn deliver(presenter: &dyn Presenter, replies: &[Outbound]) -> usize {
    let mut delivered = 0;
    for reply in replies {
        match presenter.render(reply).await {
            Ok(()) => delivered += 1,
            Err(e) => warn!("Failed to render reply for actor {}: {}", reply.actor(), e),
        }
    }
    delivered
}

/// Keeps every rendered reply in memory.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    rendered: Mutex<Vec<Outbound>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns and clears the recorded replies.
    pub fn take(&self) -> Vec<Outbound> {
        std::mem::take(&mut *self.rendered.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

#[async_trait]
impl Presenter for RecordingPresenter {
    async fn render(&self, outbound: &Outbound) -> Result<(), PresentError> {
        self.rendered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(outbound.clone());
        Ok(())
    }
}
