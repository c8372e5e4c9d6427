use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::document::Document;
use crate::traits::Transport;
use crate::types::RecipientId;

/// Mock transport for testing.
/// Records successful deliveries; fails or stalls for configured recipients.
#[derive(Clone, Default)]
pub struct MockTransport {
    pub delivered: Arc<Mutex<Vec<(RecipientId, Document)>>>,
    failing: Arc<Mutex<HashMap<RecipientId, String>>>,
    stalling: Arc<Mutex<HashSet<RecipientId>>>,
    delay: Option<Duration>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every transmit.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fail_for(&self, recipient: impl Into<RecipientId>, message: &str) {
        self.failing
            .lock()
            .unwrap()
            .insert(recipient.into(), message.to_string());
    }

    pub fn stall_for(&self, recipient: impl Into<RecipientId>) {
        self.stalling.lock().unwrap().insert(recipient.into());
    }

    /// Get recipients that received a document (for testing/verification).
    pub fn get_delivered(&self) -> Vec<RecipientId> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .map(|(r, _)| r.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &'static str {
        "mock-transport"
    }

    async fn transmit(&self, doc: &Document, recipient: &RecipientId) -> Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let stalls = self.stalling.lock().unwrap().contains(recipient);
        if stalls {
            std::future::pending::<()>().await;
        }
        let failure = self.failing.lock().unwrap().get(recipient).cloned();
        if let Some(message) = failure {
            return Err(anyhow!("{}", message));
        }
        self.delivered
            .lock()
            .unwrap()
            .push((recipient.clone(), doc.clone()));
        tracing::debug!("MockTransport: delivered document to {}", recipient);
        Ok(())
    }
}
