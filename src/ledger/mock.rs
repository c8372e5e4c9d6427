use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use kanal::{bounded_async, AsyncReceiver, AsyncSender};

use crate::traits::AnchorLedger;
use crate::types::{now_secs, AnchorConfirmation, Hash32, Identifier};

/// How the mock answers the next registrations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerBehavior {
    Confirm,
    Reject(String),
    /// The submission call itself fails.
    FailSubmission(String),
    /// Accept the submission but never confirm.
    Stall,
}

/// Mock ledger for testing.
/// Records every submission and answers according to its behavior.
#[derive(Clone)]
pub struct MockLedger {
    behavior: Arc<Mutex<LedgerBehavior>>,
    pub submissions: Arc<Mutex<Vec<(Identifier, Hash32)>>>,
    stalled: Arc<Mutex<Vec<AsyncSender<AnchorConfirmation>>>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::with_behavior(LedgerBehavior::Confirm)
    }

    pub fn with_behavior(behavior: LedgerBehavior) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(behavior)),
            submissions: Arc::new(Mutex::new(Vec::new())),
            stalled: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_behavior(&self, behavior: LedgerBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    /// Get all submissions (for testing/verification).
    pub fn get_submissions(&self) -> Vec<(Identifier, Hash32)> {
        self.submissions.lock().unwrap().clone()
    }
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnchorLedger for MockLedger {
    fn name(&self) -> &'static str {
        "mock-ledger"
    }

    async fn register_anchor(
        &self,
        id: &Identifier,
        root: &Hash32,
    ) -> Result<AsyncReceiver<AnchorConfirmation>> {
        let behavior = self.behavior.lock().unwrap().clone();
        if let LedgerBehavior::FailSubmission(msg) = &behavior {
            return Err(anyhow!("{}", msg));
        }

        let sequence = {
            let mut submissions = self.submissions.lock().unwrap();
            submissions.push((id.clone(), *root));
            submissions.len()
        };

        let (tx, rx) = bounded_async(1);
        match behavior {
            LedgerBehavior::Confirm => {
                tx.send(AnchorConfirmation::Confirmed {
                    ledger_ref: format!("mock-{sequence}"),
                    anchored_at: now_secs(),
                })
                .await?;
            }
            LedgerBehavior::Reject(reason) => {
                tx.send(AnchorConfirmation::Rejected { reason }).await?;
            }
            LedgerBehavior::Stall => self.stalled.lock().unwrap().push(tx),
            LedgerBehavior::FailSubmission(_) => unreachable!(),
        }
        tracing::debug!("MockLedger: registered anchor #{} for {}", sequence, id);
        Ok(rx)
    }
}
