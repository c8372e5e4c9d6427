use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use kanal::unbounded_async;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, span, warn, Instrument, Level};

use crate::config::BaseConfig;
use crate::document::Document;
use crate::error::{DeliveryFailure, DistributionError};
use crate::traits::Transport;
use crate::transport::TransportVariant;
use crate::types::RecipientId;

/// Fans an anchored document out to recipients.
///
/// Delivery is best effort and never touches the anchor: a failed send
/// leaves the document anchored and can simply be repeated.
pub struct DistributionCoordinator<T: Transport = TransportVariant> {
    transport: Arc<T>,
    transmit_timeout: Duration,
    max_concurrent: usize,
}

impl<T: Transport + 'static> DistributionCoordinator<T> {
    pub fn new(transport: Arc<T>, transmit_timeout: Duration, max_concurrent: usize) -> Self {
        Self {
            transport,
            transmit_timeout,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn from_config(transport: Arc<T>, config: &BaseConfig) -> Self {
        Self::new(
            transport,
            config.transmit_timeout(),
            config.max_concurrent_transmits,
        )
    }

    /// Attempt delivery of `doc` to every distinct recipient.
    ///
    /// Each transmit runs in its own task, at most `max_concurrent` at a
    /// time, and reports to a single collector. Every failing recipient ends
    /// up in the returned `DistributionError::Partial`. Dropping the returned
    /// future aborts any transmit still in flight.
    pub async fn send(
        &self,
        doc: &Document,
        recipients: &[RecipientId],
    ) -> Result<(), DistributionError> {
        if doc.root.is_none() {
            return Err(DistributionError::Unanchored);
        }
        let pending: BTreeSet<RecipientId> = recipients.iter().cloned().collect();
        let attempted = pending.len();
        if attempted == 0 {
            return Ok(());
        }

        let span = span!(
            Level::INFO,
            "distribute",
            transport = self.transport.name(),
            recipients = attempted
        );
        self.fan_out(doc, pending).instrument(span).await
    }

    async fn fan_out(
        &self,
        doc: &Document,
        mut pending: BTreeSet<RecipientId>,
    ) -> Result<(), DistributionError> {
        let attempted = pending.len();
        let doc = Arc::new(doc.clone());
        let permits = Arc::new(Semaphore::new(self.max_concurrent));
        let (tx, rx) = unbounded_async::<(RecipientId, Result<(), DeliveryFailure>)>();
        let mut tasks = JoinSet::new();

        for recipient in pending.iter().cloned() {
            let transport = Arc::clone(&self.transport);
            let doc = Arc::clone(&doc);
            let permits = Arc::clone(&permits);
            let tx = tx.clone();
            let timeout = self.transmit_timeout;
            let task_span = span!(Level::DEBUG, "transmit", recipient = %recipient);

            tasks.spawn(
                async move {
                    let outcome = match permits.acquire_owned().await {
                        Ok(_permit) => {
                            transmit_once(transport.as_ref(), &doc, &recipient, timeout).await
                        }
                        Err(_) => Err(DeliveryFailure::Failed(
                            "distribution cancelled".to_string(),
                        )),
                    };
                    if tx.send((recipient, outcome)).await.is_err() {
                        debug!("Collector gone before result was reported");
                    }
                }
                .instrument(task_span),
            );
        }
        drop(tx);

        let mut failures = BTreeMap::new();
        while let Ok((recipient, outcome)) = rx.recv().await {
            pending.remove(&recipient);
            if let Err(failure) = outcome {
                warn!("Delivery to {} failed: {}", recipient, failure);
                failures.insert(recipient, failure);
            }
        }
        for recipient in pending {
            warn!("Transmit task for {} ended without a result", recipient);
            failures.insert(
                recipient,
                DeliveryFailure::Failed("transmit task aborted".to_string()),
            );
        }

        if failures.is_empty() {
            info!("Delivered to all {} recipients", attempted);
            Ok(())
        } else {
            Err(DistributionError::Partial {
                attempted,
                failures,
            })
        }
    }
}

async fn transmit_once<T: Transport>(
    transport: &T,
    doc: &Document,
    recipient: &RecipientId,
    timeout: Duration,
) -> Result<(), DeliveryFailure> {
    match tokio::time::timeout(timeout, transport.transmit(doc, recipient)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(DeliveryFailure::Failed(format!("{e:#}"))),
        Err(_) => Err(DeliveryFailure::TimedOut(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{FieldDef, FieldKind, Schema};
    use crate::error::ErrorClass;
    use crate::transport::MockTransport;

    fn anchored() -> Document {
        let schema = Arc::new(
            Schema::new("note", vec![FieldDef::new("body", 1, FieldKind::Utf8)]).unwrap(),
        );
        let mut doc = Document::new(schema);
        doc.set("body", "hello").unwrap();
        doc.root = Some([7u8; 32]);
        doc
    }

    #[tokio::test]
    async fn test_unanchored_document_is_refused() {
        let transport = Arc::new(MockTransport::new());
        let coordinator = DistributionCoordinator::new(transport.clone(), Duration::from_secs(1), 2);
        let mut doc = anchored();
        doc.root = None;

        let err = coordinator
            .send(&doc, &[RecipientId::from("alice")])
            .await
            .unwrap_err();
        assert!(matches!(err, DistributionError::Unanchored));
        assert!(transport.get_delivered().is_empty());
    }

    #[tokio::test]
    async fn test_dropping_send_aborts_transmits() {
        let transport = Arc::new(MockTransport::new().with_delay(Duration::from_millis(100)));
        let coordinator = DistributionCoordinator::new(transport.clone(), Duration::from_secs(1), 2);
        let recipients = [RecipientId::from("alice"), RecipientId::from("bob")];

        let cut_short = tokio::time::timeout(
            Duration::from_millis(10),
            coordinator.send(&anchored(), &recipients),
        )
        .await;
        assert!(cut_short.is_err());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(transport.get_delivered().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_recipients_are_sent_once() {
        let transport = Arc::new(MockTransport::new());
        let coordinator = DistributionCoordinator::new(transport.clone(), Duration::from_secs(1), 2);
        let alice = RecipientId::from("alice");

        coordinator
            .send(&anchored(), &[alice.clone(), alice.clone()])
            .await
            .unwrap();
        assert_eq!(transport.get_delivered(), vec![alice]);
    }

    #[tokio::test]
    async fn test_stalled_recipient_times_out() {
        let transport = Arc::new(MockTransport::new());
        transport.stall_for("bob");
        let coordinator =
            DistributionCoordinator::new(transport.clone(), Duration::from_millis(50), 4);

        let err = coordinator
            .send(&anchored(), &[RecipientId::from("alice"), RecipientId::from("bob")])
            .await
            .unwrap_err();
        assert_eq!(err.failed_recipients(), vec![&RecipientId::from("bob")]);
        assert_eq!(err.class(), ErrorClass::Cancelled);
        assert_eq!(transport.get_delivered(), vec![RecipientId::from("alice")]);
    }
}
