use std::ops::AddAssign;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::domain::{Category, NotificationPayload};
use crate::errors::AlertResult;
use crate::services::notification_service::{Messenger, Recipient};
use crate::storage::traits::{ChannelBindingRepository, SubscriberRepository};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

impl AddAssign for DeliveryReport {
    fn add_assign(&mut self, other: Self) {
        self.attempted += other.attempted;
        self.delivered += other.delivered;
        self.failed += other.failed;
    }
}

/// Where rendered alerts go once the poller has found them
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, payload: &NotificationPayload, category: Category) -> DeliveryReport;
}

/// Best-effort fan-out to the bound channel and every opted-in subscriber.
///
/// Recipients are served one after another. A failed delivery is counted and
/// dropped: it is never retried and never stops the remaining recipients.
pub struct Dispatcher<S, B, M>
where
    S: SubscriberRepository,
    B: ChannelBindingRepository,
    M: Messenger,
{
    subscribers: S,
    bindings: B,
    messenger: M,
}

impl<S, B, M> Dispatcher<S, B, M>
where
    S: SubscriberRepository,
    B: ChannelBindingRepository,
    M: Messenger,
{
    pub fn new(subscribers: S, bindings: B, messenger: M) -> Self {
        Self {
            subscribers,
            bindings,
            messenger,
        }
    }

    /// Current audience for a category, read fresh from storage
    pub fn resolve_audience(&self, category: Category) -> AlertResult<Vec<Recipient>> {
        let mut audience = Vec::new();

        if let Some(channel_id) = self.bindings.get(category)? {
            audience.push(Recipient::Channel(channel_id));
        }

        audience.extend(
            self.subscribers
                .subscribed_to(category)?
                .into_iter()
                .map(Recipient::User),
        );

        Ok(audience)
    }

    pub async fn dispatch(&self, payload: &NotificationPayload, category: Category) -> DeliveryReport {
        let audience = match self.resolve_audience(category) {
            Ok(audience) => audience,
            Err(e) => {
                error!(%category, error = %e, "could not resolve audience");
                return DeliveryReport::default();
            }
        };

        let mut report = DeliveryReport::default();

        for recipient in audience {
            report.attempted += 1;

            match self.messenger.send(recipient, payload).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    debug!(%recipient, error = %e, "delivery failed");
                }
            }
        }

        info!(
            headline = %payload.headline,
            attempted = report.attempted,
            delivered = report.delivered,
            failed = report.failed,
            "alert dispatched"
        );

        report
    }
}

#[async_trait]
impl<S, B, M> AlertSink for Dispatcher<S, B, M>
where
    S: SubscriberRepository,
    B: ChannelBindingRepository,
    M: Messenger,
{
    async fn deliver(&self, payload: &NotificationPayload, category: Category) -> DeliveryReport {
        self.dispatch(payload, category).await
    }
}

/// Prints payloads instead of sending them
#[derive(Debug, Default)]
pub struct DryRunSink;

#[async_trait]
impl AlertSink for DryRunSink {
    async fn deliver(&self, payload: &NotificationPayload, category: Category) -> DeliveryReport {
        println!("  [DRY RUN] ({}) {}", category, payload.format());
        DeliveryReport::default()
    }
}
