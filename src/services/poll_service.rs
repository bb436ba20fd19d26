use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::domain::{NotificationPayload, Source};
use crate::services::dispatch_service::{AlertSink, DeliveryReport};
use crate::services::ledger::DedupLedger;
use crate::sources::FeedFetcher;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub sources_polled: usize,
    pub sources_failed: usize,
    pub new_entries: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Polls every source in turn, keeps the first `entries_per_cycle` entries of
/// each feed, drops titles already in the ledger and hands the rest to the
/// sink as they are found.
pub struct PollService<F: FeedFetcher> {
    fetcher: F,
    sources: Vec<Source>,
    ledger: DedupLedger,
    entries_per_cycle: usize,
}

impl<F: FeedFetcher> PollService<F> {
    pub fn new(
        fetcher: F,
        sources: Vec<Source>,
        ledger: DedupLedger,
        entries_per_cycle: usize,
    ) -> Self {
        Self {
            fetcher,
            sources,
            ledger,
            entries_per_cycle,
        }
    }

    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// One pass over all sources. Fetch and parse failures skip the source
    /// until the next cycle.
    pub async fn run_cycle<K: AlertSink + ?Sized>(&mut self, sink: &K) -> CycleReport {
        let Self {
            fetcher,
            sources,
            ledger,
            entries_per_cycle,
        } = self;

        let mut report = CycleReport::default();
        let mut deliveries = DeliveryReport::default();

        for source in sources.iter() {
            report.sources_polled += 1;

            let entries = match fetcher.fetch(source).await {
                Ok(entries) => entries,
                Err(e) => {
                    report.sources_failed += 1;
                    warn!(source = %source.name, error = %e, "error fetching source");
                    continue;
                }
            };

            debug!(source = %source.name, entries = entries.len(), "fetched");

            for entry in entries.into_iter().take(*entries_per_cycle) {
                if ledger.seen(&entry.title) {
                    continue;
                }
                ledger.record(&entry.title);
                report.new_entries += 1;

                let payload = NotificationPayload::render(&entry, source, Utc::now());
                deliveries += sink.deliver(&payload, source.category).await;
            }
        }

        report.delivered = deliveries.delivered;
        report.failed = deliveries.failed;

        info!(
            sources = report.sources_polled,
            sources_failed = report.sources_failed,
            new_entries = report.new_entries,
            delivered = report.delivered,
            failed = report.failed,
            ledger = ledger.len(),
            "poll cycle complete"
        );

        report
    }

    /// Run a cycle immediately and then every `period` until `shutdown`
    /// resolves. A cycle in progress is allowed to finish.
    pub async fn run<K, S>(&mut self, sink: &K, period: Duration, shutdown: S) -> usize
    where
        K: AlertSink + ?Sized,
        S: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut cycles = 0;

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!(cycles, "poll loop stopped");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_cycle(sink).await;
                    cycles += 1;
                }
            }
        }

        cycles
    }
}
