pub mod ledger;
pub mod notification_service;
pub mod dispatch_service;
pub mod poll_service;
pub mod subscription_service;
pub mod admin_service;
pub mod snapshot_service;

pub use ledger::DedupLedger;
pub use notification_service::{DiscordMessenger, Messenger, Recipient};
pub use dispatch_service::{AlertSink, DeliveryReport, Dispatcher, DryRunSink};
pub use poll_service::{CycleReport, PollService};
pub use subscription_service::{SubscribeOutcome, SubscriptionService, UnsubscribeOutcome};
pub use admin_service::{AdminService, Caller};
pub use snapshot_service::{ImportResult, SnapshotService};
