pub mod source;
pub mod entry;
pub mod subscriber;
pub mod location;
pub mod notification;

pub use source::{Category, Source};
pub use entry::FeedEntry;
pub use subscriber::{ChannelBinding, Subscriber};
pub use location::{extract_location, Coordinates, Location, AREA_PLACEHOLDER};
pub use notification::NotificationPayload;
