pub mod traits;
pub mod sqlite;

pub use traits::{ChannelBindingRepository, SubscriberRepository};
pub use sqlite::{SqliteChannelBindingRepository, SqliteStorage, SqliteSubscriberRepository};
