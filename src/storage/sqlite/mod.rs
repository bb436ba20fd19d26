mod connection;
mod subscriber_repository;
mod channel_binding_repository;

pub use connection::SqliteStorage;
pub use subscriber_repository::SqliteSubscriberRepository;
pub use channel_binding_repository::SqliteChannelBindingRepository;
