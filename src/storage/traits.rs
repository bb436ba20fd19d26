use crate::domain::{Category, ChannelBinding, Subscriber};
use crate::errors::AlertResult;

#[cfg_attr(test, mockall::automock)]
pub trait SubscriberRepository: Send + Sync {
    /// Insert a subscriber; returns false when the user is already stored
    fn add(&self, subscriber: &Subscriber) -> AlertResult<bool>;
    /// Delete a subscriber; returns false when the user was not stored
    fn remove(&self, user_id: u64) -> AlertResult<bool>;
    fn get(&self, user_id: u64) -> AlertResult<Option<Subscriber>>;
    fn get_all(&self) -> AlertResult<Vec<Subscriber>>;
    fn set_preference(&self, user_id: u64, category: Category, enabled: bool) -> AlertResult<()>;
    /// User ids whose preference for `category` is enabled
    fn subscribed_to(&self, category: Category) -> AlertResult<Vec<u64>>;
}

#[cfg_attr(test, mockall::automock)]
pub trait ChannelBindingRepository: Send + Sync {
    fn set(&self, category: Category, channel_id: u64) -> AlertResult<()>;
    /// Returns false when no binding existed
    fn remove(&self, category: Category) -> AlertResult<bool>;
    fn get(&self, category: Category) -> AlertResult<Option<u64>>;
    fn get_all(&self) -> AlertResult<Vec<ChannelBinding>>;
}
