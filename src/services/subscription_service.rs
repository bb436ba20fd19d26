use tracing::info;

use crate::domain::{Category, Subscriber};
use crate::errors::AlertResult;
use crate::storage::traits::SubscriberRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Subscribed,
    AlreadySubscribed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsubscribeOutcome {
    Unsubscribed,
    NotSubscribed,
}

/// Opt-in, opt-out and preference toggles; open to any caller.
pub struct SubscriptionService<R: SubscriberRepository> {
    repository: R,
}

impl<R: SubscriberRepository> SubscriptionService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Opt a user in. Repeating the call changes nothing.
    pub fn subscribe(&self, user_id: u64, categories: &[Category]) -> AlertResult<SubscribeOutcome> {
        let subscriber = Subscriber::new(user_id, categories);

        if self.repository.add(&subscriber)? {
            info!(user_id, "subscriber added");
            Ok(SubscribeOutcome::Subscribed)
        } else {
            Ok(SubscribeOutcome::AlreadySubscribed)
        }
    }

    pub fn unsubscribe(&self, user_id: u64) -> AlertResult<UnsubscribeOutcome> {
        if self.repository.remove(user_id)? {
            info!(user_id, "subscriber removed");
            Ok(UnsubscribeOutcome::Unsubscribed)
        } else {
            Ok(UnsubscribeOutcome::NotSubscribed)
        }
    }

    /// Toggle one category for an existing subscriber
    pub fn set_preference(&self, user_id: u64, category: Category, enabled: bool) -> AlertResult<Subscriber> {
        self.repository.set_preference(user_id, category, enabled)?;

        self.repository
            .get(user_id)?
            .ok_or(crate::errors::AlertError::SubscriberNotFound(user_id))
    }

    pub fn get(&self, user_id: u64) -> AlertResult<Option<Subscriber>> {
        self.repository.get(user_id)
    }

    pub fn list(&self) -> AlertResult<Vec<Subscriber>> {
        self.repository.get_all()
    }
}
