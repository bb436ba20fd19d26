use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Category;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub user_id: u64,
    pub preferences: BTreeMap<Category, bool>,
    pub created_at: Option<String>,
}

impl Subscriber {
    /// A new subscriber opted into the given categories. An empty list means
    /// every category, matching the plain "subscribe" button.
    pub fn new(user_id: u64, categories: &[Category]) -> Self {
        let wanted: &[Category] = if categories.is_empty() {
            &Category::ALL
        } else {
            categories
        };

        let preferences = Category::ALL
            .iter()
            .map(|c| (*c, wanted.contains(c)))
            .collect();

        Self {
            user_id,
            preferences,
            created_at: None,
        }
    }

    pub fn wants(&self, category: Category) -> bool {
        self.preferences.get(&category).copied().unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelBinding {
    pub category: Category,
    pub channel_id: u64,
}
