use tracing::info;

use crate::config::Config;
use crate::domain::{Category, ChannelBinding};
use crate::errors::{AlertError, AlertResult};
use crate::storage::traits::ChannelBindingRepository;

/// Identity of whoever triggered an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: u64,
    pub is_admin: bool,
}

impl Caller {
    pub fn from_config(user_id: u64, config: &Config) -> Self {
        Self {
            user_id,
            is_admin: config.is_admin(user_id),
        }
    }
}

/// Privileged channel configuration
pub struct AdminService<B: ChannelBindingRepository> {
    bindings: B,
}

impl<B: ChannelBindingRepository> AdminService<B> {
    pub fn new(bindings: B) -> Self {
        Self { bindings }
    }

    fn authorize(caller: &Caller, action: &str) -> AlertResult<()> {
        if caller.is_admin {
            return Ok(());
        }

        info!(user_id = caller.user_id, action, "rejected non-admin action");
        Err(AlertError::Unauthorized(format!(
            "{} requires administrator rights",
            action
        )))
    }

    /// Route a category's alerts to a channel, replacing any previous binding
    pub fn bind_channel(&self, caller: &Caller, category: Category, channel_id: u64) -> AlertResult<()> {
        Self::authorize(caller, "bind")?;

        self.bindings.set(category, channel_id)?;
        info!(user_id = caller.user_id, %category, channel_id, "channel bound");
        Ok(())
    }

    /// Returns false when the category had no binding
    pub fn unbind_channel(&self, caller: &Caller, category: Category) -> AlertResult<bool> {
        Self::authorize(caller, "unbind")?;

        let removed = self.bindings.remove(category)?;
        if removed {
            info!(user_id = caller.user_id, %category, "channel unbound");
        }
        Ok(removed)
    }

    pub fn bindings(&self) -> AlertResult<Vec<ChannelBinding>> {
        self.bindings.get_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sqlite::{SqliteChannelBindingRepository, SqliteStorage};
    use crate::storage::traits::MockChannelBindingRepository;

    const ADMIN: Caller = Caller {
        user_id: 1,
        is_admin: true,
    };
    const MEMBER: Caller = Caller {
        user_id: 2,
        is_admin: false,
    };

    fn setup() -> AdminService<SqliteChannelBindingRepository> {
        let storage = SqliteStorage::in_memory().unwrap();
        AdminService::new(SqliteChannelBindingRepository::new(storage))
    }

    #[test]
    fn test_admin_can_bind_and_unbind() {
        let service = setup();

        service.bind_channel(&ADMIN, Category::Global, 500).unwrap();
        assert_eq!(
            service.bindings().unwrap(),
            vec![ChannelBinding {
                category: Category::Global,
                channel_id: 500
            }]
        );

        assert!(service.unbind_channel(&ADMIN, Category::Global).unwrap());
        assert!(!service.unbind_channel(&ADMIN, Category::Global).unwrap());
    }

    #[test]
    fn test_non_admin_is_rejected_without_touching_storage() {
        // No expectations: any storage call would panic
        let service = AdminService::new(MockChannelBindingRepository::new());

        assert!(matches!(
            service.bind_channel(&MEMBER, Category::Regional, 10),
            Err(AlertError::Unauthorized(_))
        ));
        assert!(matches!(
            service.unbind_channel(&MEMBER, Category::Regional),
            Err(AlertError::Unauthorized(_))
        ));
    }
}
