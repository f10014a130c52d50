use std::sync::Arc;

use crate::auth::repo::UserDirectory;
use crate::config::{AppConfig, JwtConfig};
use crate::donations::tracker::DonationTracker;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<UserDirectory>,
    pub tracker: Arc<DonationTracker>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            users: Arc::new(UserDirectory::new()),
            tracker: Arc::new(DonationTracker::new()),
        }
    }

    /// Empty state with a fixed JWT config, for tests.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test".into(),
                audience: "test".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
        });
        Self::from_config(config)
    }
}
