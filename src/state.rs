use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, LogMailer, Mailer};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub mailer: Arc<dyn Mailer>,

    pub auth: Arc<AuthService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let mailer: Arc<dyn Mailer> =
            Arc::new(LogMailer::new(config.email.from_address.clone()));
        Self::with_mailer(config, mailer).await
    }

    /// Build state around a caller-provided mail backend.
    pub async fn with_mailer(config: Config, mailer: Arc<dyn Mailer>) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let auth = Arc::new(AuthService::new(
            store.clone(),
            mailer.clone(),
            config.security.clone(),
        ));

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            mailer,
            auth,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
