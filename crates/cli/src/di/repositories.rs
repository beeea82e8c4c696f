use sinkhole_domain::Config;
use sinkhole_infrastructure::dns::InMemoryClientSettings;
use sinkhole_infrastructure::repositories::SqliteQueryLogRepository;
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct Repositories {
    pub query_log: Arc<SqliteQueryLogRepository>,
    pub client_settings: Arc<InMemoryClientSettings>,
}

impl Repositories {
    pub fn new(config: &Config, pool: SqlitePool) -> Self {
        Self {
            query_log: Arc::new(SqliteQueryLogRepository::new(pool)),
            client_settings: Arc::new(InMemoryClientSettings::new(
                &config.blocking.bypass_clients,
            )),
        }
    }
}
