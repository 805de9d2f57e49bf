use std::{env, time::Duration};

use crate::retry::RetryPolicy;

/// Database and collection ids of the document store. Read-only after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub database_id: String,
    pub orders_collection: String,
    pub order_items_collection: String,
    pub recipient_collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_id: "orders_db".to_string(),
            orders_collection: "orders".to_string(),
            order_items_collection: "order_items".to_string(),
            recipient_collection: "purchase_recipient_info".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres document backend; the in-memory store is used when unset.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub store: StoreConfig,
    pub retry_max_attempts: u32,
    pub retry_delay: Duration,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        let defaults = StoreConfig::default();
        let store = StoreConfig {
            database_id: var_or("DATABASE_ID", &defaults.database_id),
            orders_collection: var_or("ORDERS_TABLE", &defaults.orders_collection),
            order_items_collection: var_or("ORDER_ITEMS_TABLE", &defaults.order_items_collection),
            recipient_collection: var_or("PURCHASE_RECIPIENT_TABLE", &defaults.recipient_collection),
        };

        let retry_max_attempts = match env::var("RETRY_MAX_ATTEMPTS") {
            Ok(v) => v.parse::<u32>()?,
            Err(_) => RetryPolicy::DEFAULT_MAX_ATTEMPTS,
        };
        let retry_delay = match env::var("RETRY_DELAY_MS") {
            Ok(v) => Duration::from_millis(v.parse::<u64>()?),
            Err(_) => RetryPolicy::DEFAULT_DELAY,
        };

        Ok(Self {
            port,
            database_url,
            host,
            store,
            retry_max_attempts,
            retry_delay,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_max_attempts, self.retry_delay)
    }
}
