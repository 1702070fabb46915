use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Mail-transfer capability configuration. Endpoint and credentials are
/// opaque to this crate and passed through to the mailer backend.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Mailer backend selector ("recording" for tests/local runs)
    #[serde(default = "default_mail_transport")]
    pub transport: String,
    #[serde(default = "default_mail_endpoint")]
    pub endpoint: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// From address stamped on every outbound message
    #[serde(default = "default_from_address")]
    pub from_address: String,
    /// Recipient for escalations and error notifications
    #[serde(default = "default_admin_address")]
    pub admin_address: String,
}

/// Durable object store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Store backend selector ("memory")
    #[serde(default = "default_store_backend")]
    pub backend: String,
    /// Bucket or namespace identifier keys are scoped under
    #[serde(default = "default_store_namespace")]
    pub namespace: String,
}

fn default_mail_transport() -> String {
    "recording".to_string()
}

fn default_mail_endpoint() -> String {
    "localhost:587".to_string()
}

fn default_from_address() -> String {
    "noreply@example.com".to_string()
}

fn default_admin_address() -> String {
    "admin@example.com".to_string()
}

fn default_store_backend() -> String {
    "memory".to_string()
}

fn default_store_namespace() -> String {
    "notify-ledger".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("mail.transport", "recording")?
            .set_default("mail.endpoint", "localhost:587")?
            .set_default("mail.from_address", "noreply@example.com")?
            .set_default("mail.admin_address", "admin@example.com")?
            .set_default("store.backend", "memory")?
            .set_default("store.namespace", "notify-ledger")?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables
            // MAIL_ENDPOINT, MAIL_USERNAME, STORE_NAMESPACE, etc.
            .add_source(
                Environment::default()
                    .separator("_")
                    .try_parsing(true)
                    .list_separator(","),
            );

        builder.build()?.try_deserialize()
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            transport: default_mail_transport(),
            endpoint: default_mail_endpoint(),
            username: None,
            password: None,
            from_address: default_from_address(),
            admin_address: default_admin_address(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            namespace: default_store_namespace(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mail_defaults() {
        let mail = MailConfig::default();
        assert_eq!(mail.transport, "recording");
        assert_eq!(mail.from_address, "noreply@example.com");
        assert_eq!(mail.admin_address, "admin@example.com");
        assert!(mail.username.is_none());
    }

    #[test]
    fn test_store_defaults() {
        let store = StoreConfig::default();
        assert_eq!(store.backend, "memory");
        assert_eq!(store.namespace, "notify-ledger");
    }
}
