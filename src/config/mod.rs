use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub stripe: StripeConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StripeConfig {
    pub secret_key: Option<String>,
    pub webhook_secret: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            webhook_secret: None,
            enabled: false,
            currency: default_currency(),
        }
    }
}

fn default_currency() -> String {
    "usd".to_string()
}

/// Admin API access. When no token is configured every admin request is
/// rejected.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AdminConfig {
    pub api_token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    #[serde(default = "default_true")]
    pub log_enabled: bool,
    pub smtp: Option<SmtpConfig>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            log_enabled: true,
            smtp: None,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.base_url", "http://localhost:8080")?
            .set_default("database.url", "sqlite://cleanpro.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("stripe.enabled", false)?
            .set_default("stripe.currency", "usd")?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Add environment variables (with CLEANPRO__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("CLEANPRO").separator("__"))

            .build()?;

        config.try_deserialize()
    }

    /// Stripe credentials, present only when payments are switched on and
    /// both keys are set.
    pub fn stripe_credentials(&self) -> Option<(String, String)> {
        if !self.stripe.enabled {
            return None;
        }
        match (&self.stripe.secret_key, &self.stripe.webhook_secret) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Some((key.clone(), secret.clone()))
            }
            _ => None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                base_url: "http://localhost:8080".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://cleanpro.db?mode=rwc".to_string(),
                max_connections: 10,
            },
            stripe: StripeConfig::default(),
            admin: AdminConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stripe_credentials_require_enabled_flag_and_both_keys() {
        let mut settings = Settings::default();
        assert!(settings.stripe_credentials().is_none());

        settings.stripe.secret_key = Some("sk_test_123".to_string());
        settings.stripe.webhook_secret = Some("whsec_123".to_string());
        assert!(settings.stripe_credentials().is_none());

        settings.stripe.enabled = true;
        assert_eq!(
            settings.stripe_credentials(),
            Some(("sk_test_123".to_string(), "whsec_123".to_string()))
        );

        settings.stripe.webhook_secret = Some(String::new());
        assert!(settings.stripe_credentials().is_none());
    }
}
