use dotenvy::dotenv;
use std::env;

pub const DEFAULT_WOMPI_API_URL: &str = "https://sandbox.wompi.co/v1";
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: Option<String>,
    pub wompi_api_url: String,
    pub wompi_public_key: String,
    pub wompi_private_key: String,
    pub wompi_integrity_secret: Option<String>,
    pub wompi_events_secret: Option<String>,
    pub frontend_url: String,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        let config = Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            database_url: optional_var("DATABASE_URL"),
            wompi_api_url: optional_var("WOMPI_API_URL")
                .unwrap_or_else(|| DEFAULT_WOMPI_API_URL.to_string()),
            wompi_public_key: required_var("WOMPI_PUBLIC_KEY")?,
            wompi_private_key: required_var("WOMPI_PRIVATE_KEY")?,
            wompi_integrity_secret: optional_var("WOMPI_INTEGRITY_SECRET"),
            wompi_events_secret: optional_var("WOMPI_EVENTS_SECRET"),
            frontend_url: optional_var("FRONTEND_URL")
                .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
            log_format: parse_log_format(&env::var("LOG_FORMAT").unwrap_or_default())?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Key used to verify inbound webhook checksums.
    pub fn webhook_secret(&self) -> Option<&str> {
        self.wompi_events_secret
            .as_deref()
            .or(self.wompi_integrity_secret.as_deref())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server_port == 0 {
            anyhow::bail!("SERVER_PORT must be greater than 0");
        }
        if self.wompi_public_key.trim().is_empty() {
            anyhow::bail!("WOMPI_PUBLIC_KEY is empty");
        }
        if self.wompi_private_key.trim().is_empty() {
            anyhow::bail!("WOMPI_PRIVATE_KEY is empty");
        }

        url::Url::parse(&self.wompi_api_url)
            .map_err(|e| anyhow::anyhow!("WOMPI_API_URL is not a valid URL: {}", e))?;
        url::Url::parse(&self.frontend_url)
            .map_err(|e| anyhow::anyhow!("FRONTEND_URL is not a valid URL: {}", e))?;

        Ok(())
    }
}

fn required_var(name: &str) -> anyhow::Result<String> {
    optional_var(name).ok_or_else(|| anyhow::anyhow!("{} must be set", name))
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_log_format(raw: &str) -> anyhow::Result<LogFormat> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "text" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        other => anyhow::bail!("LOG_FORMAT must be 'text' or 'json', got '{}'", other),
    }
}

#[cfg(test)]
pub(crate) fn test_config(api_url: &str) -> Config {
    Config {
        server_port: 3000,
        database_url: None,
        wompi_api_url: api_url.to_string(),
        wompi_public_key: "pub_test_merchant".to_string(),
        wompi_private_key: "prv_test_key".to_string(),
        wompi_integrity_secret: Some("test_integrity_secret".to_string()),
        wompi_events_secret: Some("test_events_secret".to_string()),
        frontend_url: "https://shop.example.com".to_string(),
        log_format: LogFormat::Text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_secret_prefers_events_secret() {
        let config = test_config("https://sandbox.wompi.co/v1");
        assert_eq!(config.webhook_secret(), Some("test_events_secret"));
    }

    #[test]
    fn test_webhook_secret_falls_back_to_integrity_secret() {
        let mut config = test_config("https://sandbox.wompi.co/v1");
        config.wompi_events_secret = None;
        assert_eq!(config.webhook_secret(), Some("test_integrity_secret"));

        config.wompi_integrity_secret = None;
        assert_eq!(config.webhook_secret(), None);
    }

    #[test]
    fn test_validate_rejects_bad_api_url() {
        let mut config = test_config("https://sandbox.wompi.co/v1");
        config.wompi_api_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_private_key() {
        let mut config = test_config("https://sandbox.wompi.co/v1");
        config.wompi_private_key = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_log_format() {
        assert_eq!(parse_log_format("").unwrap(), LogFormat::Text);
        assert_eq!(parse_log_format("JSON").unwrap(), LogFormat::Json);
        assert!(parse_log_format("xml").is_err());
    }
}
