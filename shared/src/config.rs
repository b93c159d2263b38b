use std::collections::HashMap;
use thiserror::Error;

const DEFAULT_TABLE: &str = "todos";
const DEFAULT_USER_INDEX: &str = "TodosByUserIndex";
const DEFAULT_URL_EXPIRATION_SECS: u64 = 300;
const DEFAULT_LOCAL_ENDPOINT: &str = "http://localhost:8000";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} must be a positive number of seconds, got {value:?}")]
    InvalidExpiration { name: &'static str, value: String },
}

/// Settings read from the Lambda environment at cold start.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub todos_table: String,
    pub todos_by_user_index: String,
    pub attachments_bucket: String,
    pub signed_url_expiration: u64,
    pub is_offline: bool,
    pub local_endpoint: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| vars.get(name).filter(|v| !v.is_empty()).cloned();

        let attachments_bucket =
            get("ATTACHMENTS_S3_BUCKET").ok_or(ConfigError::Missing("ATTACHMENTS_S3_BUCKET"))?;

        let signed_url_expiration = match get("SIGNED_URL_EXPIRATION") {
            None => DEFAULT_URL_EXPIRATION_SECS,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::InvalidExpiration {
                        name: "SIGNED_URL_EXPIRATION",
                        value: raw,
                    })
                }
            },
        };

        let is_offline = get("IS_OFFLINE")
            .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "false" | "0"))
            .unwrap_or(false);

        Ok(Self {
            todos_table: get("TODOS_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            todos_by_user_index: get("TODOS_BY_USER_INDEX")
                .unwrap_or_else(|| DEFAULT_USER_INDEX.to_string()),
            attachments_bucket,
            signed_url_expiration,
            is_offline,
            local_endpoint: get("DYNAMODB_LOCAL_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_LOCAL_ENDPOINT.to_string()),
        })
    }
}
