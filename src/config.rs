use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;

const DEFAULT_PORT: u16 = 47113;
const DEFAULT_API_VERSION: &str = "v61.0";
const DEFAULT_REFRESH_MIN_INTERVAL_SECS: u64 = 5;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Helper server configuration, sourced from the environment. The host
/// extension launches the binary with these variables set; the secret and
/// the org credentials have no defaults on purpose.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub secret: String,
    pub workspace_root: PathBuf,
    pub instance_url: String,
    pub access_token: String,
    pub org_id: String,
    pub api_version: String,
    pub refresh_min_interval_secs: u64,
    pub poll_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Ok(Self {
            port: parsed_or("SFNAV_PORT", DEFAULT_PORT),
            secret: required("SFNAV_SECRET")?,
            workspace_root: PathBuf::from(required("SFNAV_WORKSPACE")?),
            instance_url: required("SFNAV_INSTANCE_URL")?,
            access_token: required("SFNAV_ACCESS_TOKEN")?,
            org_id: required("SFNAV_ORG_ID")?,
            api_version: std::env::var("SFNAV_API_VERSION")
                .unwrap_or_else(|_| DEFAULT_API_VERSION.to_string()),
            refresh_min_interval_secs: parsed_or(
                "SFNAV_REFRESH_INTERVAL",
                DEFAULT_REFRESH_MIN_INTERVAL_SECS,
            ),
            poll_interval_secs: parsed_or("SFNAV_POLL_INTERVAL", DEFAULT_POLL_INTERVAL_SECS),
        })
    }
}

fn required(key: &'static str) -> Result<String, Error> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::Config(key)),
    }
}

// Runs before logging is up, so fall back to stderr for bad values.
fn parsed_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                eprintln!("Warning: invalid {key} '{raw}', using the default");
                default
            }
        },
        Err(_) => default,
    }
}
