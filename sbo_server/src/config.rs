use std::{env, path::PathBuf, time::Duration};

use dochost_tools::DocumentHostConfig;
use log::*;
use sagex3_tools::SageX3Config;
use sbo_common::Secret;

const DEFAULT_SBO_HOST: &str = "127.0.0.1";
const DEFAULT_SBO_PORT: u16 = 8360;
const DEFAULT_REGISTRATION_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_REGISTRATION_BATCH: i64 = 20;
const DEFAULT_EXPORT_DIR: &str = "./exports";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If set, requests against `/api` must carry this key in the `sbo-api-key` header. When unset, the API is open
    /// and a warning is logged on startup.
    pub api_key: Option<Secret<String>>,
    /// How often the registration worker scans for new transactions to send to Sage X3.
    pub registration_interval: Duration,
    /// The maximum number of transactions the worker registers per run.
    pub registration_batch: i64,
    /// The directory split exports are written into.
    pub export_dir: PathBuf,
    /// Sage X3 web service configuration
    pub sage_config: SageX3Config,
    /// Document host configuration
    pub dochost_config: DocumentHostConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SBO_HOST.to_string(),
            port: DEFAULT_SBO_PORT,
            database_url: String::default(),
            api_key: None,
            registration_interval: DEFAULT_REGISTRATION_INTERVAL,
            registration_batch: DEFAULT_REGISTRATION_BATCH,
            export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
            sage_config: SageX3Config::default(),
            dochost_config: DocumentHostConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SBO_HOST").ok().unwrap_or_else(|| DEFAULT_SBO_HOST.into());
        let port = env::var("SBO_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SBO_PORT. {e} Using the default, {DEFAULT_SBO_PORT}, instead."
                    );
                    DEFAULT_SBO_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SBO_PORT);
        let database_url = env::var("SBO_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ SBO_DATABASE_URL is not set. Please set it to the URL for the back-office database.");
            String::default()
        });
        let api_key = match env::var("SBO_API_KEY") {
            Ok(key) if !key.is_empty() => Some(Secret::new(key)),
            _ => {
                warn!("🪛️ SBO_API_KEY is not set. The /api endpoints will accept unauthenticated requests.");
                None
            },
        };
        let registration_interval = env::var("SBO_REGISTRATION_INTERVAL")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| {
                        error!("🪛️ {s} is not a valid value for SBO_REGISTRATION_INTERVAL. {e} Using the default.");
                    })
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REGISTRATION_INTERVAL);
        let registration_batch = env::var("SBO_REGISTRATION_BATCH")
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| {
                        error!("🪛️ {s} is not a valid value for SBO_REGISTRATION_BATCH. {e} Using the default.");
                    })
                    .ok()
            })
            .unwrap_or(DEFAULT_REGISTRATION_BATCH);
        let export_dir =
            env::var("SBO_EXPORT_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(DEFAULT_EXPORT_DIR));
        let sage_config = SageX3Config::new_from_env_or_default();
        let dochost_config = DocumentHostConfig::new_from_env_or_default();
        Self {
            host,
            port,
            database_url,
            api_key,
            registration_interval,
            registration_batch,
            export_dir,
            sage_config,
            dochost_config,
        }
    }
}
