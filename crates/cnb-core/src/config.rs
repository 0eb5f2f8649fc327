use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{errors::Error, Result};

/// Typed configuration, read once at startup and never mutated at runtime.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    /// Numeric user id of the single administrator (string-exact match).
    pub admin_id: String,
    /// Operations group that receives every notification: a numeric chat id
    /// or an `@name`.
    pub group_id: String,
    /// Display name used in startup logging.
    pub bot_name: String,
    pub registry_file: PathBuf,
    pub ingest_listen_addr: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        // Required env vars
        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        let admin_id = env_str("TELEGRAM_ADMIN_ID").unwrap_or_default();
        let group_id = env_str("TELEGRAM_GROUP_ID").unwrap_or_default();

        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }
        if admin_id.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_ADMIN_ID environment variable is required".to_string(),
            ));
        }
        if group_id.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_GROUP_ID environment variable is required".to_string(),
            ));
        }

        let bot_name = env_str("BOT_NAME")
            .and_then(non_empty)
            .unwrap_or_else(|| "customer-notify-bot".to_string());

        let registry_file = PathBuf::from(
            env_str("REGISTRY_FILE").unwrap_or("cnb-registry.json".to_string()),
        );

        let ingest_listen_addr =
            env_str("INGEST_LISTEN_ADDR").unwrap_or("127.0.0.1:8080".to_string());

        Ok(Self {
            telegram_bot_token,
            admin_id: admin_id.trim().to_string(),
            group_id: group_id.trim().to_string(),
            bot_name,
            registry_file,
            ingest_listen_addr,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
