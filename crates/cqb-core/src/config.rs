use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.invertironline.com";
const DEFAULT_MARKET: &str = "BCBA";

/// Typed configuration for the bot.
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    pub telegram_allowed_users: Vec<i64>,

    // Brokerage
    pub broker: BrokerConfig,

    // Presentation
    pub cauciones_limit: usize,
}

/// Everything the brokerage adapter needs, passed in explicitly.
#[derive(Clone, Debug)]
pub struct BrokerConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub market: String,
    pub request_timeout: Duration,
    /// Subtracted from the reported token lifetime.
    pub token_safety_margin: Duration,
    /// Used when the login response carries no `expires_in`.
    pub default_token_lifetime: Duration,
}

impl BrokerConfig {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            market: DEFAULT_MARKET.to_string(),
            request_timeout: Duration::from_secs(15),
            token_safety_margin: Duration::from_secs(10),
            default_token_lifetime: Duration::from_secs(600),
        }
    }
}

impl Config {
    /// Load from the process environment, after merging `.env` if present.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map instead of the env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let telegram_bot_token = required(&get, "TELEGRAM_TOKEN")?;
        let telegram_allowed_users = parse_csv_i64(get("TELEGRAM_ALLOWED_USERS"));

        let username = required(&get, "IOL_USER")?;
        let password = required(&get, "IOL_PASS")?;
        let base_url = get("IOL_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let mut broker = BrokerConfig::new(base_url, username, password);
        if let Some(market) = get("IOL_MARKET") {
            broker.market = market.trim().to_string();
        }
        if let Some(secs) = parse_u64(&get, "IOL_TIMEOUT_SECS")? {
            broker.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_u64(&get, "IOL_TOKEN_MARGIN_SECS")? {
            broker.token_safety_margin = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_u64(&get, "IOL_TOKEN_DEFAULT_TTL_SECS")? {
            broker.default_token_lifetime = Duration::from_secs(secs);
        }

        let cauciones_limit = parse_u64(&get, "CAUCIONES_LIMIT")?
            .map(|n| n as usize)
            .unwrap_or(5)
            .max(1);

        Ok(Self {
            telegram_bot_token,
            telegram_allowed_users,
            broker,
            cauciones_limit,
        })
    }
}

fn required(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    get(key).ok_or_else(|| Error::Config(format!("{key} environment variable is required")))
}

fn parse_u64(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    let Some(raw) = get(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got {raw:?}")))
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

        env::set_var(key, unquote(v.trim()));
    }

    tracing::debug!("loaded environment overrides from {}", path.display());
}

fn unquote(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return &val[1..val.len() - 1];
    }
    val
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
