use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Application-level constants
pub const APP_NAME: &str = "MedASK";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_DATABASE: &str = "medaskai";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Variables without which the server only runs in error mode.
pub const REQUIRED_ENV_VARS: &[&str] = &[
    "MONGODB_URI",
    "GEMINI_API_KEY",
    "SUPABASE_URL",
    "SUPABASE_SERVICE_ROLE_KEY",
];

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "info,medask_lib=debug"
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub supabase_url: String,
    pub supabase_service_role_key: String,
    /// Absent key leaves OCR failing per request instead of at startup.
    pub vision_api_key: Option<String>,
    pub http_timeout_secs: u64,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let missing: Vec<&'static str> = REQUIRED_ENV_VARS
            .iter()
            .copied()
            .filter(|key| get(key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let mongodb_uri = get("MONGODB_URI").unwrap_or_default();
        let mongodb_database = resolve_database(get("MONGODB_DATABASE").as_deref(), &mongodb_uri);

        Ok(Self {
            port: parse_or("PORT", get("PORT"), DEFAULT_PORT)?,
            mongodb_uri,
            mongodb_database,
            gemini_api_key: get("GEMINI_API_KEY").unwrap_or_default(),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            supabase_url: get("SUPABASE_URL")
                .unwrap_or_default()
                .trim_end_matches('/')
                .to_string(),
            supabase_service_role_key: get("SUPABASE_SERVICE_ROLE_KEY").unwrap_or_default(),
            vision_api_key: get("GOOGLE_VISION_API_KEY"),
            http_timeout_secs: parse_or(
                "HTTP_TIMEOUT_SECS",
                get("HTTP_TIMEOUT_SECS"),
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?,
            max_upload_bytes: parse_or(
                "MAX_UPLOAD_BYTES",
                get("MAX_UPLOAD_BYTES"),
                DEFAULT_MAX_UPLOAD_BYTES,
            )?,
        })
    }
}

/// Port lookup for error mode, where the rest of the config is unusable.
pub fn port_from_env() -> u16 {
    env::var("PORT")
        .ok()
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

fn parse_or<T>(key: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: format!("{raw:?}: {e}"),
        }),
    }
}

/// Database to use: an explicit non-blank name, else the one in the URI path,
/// else [`DEFAULT_DATABASE`]. The server and the ingest tool both resolve
/// through here so they agree on where remedies live.
pub fn resolve_database(explicit: Option<&str>, uri: &str) -> String {
    explicit
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .or_else(|| database_from_uri(uri))
        .unwrap_or_else(|| DEFAULT_DATABASE.to_string())
}

/// `mongodb+srv://host/medaskai?retryWrites=true` → `medaskai`.
fn database_from_uri(uri: &str) -> Option<String> {
    let after_scheme = uri.split_once("://")?.1;
    let path = after_scheme.split_once('/')?.1;
    let name = path.split(['?', '/']).next()?;
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn complete() -> Vec<(&'static str, &'static str)> {
        vec![
            ("MONGODB_URI", "mongodb://localhost:27017/remedydb"),
            ("GEMINI_API_KEY", "gem-key"),
            ("SUPABASE_URL", "https://proj.supabase.co/"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service-key"),
        ]
    }

    #[test]
    fn reports_every_missing_variable() {
        let err = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "k")])).unwrap_err();
        match err {
            ConfigError::Missing(vars) => assert_eq!(
                vars,
                vec!["MONGODB_URI", "SUPABASE_URL", "SUPABASE_SERVICE_ROLE_KEY"]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_values_count_as_missing() {
        let mut pairs = complete();
        pairs[1] = ("GEMINI_API_KEY", "   ");
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(v) if v == vec!["GEMINI_API_KEY"]));
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&complete())).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.mongodb_database, "remedydb");
        assert_eq!(config.supabase_url, "https://proj.supabase.co");
        assert!(config.vision_api_key.is_none());
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn invalid_port_names_the_key() {
        let mut pairs = complete();
        pairs.push(("PORT", "eighty"));
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }

    #[test]
    fn database_name_falls_back_to_default() {
        assert_eq!(database_from_uri("mongodb://localhost:27017"), None);
        assert_eq!(database_from_uri("mongodb://localhost:27017/"), None);
        assert_eq!(
            database_from_uri("mongodb+srv://u:p@cluster.net/medaskai?retryWrites=true"),
            Some("medaskai".to_string())
        );
    }

    #[test]
    fn database_resolution_prefers_explicit_then_uri() {
        let uri = "mongodb+srv://u:p@cluster.net/remedydb?retryWrites=true";
        assert_eq!(resolve_database(None, uri), "remedydb");
        assert_eq!(resolve_database(Some("  "), uri), "remedydb");
        assert_eq!(resolve_database(Some("other"), uri), "other");
        assert_eq!(resolve_database(None, "mongodb://localhost:27017"), DEFAULT_DATABASE);
    }

    #[test]
    fn app_name_is_medask() {
        assert_eq!(APP_NAME, "MedASK");
    }
}
