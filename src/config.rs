// Configuration for the gateway console
//
// Configuration is loaded in order of precedence:
// 1. Command-line flags (highest priority, applied in main)
// 2. Environment variables
// 3. Config file (~/.config/gwcon/config.toml)
// 4. Built-in defaults (lowest priority)

use serde::Deserialize;
use std::path::PathBuf;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log file rotation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRotation {
    Hourly,
    Daily,
    Never,
}

impl LogRotation {
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "hourly" => LogRotation::Hourly,
            "never" => LogRotation::Never,
            _ => LogRotation::Daily,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Also write JSON logs to rotating files
    pub file_enabled: bool,
    pub file_dir: PathBuf,
    pub file_prefix: String,
    pub file_rotation: LogRotation,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_enabled: false,
            file_dir: PathBuf::from("./logs"),
            file_prefix: "gwcon".to_string(),
            file_rotation: LogRotation::Daily,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the gateway's administrative REST API
    pub base_url: String,

    /// Credentials attached to every request
    pub username: String,
    pub password: String,

    /// Theme name: "auto", "dracula", "nord", "gruvbox"
    pub theme: String,

    /// Client-side ceiling for multipart uploads
    pub max_upload_bytes: u64,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
struct FileLogging {
    level: Option<String>,
    file_enabled: Option<bool>,
    file_dir: Option<String>,
    file_prefix: Option<String>,
    file_rotation: Option<String>,
}

/// Config file structure (subset of Config that makes sense to persist)
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    base_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    theme: Option<String>,
    max_upload_mb: Option<u64>,

    /// Optional [logging] section
    logging: Option<FileLogging>,
}

impl Config {
    /// Get the config file path: ~/.config/gwcon/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("gwcon").join("config.toml"))
    }

    /// Create config template if it doesn't exist
    /// Called during startup to help users discover configuration options
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        // Don't overwrite existing config
        if path.exists() {
            return;
        }

        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // Silently fail - config is optional
            }
        }

        let template = r#"# gwcon configuration
# Uncomment and modify options as needed

# Base URL of the gateway's administrative REST API
# base_url = "http://localhost:8080"

# Credentials attached to every request
# username = "admin"
# password = ""

# Theme: auto, dracula, nord, gruvbox
# theme = "auto"

# Client-side ceiling for multipart uploads, in megabytes
# max_upload_mb = 50

# Logging configuration (RUST_LOG env var overrides the level)
# [logging]
# level = "info"          # trace, debug, info, warn, error
# file_enabled = false    # also write JSON logs to rotating files
# file_dir = "./logs"
# file_prefix = "gwcon"
# file_rotation = "daily" # hourly, daily, never
"#;

        // Write template (ignore errors - config is optional)
        let _ = std::fs::write(&path, template);
    }

    /// Load file config if it exists
    fn load_file_config() -> FileConfig {
        let Some(path) = Self::config_path() else {
            return FileConfig::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse {}: {}", path.display(), e);
                FileConfig::default()
            }),
            Err(_) => FileConfig::default(), // File doesn't exist, use defaults
        }
    }

    /// Serialize config to TOML string (single source of truth for format)
    pub fn to_toml(&self) -> String {
        format!(
            r#"# gwcon configuration

# Base URL of the gateway's administrative REST API
base_url = "{base_url}"

# Credentials attached to every request
username = "{username}"
password = "{password}"

# Theme: auto, dracula, nord, gruvbox
theme = "{theme}"

# Client-side ceiling for multipart uploads, in megabytes
max_upload_mb = {max_upload_mb}

# Logging configuration (RUST_LOG env var overrides the level)
[logging]
level = "{log_level}"
file_enabled = {file_enabled}
file_dir = "{file_dir}"
file_prefix = "{file_prefix}"
file_rotation = "{file_rotation}"
"#,
            base_url = self.base_url,
            username = self.username,
            password = self.password,
            theme = self.theme,
            max_upload_mb = self.max_upload_bytes / (1024 * 1024),
            log_level = self.logging.level,
            file_enabled = self.logging.file_enabled,
            file_dir = self.logging.file_dir.display(),
            file_prefix = self.logging.file_prefix,
            file_rotation = match self.logging.file_rotation {
                LogRotation::Hourly => "hourly",
                LogRotation::Daily => "daily",
                LogRotation::Never => "never",
            },
        )
    }

    /// Save current configuration to file
    pub fn save(&self) -> Result<(), std::io::Error> {
        let Some(path) = Self::config_path() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config path",
            ));
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, self.to_toml())
    }

    /// Load configuration: file -> env vars -> defaults
    pub fn from_env() -> Self {
        let file = Self::load_file_config();

        // Gateway URL: env > file > default
        let base_url = std::env::var("GWCON_URL")
            .ok()
            .or(file.base_url)
            .unwrap_or_else(|| "http://localhost:8080".to_string());

        // Credentials: env > file > default
        let username = std::env::var("GWCON_USER")
            .ok()
            .or(file.username)
            .unwrap_or_else(|| "admin".to_string());

        let password = std::env::var("GWCON_PASSWORD")
            .ok()
            .or(file.password)
            .unwrap_or_default();

        // Theme: env > file > default
        let theme = std::env::var("GWCON_THEME")
            .ok()
            .or(file.theme)
            .unwrap_or_else(|| "auto".to_string());

        // Upload ceiling: env > file > default
        let max_upload_mb = std::env::var("GWCON_MAX_UPLOAD_MB")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(file.max_upload_mb)
            .unwrap_or(crate::rest::upload::DEFAULT_MAX_UPLOAD_BYTES / (1024 * 1024));

        // Logging settings: file config only (RUST_LOG handled in main)
        let file_logging = file.logging.unwrap_or_default();
        let defaults = LoggingConfig::default();
        let logging = LoggingConfig {
            level: file_logging.level.unwrap_or(defaults.level),
            file_enabled: file_logging.file_enabled.unwrap_or(defaults.file_enabled),
            file_dir: file_logging
                .file_dir
                .map(PathBuf::from)
                .unwrap_or(defaults.file_dir),
            file_prefix: file_logging.file_prefix.unwrap_or(defaults.file_prefix),
            file_rotation: file_logging
                .file_rotation
                .map(|v| LogRotation::parse(&v))
                .unwrap_or(defaults.file_rotation),
        };

        Self {
            base_url,
            username,
            password,
            theme,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            logging,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            username: "admin".to_string(),
            password: String::new(),
            theme: "auto".to_string(),
            max_upload_bytes: crate::rest::upload::DEFAULT_MAX_UPLOAD_BYTES,
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_parsing_defaults_to_daily() {
        assert_eq!(LogRotation::parse("hourly"), LogRotation::Hourly);
        assert_eq!(LogRotation::parse("NEVER"), LogRotation::Never);
        assert_eq!(LogRotation::parse("weekly"), LogRotation::Daily);
    }

    #[test]
    fn test_to_toml_round_trips_through_the_file_shape() {
        let config = Config::default();
        let parsed: FileConfig = toml::from_str(&config.to_toml()).unwrap();
        assert_eq!(parsed.base_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(parsed.max_upload_mb, Some(50));
        assert_eq!(
            parsed.logging.unwrap().level.as_deref(),
            Some("info")
        );
    }
}
