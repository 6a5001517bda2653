//! Configuration management
//!
//! Configuration is read from an optional `config.yml` file and then
//! overridden by `ADRIA_*` environment variables. Every section is optional;
//! missing values fall back to defaults suitable for local development.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Token and password-reset configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Default admin account created at bootstrap
    #[serde(default)]
    pub seed: SeedConfig,
    /// Outgoing mail (password reset links)
    #[serde(default)]
    pub smtp: SmtpConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (credentials are allowed, so this cannot be `*`)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Upper bound on pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Log every executed statement at DEBUG level
    #[serde(default)]
    pub echo: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
            max_connections: default_max_connections(),
            echo: false,
        }
    }
}

fn default_database_url() -> String {
    "data/adria.db".to_string()
}

fn default_max_connections() -> u32 {
    10
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing tokens. Generated per process when unset.
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// Token and cookie lifetime in days
    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: i64,
    /// Mark the token cookie `Secure` (HTTPS deployments)
    #[serde(default)]
    pub cookie_secure: bool,
    /// Password reset token lifetime in minutes
    #[serde(default = "default_reset_token_ttl_minutes")]
    pub reset_token_ttl_minutes: i64,
    /// Echo the reset link in the forgot-password response. Development only.
    #[serde(default)]
    pub expose_reset_link: bool,
    /// Front-end page that receives `?token=...`
    #[serde(default = "default_reset_url_base")]
    pub reset_url_base: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_days: default_token_ttl_days(),
            cookie_secure: false,
            reset_token_ttl_minutes: default_reset_token_ttl_minutes(),
            expose_reset_link: false,
            reset_url_base: default_reset_url_base(),
        }
    }
}

/// Upper bound for `auth.token_ttl_days`
pub const MAX_TOKEN_TTL_DAYS: i64 = 365;

/// Upper bound for `auth.reset_token_ttl_minutes` (one day)
pub const MAX_RESET_TOKEN_TTL_MINUTES: i64 = 24 * 60;

fn default_token_ttl_days() -> i64 {
    30
}

fn default_reset_token_ttl_minutes() -> i64 {
    60
}

fn default_reset_url_base() -> String {
    "http://localhost:3000/reset-password.html".to_string()
}

/// Bootstrap account configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
    #[serde(default = "default_admin_password")]
    pub admin_password: String,
    /// Insert the sample articles when the blog is empty
    #[serde(default = "default_true")]
    pub sample_articles: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            admin_email: default_admin_email(),
            admin_password: default_admin_password(),
            sample_articles: true,
        }
    }
}

fn default_admin_email() -> String {
    "admin@adriastyle.com".to_string()
}

fn default_admin_password() -> String {
    "Admin123!".to_string()
}

fn default_true() -> bool {
    true
}

/// SMTP configuration. Mail is disabled while `host` is unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_smtp_from")]
    pub from: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            from: default_smtp_from(),
        }
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_from() -> String {
    "Adria Style Studio <no-reply@adriastyle.com>".to_string()
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

impl Config {
    /// Load configuration from file.
    ///
    /// A missing or empty file yields the defaults; invalid YAML is an error
    /// carrying the line and column.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: format_yaml_error(&e),
        })?;

        Ok(config)
    }

    /// Load configuration from file, then apply environment overrides.
    ///
    /// Recognised variables: `DATABASE_URL` and every `ADRIA_<SECTION>_<KEY>`
    /// matching a field above, e.g. `ADRIA_SERVER_PORT`,
    /// `ADRIA_DATABASE_MAX_CONNECTIONS`, `ADRIA_AUTH_JWT_SECRET`,
    /// `ADRIA_SMTP_HOST`.
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break token issuing at runtime
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range(
            "auth.token_ttl_days",
            self.auth.token_ttl_days,
            MAX_TOKEN_TTL_DAYS,
        )?;
        check_range(
            "auth.reset_token_ttl_minutes",
            self.auth.reset_token_ttl_minutes,
            MAX_RESET_TOKEN_TTL_MINUTES,
        )?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        // Server
        if let Ok(host) = std::env::var("ADRIA_SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_parse::<u16>("ADRIA_SERVER_PORT") {
            self.server.port = port;
        }
        if let Ok(cors_origin) = std::env::var("ADRIA_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        // Database
        if let Ok(driver) = std::env::var("ADRIA_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {}
            }
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(url) = std::env::var("ADRIA_DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(max) = env_parse::<u32>("ADRIA_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = max;
        }
        if let Some(echo) = env_flag("ADRIA_DATABASE_ECHO") {
            self.database.echo = echo;
        }

        // Auth
        if let Ok(secret) = std::env::var("ADRIA_AUTH_JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
        if let Some(days) = env_parse::<i64>("ADRIA_AUTH_TOKEN_TTL_DAYS") {
            self.auth.token_ttl_days = days;
        }
        if let Some(minutes) = env_parse::<i64>("ADRIA_AUTH_RESET_TOKEN_TTL_MINUTES") {
            self.auth.reset_token_ttl_minutes = minutes;
        }
        if let Some(secure) = env_flag("ADRIA_AUTH_COOKIE_SECURE") {
            self.auth.cookie_secure = secure;
        }
        if let Some(expose) = env_flag("ADRIA_AUTH_EXPOSE_RESET_LINK") {
            self.auth.expose_reset_link = expose;
        }
        if let Ok(base) = std::env::var("ADRIA_AUTH_RESET_URL_BASE") {
            self.auth.reset_url_base = base;
        }

        // Seed
        if let Ok(email) = std::env::var("ADRIA_SEED_ADMIN_EMAIL") {
            self.seed.admin_email = email;
        }
        if let Ok(password) = std::env::var("ADRIA_SEED_ADMIN_PASSWORD") {
            self.seed.admin_password = password;
        }

        // SMTP
        if let Ok(host) = std::env::var("ADRIA_SMTP_HOST") {
            self.smtp.host = Some(host);
        }
        if let Some(port) = env_parse::<u16>("ADRIA_SMTP_PORT") {
            self.smtp.port = port;
        }
        if let Ok(username) = std::env::var("ADRIA_SMTP_USERNAME") {
            self.smtp.username = username;
        }
        if let Ok(password) = std::env::var("ADRIA_SMTP_PASSWORD") {
            self.smtp.password = password;
        }
        if let Ok(from) = std::env::var("ADRIA_SMTP_FROM") {
            self.smtp.from = from;
        }
    }
}

fn check_range(field: &'static str, value: i64, max: i64) -> Result<(), ConfigError> {
    if !(1..=max).contains(&value) {
        return Err(ConfigError::InvalidValue {
            field,
            message: format!("{} is outside 1..={}", value, max),
        });
    }
    Ok(())
}

/// Parse an environment variable, ignoring it when unset or malformed
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Config tests mutate process-wide environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
