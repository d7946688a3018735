//! Configuration module
//!
//! Service configuration is read from the environment (after loading an
//! optional `.env` file). Every value has a default so the service starts
//! with no configuration at all.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SERVER_PORT: u16 = 3000;
const MAX_FILE_SIZE_MB: u64 = 50;
const MAX_TOTAL_SIZE_MB: u64 = 100;
const CONVERSION_TIMEOUT_SECS: u64 = 120;
const CLEANUP_MAX_AGE_SECS: u64 = 3600;
const CLEANUP_INTERVAL_SECS: u64 = 900;
const RATE_LIMIT_PER_MINUTE: u32 = 30;
const RATE_LIMIT_WINDOW_SECS: u64 = 60;
const TRUSTED_PROXY_COUNT: usize = 1;
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// PDF engines the converter may be pointed at.
pub const ALLOWED_PDF_ENGINES: &[&str] = &[
    "xelatex",
    "lualatex",
    "pdflatex",
    "tectonic",
    "wkhtmltopdf",
    "weasyprint",
    "typst",
];

#[derive(Clone, Debug)]
pub struct PanvertConfig {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    // Staging
    pub upload_dir: PathBuf,
    pub status_dir: PathBuf,
    pub max_file_size_bytes: u64,
    pub max_total_size_bytes: u64,
    // Converter
    pub pandoc_path: String,
    pub pdf_engine: String,
    pub conversion_timeout_secs: u64,
    // Cleanup sweeper
    pub cleanup_max_age_secs: u64,
    pub cleanup_interval_secs: u64,
    // Rate limiting
    pub rate_limit_per_minute: u32,
    pub rate_limit_window_secs: u64,
    pub trusted_proxy_count: usize,
}

impl PanvertConfig {
    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let upload_dir = PathBuf::from(lookup("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string()));
        let status_dir = lookup("STATUS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| upload_dir.join(".jobs"));

        let max_file_size_mb = parse_or(&lookup, "MAX_FILE_SIZE_MB", MAX_FILE_SIZE_MB);
        let max_total_size_mb = parse_or(&lookup, "MAX_TOTAL_SIZE_MB", MAX_TOTAL_SIZE_MB);

        Ok(Self {
            server_port: lookup("PORT")
                .unwrap_or_else(|| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins,
            request_timeout_secs: parse_or(&lookup, "REQUEST_TIMEOUT_SECS", REQUEST_TIMEOUT_SECS),
            upload_dir,
            status_dir,
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            max_total_size_bytes: max_total_size_mb * 1024 * 1024,
            pandoc_path: lookup("PANDOC_PATH").unwrap_or_else(|| "pandoc".to_string()),
            pdf_engine: lookup("PDF_ENGINE")
                .map(|s| s.trim().to_lowercase())
                .unwrap_or_else(|| "xelatex".to_string()),
            conversion_timeout_secs: parse_or(
                &lookup,
                "CONVERSION_TIMEOUT_SECS",
                CONVERSION_TIMEOUT_SECS,
            ),
            cleanup_max_age_secs: parse_or(&lookup, "CLEANUP_MAX_AGE_SECS", CLEANUP_MAX_AGE_SECS),
            cleanup_interval_secs: parse_or(
                &lookup,
                "CLEANUP_INTERVAL_SECS",
                CLEANUP_INTERVAL_SECS,
            ),
            rate_limit_per_minute: parse_or(&lookup, "RATE_LIMIT_PER_MINUTE", RATE_LIMIT_PER_MINUTE),
            rate_limit_window_secs: parse_or(
                &lookup,
                "RATE_LIMIT_WINDOW_SECS",
                RATE_LIMIT_WINDOW_SECS,
            ),
            trusted_proxy_count: parse_or(&lookup, "TRUSTED_PROXY_COUNT", TRUSTED_PROXY_COUNT),
        })
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.max_file_size_bytes == 0 || self.max_total_size_bytes == 0 {
            return Err(anyhow::anyhow!(
                "MAX_FILE_SIZE_MB and MAX_TOTAL_SIZE_MB must be greater than zero"
            ));
        }

        if self.max_total_size_bytes < self.max_file_size_bytes {
            return Err(anyhow::anyhow!(
                "MAX_TOTAL_SIZE_MB must be at least MAX_FILE_SIZE_MB"
            ));
        }

        if !ALLOWED_PDF_ENGINES.contains(&self.pdf_engine.as_str()) {
            return Err(anyhow::anyhow!(
                "PDF_ENGINE '{}' is not supported, expected one of: {}",
                self.pdf_engine,
                ALLOWED_PDF_ENGINES.join(", ")
            ));
        }

        if self.conversion_timeout_secs == 0 {
            return Err(anyhow::anyhow!("CONVERSION_TIMEOUT_SECS must be greater than zero"));
        }

        if self.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("REQUEST_TIMEOUT_SECS must be greater than zero"));
        }

        // Staged `<id>.json` inputs and `<id>.json` status records would collide.
        if self.status_dir == self.upload_dir {
            return Err(anyhow::anyhow!(
                "STATUS_DIR must be different from UPLOAD_DIR"
            ));
        }

        if self.cleanup_interval_secs == 0 {
            return Err(anyhow::anyhow!("CLEANUP_INTERVAL_SECS must be greater than zero"));
        }

        if self.rate_limit_per_minute == 0 || self.rate_limit_window_secs == 0 {
            return Err(anyhow::anyhow!(
                "RATE_LIMIT_PER_MINUTE and RATE_LIMIT_WINDOW_SECS must be greater than zero"
            ));
        }

        if self.pandoc_path.trim().is_empty() {
            return Err(anyhow::anyhow!("PANDOC_PATH cannot be empty"));
        }

        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[derive(Clone, Debug)]
pub struct Config(pub Box<PanvertConfig>);

impl Config {
    fn inner(&self) -> &PanvertConfig {
        &self.0
    }

    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = PanvertConfig::from_lookup(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(Config(Box::new(config)))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = PanvertConfig::from_lookup(lookup)?;
        config.validate()?;
        Ok(Config(Box::new(config)))
    }

    pub fn is_production(&self) -> bool {
        self.inner().is_production()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().server_port
    }

    pub fn environment(&self) -> &str {
        &self.inner().environment
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().cors_origins
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.inner().request_timeout_secs)
    }

    pub fn upload_dir(&self) -> &Path {
        &self.inner().upload_dir
    }

    pub fn status_dir(&self) -> &Path {
        &self.inner().status_dir
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.inner().max_file_size_bytes
    }

    pub fn max_total_size_bytes(&self) -> u64 {
        self.inner().max_total_size_bytes
    }

    pub fn pandoc_path(&self) -> &str {
        &self.inner().pandoc_path
    }

    pub fn pdf_engine(&self) -> &str {
        &self.inner().pdf_engine
    }

    pub fn conversion_timeout(&self) -> Duration {
        Duration::from_secs(self.inner().conversion_timeout_secs)
    }

    pub fn cleanup_max_age(&self) -> Duration {
        Duration::from_secs(self.inner().cleanup_max_age_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.inner().cleanup_interval_secs)
    }

    pub fn rate_limit_per_minute(&self) -> u32 {
        self.inner().rate_limit_per_minute
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.inner().rate_limit_window_secs)
    }

    pub fn trusted_proxy_count(&self) -> usize {
        self.inner().trusted_proxy_count
    }
}
