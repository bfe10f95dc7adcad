use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub registration: RegistrationMode,
    pub max_upload_size: usize,
    pub reset_token_ttl_mins: i64,
    pub direct_reset: bool,
    pub log_level: String,
    pub converter: ConverterConfig,
    pub storage: StorageConfig,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct ConverterConfig {
    pub binary: PathBuf,
    pub timeout: Duration,
    pub work_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub download_ttl: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    S3 { bucket: String },
    Memory,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationMode {
    Open,
    Closed,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("PDFCONV_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid PDFCONV_HOST: {e}"))?;

        let port: u16 = env_or("PDFCONV_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid PDFCONV_PORT: {e}"))?;

        let base_url = env_or("PDFCONV_BASE_URL", &format!("http://{host}:{port}"));

        let registration = match env_or("PDFCONV_REGISTRATION", "open").as_str() {
            "closed" => RegistrationMode::Closed,
            _ => RegistrationMode::Open,
        };

        let max_upload_size: usize = env_or("PDFCONV_MAX_UPLOAD_SIZE", "20971520")
            .parse()
            .map_err(|e| format!("Invalid PDFCONV_MAX_UPLOAD_SIZE: {e}"))?;

        let reset_token_ttl_mins: i64 = env_or("PDFCONV_RESET_TOKEN_TTL_MINS", "60")
            .parse()
            .map_err(|e| format!("Invalid PDFCONV_RESET_TOKEN_TTL_MINS: {e}"))?;

        let direct_reset = parse_bool("PDFCONV_DIRECT_RESET", &env_or("PDFCONV_DIRECT_RESET", "false"))?;

        let log_level = env_or("PDFCONV_LOG_LEVEL", "info");

        let timeout_secs: u64 = env_or("PDFCONV_CONVERT_TIMEOUT_SECS", "120")
            .parse()
            .map_err(|e| format!("Invalid PDFCONV_CONVERT_TIMEOUT_SECS: {e}"))?;

        let converter = ConverterConfig {
            binary: PathBuf::from(env_or(
                "PDFCONV_SOFFICE_PATH",
                "/opt/libreoffice/program/soffice",
            )),
            timeout: Duration::from_secs(timeout_secs),
            work_dir: std::env::var("PDFCONV_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir()),
        };

        let backend = match env_or("PDFCONV_STORAGE", "s3").as_str() {
            "memory" => StorageBackend::Memory,
            "s3" => StorageBackend::S3 {
                bucket: env_required("S3_BUCKET_NAME")?,
            },
            other => return Err(format!("Invalid PDFCONV_STORAGE: {other}")),
        };

        let download_ttl_secs: u64 = env_or("PDFCONV_DOWNLOAD_TTL_SECS", "300")
            .parse()
            .map_err(|e| format!("Invalid PDFCONV_DOWNLOAD_TTL_SECS: {e}"))?;

        let storage = StorageConfig {
            backend,
            download_ttl: Duration::from_secs(download_ttl_secs),
        };

        let smtp = match (
            std::env::var("PDFCONV_SMTP_HOST").ok(),
            std::env::var("PDFCONV_SMTP_PORT").ok(),
            std::env::var("PDFCONV_SMTP_USER").ok(),
            std::env::var("PDFCONV_SMTP_PASS").ok(),
            std::env::var("PDFCONV_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid PDFCONV_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            base_url,
            registration,
            max_upload_size,
            reset_token_ttl_mins,
            direct_reset,
            log_level,
            converter,
            storage,
            smtp,
        })
    }

    /// Cookies are only marked `Secure` when the public URL is served over TLS.
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(format!("Invalid {key}: expected true or false")),
    }
}
