use anyhow::{bail, Context, Result};

use crate::export::ExportSettings;
use crate::render::PageSize;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub port: u16,
    pub rust_log: String,
    pub page_size: PageSize,
    /// Capture oversampling factor, in (0, 4].
    pub export_scale: f32,
    pub export_frame_budget: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            get(key).with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let page_size = match get("PAGE_SIZE") {
            Some(raw) => PageSize::parse(&raw)
                .with_context(|| format!("PAGE_SIZE must be 'a4' or 'letter', got '{raw}'"))?,
            None => PageSize::default(),
        };

        let export_scale = get("EXPORT_SCALE")
            .unwrap_or_else(|| "2.0".to_string())
            .parse::<f32>()
            .context("EXPORT_SCALE must be a number")?;
        if !(export_scale > 0.0 && export_scale <= 4.0) {
            bail!("EXPORT_SCALE must be in (0, 4], got {export_scale}");
        }

        let export_frame_budget = get("EXPORT_FRAME_BUDGET")
            .unwrap_or_else(|| "8".to_string())
            .parse::<u32>()
            .context("EXPORT_FRAME_BUDGET must be a positive integer")?;
        if export_frame_budget == 0 {
            bail!("EXPORT_FRAME_BUDGET must be at least 1");
        }

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            s3_bucket: require("S3_BUCKET")?,
            s3_endpoint: require("S3_ENDPOINT")?,
            aws_access_key_id: require("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
            port: get("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            page_size,
            export_scale,
            export_frame_budget,
        })
    }

    pub fn export_settings(&self) -> ExportSettings {
        ExportSettings {
            page_size: self.page_size,
            scale: self.export_scale,
            frame_budget: self.export_frame_budget,
        }
    }
}
