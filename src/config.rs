use clap::Parser;
use std::env;
use std::time::Duration;

use crate::query::{DEFAULT_GC_TIME, DEFAULT_STALE_TIME};
use crate::remote::DEFAULT_API_BASE_URL;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Command-line flags; each one overrides its environment variable
#[derive(Parser, Debug, Default)]
#[command(name = "job-dashboard")]
#[command(about = "Server-rendered dashboard for browsing and triaging job listings")]
#[command(version)]
pub struct Cli {
    /// Base URL of the Remote Job API
    #[arg(long)]
    pub api_base_url: Option<String>,

    /// Address to listen on
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory for the rolling log files
    #[arg(long)]
    pub log_dir: Option<String>,
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Remote Job API base URL, without a trailing slash
    /// Default: http://localhost:8080/api
    pub api_base_url: String,

    pub host: String,
    pub port: u16,

    /// Directory for log files
    /// Default: logs
    pub log_dir: String,

    /// How long cached query data counts as fresh
    /// Default: 5 minutes
    pub stale_time: Duration,

    /// How long an unobserved cache entry survives
    /// Default: 5 minutes
    pub gc_time: Duration,

    /// How long a page waits for data before rendering its loading state
    /// Default: 3 seconds
    pub render_timeout: Duration,

    /// Jobs per page on the list and favorites pages
    /// Default: 20
    pub page_size: u32,
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value,
        }),
        None => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Optional environment variables:
    /// - API_BASE_URL: Remote Job API base URL (default: http://localhost:8080/api)
    /// - DASHBOARD_HOST / DASHBOARD_PORT: listen address (default: 127.0.0.1:3000)
    /// - LOG_DIR: log directory (default: logs)
    /// - QUERY_STALE_SECS / QUERY_GC_SECS: cache timings (default: 300 each)
    /// - RENDER_TIMEOUT_MS: loading-state deadline (default: 3000)
    /// - PAGE_SIZE: jobs per page, 1 to 100 (default: 20)
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenv::dotenv().ok();
        Self::from_vars(|name| env::var(name).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base_url = lookup("API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                name: "API_BASE_URL",
                expected: "an http(s) URL",
                value: api_base_url,
            });
        }

        let host = lookup("DASHBOARD_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or(&lookup, "DASHBOARD_PORT", "a port number", 3000u16)?;
        let log_dir = lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string());

        let stale_secs = parse_or(
            &lookup,
            "QUERY_STALE_SECS",
            "a number of seconds",
            DEFAULT_STALE_TIME.as_secs(),
        )?;
        let gc_secs = parse_or(
            &lookup,
            "QUERY_GC_SECS",
            "a number of seconds",
            DEFAULT_GC_TIME.as_secs(),
        )?;
        let render_ms = parse_or(
            &lookup,
            "RENDER_TIMEOUT_MS",
            "a number of milliseconds",
            3000u64,
        )?;

        let page_size = parse_or(&lookup, "PAGE_SIZE", "a number from 1 to 100", 20u32)?;
        if !(1..=100).contains(&page_size) {
            return Err(ConfigError::Invalid {
                name: "PAGE_SIZE",
                expected: "a number from 1 to 100",
                value: page_size.to_string(),
            });
        }

        Ok(Config {
            api_base_url,
            host,
            port,
            log_dir,
            stale_time: Duration::from_secs(stale_secs),
            gc_time: Duration::from_secs(gc_secs),
            render_timeout: Duration::from_millis(render_ms),
            page_size,
        })
    }

    /// Apply command-line overrides
    pub fn with_cli(mut self, cli: Cli) -> Self {
        if let Some(url) = cli.api_base_url {
            self.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(host) = cli.host {
            self.host = host;
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(log_dir) = cli.log_dir {
            self.log_dir = log_dir;
        }
        self
    }
}
