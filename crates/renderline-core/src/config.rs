// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loading from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

/// Renderline Core configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Control-plane address the transport worker dials
    pub server_addr: SocketAddr,
    /// Bearer token presented on connect
    pub api_token: String,
    /// Constant delay between reconnect attempts
    pub reconnect_delay: Duration,
    /// Cadence of the correlation sweep
    pub sweep_interval: Duration,
    /// Maximum age of a correlation entry before the sweep discards it
    pub correlation_horizon: Duration,
    /// Initial maximum accepted demo file size in bytes
    /// (overridden at runtime by `config` frames)
    pub max_demo_file_size: u64,
    /// Base URL under which finished videos are reachable
    pub video_base_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `RENDERLINE_API_TOKEN`: bearer token for the control-plane link
    ///
    /// Optional (with defaults):
    /// - `RENDERLINE_SERVER_ADDR`: control-plane address (default: 127.0.0.1:8007)
    /// - `RENDERLINE_RECONNECT_DELAY_MS`: reconnect delay (default: 100)
    /// - `RENDERLINE_SWEEP_INTERVAL_SECS`: sweep cadence (default: 60)
    /// - `RENDERLINE_CORRELATION_HORIZON_SECS`: entry lifetime (default: 900)
    /// - `RENDERLINE_MAX_DEMO_FILE_SIZE`: admission limit in bytes (default: 209715200)
    /// - `RENDERLINE_VIDEO_BASE_URL`: video link base (default: http://127.0.0.1:8080/videos)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_token = std::env::var("RENDERLINE_API_TOKEN")
            .map_err(|_| ConfigError::Missing("RENDERLINE_API_TOKEN"))?;

        let server_addr: SocketAddr = std::env::var("RENDERLINE_SERVER_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8007".to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid("RENDERLINE_SERVER_ADDR", "must be a socket address")
            })?;

        let reconnect_delay_ms: u64 = std::env::var("RENDERLINE_RECONNECT_DELAY_MS")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid("RENDERLINE_RECONNECT_DELAY_MS", "must be an integer")
            })?;

        let sweep_interval_secs: u64 = std::env::var("RENDERLINE_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid("RENDERLINE_SWEEP_INTERVAL_SECS", "must be an integer")
            })?;

        let correlation_horizon_secs: u64 = std::env::var("RENDERLINE_CORRELATION_HORIZON_SECS")
            .unwrap_or_else(|_| "900".to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid("RENDERLINE_CORRELATION_HORIZON_SECS", "must be an integer")
            })?;

        let max_demo_file_size: u64 = std::env::var("RENDERLINE_MAX_DEMO_FILE_SIZE")
            .unwrap_or_else(|_| "209715200".to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid("RENDERLINE_MAX_DEMO_FILE_SIZE", "must be an integer")
            })?;

        let video_base_url = std::env::var("RENDERLINE_VIDEO_BASE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8080/videos".to_string());

        Ok(Self {
            server_addr,
            api_token,
            reconnect_delay: Duration::from_millis(reconnect_delay_ms),
            sweep_interval: Duration::from_secs(sweep_interval_secs),
            correlation_horizon: Duration::from_secs(correlation_horizon_secs),
            max_demo_file_size,
            video_base_url,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}
