//! CLI Configuration
//!
//! Layered from `config/default`, `config/local`, an optional `--config` file
//! and `METACOLLAB__*` environment variables. Later sources win.

use metacollab_core::ChainConfig;
use metacollab_types::TokenAmount;
use serde::{Deserialize, Serialize};

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Chain the demo runs on
    #[serde(default)]
    pub chain: ChainConfig,

    #[serde(default)]
    pub demo: DemoConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Parameters of the demonstration lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Wallet label of the funder
    #[serde(default = "default_funder")]
    pub funder: String,

    /// Wallet label of the doer
    #[serde(default = "default_doer")]
    pub doer: String,

    /// Wallet label of the resolver
    #[serde(default = "default_resolver")]
    pub resolver: String,

    #[serde(default = "default_token_symbol")]
    pub token_symbol: String,

    /// Opaque gig reference, e.g. an IPFS URI
    #[serde(default = "default_reference")]
    pub reference: String,

    /// Amount escrowed per gig
    #[serde(default = "default_amount")]
    pub amount: u64,

    /// Flat fee the resolver charges to lock a gig
    #[serde(default = "default_resolver_fee")]
    pub resolver_fee: u64,

    /// Seconds after start during which the funder may cancel
    #[serde(default = "default_cancellation_window")]
    pub cancellation_window: u64,

    /// Seconds between starting a dispute countdown and locking
    #[serde(default = "default_countdown_period")]
    pub countdown_period: u64,

    /// Seconds after start from which the funder may cancel again
    #[serde(default = "default_expiration_period")]
    pub expiration_period: u64,

    #[serde(default = "default_funder_share")]
    pub funder_share: u8,

    #[serde(default = "default_doer_share")]
    pub doer_share: u8,
}

impl DemoConfig {
    pub fn amount(&self) -> TokenAmount {
        TokenAmount::from(self.amount)
    }

    pub fn resolver_fee(&self) -> TokenAmount {
        TokenAmount::from(self.resolver_fee)
    }

    pub fn durations(&self) -> [u64; 3] {
        [
            self.cancellation_window,
            self.countdown_period,
            self.expiration_period,
        ]
    }

    pub fn ratio(&self) -> [u8; 2] {
        [self.funder_share, self.doer_share]
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            funder: default_funder(),
            doer: default_doer(),
            resolver: default_resolver(),
            token_symbol: default_token_symbol(),
            reference: default_reference(),
            amount: default_amount(),
            resolver_fee: default_resolver_fee(),
            cancellation_window: default_cancellation_window(),
            countdown_period: default_countdown_period(),
            expiration_period: default_expiration_period(),
            funder_share: default_funder_share(),
            doer_share: default_doer_share(),
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_funder() -> String {
    "funder".to_string()
}

fn default_doer() -> String {
    "doer".to_string()
}

fn default_resolver() -> String {
    "resolver".to_string()
}

fn default_token_symbol() -> String {
    "DAI".to_string()
}

fn default_reference() -> String {
    "ipfs://metacollab-demo-brief".to_string()
}

fn default_amount() -> u64 {
    1_000
}

fn default_resolver_fee() -> u64 {
    10
}

fn default_cancellation_window() -> u64 {
    86_400
}

fn default_countdown_period() -> u64 {
    3 * 86_400
}

fn default_expiration_period() -> u64 {
    14 * 86_400
}

fn default_funder_share() -> u8 {
    1
}

fn default_doer_share() -> u8 {
    3
}

// =============================================================================
// Configuration Loading
// =============================================================================

impl CliConfig {
    /// Load configuration from environment and optional config file
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder();

        builder = builder
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        // Environment variables with METACOLLAB__ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("METACOLLAB")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }
}
