//! Process configuration: flags with environment fallbacks.
//!
//! `TFE_ADDRESS` and `TFE_TOKEN` are the variables the platform's own tooling
//! reads, so an existing deployment environment works unchanged.

use std::net::SocketAddr;

use clap::{Parser, ValueEnum};
use runtask::LookupFailurePolicy;

/// Run task that fails runs on workspaces carrying static AWS credentials.
#[derive(Parser)]
#[command(name = "credguard", version, about)]
pub struct Config {
    /// Address the run task endpoint listens on.
    #[arg(long, env = "CREDGUARD_LISTEN", default_value = "0.0.0.0:80")]
    pub listen: SocketAddr,

    /// Terraform Cloud / Enterprise API address.
    #[arg(long, env = "TFE_ADDRESS", default_value = tfc::DEFAULT_ADDRESS)]
    pub tfe_address: String,

    /// API token used to list workspace variables.
    #[arg(long, env = "TFE_TOKEN", hide_env_values = true)]
    pub tfe_token: String,

    /// Verdict when a workspace's variables cannot be listed.
    #[arg(long, env = "CREDGUARD_LOOKUP_FAILURE", value_enum, default_value_t = LookupFailureMode::Pass)]
    pub lookup_failure: LookupFailureMode,

    /// Log line format.
    #[arg(long, env = "CREDGUARD_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP gRPC endpoint; trace export is disabled when unset.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LookupFailureMode {
    /// Report `passed`, as if the workspace had no variables.
    Pass,
    /// Report `failed`.
    Fail,
}

impl From<LookupFailureMode> for LookupFailurePolicy {
    fn from(mode: LookupFailureMode) -> Self {
        match mode {
            LookupFailureMode::Pass => LookupFailurePolicy::FailOpen,
            LookupFailureMode::Fail => LookupFailurePolicy::FailClosed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}
