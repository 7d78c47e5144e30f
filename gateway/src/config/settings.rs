// Copyright 2018 Alex Crawford
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Application settings for the gateway.

use super::{cli, file};
use commons::MergeOptions;
use ipnet::IpNet;
use smart_default::SmartDefault;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;
use structopt::StructOpt;

/// Runtime application settings (validated config).
#[derive(Debug, SmartDefault)]
pub struct AppSettings {
    /// Global log level.
    #[default(log::LevelFilter::Warn)]
    pub verbosity: log::LevelFilter,

    /// Listening address for the main service.
    #[default(IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub address: IpAddr,

    /// Listening port for the main service.
    #[default(8000)]
    pub port: u16,

    /// Endpoints namespace for the main service.
    pub path_prefix: String,

    /// Expected value of the `X-API-Key` header (spec §4.9, §6 `API_KEY`).
    pub api_key: String,

    /// CIDR ranges that bypass the API key check (`ALLOWED_IP_RANGES`).
    pub allowed_ranges: Vec<IpNet>,

    /// Connection string for the broker (`BROKER_URL`).
    #[default("redis://127.0.0.1:6379")]
    pub broker_url: String,

    /// Retention window for terminal job records (`JOB_RESULT_TTL_SECONDS`).
    #[default(86_400)]
    pub job_result_ttl_secs: u64,

    /// Default lifetime of a minted download token (`DOWNLOAD_TOKEN_TTL_SECONDS`).
    #[default(1_800)]
    pub download_token_ttl_secs: u64,

    /// Root of client-provided inputs.
    #[default(PathBuf::from("/uploads"))]
    pub uploads_root: PathBuf,

    /// Root of per-kind handler outputs.
    #[default(PathBuf::from("/output"))]
    pub output_root: PathBuf,

    /// Root of static sample files.
    #[default(PathBuf::from("/examples"))]
    pub examples_root: PathBuf,

    /// Bounded wait budget for the synchronous patch-recipe-list endpoint.
    #[default(Duration::from_secs(10))]
    pub patch_list_wait: Duration,
}

impl AppSettings {
    /// Lookup all optional configs, merge them with defaults, and
    /// transform into valid runtime settings.
    pub fn assemble() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let cli_opts = cli::CliOptions::from_args();
        let file_opts = match &cli_opts.config_path {
            Some(path) => Some(file::FileOptions::read_filepath(path)?),
            None => None,
        };

        let mut cfg = defaults;
        cfg.try_merge(cli_opts)?;
        cfg.try_merge(file_opts)?;

        cfg.try_validate()
    }

    fn try_validate(self) -> anyhow::Result<Self> {
        if self.api_key.is_empty() {
            anyhow::bail!("API_KEY must be set (env var or --api-key)");
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let defaults = AppSettings::default();
        assert_eq!(defaults.port, 8000);
        assert_eq!(defaults.job_result_ttl_secs, 86_400);
        assert_eq!(defaults.download_token_ttl_secs, 1_800);
    }

    #[test]
    fn empty_api_key_fails_validation() {
        let settings = AppSettings::default();
        assert!(settings.try_validate().is_err());
    }
}
