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

//! Command-line (and environment-variable) options for the gateway.

use super::AppSettings;
use commons::{admission, MergeOptions};
use structopt::StructOpt;

/// CLI configuration flags, top-level. Every flag also accepts its value
/// from the matching environment variable (spec §6); an explicit flag
/// takes precedence over the environment.
#[derive(Debug, StructOpt)]
pub struct CliOptions {
    /// Verbosity level.
    #[structopt(short = "v", parse(from_occurrences))]
    pub verbosity: u64,

    /// Path to a TOML configuration file.
    #[structopt(short = "c", long = "config")]
    pub config_path: Option<String>,

    /// Address on which the gateway listens.
    #[structopt(long = "address")]
    pub address: Option<std::net::IpAddr>,

    /// Port on which the gateway listens.
    #[structopt(long = "port")]
    pub port: Option<u16>,

    /// Namespace prefix for all gateway endpoints.
    #[structopt(long = "path-prefix", parse(from_str = commons::parse_path_prefix))]
    pub path_prefix: Option<String>,

    /// Expected `X-API-Key` header value.
    #[structopt(long = "api-key", env = "API_KEY")]
    pub api_key: Option<String>,

    /// Comma-separated CIDR ranges bypassing the API key check.
    #[structopt(long = "allowed-ip-ranges", env = "ALLOWED_IP_RANGES", parse(from_str = admission::parse_allowed_ranges))]
    pub allowed_ranges: Option<Vec<ipnet::IpNet>>,

    /// Broker connection string.
    #[structopt(long = "broker-url", env = "BROKER_URL")]
    pub broker_url: Option<String>,

    /// Retention (seconds) for terminal job records.
    #[structopt(long = "job-result-ttl-seconds", env = "JOB_RESULT_TTL_SECONDS")]
    pub job_result_ttl_secs: Option<u64>,

    /// Default lifetime (seconds) of a minted download token.
    #[structopt(long = "download-token-ttl-seconds", env = "DOWNLOAD_TOKEN_TTL_SECONDS")]
    pub download_token_ttl_secs: Option<u64>,
}

impl MergeOptions<CliOptions> for AppSettings {
    fn try_merge(&mut self, opts: CliOptions) -> anyhow::Result<()> {
        self.verbosity = match opts.verbosity {
            0 => self.verbosity,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        assign_if_some!(self.address, opts.address);
        assign_if_some!(self.port, opts.port);
        assign_if_some!(self.path_prefix, opts.path_prefix);
        assign_if_some!(self.api_key, opts.api_key);
        assign_if_some!(self.broker_url, opts.broker_url);
        assign_if_some!(self.job_result_ttl_secs, opts.job_result_ttl_secs);
        assign_if_some!(self.download_token_ttl_secs, opts.download_token_ttl_secs);
        if let Some(ranges) = opts.allowed_ranges {
            self.allowed_ranges.extend(ranges);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::CliOptions;
    use crate::config::AppSettings;
    use commons::MergeOptions;
    use structopt::StructOpt;

    #[test]
    fn cli_basic() {
        let no_args = vec!["argv0"];
        let no_args_cli = CliOptions::from_iter_safe(no_args).unwrap();
        assert_eq!(no_args_cli.verbosity, 0);
        assert!(no_args_cli.port.is_none());
    }

    #[test]
    fn cli_merge_settings() {
        let mut settings = AppSettings::default();
        let args = vec!["argv0", "--port", "9999", "--api-key", "s3cr3t"];
        let cli = CliOptions::from_iter_safe(args).unwrap();
        settings.try_merge(cli).unwrap();
        assert_eq!(settings.port, 9999);
        assert_eq!(settings.api_key, "s3cr3t");
    }
}
