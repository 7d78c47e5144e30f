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

//! Command-line (and environment-variable) options for a worker process.

use super::WorkerSettings;
use commons::MergeOptions;
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

    /// The queue this process serves.
    #[structopt(long = "queue", env = "QUEUE_NAME")]
    pub queue: Option<String>,

    /// Broker connection string.
    #[structopt(long = "broker-url", env = "BROKER_URL")]
    pub broker_url: Option<String>,

    /// Root of client-provided inputs.
    #[structopt(long = "uploads-root")]
    pub uploads_root: Option<std::path::PathBuf>,

    /// Root of per-kind handler outputs.
    #[structopt(long = "output-root")]
    pub output_root: Option<std::path::PathBuf>,

    /// Address on which the worker's `/health` and `/metrics` probes listen.
    #[structopt(long = "metrics-address")]
    pub metrics_address: Option<std::net::IpAddr>,

    /// Port on which the worker's `/health` and `/metrics` probes listen.
    #[structopt(long = "metrics-port")]
    pub metrics_port: Option<u16>,
}

impl MergeOptions<CliOptions> for WorkerSettings {
    fn try_merge(&mut self, opts: CliOptions) -> anyhow::Result<()> {
        self.verbosity = match opts.verbosity {
            0 => self.verbosity,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        assign_if_some!(self.queue, opts.queue);
        assign_if_some!(self.broker_url, opts.broker_url);
        assign_if_some!(self.uploads_root, opts.uploads_root);
        assign_if_some!(self.output_root, opts.output_root);
        assign_if_some!(self.metrics_address, opts.metrics_address);
        assign_if_some!(self.metrics_port, opts.metrics_port);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::CliOptions;
    use crate::config::WorkerSettings;
    use commons::MergeOptions;
    use structopt::StructOpt;

    #[test]
    fn cli_basic() {
        let no_args = vec!["argv0"];
        let no_args_cli = CliOptions::from_iter_safe(no_args).unwrap();
        assert_eq!(no_args_cli.verbosity, 0);
        assert!(no_args_cli.queue.is_none());
    }

    #[test]
    fn cli_merge_settings() {
        let mut settings = WorkerSettings::default();
        let args = vec!["argv0", "--queue", "ifcclash"];
        let cli = CliOptions::from_iter_safe(args).unwrap();
        settings.try_merge(cli).unwrap();
        assert_eq!(settings.queue, "ifcclash");
    }
}
