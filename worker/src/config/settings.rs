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

//! Runtime settings for a worker process (spec C3, §6).

use super::{cli, file};
use commons::MergeOptions;
use smart_default::SmartDefault;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use structopt::StructOpt;

/// Runtime application settings (validated config) for a single worker
/// process. Each process is bound to exactly one `queue` (spec §4.3).
#[derive(Debug, SmartDefault)]
pub struct WorkerSettings {
    /// Global log level.
    #[default(log::LevelFilter::Warn)]
    pub verbosity: log::LevelFilter,

    /// The queue this process serves (`QUEUE_NAME`). `ifc5d` and
    /// `calculate-qtos` both resolve to the qto queue (spec §9 Open
    /// Question, resolved in `SPEC_FULL.md`: `ifc5d` is canonical).
    pub queue: String,

    /// Connection string for the broker (`BROKER_URL`).
    #[default("redis://127.0.0.1:6379")]
    pub broker_url: String,

    /// Root of client-provided inputs.
    #[default(PathBuf::from("/uploads"))]
    pub uploads_root: PathBuf,

    /// Root of per-kind handler outputs.
    #[default(PathBuf::from("/output"))]
    pub output_root: PathBuf,

    /// Listening address for the `/health` and `/metrics` probes.
    #[default(IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub metrics_address: IpAddr,

    /// Listening port for the `/health` and `/metrics` probes.
    #[default(9000)]
    pub metrics_port: u16,

    /// Age after which a file under `/output/clash` or `/output/diff` is
    /// swept by the scheduled cleanup collaborator (spec §4.7), in
    /// seconds. Only the worker bound to `ifcclash` or `ifcdiff` runs
    /// the sweep.
    #[default(7 * 24 * 60 * 60)]
    pub cleanup_max_age_secs: u64,

    /// How often the cleanup sweep runs, in seconds.
    #[default(60 * 60)]
    pub cleanup_interval_secs: u64,
}

impl WorkerSettings {
    /// Canonical queue name this worker's `QUEUE_NAME` resolves to.
    /// `calculate-qtos` is accepted as an alias of `ifc5d` (spec §9 Open
    /// Question).
    pub fn canonical_queue(&self) -> &str {
        match self.queue.as_str() {
            "calculate-qtos" => "ifc5d",
            other => other,
        }
    }

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
        if self.queue.is_empty() {
            anyhow::bail!("QUEUE_NAME must be set (env var or --queue)");
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let defaults = WorkerSettings::default();
        assert_eq!(defaults.metrics_port, 9000);
        assert_eq!(defaults.cleanup_max_age_secs, 7 * 24 * 60 * 60);
    }

    #[test]
    fn empty_queue_fails_validation() {
        let settings = WorkerSettings::default();
        assert!(settings.try_validate().is_err());
    }

    #[test]
    fn calculate_qtos_aliases_ifc5d() {
        let mut settings = WorkerSettings::default();
        settings.queue = "calculate-qtos".to_string();
        assert_eq!(settings.canonical_queue(), "ifc5d");
    }

    #[test]
    fn other_queues_pass_through() {
        let mut settings = WorkerSettings::default();
        settings.queue = "ifcclash".to_string();
        assert_eq!(settings.canonical_queue(), "ifcclash");
    }
}
