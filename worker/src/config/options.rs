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

//! Options shared by CLI and TOML, grouped by the setting they feed.

use super::WorkerSettings;
use commons::MergeOptions;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use structopt::StructOpt;

/// Queue/broker options.
#[derive(Debug, Deserialize, Serialize, StructOpt)]
pub struct BrokerOptions {
    /// The queue this process serves.
    #[structopt(name = "broker_queue", long = "broker.queue", env = "QUEUE_NAME")]
    pub queue: Option<String>,

    /// Broker connection string.
    #[structopt(long = "broker.url", env = "BROKER_URL")]
    pub url: Option<String>,
}

impl MergeOptions<Option<BrokerOptions>> for WorkerSettings {
    fn try_merge(&mut self, opts: Option<BrokerOptions>) -> anyhow::Result<()> {
        if let Some(broker) = opts {
            assign_if_some!(self.queue, broker.queue);
            assign_if_some!(self.broker_url, broker.url);
        }
        Ok(())
    }
}

/// Shared-volume root directory options.
#[derive(Debug, Deserialize, Serialize, StructOpt)]
pub struct VolumesOptions {
    /// Root of client-provided inputs.
    #[structopt(long = "volumes.uploads_root")]
    pub uploads_root: Option<PathBuf>,

    /// Root of per-kind handler outputs.
    #[structopt(long = "volumes.output_root")]
    pub output_root: Option<PathBuf>,
}

impl MergeOptions<Option<VolumesOptions>> for WorkerSettings {
    fn try_merge(&mut self, opts: Option<VolumesOptions>) -> anyhow::Result<()> {
        if let Some(volumes) = opts {
            assign_if_some!(self.uploads_root, volumes.uploads_root);
            assign_if_some!(self.output_root, volumes.output_root);
        }
        Ok(())
    }
}

/// `/health` and `/metrics` probe options.
#[derive(Debug, Deserialize, Serialize, StructOpt)]
pub struct MetricsOptions {
    /// Address on which the probes listen.
    #[structopt(name = "metrics_address", long = "metrics.address")]
    pub address: Option<IpAddr>,

    /// Port on which the probes listen.
    #[structopt(name = "metrics_port", long = "metrics.port")]
    pub port: Option<u16>,
}

impl MergeOptions<Option<MetricsOptions>> for WorkerSettings {
    fn try_merge(&mut self, opts: Option<MetricsOptions>) -> anyhow::Result<()> {
        if let Some(metrics) = opts {
            assign_if_some!(self.metrics_address, metrics.address);
            assign_if_some!(self.metrics_port, metrics.port);
        }
        Ok(())
    }
}

/// Output-cleanup sweep options (spec §4.7).
#[derive(Debug, Deserialize, Serialize, StructOpt)]
pub struct CleanupOptions {
    /// Age (seconds) after which an output file is swept.
    #[structopt(long = "cleanup.max_age_seconds")]
    pub max_age_secs: Option<u64>,

    /// Interval (seconds) between cleanup sweeps.
    #[structopt(long = "cleanup.interval_seconds")]
    pub interval_secs: Option<u64>,
}

impl MergeOptions<Option<CleanupOptions>> for WorkerSettings {
    fn try_merge(&mut self, opts: Option<CleanupOptions>) -> anyhow::Result<()> {
        if let Some(cleanup) = opts {
            assign_if_some!(self.cleanup_max_age_secs, cleanup.max_age_secs);
            assign_if_some!(self.cleanup_interval_secs, cleanup.interval_secs);
        }
        Ok(())
    }
}
