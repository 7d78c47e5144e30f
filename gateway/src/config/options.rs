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

use super::AppSettings;
use commons::{admission, MergeOptions};
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use structopt::StructOpt;

/// Address/port/namespace options for the main HTTP service.
#[derive(Debug, Deserialize, Serialize, StructOpt)]
pub struct ServiceOptions {
    /// Address on which the server will listen.
    #[structopt(name = "service_address", long = "service.address")]
    pub address: Option<IpAddr>,

    /// Port to which the server will bind.
    #[structopt(name = "service_port", long = "service.port")]
    pub port: Option<u16>,

    /// Namespace prefix for all service endpoints.
    #[structopt(long = "service.path_prefix", parse(from_str = commons::parse_path_prefix))]
    pub path_prefix: Option<String>,
}

impl MergeOptions<Option<ServiceOptions>> for AppSettings {
    fn try_merge(&mut self, opts: Option<ServiceOptions>) -> anyhow::Result<()> {
        if let Some(service) = opts {
            assign_if_some!(self.address, service.address);
            assign_if_some!(self.port, service.port);
            assign_if_some!(self.path_prefix, service.path_prefix);
        }
        Ok(())
    }
}

/// Admission options: the API key and the CIDR allow-list that bypasses it.
#[derive(Debug, Deserialize, Serialize, StructOpt)]
pub struct AdmissionOptions {
    /// Expected value of the `X-API-Key` header.
    #[structopt(long = "admission.api_key", env = "API_KEY")]
    pub api_key: Option<String>,

    /// Comma-separated CIDR ranges that bypass the API key check.
    #[structopt(
        long = "admission.allowed_ip_ranges",
        env = "ALLOWED_IP_RANGES",
        parse(from_str = admission::parse_allowed_ranges)
    )]
    #[serde(default = "Option::default", deserialize_with = "commons::de::de_allowed_ranges")]
    pub allowed_ranges: Option<Vec<IpNet>>,
}

impl MergeOptions<Option<AdmissionOptions>> for AppSettings {
    fn try_merge(&mut self, opts: Option<AdmissionOptions>) -> anyhow::Result<()> {
        if let Some(admission) = opts {
            assign_if_some!(self.api_key, admission.api_key);
            if let Some(ranges) = admission.allowed_ranges {
                self.allowed_ranges.extend(ranges);
            }
        }
        Ok(())
    }
}

/// Broker connection and retention options.
#[derive(Debug, Deserialize, Serialize, StructOpt)]
pub struct BrokerOptions {
    /// Connection string for the broker.
    #[structopt(long = "broker.url", env = "BROKER_URL")]
    pub url: Option<String>,

    /// Retention window (seconds) for terminal job records.
    #[structopt(long = "broker.job_result_ttl_seconds", env = "JOB_RESULT_TTL_SECONDS")]
    pub job_result_ttl_secs: Option<u64>,

    /// Default lifetime (seconds) of a minted download token.
    #[structopt(
        long = "broker.download_token_ttl_seconds",
        env = "DOWNLOAD_TOKEN_TTL_SECONDS"
    )]
    pub download_token_ttl_secs: Option<u64>,
}

impl MergeOptions<Option<BrokerOptions>> for AppSettings {
    fn try_merge(&mut self, opts: Option<BrokerOptions>) -> anyhow::Result<()> {
        if let Some(broker) = opts {
            assign_if_some!(self.broker_url, broker.url);
            assign_if_some!(self.job_result_ttl_secs, broker.job_result_ttl_secs);
            assign_if_some!(
                self.download_token_ttl_secs,
                broker.download_token_ttl_secs
            );
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

    /// Root of static sample files.
    #[structopt(long = "volumes.examples_root")]
    pub examples_root: Option<PathBuf>,
}

impl MergeOptions<Option<VolumesOptions>> for AppSettings {
    fn try_merge(&mut self, opts: Option<VolumesOptions>) -> anyhow::Result<()> {
        if let Some(volumes) = opts {
            assign_if_some!(self.uploads_root, volumes.uploads_root);
            assign_if_some!(self.output_root, volumes.output_root);
            assign_if_some!(self.examples_root, volumes.examples_root);
        }
        Ok(())
    }
}
