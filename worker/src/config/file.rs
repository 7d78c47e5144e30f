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

//! TOML file configuration options.

use super::options::{BrokerOptions, CleanupOptions, MetricsOptions, VolumesOptions};
use super::WorkerSettings;
use commons::de::de_loglevel;
use commons::MergeOptions;
use serde::Deserialize;
use std::io::Read;
use std::{fs, io, path};

/// TOML configuration, top-level.
#[derive(Debug, Deserialize)]
pub struct FileOptions {
    /// Verbosity level.
    #[serde(default = "Option::default", deserialize_with = "de_loglevel")]
    pub verbosity: Option<log::LevelFilter>,

    /// Queue/broker options.
    pub broker: Option<BrokerOptions>,

    /// Shared-volume root options.
    pub volumes: Option<VolumesOptions>,

    /// `/health` and `/metrics` probe options.
    pub metrics: Option<MetricsOptions>,

    /// Output-cleanup sweep options.
    pub cleanup: Option<CleanupOptions>,
}

impl FileOptions {
    /// Parse a TOML configuration from path.
    pub fn read_filepath<P>(cfg_path: P) -> anyhow::Result<Self>
    where
        P: AsRef<path::Path>,
    {
        let cfg_file = fs::File::open(&cfg_path)
            .map_err(|e| anyhow::anyhow!("failed to open config path {:?}: {}", cfg_path.as_ref(), e))?;
        let mut bufrd = io::BufReader::new(cfg_file);

        let mut content = vec![];
        bufrd.read_to_end(&mut content)?;
        let cfg = toml::from_slice(&content).map_err(|e| {
            anyhow::anyhow!(
                "failed to read config file {}: {}",
                cfg_path.as_ref().display(),
                e
            )
        })?;

        Ok(cfg)
    }
}

impl MergeOptions<Option<FileOptions>> for WorkerSettings {
    fn try_merge(&mut self, opts: Option<FileOptions>) -> anyhow::Result<()> {
        if let Some(file) = opts {
            assign_if_some!(self.verbosity, file.verbosity);
            self.try_merge(file.broker)?;
            self.try_merge(file.volumes)?;
            self.try_merge(file.metrics)?;
            self.try_merge(file.cleanup)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::FileOptions;
    use crate::config::WorkerSettings;
    use commons::MergeOptions;

    #[test]
    fn toml_merge_settings() {
        let mut settings = WorkerSettings::default();
        assert_eq!(settings.metrics_port, 9000);

        let toml_input = "broker.queue = \"ifcclash\"\nmetrics.port = 9191";
        let file_opts: FileOptions = toml::from_str(toml_input).unwrap();

        settings.try_merge(Some(file_opts)).unwrap();
        assert_eq!(settings.queue, "ifcclash");
        assert_eq!(settings.metrics_port, 9191);
    }
}
