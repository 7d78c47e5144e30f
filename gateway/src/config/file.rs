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

use super::options::{AdmissionOptions, BrokerOptions, ServiceOptions, VolumesOptions};
use super::AppSettings;
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

    /// Web frontend options.
    pub service: Option<ServiceOptions>,

    /// Admission (API key / allow-list) options.
    pub admission: Option<AdmissionOptions>,

    /// Broker connection and retention options.
    pub broker: Option<BrokerOptions>,

    /// Shared-volume root options.
    pub volumes: Option<VolumesOptions>,
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

impl MergeOptions<Option<FileOptions>> for AppSettings {
    fn try_merge(&mut self, opts: Option<FileOptions>) -> anyhow::Result<()> {
        if let Some(file) = opts {
            assign_if_some!(self.verbosity, file.verbosity);
            self.try_merge(file.service)?;
            self.try_merge(file.admission)?;
            self.try_merge(file.broker)?;
            self.try_merge(file.volumes)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::FileOptions;
    use crate::config::AppSettings;
    use commons::MergeOptions;

    #[test]
    fn toml_basic() {
        let toml_input = "[service]\nport = 9191";
        let file_opts: FileOptions = toml::from_str(toml_input).unwrap();
        assert_eq!(file_opts.service.unwrap().port, Some(9191));
    }

    #[test]
    fn toml_merge_settings() {
        let mut settings = AppSettings::default();
        assert_eq!(settings.port, 8000);

        let toml_input = "service.port = 2222";
        let file_opts: FileOptions = toml::from_str(toml_input).unwrap();

        settings.try_merge(Some(file_opts)).unwrap();
        assert_eq!(settings.port, 2222);
    }

    #[test]
    fn toml_sample_config() {
        use std::io::Write;

        let sample_config = r#"
            verbosity = 3

            [service]
            address = "0.0.0.0"
            port = 8383

            [admission]
            api_key = "s3cr3t"
            allowed_ranges = "10.0.0.0/8,192.168.0.0/16"

            [broker]
            url = "redis://redis:6379"
            job_result_ttl_seconds = 3600

            [volumes]
            uploads_root = "/data/uploads"
        "#;

        let mut config_file = tempfile::NamedTempFile::new().unwrap();
        config_file
            .write_fmt(format_args!("{}", sample_config))
            .unwrap();
        let opts = FileOptions::read_filepath(config_file.path()).unwrap();

        assert_eq!(opts.verbosity, Some(log::LevelFilter::Trace));
        assert!(opts.service.is_some());
        assert_eq!(opts.admission.unwrap().api_key.unwrap(), "s3cr3t");
        assert_eq!(opts.broker.unwrap().job_result_ttl_secs, Some(3600));
        assert_eq!(
            opts.volumes.unwrap().uploads_root.unwrap(),
            std::path::PathBuf::from("/data/uploads")
        );
    }
}
