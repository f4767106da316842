//! Configuration loading from files.
//!
//! The YAML file is layered with `BLOGSMITH_`-prefixed environment variables
//! (`BLOGSMITH_PUBLISH__BUCKET=...`), which lets credentials-adjacent settings
//! stay out of the committed file.

use std::collections::HashMap;
use std::path::Path;

use super::{ConfigError, ConfigFile, DEFAULT_CONFIG_FILE, SiteConfig};

const ENV_PREFIX: &str = "BLOGSMITH";

impl SiteConfig {
    /// Load the config from the command line argument, defaulting to `blogsmith.yaml`
    pub fn load_from_arg(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config_file = config_file.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        let config_file = if config_file.is_relative() {
            std::env::current_dir()
                .map_err(ConfigError::CwdFailure)?
                .join(config_file)
        } else {
            config_file.to_path_buf()
        };

        Self::load_from_file(&config_file, None)
    }

    /// Load the config from a file path.
    ///
    /// `env` replaces the process environment as the override source; `None`
    /// reads the real environment.
    pub(crate) fn load_from_file(
        path: &Path,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let path_str = path
            .as_os_str()
            .to_str()
            .ok_or_else(|| ConfigError::EncodePath(path.to_path_buf()))?;

        let file = config::Config::builder()
            .add_source(config::File::new(path_str, config::FileFormat::Yaml))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize::<ConfigFile>()?;

        tracing::debug!(path = %path.display(), "loaded config");

        SiteConfig::from_file(file, path)
    }
}
