//! Runtime configuration.
//!
//! Sources, lowest precedence first: built-in defaults, `classquiz.toml` in the
//! working directory, then `CLASSQUIZ__*` environment variables (a `.env` file
//! is loaded first). Nested keys use `__`, e.g. `CLASSQUIZ__SESSION__STRICT_LABEL_VALIDATION=true`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::parser::ParseOptions;
use crate::session::SessionOptions;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5011/generate-quiz";
pub const CONFIG_FILE: &str = "classquiz";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    /// Generation backend URL
    pub endpoint: String,
    pub timeout_secs: u64,
    pub database_path: String,
    pub parser: ParseOptions,
    pub session: SessionOptions,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 120,
            database_path: "classquiz.db".to_string(),
            parser: ParseOptions::default(),
            session: SessionOptions::default(),
        }
    }
}

impl QuizConfig {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let file = Path::new(CONFIG_FILE).with_extension("toml");
        Self::from_sources(file.exists().then_some(file.as_path()))
    }

    /// Build from an optional TOML file plus the environment
    pub fn from_sources(file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).format(config::FileFormat::Toml));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("CLASSQUIZ")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let loaded: QuizConfig = builder.build()?.try_deserialize()?;
        log::debug!("loaded config: endpoint={}", loaded.endpoint);
        Ok(loaded)
    }

    /// Parse a TOML snippet on top of the defaults
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let loaded = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(loaded)
    }
}
