//! Configuration types for `cimport.toml`.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::platform::Platform;

/// Root configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Directory holding the module headers, relative to the config file.
    /// Output lands in a per-platform subdirectory underneath it.
    #[serde(default = "default_header_dir")]
    pub header_dir: PathBuf,
    /// Extra include directories passed to the front-end.
    #[serde(default)]
    pub include_paths: Vec<PathBuf>,
    /// Front-end binary override; defaults per platform.
    #[serde(default)]
    pub frontend: Option<String>,
    #[serde(default)]
    pub module: Vec<ModuleConfig>,
}

fn default_header_dir() -> PathBuf {
    PathBuf::from("include")
}

/// A single module: one header, optionally gated to platforms, optionally
/// restricted to the exports of native libraries.
#[derive(Debug, Deserialize)]
pub struct ModuleConfig {
    /// Module name; the header is `<name>.h` and the outputs are
    /// `<name>.pr` and `<name>_sym.pr`.
    pub name: String,
    /// Native libraries whose exported symbols gate the symbol table.
    #[serde(default)]
    pub libs: Vec<String>,
    /// Platforms the module applies to; empty means all.
    #[serde(default)]
    pub platforms: Vec<String>,
}

impl ModuleConfig {
    pub fn enabled_on(&self, platform: Platform) -> bool {
        self.platforms.is_empty()
            || self
                .platforms
                .iter()
                .any(|name| Platform::from_name(name) == Some(platform))
    }
}

/// Load and parse a `cimport.toml` configuration file.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let config: Config = toml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {}", path.display(), e))?;
    Ok(config)
}
