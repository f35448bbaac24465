//! `gitviz.toml` configuration.
//!
//! Every key is optional; missing keys fall back to the defaults below.
//!
//! ```toml
//! [layout]
//! branch_offset = 0.25
//! step = 0.5
//! placeholder = [1.0, 1.0]
//!
//! [extract]
//! recent = 50
//!
//! [figure]
//! title = "Git Visualizer"
//! height = 600
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{GraphError, Result};
use crate::git_backend::ExtractMode;

pub const CONFIG_FILE: &str = "gitviz.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitvizConfig {
    pub layout: LayoutConfig,
    pub extract: ExtractConfig,
    pub figure: FigureConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// X distance between a parent and the first commit of a branch forking from it
    pub branch_offset: f64,
    /// X distance between consecutive commits of one lane
    pub step: f64,
    /// Where a single-commit graph puts its only node
    pub placeholder: [f64; 2],
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            branch_offset: 0.25,
            step: 0.5,
            placeholder: [1.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Only take this many recent commits from the active branch
    pub recent: Option<usize>,
}

impl ExtractConfig {
    pub fn mode(&self) -> ExtractMode {
        match self.recent {
            Some(n) => ExtractMode::Recent(n),
            None => ExtractMode::Full,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    pub title: String,
    pub height: u32,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            title: "Git Visualizer".to_string(),
            height: 600,
        }
    }
}

impl GitvizConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: GitvizConfig =
            toml::from_str(text).map_err(|e| GraphError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Load `gitviz.toml` from `dir` when present, defaults otherwise
    pub fn discover<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let candidate = dir.as_ref().join(CONFIG_FILE);
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "loading config");
            Self::load(candidate)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        let layout = &self.layout;
        if !(layout.step.is_finite() && layout.step > 0.0) {
            return Err(GraphError::Config(format!(
                "layout.step must be positive, got {}",
                layout.step
            )));
        }
        if !(layout.branch_offset.is_finite() && layout.branch_offset >= 0.0) {
            return Err(GraphError::Config(format!(
                "layout.branch_offset must not be negative, got {}",
                layout.branch_offset
            )));
        }
        if layout.placeholder.iter().any(|v| !v.is_finite()) {
            return Err(GraphError::Config("layout.placeholder must be finite".to_string()));
        }
        if self.extract.recent == Some(0) {
            return Err(GraphError::Config("extract.recent must be at least 1".to_string()));
        }
        if self.figure.height == 0 {
            return Err(GraphError::Config("figure.height must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = GitvizConfig::from_toml_str("").unwrap();
        assert_eq!(config, GitvizConfig::default());
        assert_eq!(config.layout.step, 0.5);
        assert_eq!(config.layout.branch_offset, 0.25);
        assert_eq!(config.extract.mode(), ExtractMode::Full);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = GitvizConfig::from_toml_str(
            "[layout]\nstep = 1.0\n\n[extract]\nrecent = 25\n",
        )
        .unwrap();
        assert_eq!(config.layout.step, 1.0);
        assert_eq!(config.layout.branch_offset, 0.25);
        assert_eq!(config.layout.placeholder, [1.0, 1.0]);
        assert_eq!(config.extract.mode(), ExtractMode::Recent(25));
        assert_eq!(config.figure.title, "Git Visualizer");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for text in [
            "[layout]\nstep = 0.0\n",
            "[layout]\nbranch_offset = -1.0\n",
            "[extract]\nrecent = 0\n",
            "[figure]\nheight = 0\n",
            "[layout]\nstep = \"wide\"\n",
        ] {
            assert!(
                matches!(GitvizConfig::from_toml_str(text), Err(GraphError::Config(_))),
                "accepted {:?}",
                text
            );
        }
    }

    #[test]
    fn test_discover_reads_file_in_directory() {
        let dir = TempDir::new().unwrap();
        assert_eq!(GitvizConfig::discover(dir.path()).unwrap(), GitvizConfig::default());

        std::fs::write(dir.path().join(CONFIG_FILE), "[figure]\ntitle = \"History\"\n").unwrap();
        let config = GitvizConfig::discover(dir.path()).unwrap();
        assert_eq!(config.figure.title, "History");
    }
}
