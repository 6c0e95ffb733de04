mod loader;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use loader::load_config;

use crate::output::PostProcess;
use crate::sampler::SamplingStrategy;
use crate::scene::{Scene, SceneEntry};
use crate::scenes;
use crate::tracer::TraceConfig;
use crate::{DEFAULT_SAMPLES, DEFAULT_SIZE};

/// Complete description of one render
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderConfig {
    #[serde(default = "default_size")]
    pub width: u32,
    #[serde(default = "default_size")]
    pub height: u32,
    /// Directions traced per pixel
    #[serde(default = "default_samples")]
    pub samples: u32,
    #[serde(default)]
    pub strategy: SamplingStrategy,
    /// Base seed for the per-row random streams; drawn at random when absent
    #[serde(default)]
    pub seed: Option<u64>,
    /// Worker threads; the global rayon pool is used when absent
    #[serde(default)]
    pub threads: Option<usize>,
    #[serde(default)]
    pub tracer: TraceConfig,
    #[serde(default)]
    pub post: PostProcess,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Built-in scene name or an inline list of entries
    #[serde(default)]
    pub scene: Option<SceneSource>,
}

/// Where the scene geometry comes from
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SceneSource {
    Preset(String),
    Entries(Vec<SceneEntry>),
}

fn default_size() -> u32 {
    DEFAULT_SIZE
}

fn default_samples() -> u32 {
    DEFAULT_SAMPLES
}

fn default_output() -> PathBuf {
    PathBuf::from("light2d.png")
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: default_size(),
            height: default_size(),
            samples: default_samples(),
            strategy: SamplingStrategy::default(),
            seed: None,
            threads: None,
            tracer: TraceConfig::default(),
            post: PostProcess::default(),
            output: default_output(),
            scene: None,
        }
    }
}

impl RenderConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        load_config(path)
    }

    /// Load configuration with fallback to the default locations, then to defaults
    pub fn load_or_default(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) => Self::from_file(path),
            None => {
                let default_paths = ["light2d.yaml", "light2d.yml"];
                for p in default_paths {
                    let path = Path::new(p);
                    if path.exists() {
                        return Self::from_file(path);
                    }
                }
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Validation(format!(
                "image size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.samples == 0 {
            return Err(ConfigError::Validation("samples must be at least 1".to_string()));
        }
        if self.threads == Some(0) {
            return Err(ConfigError::Validation("threads must be at least 1".to_string()));
        }
        self.tracer.validate()?;
        Ok(())
    }

    /// Name used in logs for the configured scene
    pub fn scene_name(&self) -> &str {
        match &self.scene {
            Some(SceneSource::Preset(name)) => name,
            Some(SceneSource::Entries(_)) => "custom",
            None => scenes::DEFAULT_SCENE,
        }
    }

    /// Build the scene this configuration refers to
    pub fn build_scene(&self) -> Result<Scene, ConfigError> {
        match &self.scene {
            Some(SceneSource::Entries(entries)) => Scene::new(entries.clone()),
            Some(SceneSource::Preset(name)) => scenes::find(name)?.scene(),
            None => scenes::find(scenes::DEFAULT_SCENE)?.scene(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Unknown scene '{0}'")]
    UnknownScene(String),
}
