use std::path::Path;

use super::{ConfigError, RenderConfig};

/// Load and validate configuration from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RenderConfig, ConfigError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }

    let content = std::fs::read_to_string(path)?;
    let config: RenderConfig = serde_yaml::from_str(&content)?;
    config.validate()?;

    Ok(config)
}
