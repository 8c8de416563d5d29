use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "config/serving.yaml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServingConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub preprocessing: PreprocessingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 100 * 1024 * 1024,
            allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelOutput {
    #[default]
    Probability,
    Logit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceChoice {
    #[default]
    Cpu,
    CudaIfAvailable,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: Option<PathBuf>,
    pub output: ModelOutput,
    pub device: DeviceChoice,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    pub raster: RasterConfig,
    pub volumetric: VolumetricConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelOrder {
    #[default]
    Bgr,
    Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RasterLayout {
    #[default]
    Nhwc,
    Nchw,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// `[height, width]`
    pub size: [usize; 2],
    pub channel_order: ChannelOrder,
    pub layout: RasterLayout,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            size: [224, 224],
            channel_order: ChannelOrder::default(),
            layout: RasterLayout::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelAxis {
    #[default]
    None,
    First,
    Last,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumetricConfig {
    /// `[depth, height, width]`
    pub shape: [usize; 3],
    pub channel_axis: ChannelAxis,
    pub extensions: Vec<String>,
}

impl Default for VolumetricConfig {
    fn default() -> Self {
        Self {
            shape: [80, 128, 128],
            channel_axis: ChannelAxis::default(),
            extensions: vec![".nii".to_string(), ".nii.gz".to_string()],
        }
    }
}

impl ServingConfig {
    /// Reads the YAML file at `path`. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = match std::fs::read_to_string(path) {
            Ok(config_str) => serde_yaml::from_str(&config_str)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Config file {} not found, using defaults", path.display());
                ServingConfig::default()
            }
            Err(e) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source: e,
                });
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Applies `MODEL_PATH`, `HOST`, `PORT` and `UPLOAD_DIR` from `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model_path) = lookup("MODEL_PATH") {
            self.model.path = Some(PathBuf::from(model_path));
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::Invalid {
                field: "PORT",
                reason: format!("{port:?} is not a port number"),
            })?;
        }
        if let Some(upload_dir) = lookup("UPLOAD_DIR") {
            self.server.upload_dir = PathBuf::from(upload_dir);
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let raster = &self.preprocessing.raster;
        if raster.size.contains(&0) {
            return Err(ConfigError::Invalid {
                field: "preprocessing.raster.size",
                reason: format!("{:?} has a zero dimension", raster.size),
            });
        }
        let volumetric = &self.preprocessing.volumetric;
        if volumetric.shape.contains(&0) {
            return Err(ConfigError::Invalid {
                field: "preprocessing.volumetric.shape",
                reason: format!("{:?} has a zero dimension", volumetric.shape),
            });
        }
        if volumetric.extensions.is_empty() {
            return Err(ConfigError::Invalid {
                field: "preprocessing.volumetric.extensions",
                reason: "at least one suffix is required".to_string(),
            });
        }
        if let Some(bad) = volumetric
            .extensions
            .iter()
            .find(|ext| !ext.starts_with('.') || ext.len() < 2)
        {
            return Err(ConfigError::Invalid {
                field: "preprocessing.volumetric.extensions",
                reason: format!("{bad:?} must look like \".nii\""),
            });
        }
        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "server.max_upload_bytes",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_yaml_gives_defaults() {
        let config: ServingConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.preprocessing.raster.size, [224, 224]);
        assert_eq!(config.preprocessing.volumetric.shape, [80, 128, 128]);
        assert_eq!(config.preprocessing.volumetric.extensions, vec![".nii", ".nii.gz"]);
        assert_eq!(config.preprocessing.raster.channel_order, ChannelOrder::Bgr);
        assert!(config.model.path.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn partial_yaml_overrides_only_named_fields() {
        let yaml = r#"
preprocessing:
  raster:
    size: [128, 128]
    layout: nchw
  volumetric:
    channel_axis: last
model:
  output: logit
"#;
        let config: ServingConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.preprocessing.raster.size, [128, 128]);
        assert_eq!(config.preprocessing.raster.layout, RasterLayout::Nchw);
        assert_eq!(config.preprocessing.volumetric.channel_axis, ChannelAxis::Last);
        assert_eq!(config.preprocessing.volumetric.shape, [80, 128, 128]);
        assert_eq!(config.model.output, ModelOutput::Logit);
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn zero_target_dimension_is_rejected() {
        let yaml = "preprocessing:\n  volumetric:\n    shape: [0, 128, 128]\n";
        let config: ServingConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "preprocessing.volumetric.shape", .. })
        ));
    }

    #[test]
    fn suffix_without_dot_is_rejected() {
        let mut config = ServingConfig::default();
        config.preprocessing.volumetric.extensions = vec!["nii".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> =
            HashMap::from([("MODEL_PATH", "/models/v2.pt"), ("PORT", "8081"), ("UPLOAD_DIR", "/tmp/up")]);
        let mut config = ServingConfig::default();
        config
            .apply_env_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.model.path, Some(PathBuf::from("/models/v2.pt")));
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.upload_dir, PathBuf::from("/tmp/up"));
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn bad_port_is_a_config_error() {
        let mut config = ServingConfig::default();
        let result = config.apply_env_overrides(|key| (key == "PORT").then(|| "eighty".to_string()));
        assert!(matches!(result, Err(ConfigError::Invalid { field: "PORT", .. })));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServingConfig::load(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config.server.port, 5000);
    }
}
