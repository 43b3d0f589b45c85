use std::fmt;
use std::path::PathBuf;

use ::config::{Config, ConfigError, Environment, File, FileFormat, FileSourceFile};
use serde::Deserialize;

use crate::domain::model::YoloParams;

pub const CONFIG_FILE: &str = "elevate-vision";

/// Deployment settings. The detection settings a user picks live in `Settings`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub models: ModelsConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Directory holding `yolov8{n,m,l}.onnx`.
    pub dir: PathBuf,
    pub input_size: u32,
    pub iou_threshold: f32,
    pub max_detections: usize,
    pub intra_threads: usize,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RenderConfig {
    /// TrueType font for box labels; boxes are drawn without text when unset.
    pub font_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
            static_dir: PathBuf::from("static"),
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        let yolo = YoloParams::default();
        Self {
            dir: PathBuf::from("models"),
            input_size: yolo.input_size,
            iou_threshold: yolo.iou_threshold,
            max_detections: yolo.max_detections,
            intra_threads: 4,
        }
    }
}

impl ModelsConfig {
    pub fn yolo_params(&self) -> YoloParams {
        YoloParams {
            input_size: self.input_size,
            iou_threshold: self.iou_threshold,
            max_detections: self.max_detections,
        }
    }
}

impl fmt::Display for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl AppConfig {
    /// Loads `elevate-vision.toml` (optional) and `VISION__*` overrides on top of the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources(File::with_name(CONFIG_FILE).required(false))
    }

    pub fn from_sources(file: File<FileSourceFile, FileFormat>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix("VISION").separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn addr(&self) -> String {
        self.server.to_string()
    }
}
