//! 配置管理模块
//!
//! 提供引擎配置的加载、解析和管理功能。
//! 支持从 TOML 配置文件加载，也支持命令行参数覆盖。
//!
//! # 配置文件格式 (config.toml)
//!
//! ```toml
//! [window]
//! width = 1280
//! height = 720
//! title = "Stagehand"
//!
//! [stages]
//! initial = "title"        # 可选，默认为第一个注册的舞台
//! retain_inactive = false  # 切换舞台时是否保留旧舞台
//! content_root = "content"
//!
//! [timing]
//! target_fps = 60
//! max_frames = 600         # 可选，无头宿主运行的帧数
//!
//! [logging]
//! level = "info"           # trace, debug, info, warn, error
//! file_output = false
//! ```

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, Result};

/// 引擎配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 窗口配置
    #[serde(default)]
    pub window: WindowConfig,

    /// 舞台配置
    #[serde(default)]
    pub stages: StageConfig,

    /// 帧时间配置
    #[serde(default)]
    pub timing: TimingConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 窗口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// 窗口宽度
    #[serde(default = "default_width")]
    pub width: u32,

    /// 窗口高度
    #[serde(default = "default_height")]
    pub height: u32,

    /// 窗口标题
    #[serde(default = "default_title")]
    pub title: String,
}

/// 舞台配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// 初始舞台名称
    #[serde(default)]
    pub initial: Option<String>,

    /// 切换舞台后保留旧舞台（不卸载）
    #[serde(default)]
    pub retain_inactive: bool,

    /// 内容根目录
    #[serde(default = "default_content_root")]
    pub content_root: String,
}

/// 帧时间配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// 目标帧率
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,

    /// 最大帧数（无头运行时使用）
    #[serde(default)]
    pub max_frames: Option<u64>,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default = "default_file_output")]
    pub file_output: bool,

    /// 日志文件路径
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

// 默认值函数
fn default_width() -> u32 { 1280 }
fn default_height() -> u32 { 720 }
fn default_title() -> String { "Stagehand".to_string() }
fn default_content_root() -> String { "content".to_string() }
fn default_target_fps() -> u32 { 60 }
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_file_output() -> bool { false }
fn default_log_file() -> String { "stagehand.log".to_string() }

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            title: default_title(),
        }
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            initial: None,
            retain_inactive: false,
            content_root: default_content_root(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            target_fps: default_target_fps(),
            max_frames: None,
        }
    }
}

impl TimingConfig {
    /// 固定帧间隔
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.target_fps.max(1)))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: default_file_output(),
            log_file: default_log_file(),
        }
    }
}

impl FromStr for Config {
    type Err = super::error::EngineError;

    fn from_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }
}

impl Config {
    /// 从配置文件加载
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path_str))?;

        contents.parse()
    }

    /// 从配置文件加载，如果文件不存在或无效则使用默认配置
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::from_file(path) {
            Ok(config) => {
                tracing::info!("Loaded config from: {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("Failed to load config: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// 从命令行参数覆盖配置
    ///
    /// 支持的参数：
    /// - `--stage <name>`: 初始舞台
    /// - `--frames <n>`: 运行的帧数
    /// - `--width <value>` / `--height <value>`: 视口尺寸
    /// - `--retain-stages`: 切换舞台时保留旧舞台
    pub fn apply_args<I>(&mut self, args: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
        let value_of = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .and_then(|idx| args.get(idx + 1))
        };

        if let Some(stage) = value_of("--stage") {
            self.stages.initial = Some(stage.clone());
        }

        if let Some(frames) = value_of("--frames").and_then(|v| v.parse().ok()) {
            self.timing.max_frames = Some(frames);
        }

        if let Some(width) = value_of("--width").and_then(|v| v.parse().ok()) {
            self.window.width = width;
        }

        if let Some(height) = value_of("--height").and_then(|v| v.parse().ok()) {
            self.window.height = height;
        }

        if args.iter().any(|a| a == "--retain-stages") {
            self.stages.retain_inactive = true;
        }
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "window.width/height".to_string(),
                reason: "Window dimensions must be greater than 0".to_string(),
            }
            .into());
        }

        if self.timing.target_fps == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timing.target_fps".to_string(),
                reason: "Target frame rate must be greater than 0".to_string(),
            }
            .into());
        }

        if matches!(&self.stages.initial, Some(name) if name.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "stages.initial".to_string(),
                reason: "Initial stage name must not be empty".to_string(),
            }
            .into());
        }

        Ok(())
    }
}
