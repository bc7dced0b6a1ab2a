//! 日志
//!
//! 引擎内部和游戏代码使用两个固定的 target，便于用 `RUST_LOG` 分别过滤：
//!
//! - `stagehand::engine`：舞台加载、切换等引擎事件（`engine_*!`）
//! - `stagehand::app`：宿主和游戏脚本（`app_*!`）
//!
//! 其余模块直接使用 `tracing` 的宏，target 为模块路径。
//!
//! ```ignore
//! use stagehand::core::log::{self, LogLevel};
//!
//! log::init_logger(LogLevel::Info, false, None);
//! stagehand::engine_info!(stage = "main", "Stage activated");
//! ```
//!
//! ```bash
//! RUST_LOG=stagehand::engine=debug,stagehand::app=warn cargo run
//! ```

use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

pub use super::config::LogLevel;

const DEFAULT_LOG_FILE: &str = "stagehand.log";

/// 初始化日志系统
///
/// 只能调用一次。`RUST_LOG` 存在时优先于 `level`。
/// `file_output` 为 true 时额外写入按天滚动的日志文件
/// （`log_file_path` 缺省为 `stagehand.log`）。
pub fn init_logger(level: LogLevel, file_output: bool, log_file_path: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true);

    let file_layer = file_output.then(|| {
        let (directory, filename) = split_log_path(log_file_path.unwrap_or(DEFAULT_LOG_FILE));
        fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_writer(RollingFileAppender::new(Rotation::DAILY, directory, filename))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();
}

/// 拆分为滚动日志的目录和文件名前缀
fn split_log_path(path: &str) -> (PathBuf, String) {
    let path = Path::new(path);
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(DEFAULT_LOG_FILE)
        .to_string();
    (directory, filename)
}

/// 引擎核心日志 - Info 级别
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {
        tracing::info!(target: "stagehand::engine", $($arg)*)
    };
}

/// 引擎核心日志 - Warn 级别
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {
        tracing::warn!(target: "stagehand::engine", $($arg)*)
    };
}

/// 引擎核心日志 - Error 级别
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {
        tracing::error!(target: "stagehand::engine", $($arg)*)
    };
}

/// 应用层日志 - Info 级别
#[macro_export]
macro_rules! app_info {
    ($($arg:tt)*) => {
        tracing::info!(target: "stagehand::app", $($arg)*)
    };
}

/// 应用层日志 - Warn 级别
#[macro_export]
macro_rules! app_warn {
    ($($arg:tt)*) => {
        tracing::warn!(target: "stagehand::app", $($arg)*)
    };
}

/// 应用层日志 - Error 级别
#[macro_export]
macro_rules! app_error {
    ($($arg:tt)*) => {
        tracing::error!(target: "stagehand::app", $($arg)*)
    };
}

impl LogLevel {
    /// 对应的 `EnvFilter` 指令
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// 日志级别转换
impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(Level::from(LogLevel::Info), Level::INFO);
        assert_eq!(Level::from(LogLevel::Error), Level::ERROR);
    }

    #[test]
    fn test_split_log_path() {
        assert_eq!(
            split_log_path("logs/engine.log"),
            (PathBuf::from("logs"), "engine.log".to_string())
        );
        assert_eq!(
            split_log_path("stagehand.log"),
            (PathBuf::from("."), "stagehand.log".to_string())
        );
        assert_eq!(split_log_path("logs/").1, "logs");
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(LogLevel::Debug.as_filter(), "debug");
        assert_eq!(LogLevel::Warn.as_filter(), "warn");
    }
}
