//! 核心功能模块
//!
//! 提供引擎的基础功能：数学类型、帧时间、输入控件、日志系统、
//! 配置管理和错误处理。这些模块不依赖舞台和组件系统。
//!
//! # 模块组织
//!
//! - `math`：二维向量和颜色
//! - `time`：帧时间 `GameTime`
//! - `input`：输入控件注册表和设备轮询
//! - `log`：日志系统，提供结构化的日志记录功能
//! - `config`：配置管理，支持从配置文件加载引擎设置
//! - `error`：错误处理，定义统一的错误类型

pub mod config;
pub mod error;
pub mod input;
pub mod log;
pub mod math;
pub mod time;

// 重新导出常用类型，方便使用
pub use config::Config;
pub use error::{EngineError, Result};
pub use input::{Binding, Control, Input, InputDevice, KeyboardMouse};
pub use math::{Color, Vector2};
pub use time::GameTime;
