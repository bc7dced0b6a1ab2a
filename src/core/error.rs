//! 错误处理模块
//!
//! 定义了引擎中使用的统一错误类型，使用 `thiserror` 提供友好的错误消息。
//!
//! # 错误分类
//!
//! - **层级完整性错误**：自我父子化、形成环，在变更发生前同步返回
//! - **查询歧义错误**：单结果查询匹配到多个组件
//! - **注册错误**：重复的控件键、重复的舞台名称、没有注册任何舞台
//! - **资源缺失错误**：访问未加载的内容、未注册的控件、不存在的图层
//!
//! 外部后端（渲染、内容解码）产生的错误通过 `External` 原样向上传播。

use std::path::PathBuf;

use thiserror::Error;

/// 引擎统一的 Result 类型
///
/// 所有可能返回错误的函数都应该使用这个类型。
pub type Result<T> = std::result::Result<T, EngineError>;

/// Stagehand 引擎的错误类型
#[derive(Debug, Error)]
pub enum EngineError {
    /// 场景层级错误
    #[error("Hierarchy error: {0}")]
    Hierarchy(#[from] HierarchyError),

    /// 单结果组件查询匹配到了多个组件
    #[error("Found {count} components matching `{type_name}`, expected at most one")]
    AmbiguousComponent {
        type_name: &'static str,
        count: usize,
    },

    /// 注册错误
    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// 资源访问错误
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 外部协作者（渲染后端、内容解码器）的错误
    #[error(transparent)]
    External(#[from] anyhow::Error),
}

/// 场景层级相关的错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HierarchyError {
    /// 试图把对象添加为自己的子对象
    #[error("game object '{0}' cannot be its own child")]
    SelfParenting(String),

    /// 添加子对象会形成环
    #[error("adding '{child}' under '{parent}' would create a cycle")]
    Cycle { parent: String, child: String },

    /// 已经是该对象的子对象
    #[error("'{child}' is already a child of '{parent}'")]
    AlreadyChild { parent: String, child: String },

    /// 对象已被销毁
    #[error("game object '{0}' has been destroyed")]
    Destroyed(String),

    /// 组件已附加到其他对象
    #[error("component '{0}' is already attached to a game object")]
    ComponentAttached(String),
}

/// 注册相关的错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    /// 重复的控件键
    #[error("duplicate control key '{0}'")]
    DuplicateControl(String),

    /// 重复的舞台名称
    #[error("duplicate game stage '{0}'")]
    DuplicateStage(String),

    /// 重复的图层名称
    #[error("duplicate layer '{0}'")]
    DuplicateLayer(String),

    /// 初始化时没有注册任何舞台
    #[error("at least one game stage must be registered before initialization")]
    NoStages,

    /// 未注册的舞台
    #[error("there is no registered game stage named '{0}'")]
    UnknownStage(String),
}

/// 资源访问相关的错误
#[derive(Debug, Error)]
pub enum ResourceError {
    /// 请求的内容从未加载
    #[error("content '{0}' has not been loaded")]
    ContentNotLoaded(String),

    /// 内容源中找不到对应的数据
    #[error("content '{key}' not found at {}", .path.display())]
    ContentNotFound { key: String, path: PathBuf },

    /// 内容已加载，但类型与请求不符
    #[error("content '{key}' is not of type `{expected}`")]
    ContentTypeMismatch { key: String, expected: &'static str },

    /// 当前帧上下文没有可用的内容管理器
    #[error("no content manager is available in this context")]
    ContentUnavailable,

    /// 未注册的控件
    #[error("there is no registered control with key '{0}'")]
    ControlNotFound(String),

    /// 渲染器引用了不存在的图层
    #[error("layer '{0}' does not exist in this stage")]
    LayerNotFound(String),
}

/// 配置相关的错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件未找到
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    /// 配置文件解析失败
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// 配置值无效
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err: EngineError = HierarchyError::SelfParenting("ship".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Hierarchy error: game object 'ship' cannot be its own child"
        );

        let err: EngineError = RegistrationError::NoStages.into();
        assert!(err.to_string().contains("at least one game stage"));

        let err = EngineError::AmbiguousComponent {
            type_name: "Transform",
            count: 2,
        };
        assert_eq!(
            err.to_string(),
            "Found 2 components matching `Transform`, expected at most one"
        );
    }

    #[test]
    fn test_external_error_is_transparent() {
        let err: EngineError = anyhow::anyhow!("device lost").into();
        assert_eq!(err.to_string(), "device lost");
    }
}
