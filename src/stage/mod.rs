//! 游戏舞台模块
//!
//! - `layer`：图层及其绘制状态（混合、采样、排序）
//! - `stage`：单个舞台及其场景
//! - `registry`：舞台注册表和游戏初始化器
//! - `manager`：舞台管理器，负责输入轮询、舞台切换和每帧调度

mod layer;
mod manager;
mod registry;
#[allow(clippy::module_inception)]
mod stage;

/// 每个舞台都有的默认图层名称
pub const DEFAULT_LAYER: &str = "default";

pub use layer::{BlendMode, Layer, SamplerMode, SortMode};
pub use manager::GameStageManager;
pub use registry::{GameInitializer, StageFactory, StageRegistry};
pub use stage::{GameStage, Scene, StageScript, StageState};
