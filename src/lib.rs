//! Stagehand - 二维场景图引擎
//!
//! 游戏由若干舞台（`GameStage`）组成，每个舞台持有一棵 `GameObject` 层级。
//! 游戏对象上附加组件：`Transform` 决定位置、旋转和缩放，
//! 行为组件（`Behavior`）响应输入，渲染组件（`Renderer`）按图层提交绘制命令。
//! `GameStageManager` 负责注册舞台、轮询输入和切换舞台。
//!
//! # 模块结构
//!
//! - `core`: 核心功能模块（数学、时间、输入、日志、配置、错误处理）
//! - `component`: 游戏对象和组件
//! - `content`: 按键名加载的内容（纹理、文本）
//! - `renderer`: 绘制命令、渲染后端接口和无窗口后端
//! - `stage`: 图层、舞台和舞台管理器
//!
//! # 使用示例
//!
//! ```
//! use stagehand::component::GameObject;
//! use stagehand::core::math::Vector2;
//!
//! let world = GameObject::new("world").set_position_xy(5.0, 5.0);
//! let player = GameObject::new("player").set_local_position(Vector2::new(10.0, 10.0));
//! world.add_child(&player).unwrap();
//!
//! assert_eq!(player.position(), Vector2::new(15.0, 15.0));
//! ```

pub mod component;
pub mod content;
pub mod core;
pub mod renderer;
pub mod stage;

#[cfg(test)]
mod testing;
