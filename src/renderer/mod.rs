//! 渲染器模块
//!
//! 场景本身不直接调用图形 API。每帧渲染分两步：
//!
//! 1. 沿层级收集：每个暴露 `dyn Renderer` 的组件把绘制命令放进 `RenderQueue`，
//!    按图层名称分组；
//! 2. 提交：舞台按图层顺序把命令交给 `RenderBackend`。
//!
//! # 架构设计
//!
//! - `Renderer`：产生绘制命令的组件能力
//! - `RenderBackend`：统一的后端接口（见 `backend_trait`）
//! - `HeadlessBackend`：只记录提交内容的后端，用于无头运行和测试

use std::collections::HashMap;
use std::rc::Rc;

use crate::component::{Component, ComponentCell, Interfaces, Placement};
use crate::core::math::{Color, Vector2};
use crate::core::time::GameTime;

pub mod backend_trait;
pub mod headless;

pub use backend_trait::RenderBackend;
pub use headless::{HeadlessBackend, RecordedFrame, RecordedLayer};

/// 一条绘制命令
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    /// 纹理的内容键
    pub texture: String,
    /// 世界位置
    pub position: Vector2,
    /// 旋转（弧度）
    pub rotation: f32,
    pub scale: f32,
    /// 纹理内的旋转/缩放原点（像素）
    pub origin: Vector2,
    pub color: Color,
    /// 排序深度，0.0 在前，1.0 在后
    pub depth: f32,
}

/// 按图层名称分组的绘制命令
#[derive(Debug, Default)]
pub struct RenderQueue {
    layers: HashMap<String, Vec<DrawCommand>>,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 向图层追加一条命令（保持提交顺序）
    pub fn push(&mut self, layer: &str, command: DrawCommand) {
        self.layers
            .entry(layer.to_string())
            .or_default()
            .push(command);
    }

    /// 取出某个图层的全部命令
    pub fn take(&mut self, layer: &str) -> Vec<DrawCommand> {
        self.layers.remove(layer).unwrap_or_default()
    }

    /// 有命令的图层名称
    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.layers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.values().all(Vec::is_empty)
    }
}

/// 舞台视图（来自相机）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    /// 视图中心的世界位置
    pub position: Vector2,
    pub rotation: f32,
    pub zoom: f32,
}

impl View {
    pub fn identity() -> Self {
        Self {
            position: Vector2::zeros(),
            rotation: 0.0,
            zoom: 1.0,
        }
    }
}

impl Default for View {
    fn default() -> Self {
        Self::identity()
    }
}

/// 产生绘制命令的组件
///
/// 实现者需要在 `Component::interfaces` 中调用 `table.renderer()`。
pub trait Renderer: Component {
    /// 目标图层名称
    fn layer(&self) -> &str;

    /// 在世界变换 `placement` 下生成绘制命令
    fn render(&self, placement: &Placement, time: &GameTime, queue: &mut RenderQueue);
}

fn as_renderer<T: Renderer>(cell: Rc<ComponentCell<T>>) -> Rc<ComponentCell<dyn Renderer>> {
    cell
}

impl<T: Renderer> Interfaces<'_, T> {
    /// 以 `dyn Renderer` 暴露组件
    pub fn renderer(&mut self) -> &mut Self {
        self.expose(as_renderer::<T>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(texture: &str) -> DrawCommand {
        DrawCommand {
            texture: texture.to_string(),
            position: Vector2::zeros(),
            rotation: 0.0,
            scale: 1.0,
            origin: Vector2::zeros(),
            color: Color::WHITE,
            depth: 0.0,
        }
    }

    #[test]
    fn test_queue_groups_by_layer() {
        let mut queue = RenderQueue::new();
        queue.push("default", command("ship"));
        queue.push("particles", command("smoke"));
        queue.push("default", command("enemy"));

        assert_eq!(queue.len(), 3);
        let default = queue.take("default");
        assert_eq!(
            default.iter().map(|c| c.texture.as_str()).collect::<Vec<_>>(),
            ["ship", "enemy"]
        );
        assert!(queue.take("default").is_empty());
        assert_eq!(queue.layer_names().collect::<Vec<_>>(), ["particles"]);
    }
}
