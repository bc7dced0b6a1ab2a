//! 图层
//!
//! 图层按 `order` 升序提交，同序的图层保持创建顺序。
//! 每个图层带有自己的绘制状态：混合方式、采样方式和排序方式。

use serde::{Deserialize, Serialize};

use crate::renderer::DrawCommand;

/// 混合方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    AlphaBlend,
    Additive,
    NonPremultiplied,
    Opaque,
}

/// 纹理采样方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplerMode {
    #[default]
    LinearClamp,
    LinearWrap,
    PointClamp,
    PointWrap,
}

/// 图层内绘制命令的排序方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// 按提交顺序，批量提交
    #[default]
    Deferred,
    /// 按提交顺序，逐条提交
    Immediate,
    /// 深度从大到小
    BackToFront,
    /// 深度从小到大
    FrontToBack,
    /// 按纹理分组
    Texture,
}

/// 图层
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    name: String,
    order: i32,
    pub blend: BlendMode,
    pub sampler: SamplerMode,
    pub sort: SortMode,
}

impl Layer {
    pub fn new(name: impl Into<String>, order: i32) -> Self {
        Self {
            name: name.into(),
            order,
            blend: BlendMode::default(),
            sampler: SamplerMode::default(),
            sort: SortMode::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    pub fn with_sampler(mut self, sampler: SamplerMode) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn with_sort(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }

    /// 按排序方式整理命令（稳定排序）
    pub fn sort_commands(&self, commands: &mut [DrawCommand]) {
        match self.sort {
            SortMode::Deferred | SortMode::Immediate => {}
            SortMode::BackToFront => commands.sort_by(|a, b| b.depth.total_cmp(&a.depth)),
            SortMode::FrontToBack => commands.sort_by(|a, b| a.depth.total_cmp(&b.depth)),
            SortMode::Texture => commands.sort_by(|a, b| a.texture.cmp(&b.texture)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::{Color, Vector2};

    fn command(texture: &str, depth: f32) -> DrawCommand {
        DrawCommand {
            texture: texture.to_string(),
            position: Vector2::zeros(),
            rotation: 0.0,
            scale: 1.0,
            origin: Vector2::zeros(),
            color: Color::WHITE,
            depth,
        }
    }

    fn textures(commands: &[DrawCommand]) -> Vec<&str> {
        commands.iter().map(|c| c.texture.as_str()).collect()
    }

    #[test]
    fn test_default_layer_state() {
        let layer = Layer::new("default", 0);
        assert_eq!(layer.blend, BlendMode::AlphaBlend);
        assert_eq!(layer.sampler, SamplerMode::LinearClamp);
        assert_eq!(layer.sort, SortMode::Deferred);
    }

    #[test]
    fn test_deferred_keeps_submission_order() {
        let layer = Layer::new("default", 0);
        let mut commands = vec![command("b", 0.9), command("a", 0.1)];
        layer.sort_commands(&mut commands);
        assert_eq!(textures(&commands), ["b", "a"]);
    }

    #[test]
    fn test_depth_sorting() {
        let mut commands = vec![command("mid", 0.5), command("front", 0.0), command("back", 1.0)];

        Layer::new("l", 0)
            .with_sort(SortMode::BackToFront)
            .sort_commands(&mut commands);
        assert_eq!(textures(&commands), ["back", "mid", "front"]);

        Layer::new("l", 0)
            .with_sort(SortMode::FrontToBack)
            .sort_commands(&mut commands);
        assert_eq!(textures(&commands), ["front", "mid", "back"]);
    }

    #[test]
    fn test_texture_sorting_is_stable() {
        let layer = Layer::new("l", 0).with_sort(SortMode::Texture);
        let mut commands = vec![command("star", 0.2), command("ship", 0.0), command("star", 0.1)];
        layer.sort_commands(&mut commands);
        assert_eq!(textures(&commands), ["ship", "star", "star"]);
        assert_eq!(commands[1].depth, 0.2);
        assert_eq!(commands[2].depth, 0.1);
    }
}
