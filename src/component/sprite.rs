//! SpriteRenderer 组件
//!
//! 在所属对象的世界变换处绘制一张纹理。

use std::rc::Rc;

use super::{Component, Interfaces, Placement};
use crate::content::Texture;
use crate::core::math::{Color, Vector2};
use crate::core::time::GameTime;
use crate::renderer::{DrawCommand, RenderQueue, Renderer};
use crate::stage::DEFAULT_LAYER;

/// 精灵渲染组件
#[derive(Debug, Clone)]
pub struct SpriteRenderer {
    layer: String,
    texture: Rc<Texture>,
    /// 着色
    pub color: Color,
    /// 旋转和缩放的原点（像素），默认为纹理中心
    pub origin: Vector2,
    /// 图层内的排序深度
    pub depth: f32,
}

impl SpriteRenderer {
    /// 在默认图层上创建
    pub fn new(texture: Rc<Texture>) -> Self {
        Self::on_layer(DEFAULT_LAYER, texture)
    }

    /// 在指定图层上创建
    pub fn on_layer(layer: impl Into<String>, texture: Rc<Texture>) -> Self {
        let origin = Vector2::new(texture.width() as f32 * 0.5, texture.height() as f32 * 0.5);
        Self {
            layer: layer.into(),
            texture,
            color: Color::WHITE,
            origin,
            depth: 0.0,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_depth(mut self, depth: f32) -> Self {
        self.depth = depth;
        self
    }

    pub fn texture(&self) -> &Rc<Texture> {
        &self.texture
    }

    pub fn set_texture(&mut self, texture: Rc<Texture>) {
        self.texture = texture;
    }

    pub fn set_layer(&mut self, layer: impl Into<String>) {
        self.layer = layer.into();
    }
}

impl Component for SpriteRenderer {
    fn interfaces(table: &mut Interfaces<'_, Self>) {
        table.renderer();
    }
}

impl Renderer for SpriteRenderer {
    fn layer(&self) -> &str {
        &self.layer
    }

    fn render(&self, placement: &Placement, _time: &GameTime, queue: &mut RenderQueue) {
        queue.push(
            &self.layer,
            DrawCommand {
                texture: self.texture.key().to_string(),
                position: placement.position,
                rotation: placement.rotation,
                scale: placement.scale,
                origin: self.origin,
                color: self.color,
                depth: self.depth,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::GameObject;

    #[test]
    fn test_sprite_draws_at_world_placement() {
        let texture = Rc::new(Texture::solid("ship", 8, 4, Color::WHITE));
        let parent = GameObject::new("fleet").set_position_xy(100.0, 50.0).set_scale(2.0);
        let ship = GameObject::new("ship")
            .set_local_position(Vector2::new(10.0, 0.0))
            .set_rotation(0.5)
            .add_component(SpriteRenderer::on_layer("ships", texture).with_depth(0.3));
        parent.add_child(&ship).unwrap();

        let mut queue = RenderQueue::new();
        parent.render(&GameTime::default(), &mut queue);

        let commands = queue.take("ships");
        assert_eq!(commands.len(), 1);
        let command = &commands[0];
        assert_eq!(command.texture, "ship");
        assert_eq!(command.position, Vector2::new(110.0, 50.0));
        assert_eq!(command.rotation, 0.5);
        assert_eq!(command.scale, 2.0);
        assert_eq!(command.origin, Vector2::new(4.0, 2.0));
        assert_eq!(command.depth, 0.3);
    }

    #[test]
    fn test_disabled_sprite_is_not_drawn() {
        let texture = Rc::new(Texture::solid("star", 1, 1, Color::WHITE));
        let star = GameObject::new("star").add_component(SpriteRenderer::new(texture));
        let sprite = star.get_component::<dyn Renderer>().unwrap().unwrap();
        assert_eq!(sprite.borrow().layer(), DEFAULT_LAYER);

        sprite.set_enabled(false);
        let mut queue = RenderQueue::new();
        star.render(&GameTime::default(), &mut queue);
        assert!(queue.is_empty());
    }
}
