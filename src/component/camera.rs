//! Camera 组件
//!
//! 相机所在游戏对象的世界变换决定舞台视图：位置为视图中心，
//! 旋转为视图旋转，缩放与 `zoom` 相乘得到最终缩放。

use super::{Component, Placement};
use crate::renderer::View;

/// Camera 组件
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// 视图缩放（1.0 为原始大小）
    pub zoom: f32,
}

impl Camera {
    /// 创建新的 Camera
    pub fn new() -> Self {
        Self { zoom: 1.0 }
    }

    pub fn with_zoom(zoom: f32) -> Self {
        Self { zoom }
    }

    /// 在相机对象的世界变换下计算视图
    pub fn view(&self, placement: &Placement) -> View {
        View {
            position: placement.position,
            rotation: placement.rotation,
            zoom: self.zoom * placement.scale,
        }
    }
}

impl Component for Camera {}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::GameObject;
    use crate::core::math::Vector2;

    #[test]
    fn test_view_follows_game_object() {
        let rig = GameObject::new("rig").set_position_xy(640.0, 360.0);
        let camera_object = GameObject::new("camera")
            .add_component(Camera::with_zoom(2.0))
            .set_rotation(0.25);
        rig.add_child(&camera_object).unwrap();

        let camera = camera_object.get_component::<Camera>().unwrap().unwrap();
        let view = camera.borrow().view(&camera_object.placement());
        assert_eq!(view.position, Vector2::new(640.0, 360.0));
        assert_eq!(view.rotation, 0.25);
        assert_eq!(view.zoom, 2.0);
    }
}
