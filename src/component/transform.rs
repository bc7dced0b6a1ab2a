//! Transform 组件
//!
//! 管理游戏对象在二维空间中的局部位置、旋转和缩放。
//! 世界变换沿父链组合：位置相加，旋转（弧度）相加，缩放相乘。

use super::Component;
use crate::core::math::Vector2;

/// 位置、旋转和缩放的组合
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vector2,
    /// 旋转（弧度）
    pub rotation: f32,
    pub scale: f32,
}

impl Placement {
    /// 单位变换
    pub fn identity() -> Self {
        Self {
            position: Vector2::zeros(),
            rotation: 0.0,
            scale: 1.0,
        }
    }

    pub fn new(position: Vector2, rotation: f32, scale: f32) -> Self {
        Self { position, rotation, scale }
    }

    /// 在当前（父级）变换下组合一个局部变换
    pub fn compose(&self, local: &Placement) -> Placement {
        Placement {
            position: self.position + local.position,
            rotation: self.rotation + local.rotation,
            scale: self.scale * local.scale,
        }
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::identity()
    }
}

/// Transform 组件
///
/// 只保存局部值；世界值由 `GameObject` 的代理方法沿父链解析。
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// 相对父对象的位置
    pub local_position: Vector2,

    /// 相对父对象的旋转（弧度）
    pub local_rotation: f32,

    /// 相对父对象的缩放
    pub local_scale: f32,
}

impl Transform {
    /// 创建新的 Transform 组件
    pub fn new() -> Self {
        Self {
            local_position: Vector2::zeros(),
            local_rotation: 0.0,
            local_scale: 1.0,
        }
    }

    /// 创建带位置的 Transform
    pub fn with_position(position: Vector2) -> Self {
        Self {
            local_position: position,
            ..Self::new()
        }
    }

    /// 设置位置（分量形式）
    pub fn set_local_position_xy(&mut self, x: f32, y: f32) {
        self.local_position = Vector2::new(x, y);
    }

    /// 添加位置偏移
    pub fn translate(&mut self, offset: Vector2) {
        self.local_position += offset;
    }

    /// 添加旋转偏移（弧度）
    pub fn rotate(&mut self, radians: f32) {
        self.local_rotation += radians;
    }

    /// 局部变换
    pub fn local(&self) -> Placement {
        Placement::new(self.local_position, self.local_rotation, self.local_scale)
    }

    /// 设置局部值，使得在 `parent` 下得到给定的世界位置
    pub fn set_world_position(&mut self, parent: &Placement, position: Vector2) {
        self.local_position = position - parent.position;
    }

    pub fn set_world_rotation(&mut self, parent: &Placement, rotation: f32) {
        self.local_rotation = rotation - parent.rotation;
    }

    /// 父级缩放为 0 时无法反解，直接保存给定值
    pub fn set_world_scale(&mut self, parent: &Placement, scale: f32) {
        self.local_scale = if parent.scale == 0.0 {
            scale
        } else {
            scale / parent.scale
        };
    }
}

impl Component for Transform {}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::{approx_eq, approx_eq_vec};

    #[test]
    fn test_compose() {
        let parent = Placement::new(Vector2::new(5.0, 5.0), 0.5, 2.0);
        let local = Placement::new(Vector2::new(10.0, 10.0), 0.25, 1.5);
        let world = parent.compose(&local);

        assert!(approx_eq_vec(world.position, Vector2::new(15.0, 15.0)));
        assert!(approx_eq(world.rotation, 0.75));
        assert!(approx_eq(world.scale, 3.0));
    }

    #[test]
    fn test_identity_is_neutral() {
        let local = Placement::new(Vector2::new(3.0, -4.0), 1.0, 0.5);
        assert_eq!(Placement::identity().compose(&local), local);
    }

    #[test]
    fn test_world_setters_invert_composition() {
        let parent = Placement::new(Vector2::new(5.0, 5.0), 1.0, 4.0);
        let mut transform = Transform::new();
        transform.set_world_position(&parent, Vector2::new(15.0, 20.0));
        transform.set_world_rotation(&parent, 1.5);
        transform.set_world_scale(&parent, 2.0);

        let world = parent.compose(&transform.local());
        assert!(approx_eq_vec(world.position, Vector2::new(15.0, 20.0)));
        assert!(approx_eq(world.rotation, 1.5));
        assert!(approx_eq(world.scale, 2.0));
    }

    #[test]
    fn test_world_scale_under_zero_parent_scale() {
        let parent = Placement::new(Vector2::zeros(), 0.0, 0.0);
        let mut transform = Transform::new();
        transform.set_world_scale(&parent, 3.0);
        assert_eq!(transform.local_scale, 3.0);
    }
}
