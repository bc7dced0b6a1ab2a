//! 组件系统模块
//!
//! 提供 GameObject 层级、可附加组件以及内置的 Transform、Camera、
//! SpriteRenderer 组件。行为组件通过 `Behavior` 能力接收输入。

mod behavior;
mod camera;
#[allow(clippy::module_inception)]
mod component;
mod context;
mod game_object;
mod sprite;
mod transform;

pub use behavior::Behavior;
pub use camera::Camera;
pub use component::{Component, ComponentCell, ComponentLink, ComponentRef, Interfaces};
pub use context::{ComponentContext, FrameContext};
pub use game_object::GameObject;
pub use sprite::SpriteRenderer;
pub use transform::{Placement, Transform};
