//! Behavior 能力
//!
//! 行为组件在每帧 `update` 之前收到输入，可以通过 `ComponentContext`
//! 读取内容、默认图层，或请求销毁所属对象。

use std::rc::Rc;

use super::component::{Component, ComponentCell, Interfaces};
use super::context::ComponentContext;
use crate::core::input::Input;

/// 行为组件
///
/// 实现者还需要在 `Component::interfaces` 中调用 `table.behavior()`，
/// 游戏对象才会把它当作行为组件派发输入。
pub trait Behavior: Component {
    /// 处理输入（每帧在 `update` 之前调用，仅当本帧有输入时）
    fn handle_input(&mut self, _ctx: &ComponentContext<'_>, _input: &Input) {}
}

fn as_behavior<T: Behavior>(cell: Rc<ComponentCell<T>>) -> Rc<ComponentCell<dyn Behavior>> {
    cell
}

impl<T: Behavior> Interfaces<'_, T> {
    /// 以 `dyn Behavior` 暴露组件
    pub fn behavior(&mut self) -> &mut Self {
        self.expose(as_behavior::<T>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{FrameContext, GameObject};
    use crate::core::input::Control;
    use crate::core::time::GameTime;
    use crate::testing::{Counter, RecordingBehavior};
    use winit::keyboard::KeyCode;

    #[test]
    fn test_behavior_is_queryable_as_trait_object() {
        let go = GameObject::new("ship")
            .add_component(RecordingBehavior::default())
            .add_component(Counter::default());

        let behaviors = go.get_components::<dyn Behavior>();
        assert_eq!(behaviors.len(), 1);
        assert!(go.get_component::<dyn Behavior>().unwrap().is_some());
    }

    #[test]
    fn test_handle_input_runs_only_with_input() {
        let recorder = crate::component::ComponentRef::new(RecordingBehavior::default());
        let go = GameObject::new("ship");
        go.attach_component(&recorder).unwrap();

        go.update(&FrameContext::new(GameTime::default()));
        assert_eq!(recorder.borrow().inputs, 0);
        assert_eq!(recorder.borrow().updates, 1);

        let mut input = Input::new();
        input.add_control(Control::button("fire", [KeyCode::Space])).unwrap();
        go.update(&FrameContext::new(GameTime::default()).with_input(&input));
        assert_eq!(recorder.borrow().inputs, 1);
        assert_eq!(recorder.borrow().updates, 2);
    }

    #[test]
    fn test_destroy_from_behavior() {
        let parent = GameObject::new("root");
        let child = GameObject::new("ship").add_component(RecordingBehavior::destroying());
        parent.add_child(&child).unwrap();

        parent.update(&FrameContext::new(GameTime::default()));
        assert!(child.is_destroyed());
        assert!(child.parent().is_none());
        assert_eq!(parent.child_count(), 0);
    }
}
