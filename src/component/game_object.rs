//! GameObject 组件容器
//!
//! 管理游戏对象的组件和子对象，并在每帧把更新和渲染沿层级向下传播。
//!
//! `GameObject` 是一个廉价可克隆的句柄，相等性比较的是句柄身份。
//! 父对象强引用子对象，子对象只弱引用父对象，因此层级本身不会形成引用环。
//!
//! # 遍历期间的修改
//!
//! 更新遍历的是组件列表和子对象列表的快照：
//! - 遍历期间移除组件只会打上待移除标记，遍历结束后统一移除；
//! - 遍历期间添加的组件下一帧才会被更新；
//! - 遍历期间被移走或销毁的子对象会被跳过。

use std::any::type_name;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use super::behavior::Behavior;
use super::component::{Component, ComponentRef, ComponentSlot};
use super::context::{ComponentContext, FrameContext};
use super::transform::{Placement, Transform};
use crate::core::error::{EngineError, HierarchyError, Result};
use crate::core::math::Vector2;
use crate::core::time::GameTime;
use crate::renderer::{RenderQueue, Renderer};

pub(crate) struct GameObjectInner {
    name: String,
    enabled: bool,
    destroyed: bool,
    parent: Weak<RefCell<GameObjectInner>>,
    children: Vec<GameObject>,
    components: Vec<Rc<ComponentSlot>>,
    /// 正在进行的组件遍历层数
    updating: u32,
    /// 最近一次更新所在的遍历编号
    last_pass: u64,
}

/// GameObject - 游戏对象
///
/// 作为组件容器和层级节点，可以添加、移除和查询组件与子对象
#[derive(Clone)]
pub struct GameObject {
    inner: Rc<RefCell<GameObjectInner>>,
}

impl GameObject {
    /// 创建新的 GameObject
    ///
    /// # 参数
    /// - `name`: 游戏对象名称，用于日志和查找
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(GameObjectInner {
                name: name.into(),
                enabled: true,
                destroyed: false,
                parent: Weak::new(),
                children: Vec::new(),
                components: Vec::new(),
                updating: 0,
                last_pass: 0,
            })),
        }
    }

    pub(crate) fn from_inner(inner: Rc<RefCell<GameObjectInner>>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<RefCell<GameObjectInner>> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn inner_ptr(&self) -> *const RefCell<GameObjectInner> {
        Rc::as_ptr(&self.inner)
    }

    /// 获取名称
    pub fn name(&self) -> String {
        self.inner.borrow().name.clone()
    }

    /// 设置名称
    pub fn set_name(&self, name: impl Into<String>) -> GameObject {
        self.inner.borrow_mut().name = name.into();
        self.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.borrow().enabled
    }

    /// 禁用的对象及其子树不会被更新和渲染
    pub fn set_enabled(&self, enabled: bool) -> GameObject {
        self.inner.borrow_mut().enabled = enabled;
        self.clone()
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.borrow().destroyed
    }

    // ========== 层级管理 ==========

    /// 父对象
    pub fn parent(&self) -> Option<GameObject> {
        self.inner.borrow().parent.upgrade().map(Self::from_inner)
    }

    /// 子对象（按添加顺序）
    pub fn children(&self) -> Vec<GameObject> {
        self.inner.borrow().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.inner.borrow().children.len()
    }

    /// 添加子对象
    ///
    /// 子对象如果已有父对象，会先从旧父对象上移除。
    ///
    /// # 错误
    /// - 把自己添加为子对象
    /// - 任一方已被销毁
    /// - 已经是本对象的子对象
    /// - 本对象是 `child` 的后代（会形成环）
    ///
    /// 出错时层级不会有任何变化。
    pub fn add_child(&self, child: &GameObject) -> Result<GameObject> {
        if self == child {
            return Err(HierarchyError::SelfParenting(self.name()).into());
        }
        if self.is_destroyed() {
            return Err(HierarchyError::Destroyed(self.name()).into());
        }
        if child.is_destroyed() {
            return Err(HierarchyError::Destroyed(child.name()).into());
        }
        if child.parent().as_ref() == Some(self) {
            return Err(HierarchyError::AlreadyChild {
                parent: self.name(),
                child: child.name(),
            }
            .into());
        }
        if self.is_descendant_of(child) {
            return Err(HierarchyError::Cycle {
                parent: self.name(),
                child: child.name(),
            }
            .into());
        }

        if let Some(old_parent) = child.parent() {
            old_parent.remove_child(child);
        }

        child.inner.borrow_mut().parent = self.downgrade();
        self.inner.borrow_mut().children.push(child.clone());
        trace!(parent = %self.name(), child = %child.name(), "Child added");
        Ok(self.clone())
    }

    /// 设置父对象，等价于 `parent.add_child(self)`
    pub fn set_parent(&self, parent: &GameObject) -> Result<GameObject> {
        parent.add_child(self)?;
        Ok(self.clone())
    }

    /// 移除子对象
    ///
    /// # 返回
    /// 如果 `child` 是本对象的子对象并已移除，返回 `true`；否则返回 `false`
    pub fn remove_child(&self, child: &GameObject) -> bool {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            match inner.children.iter().position(|c| c == child) {
                Some(index) => {
                    inner.children.remove(index);
                    true
                }
                None => false,
            }
        };

        if removed {
            child.inner.borrow_mut().parent = Weak::new();
            trace!(parent = %self.name(), child = %child.name(), "Child removed");
        }
        removed
    }

    /// 从父对象上脱离
    pub fn detach(&self) -> bool {
        match self.parent() {
            Some(parent) => parent.remove_child(self),
            None => false,
        }
    }

    /// 是否是 `other` 的祖先（传递）
    pub fn is_ancestor_of(&self, other: &GameObject) -> bool {
        other.is_descendant_of(self)
    }

    /// 是否是 `other` 的后代（传递）
    pub fn is_descendant_of(&self, other: &GameObject) -> bool {
        let mut current = self.parent();
        while let Some(node) = current {
            if &node == other {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// 在自身及子树中按名称深度优先查找
    pub fn find(&self, name: &str) -> Option<GameObject> {
        if self.inner.borrow().name == name {
            return Some(self.clone());
        }
        self.children().iter().find_map(|child| child.find(name))
    }

    /// 销毁对象及其子树，并立即从父对象上脱离
    ///
    /// 被销毁的对象不会再被更新或渲染，也不能再加入层级。
    pub fn destroy(&self) {
        if self.is_destroyed() {
            return;
        }
        self.detach();
        self.mark_destroyed();
        debug!(game_object = %self.name(), "GameObject destroyed");
    }

    fn mark_destroyed(&self) {
        self.inner.borrow_mut().destroyed = true;
        for child in self.children() {
            child.mark_destroyed();
        }
    }

    // ========== 组件管理 ==========

    /// 添加组件
    ///
    /// # 示例
    /// ```
    /// use stagehand::component::{GameObject, Transform};
    ///
    /// let go = GameObject::new("Player")
    ///     .add_component(Transform::new())
    ///     .set_position_xy(60.0, 360.0);
    /// assert_eq!(go.component_count(), 1);
    /// ```
    pub fn add_component<T: Component>(&self, component: T) -> GameObject {
        self.attach_slot(&ComponentRef::new(component));
        self.clone()
    }

    /// 附加一个已有的组件句柄
    ///
    /// # 错误
    /// 组件已附加在某个游戏对象上（包括本对象）时返回错误
    pub fn attach_component<T: Component>(&self, component: &ComponentRef<T>) -> Result<GameObject> {
        if component.is_attached() {
            return Err(HierarchyError::ComponentAttached(
                super::component::short_type_name(type_name::<T>()).to_string(),
            )
            .into());
        }
        self.attach_slot(component);
        Ok(self.clone())
    }

    fn attach_slot<T: Component>(&self, component: &ComponentRef<T>) {
        component.link().set_owner(self);
        self.inner
            .borrow_mut()
            .components
            .push(Rc::new(ComponentSlot::new(component)));

        match component.try_borrow_mut() {
            Ok(mut value) => value.initialize(self),
            Err(_) => warn!(
                game_object = %self.name(),
                component = type_name::<T>(),
                "Component is borrowed, skipping initialize"
            ),
        }
        trace!(game_object = %self.name(), component = type_name::<T>(), "Component attached");
    }

    /// 移除组件
    ///
    /// 在本对象的组件遍历期间调用时，组件被标记为待移除并在遍历结束后移除。
    ///
    /// # 返回
    /// 如果组件附加在本对象上（且尚未待移除），返回 `true`；否则返回 `false`
    pub fn remove_component<T: ?Sized>(&self, component: &ComponentRef<T>) -> bool {
        if !component.link().is_owned_by(self) || component.link().is_pending_removal() {
            return false;
        }

        if self.inner.borrow().updating > 0 {
            component.link().mark_pending_removal();
            return true;
        }

        let slot = {
            let mut inner = self.inner.borrow_mut();
            let index = inner.components.iter().position(|slot| slot.holds(component));
            index.map(|index| inner.components.remove(index))
        };

        match slot {
            Some(slot) => {
                slot.detach();
                trace!(game_object = %self.name(), component = slot.type_name(), "Component removed");
                true
            }
            None => false,
        }
    }

    /// 获取唯一匹配的组件
    ///
    /// `T` 可以是具体组件类型，也可以是组件暴露的能力 trait 对象
    /// （例如 `dyn Behavior`）。待移除的组件不参与匹配。
    ///
    /// # 返回
    /// - 没有匹配时返回 `Ok(None)`
    /// - 恰好一个匹配时返回 `Ok(Some(..))`
    /// - 多个匹配时返回 `EngineError::AmbiguousComponent`
    pub fn get_component<T: ?Sized + 'static>(&self) -> Result<Option<ComponentRef<T>>> {
        let mut matches = self.get_components::<T>();
        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            count => Err(EngineError::AmbiguousComponent {
                type_name: type_name::<T>(),
                count,
            }),
        }
    }

    /// 获取所有匹配的组件（按附加顺序）
    pub fn get_components<T: ?Sized + 'static>(&self) -> Vec<ComponentRef<T>> {
        self.inner
            .borrow()
            .components
            .iter()
            .filter(|slot| !slot.link().is_pending_removal())
            .filter_map(|slot| slot.get::<T>())
            .collect()
    }

    /// 检查是否有指定类型的组件
    pub fn has_component<T: ?Sized + 'static>(&self) -> bool {
        self.inner
            .borrow()
            .components
            .iter()
            .any(|slot| !slot.link().is_pending_removal() && slot.get::<T>().is_some())
    }

    /// 获取组件数量（不含待移除的组件）
    pub fn component_count(&self) -> usize {
        self.inner
            .borrow()
            .components
            .iter()
            .filter(|slot| !slot.link().is_pending_removal())
            .count()
    }

    fn flush_removals(&self) {
        let removed: Vec<Rc<ComponentSlot>> = {
            let mut inner = self.inner.borrow_mut();
            if inner.updating > 0 {
                return;
            }
            let (removed, kept) = std::mem::take(&mut inner.components)
                .into_iter()
                .partition(|slot| slot.link().is_pending_removal());
            inner.components = kept;
            removed
        };

        for slot in removed {
            slot.detach();
            trace!(game_object = %self.name(), component = slot.type_name(), "Deferred component removal applied");
        }
    }

    // ========== 每帧传播 ==========

    /// 更新组件和子对象
    ///
    /// 同一遍历中每个对象最多更新一次，遍历中途被挂到
    /// 后续对象下的对象不会再次更新。
    pub fn update(&self, frame: &FrameContext<'_>) {
        if !self.is_enabled() || self.is_destroyed() {
            return;
        }

        {
            let mut inner = self.inner.borrow_mut();
            if inner.last_pass == frame.pass() {
                trace!(game_object = %inner.name, "Already updated in this pass");
                return;
            }
            inner.last_pass = frame.pass();
        }

        self.flush_removals();

        let slots = {
            let mut inner = self.inner.borrow_mut();
            inner.updating += 1;
            inner.components.clone()
        };

        for slot in &slots {
            if self.is_destroyed() {
                break;
            }

            let link = slot.link();
            if link.is_pending_removal() || !link.is_enabled() || !link.is_owned_by(self) {
                continue;
            }

            let ctx = ComponentContext::new(self, link, frame);

            if let Some(input) = frame.input() {
                if let Some(behavior) = slot.get::<dyn Behavior>() {
                    match behavior.try_borrow_mut() {
                        Ok(mut behavior) => behavior.handle_input(&ctx, input),
                        Err(_) => warn!(
                            game_object = %self.name(),
                            component = slot.type_name(),
                            "Behavior is borrowed, skipping handle_input"
                        ),
                    }
                }
                if link.is_pending_removal() || self.is_destroyed() {
                    continue;
                }
            }

            match slot.erased().try_borrow_mut() {
                Ok(mut component) => component.update(&ctx),
                Err(_) => warn!(
                    game_object = %self.name(),
                    component = slot.type_name(),
                    "Component is borrowed, skipping update"
                ),
            }
        }

        self.inner.borrow_mut().updating -= 1;
        self.flush_removals();

        if self.is_destroyed() {
            return;
        }

        for child in self.children() {
            if child.parent().as_ref() != Some(self) || child.is_destroyed() {
                continue;
            }
            child.update(frame);
        }
    }

    /// 收集本对象及子树的绘制命令
    pub fn render(&self, time: &GameTime, queue: &mut RenderQueue) {
        let parent = self
            .parent()
            .map(|parent| parent.placement())
            .unwrap_or_default();
        self.render_under(&parent, time, queue);
    }

    fn render_under(&self, parent: &Placement, time: &GameTime, queue: &mut RenderQueue) {
        if !self.is_enabled() || self.is_destroyed() {
            return;
        }

        let placement = parent.compose(&self.local_placement());

        for renderer in self.get_components::<dyn Renderer>() {
            if !renderer.is_enabled() {
                continue;
            }
            match renderer.try_borrow() {
                Ok(renderer) => renderer.render(&placement, time, queue),
                Err(_) => warn!(game_object = %self.name(), "Renderer is borrowed, skipping render"),
            }
        }

        for child in self.children() {
            child.render_under(&placement, time, queue);
        }
    }

    // ========== Transform 代理 ==========

    /// 第一个 Transform 组件
    pub fn transform(&self) -> Option<ComponentRef<Transform>> {
        self.get_components::<Transform>().into_iter().next()
    }

    /// 获取或添加 Transform 组件
    ///
    /// 如果已存在 Transform，返回第一个；否则添加一个新的并返回
    pub fn get_or_add_transform(&self) -> ComponentRef<Transform> {
        if let Some(transform) = self.transform() {
            return transform;
        }
        let transform = ComponentRef::new(Transform::new());
        self.attach_slot(&transform);
        transform
    }

    /// 局部变换（没有 Transform 时为单位变换）
    pub fn local_placement(&self) -> Placement {
        self.transform()
            .map(|transform| transform.borrow().local())
            .unwrap_or_default()
    }

    /// 世界变换
    pub fn placement(&self) -> Placement {
        let parent = self
            .parent()
            .map(|parent| parent.placement())
            .unwrap_or_default();
        parent.compose(&self.local_placement())
    }

    fn parent_placement(&self) -> Placement {
        self.parent()
            .map(|parent| parent.placement())
            .unwrap_or_default()
    }

    /// 世界位置
    pub fn position(&self) -> Vector2 {
        self.placement().position
    }

    /// 相对父对象的位置
    pub fn local_position(&self) -> Vector2 {
        self.local_placement().position
    }

    /// 世界旋转（弧度）
    pub fn rotation(&self) -> f32 {
        self.placement().rotation
    }

    /// 世界缩放
    pub fn scale(&self) -> f32 {
        self.placement().scale
    }

    /// 设置世界位置
    pub fn set_position(&self, position: Vector2) -> GameObject {
        let parent = self.parent_placement();
        self.get_or_add_transform()
            .borrow_mut()
            .set_world_position(&parent, position);
        self.clone()
    }

    /// 设置世界位置（分量形式）
    pub fn set_position_xy(&self, x: f32, y: f32) -> GameObject {
        self.set_position(Vector2::new(x, y))
    }

    /// 设置相对父对象的位置
    pub fn set_local_position(&self, position: Vector2) -> GameObject {
        self.get_or_add_transform().borrow_mut().local_position = position;
        self.clone()
    }

    /// 设置世界旋转（弧度）
    pub fn set_rotation(&self, rotation: f32) -> GameObject {
        let parent = self.parent_placement();
        self.get_or_add_transform()
            .borrow_mut()
            .set_world_rotation(&parent, rotation);
        self.clone()
    }

    /// 设置世界缩放
    pub fn set_scale(&self, scale: f32) -> GameObject {
        let parent = self.parent_placement();
        self.get_or_add_transform()
            .borrow_mut()
            .set_world_scale(&parent, scale);
        self.clone()
    }
}

impl PartialEq for GameObject {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for GameObject {}

impl Default for GameObject {
    fn default() -> Self {
        Self::new("GameObject")
    }
}

impl fmt::Debug for GameObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("GameObject")
                .field("name", &inner.name)
                .field("enabled", &inner.enabled)
                .field("destroyed", &inner.destroyed)
                .field("components", &inner.components.len())
                .field("children", &inner.children.len())
                .finish(),
            Err(_) => f.write_str("GameObject { <borrowed> }"),
        }
    }
}
