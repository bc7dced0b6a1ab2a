//! 组件基类
//!
//! 组件在附加到 `GameObject` 时被包装进共享单元 `ComponentCell`，
//! 单元里同时保存组件值和它与所有者之间的链接 `ComponentLink`。
//! 用户持有的 `ComponentRef<T>` 和所有者内部保存的 `ComponentSlot`
//! 指向同一个单元。
//!
//! # 多态查询
//!
//! 每个组件在附加时登记一张接口表：具体类型本身、`dyn Component`，
//! 以及组件通过 `Component::interfaces` 暴露的能力 trait（例如
//! `dyn Behavior`、`dyn Renderer`）。查询时只比较 `TypeId`，
//! 命中后直接取出已经转换好的 `ComponentRef<I>`。

use std::any::{type_name, Any, TypeId};
use std::cell::{BorrowError, BorrowMutError, Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use super::context::ComponentContext;
use super::game_object::{GameObject, GameObjectInner};

/// 组件 trait
///
/// 所有游戏对象组件的基础接口
pub trait Component: Any {
    /// 获取组件名称
    fn name(&self) -> &str {
        short_type_name(type_name::<Self>())
    }

    /// 附加到游戏对象后调用
    fn initialize(&mut self, _game_object: &GameObject) {}

    /// 每帧更新（可选实现）
    fn update(&mut self, _ctx: &ComponentContext<'_>) {}

    /// 从游戏对象上移除后调用
    fn on_detach(&mut self) {}

    /// 登记组件暴露的能力接口
    ///
    /// ```ignore
    /// impl Component for ShipBehavior {
    ///     fn interfaces(table: &mut Interfaces<'_, Self>) {
    ///         table.behavior();
    ///     }
    /// }
    /// ```
    fn interfaces(_table: &mut Interfaces<'_, Self>)
    where
        Self: Sized,
    {
    }
}

/// 去掉模块路径的类型名
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    if full.contains('<') {
        return full;
    }
    full.rsplit("::").next().unwrap_or(full)
}

/// 组件与所有者之间的链接
///
/// 附加期间组件恰好有一个所有者；移除后所有者被清空。
pub struct ComponentLink {
    owner: RefCell<Weak<RefCell<GameObjectInner>>>,
    pending_removal: Cell<bool>,
    enabled: Cell<bool>,
}

impl ComponentLink {
    fn new() -> Self {
        Self {
            owner: RefCell::new(Weak::new()),
            pending_removal: Cell::new(false),
            enabled: Cell::new(true),
        }
    }

    /// 当前所有者
    pub fn owner(&self) -> Option<GameObject> {
        self.owner.borrow().upgrade().map(GameObject::from_inner)
    }

    pub fn is_attached(&self) -> bool {
        self.owner.borrow().strong_count() > 0
    }

    pub(crate) fn is_owned_by(&self, game_object: &GameObject) -> bool {
        std::ptr::eq(self.owner.borrow().as_ptr(), game_object.inner_ptr())
    }

    pub(crate) fn set_owner(&self, game_object: &GameObject) {
        *self.owner.borrow_mut() = game_object.downgrade();
        self.pending_removal.set(false);
    }

    pub(crate) fn clear_owner(&self) {
        *self.owner.borrow_mut() = Weak::new();
        self.pending_removal.set(false);
    }

    /// 是否已标记为待移除
    pub fn is_pending_removal(&self) -> bool {
        self.pending_removal.get()
    }

    pub(crate) fn mark_pending_removal(&self) {
        self.pending_removal.set(true);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }
}

/// 组件共享单元
pub struct ComponentCell<T: ?Sized> {
    pub(crate) link: ComponentLink,
    pub(crate) value: RefCell<T>,
}

/// 组件句柄
///
/// `T` 可以是具体组件类型，也可以是组件暴露的能力 trait 对象。
/// 克隆句柄只增加引用计数。
pub struct ComponentRef<T: ?Sized> {
    pub(crate) cell: Rc<ComponentCell<T>>,
}

impl<T: Component> ComponentRef<T> {
    /// 创建尚未附加的组件句柄
    pub fn new(value: T) -> Self {
        Self {
            cell: Rc::new(ComponentCell {
                link: ComponentLink::new(),
                value: RefCell::new(value),
            }),
        }
    }
}

impl<T: ?Sized> ComponentRef<T> {
    pub fn borrow(&self) -> Ref<'_, T> {
        self.cell.value.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.cell.value.borrow_mut()
    }

    pub fn try_borrow(&self) -> Result<Ref<'_, T>, BorrowError> {
        self.cell.value.try_borrow()
    }

    pub fn try_borrow_mut(&self) -> Result<RefMut<'_, T>, BorrowMutError> {
        self.cell.value.try_borrow_mut()
    }

    pub fn link(&self) -> &ComponentLink {
        &self.cell.link
    }

    /// 所属的游戏对象
    pub fn game_object(&self) -> Option<GameObject> {
        self.cell.link.owner()
    }

    pub fn is_attached(&self) -> bool {
        self.cell.link.is_attached()
    }

    pub fn is_enabled(&self) -> bool {
        self.cell.link.is_enabled()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.cell.link.set_enabled(enabled);
    }

    /// 是否与另一个句柄指向同一个组件（不论句柄的视图类型）
    pub fn same_component<U: ?Sized>(&self, other: &ComponentRef<U>) -> bool {
        self.addr() == other.addr()
    }

    pub(crate) fn addr(&self) -> *const () {
        Rc::as_ptr(&self.cell) as *const ()
    }
}

impl<T: ?Sized> Clone for ComponentRef<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T: ?Sized> fmt::Debug for ComponentRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRef")
            .field("type", &type_name::<T>())
            .field("attached", &self.is_attached())
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// 附加时构建的接口表
pub struct Interfaces<'a, T: Component> {
    cell: &'a Rc<ComponentCell<T>>,
    entries: &'a mut Vec<(TypeId, Box<dyn Any>)>,
}

impl<'a, T: Component> Interfaces<'a, T> {
    /// 以能力类型 `I` 暴露组件
    ///
    /// `cast` 通常是一个把 `Rc<ComponentCell<T>>` 原样返回、
    /// 由编译器完成非定长转换的函数。
    pub fn expose<I: ?Sized + 'static>(
        &mut self,
        cast: fn(Rc<ComponentCell<T>>) -> Rc<ComponentCell<I>>,
    ) -> &mut Self {
        let id = TypeId::of::<I>();
        if !self.entries.iter().any(|(existing, _)| *existing == id) {
            let handle: Box<dyn Any> = Box::new(ComponentRef {
                cell: cast(Rc::clone(self.cell)),
            });
            self.entries.push((id, handle));
        }
        self
    }
}

fn as_component<T: Component>(cell: Rc<ComponentCell<T>>) -> Rc<ComponentCell<dyn Component>> {
    cell
}

/// 游戏对象内部保存的组件条目
pub(crate) struct ComponentSlot {
    erased: ComponentRef<dyn Component>,
    entries: Vec<(TypeId, Box<dyn Any>)>,
    type_name: &'static str,
}

impl ComponentSlot {
    pub(crate) fn new<T: Component>(handle: &ComponentRef<T>) -> Self {
        let concrete: Box<dyn Any> = Box::new(handle.clone());
        let mut entries = vec![(TypeId::of::<T>(), concrete)];

        let mut table = Interfaces {
            cell: &handle.cell,
            entries: &mut entries,
        };
        table.expose(as_component::<T>);
        T::interfaces(&mut table);

        Self {
            erased: ComponentRef {
                cell: as_component(Rc::clone(&handle.cell)),
            },
            entries,
            type_name: type_name::<T>(),
        }
    }

    /// 以类型 `I` 查询该组件
    pub(crate) fn get<I: ?Sized + 'static>(&self) -> Option<ComponentRef<I>> {
        let id = TypeId::of::<I>();
        self.entries
            .iter()
            .find(|(existing, _)| *existing == id)
            .and_then(|(_, handle)| handle.downcast_ref::<ComponentRef<I>>())
            .cloned()
    }

    pub(crate) fn erased(&self) -> &ComponentRef<dyn Component> {
        &self.erased
    }

    pub(crate) fn link(&self) -> &ComponentLink {
        self.erased.link()
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn holds<U: ?Sized>(&self, handle: &ComponentRef<U>) -> bool {
        self.erased.same_component(handle)
    }

    /// 清空所有者并通知组件
    pub(crate) fn detach(&self) {
        self.link().clear_owner();
        match self.erased.try_borrow_mut() {
            Ok(mut component) => component.on_detach(),
            Err(_) => tracing::warn!(
                component = self.type_name,
                "Component is borrowed, skipping on_detach"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Counter, Greeter, Greeting};

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("stagehand::component::Transform"), "Transform");
        assert_eq!(short_type_name("Plain"), "Plain");
    }

    #[test]
    fn test_new_handle_is_detached() {
        let handle = ComponentRef::new(Counter::default());
        assert!(!handle.is_attached());
        assert!(handle.is_enabled());
        assert!(handle.game_object().is_none());
    }

    #[test]
    fn test_slot_exposes_concrete_and_erased_types() {
        let handle = ComponentRef::new(Counter::default());
        let slot = ComponentSlot::new(&handle);

        let concrete = slot.get::<Counter>().unwrap();
        assert!(concrete.same_component(&handle));
        assert!(slot.get::<dyn Component>().is_some());
        assert!(slot.get::<Greeter>().is_none());
    }

    #[test]
    fn test_slot_exposes_declared_interfaces() {
        let handle = ComponentRef::new(Greeter::new("hello"));
        let slot = ComponentSlot::new(&handle);

        let greeting = slot.get::<dyn Greeting>().unwrap();
        assert_eq!(greeting.borrow().greet(), "hello");
        assert!(greeting.same_component(&handle));

        // 通过接口视图修改，具体类型视图可见
        handle.borrow_mut().text = "bye".to_string();
        assert_eq!(greeting.borrow().greet(), "bye");
    }

    #[test]
    fn test_enabled_flag_is_shared() {
        let handle = ComponentRef::new(Counter::default());
        let clone = handle.clone();
        clone.set_enabled(false);
        assert!(!handle.is_enabled());
    }
}
