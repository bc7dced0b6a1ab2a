//! 单元测试共用的测试组件

use std::rc::Rc;

use crate::component::{
    Behavior, Component, ComponentCell, ComponentContext, ComponentRef, GameObject, Interfaces,
};
use crate::core::input::Input;

/// 记录生命周期回调次数
#[derive(Debug, Default)]
pub struct Counter {
    pub updates: u32,
    pub initialized: u32,
    pub detached: u32,
}

impl Component for Counter {
    fn initialize(&mut self, _game_object: &GameObject) {
        self.initialized += 1;
    }

    fn update(&mut self, _ctx: &ComponentContext<'_>) {
        self.updates += 1;
    }

    fn on_detach(&mut self) {
        self.detached += 1;
    }
}

/// 测试用的能力接口
pub trait Greeting: Component {
    fn greet(&self) -> String;
}

#[derive(Debug)]
pub struct Greeter {
    pub text: String,
}

impl Greeter {
    pub fn new(text: &str) -> Self {
        Self { text: text.to_string() }
    }
}

fn as_greeting(cell: Rc<ComponentCell<Greeter>>) -> Rc<ComponentCell<dyn Greeting>> {
    cell
}

impl Component for Greeter {
    fn interfaces(table: &mut Interfaces<'_, Self>) {
        table.expose(as_greeting);
    }
}

impl Greeting for Greeter {
    fn greet(&self) -> String {
        self.text.clone()
    }
}

/// 第一次更新时移除自己
#[derive(Debug, Default)]
pub struct SelfRemover {
    pub updates: u32,
}

impl Component for SelfRemover {
    fn update(&mut self, ctx: &ComponentContext<'_>) {
        self.updates += 1;
        ctx.remove_self();
    }
}

/// 更新时从所属对象上移除另一个组件
pub struct Remover {
    victim: ComponentRef<Counter>,
}

impl Remover {
    pub fn new(victim: ComponentRef<Counter>) -> Self {
        Self { victim }
    }
}

impl Component for Remover {
    fn update(&mut self, ctx: &ComponentContext<'_>) {
        ctx.game_object().remove_component(&self.victim);
    }
}

/// 记录输入和更新次数的行为
#[derive(Debug, Default)]
pub struct RecordingBehavior {
    pub inputs: u32,
    pub updates: u32,
    destroy: bool,
}

impl RecordingBehavior {
    /// 第一次更新时销毁所属对象
    pub fn destroying() -> Self {
        Self {
            destroy: true,
            ..Self::default()
        }
    }
}

impl Component for RecordingBehavior {
    fn update(&mut self, ctx: &ComponentContext<'_>) {
        self.updates += 1;
        if self.destroy {
            ctx.destroy();
        }
    }

    fn interfaces(table: &mut Interfaces<'_, Self>) {
        table.behavior();
    }
}

impl Behavior for RecordingBehavior {
    fn handle_input(&mut self, _ctx: &ComponentContext<'_>, _input: &Input) {
        self.inputs += 1;
    }
}

/// 第一次更新时生成一个新的根对象
pub struct Spawner {
    name: String,
    spawned: bool,
}

impl Spawner {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            spawned: false,
        }
    }
}

impl Component for Spawner {
    fn update(&mut self, ctx: &ComponentContext<'_>) {
        if !self.spawned {
            ctx.spawn(GameObject::new(self.name.as_str()));
            self.spawned = true;
        }
    }
}

/// 第一次更新时把所属对象挂到 `parent` 下
pub struct Adopter {
    parent: GameObject,
    done: bool,
}

impl Adopter {
    pub fn new(parent: &GameObject) -> Self {
        Self {
            parent: parent.clone(),
            done: false,
        }
    }
}

impl Component for Adopter {
    fn update(&mut self, ctx: &ComponentContext<'_>) {
        if !self.done {
            self.done = true;
            if let Err(e) = self.parent.add_child(ctx.game_object()) {
                panic!("failed to reparent: {}", e);
            }
        }
    }
}
