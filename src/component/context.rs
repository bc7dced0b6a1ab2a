//! 每帧的更新上下文

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::component::ComponentLink;
use super::game_object::GameObject;
use crate::content::{Content, ContentManager};
use crate::core::error::{ResourceError, Result};
use crate::core::input::{Control, Input};
use crate::core::time::GameTime;
use crate::stage::DEFAULT_LAYER;

thread_local! {
    static NEXT_PASS: Cell<u64> = Cell::new(1);
}

fn next_pass() -> u64 {
    NEXT_PASS.with(|next| {
        let pass = next.get();
        next.set(pass + 1);
        pass
    })
}

/// 一次更新遍历共享的上下文
///
/// 舞台在遍历前创建，遍历结束后取回遍历期间排队的请求
/// （新生成的根对象、舞台切换）。
pub struct FrameContext<'a> {
    /// 遍历编号，每个上下文唯一
    pass: u64,
    time: GameTime,
    input: Option<&'a Input>,
    content: Option<&'a ContentManager>,
    default_layer: &'a str,
    stage_request: RefCell<Option<String>>,
    spawned: RefCell<Vec<GameObject>>,
}

impl<'a> FrameContext<'a> {
    pub fn new(time: GameTime) -> Self {
        Self {
            pass: next_pass(),
            time,
            input: None,
            content: None,
            default_layer: DEFAULT_LAYER,
            stage_request: RefCell::new(None),
            spawned: RefCell::new(Vec::new()),
        }
    }

    pub fn with_input(mut self, input: &'a Input) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_content(mut self, content: &'a ContentManager) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_default_layer(mut self, layer: &'a str) -> Self {
        self.default_layer = layer;
        self
    }

    pub(crate) fn pass(&self) -> u64 {
        self.pass
    }

    pub fn time(&self) -> &GameTime {
        &self.time
    }

    pub fn input(&self) -> Option<&'a Input> {
        self.input
    }

    pub fn content(&self) -> Option<&'a ContentManager> {
        self.content
    }

    pub fn default_layer(&self) -> &'a str {
        self.default_layer
    }

    /// 请求在本帧结束后切换舞台（后一次请求覆盖前一次）
    pub fn request_stage(&self, name: impl Into<String>) {
        *self.stage_request.borrow_mut() = Some(name.into());
    }

    /// 排队一个新的根对象，本帧结束后加入舞台
    pub fn spawn(&self, game_object: GameObject) {
        self.spawned.borrow_mut().push(game_object);
    }

    pub fn take_stage_request(&self) -> Option<String> {
        self.stage_request.borrow_mut().take()
    }

    pub fn take_spawned(&self) -> Vec<GameObject> {
        std::mem::take(&mut *self.spawned.borrow_mut())
    }
}

/// 组件钩子收到的上下文
pub struct ComponentContext<'a> {
    game_object: &'a GameObject,
    link: &'a ComponentLink,
    frame: &'a FrameContext<'a>,
}

impl<'a> ComponentContext<'a> {
    pub(crate) fn new(
        game_object: &'a GameObject,
        link: &'a ComponentLink,
        frame: &'a FrameContext<'a>,
    ) -> Self {
        Self {
            game_object,
            link,
            frame,
        }
    }

    /// 组件所属的游戏对象
    pub fn game_object(&self) -> &GameObject {
        self.game_object
    }

    pub fn time(&self) -> &GameTime {
        self.frame.time()
    }

    pub fn input(&self) -> Option<&Input> {
        self.frame.input()
    }

    /// 按键名获取控件
    pub fn control(&self, key: &str) -> Result<Rc<Control>> {
        match self.frame.input() {
            Some(input) => input.get_control(key),
            None => Err(ResourceError::ControlNotFound(key.to_string()).into()),
        }
    }

    /// 获取舞台已加载的内容
    pub fn content<T: Content>(&self, key: &str) -> Result<Rc<T>> {
        self.frame
            .content()
            .ok_or(ResourceError::ContentUnavailable)?
            .get::<T>(key)
    }

    pub fn default_layer(&self) -> &str {
        self.frame.default_layer()
    }

    /// 在当前组件遍历结束后把自己从游戏对象上移除
    pub fn remove_self(&self) {
        self.link.mark_pending_removal();
    }

    /// 销毁所属的游戏对象及其子树
    pub fn destroy(&self) {
        self.game_object.destroy();
    }

    pub fn request_stage(&self, name: impl Into<String>) {
        self.frame.request_stage(name);
    }

    pub fn spawn(&self, game_object: GameObject) {
        self.frame.spawn(game_object);
    }

    pub fn frame(&self) -> &FrameContext<'a> {
        self.frame
    }
}
