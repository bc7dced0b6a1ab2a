//! 游戏舞台
//!
//! 舞台由名称、生命周期状态、用户脚本 `StageScript` 和场景 `Scene` 组成。
//! 场景持有根对象、图层、已加载的内容和背景色。
//!
//! # 生命周期
//!
//! ```text
//! Registered --load--> Loaded --activate--> Active --deactivate--> Inactive
//!     ^                                        |                      |
//!     +------------------ unload --------------+----------------------+
//! ```

use std::rc::Rc;

use tracing::{debug, info, trace, warn};

use super::layer::Layer;
use super::DEFAULT_LAYER;
use crate::component::{Camera, FrameContext, GameObject};
use crate::content::{Content, ContentManager, ContentSource};
use crate::core::error::{HierarchyError, RegistrationError, ResourceError, Result};
use crate::core::input::Input;
use crate::core::math::Color;
use crate::core::time::GameTime;
use crate::renderer::{RenderBackend, RenderQueue, View};

/// 舞台脚本
///
/// 对应一个具体的游戏场景（标题画面、关卡等）。
pub trait StageScript {
    /// 加载内容（在 `initialize` 之前调用）
    fn load_content(&mut self, _scene: &mut Scene) -> Result<()> {
        Ok(())
    }

    /// 创建图层和初始对象
    fn initialize(&mut self, scene: &mut Scene) -> Result<()>;

    /// 每帧在根对象更新之前调用
    fn update(&mut self, _scene: &Scene, _frame: &FrameContext<'_>) {}

    /// 卸载前调用
    fn unload(&mut self, _scene: &mut Scene) {}
}

/// 舞台状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    /// 已注册，尚未加载
    Registered,
    /// 内容已加载、已初始化
    Loaded,
    /// 当前活动舞台
    Active,
    /// 已加载但不活动
    Inactive,
}

/// 场景：根对象、图层、内容和背景色
pub struct Scene {
    roots: Vec<GameObject>,
    layers: Vec<Layer>,
    content: ContentManager,
    /// 清屏颜色
    pub background: Color,
}

impl Scene {
    pub fn new(source: Rc<dyn ContentSource>) -> Self {
        Self {
            roots: Vec::new(),
            layers: vec![Layer::new(DEFAULT_LAYER, 0)],
            content: ContentManager::new(source),
            background: Color::CORNFLOWER_BLUE,
        }
    }

    // ========== 根对象 ==========

    /// 添加根对象
    ///
    /// 对象如果有父对象会先脱离；已经是根对象时不做任何事。
    pub fn add_game_object(&mut self, game_object: GameObject) -> Result<GameObject> {
        if game_object.is_destroyed() {
            return Err(HierarchyError::Destroyed(game_object.name()).into());
        }
        if self.roots.contains(&game_object) {
            return Ok(game_object);
        }
        game_object.detach();
        debug!(game_object = %game_object.name(), "Root game object added");
        self.roots.push(game_object.clone());
        Ok(game_object)
    }

    /// 移除根对象
    pub fn remove_game_object(&mut self, game_object: &GameObject) -> bool {
        let before = self.roots.len();
        self.roots.retain(|root| root != game_object);
        before != self.roots.len()
    }

    pub fn roots(&self) -> &[GameObject] {
        &self.roots
    }

    /// 在所有根对象的子树中按名称查找
    pub fn find(&self, name: &str) -> Option<GameObject> {
        self.live_roots().find_map(|root| root.find(name))
    }

    /// 仍是根的对象：未销毁且没有被挂到其他对象下
    fn live_roots(&self) -> impl Iterator<Item = &GameObject> {
        self.roots
            .iter()
            .filter(|root| !root.is_destroyed() && root.parent().is_none())
    }

    // ========== 图层 ==========

    /// 添加图层
    ///
    /// # 错误
    /// 同名图层已存在（包括默认图层）
    pub fn add_layer(&mut self, name: impl Into<String>, order: i32) -> Result<&mut Layer> {
        let name = name.into();
        if self.layer(&name).is_some() {
            return Err(RegistrationError::DuplicateLayer(name).into());
        }
        debug!(layer = %name, order, "Layer added");
        self.layers.push(Layer::new(name, order));
        let index = self.layers.len() - 1;
        Ok(&mut self.layers[index])
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.name() == name)
    }

    pub fn layer_mut(&mut self, name: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|layer| layer.name() == name)
    }

    /// 按提交顺序排列的图层（同序保持创建顺序）
    pub fn layers(&self) -> Vec<&Layer> {
        let mut layers: Vec<&Layer> = self.layers.iter().collect();
        layers.sort_by_key(|layer| layer.order());
        layers
    }

    // ========== 内容 ==========

    pub fn content(&self) -> &ContentManager {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut ContentManager {
        &mut self.content
    }

    /// 加载内容
    pub fn load_content<T: Content>(&mut self, key: &str) -> Result<Rc<T>> {
        self.content.load::<T>(key)
    }

    /// 获取已加载的内容
    pub fn get_content<T: Content>(&self, key: &str) -> Result<Rc<T>> {
        self.content.get::<T>(key)
    }

    // ========== 每帧 ==========

    /// 更新所有根对象
    ///
    /// `hook` 在根对象之前运行，与根对象共享同一个帧上下文。
    /// 返回遍历期间请求切换的舞台名称。
    pub fn update<F>(&mut self, time: &GameTime, input: Option<&Input>, hook: F) -> Option<String>
    where
        F: FnOnce(&Scene, &FrameContext<'_>),
    {
        let (spawned, request) = {
            let mut frame = FrameContext::new(*time).with_content(&self.content);
            if let Some(input) = input {
                frame = frame.with_input(input);
            }

            hook(self, &frame);

            for root in self.roots.clone() {
                if root.is_destroyed() || root.parent().is_some() {
                    continue;
                }
                root.update(&frame);
            }
            (frame.take_spawned(), frame.take_stage_request())
        };

        // 销毁或被挂到其他对象下的根对象不再是根
        self.roots
            .retain(|root| !root.is_destroyed() && root.parent().is_none());

        for game_object in spawned {
            if let Err(e) = self.add_game_object(game_object) {
                warn!("Failed to add spawned game object: {}", e);
            }
        }
        request
    }

    /// 深度优先找到的第一个启用相机的视图
    pub fn camera_view(&self) -> View {
        self.live_roots().find_map(find_camera).unwrap_or_default()
    }

    /// 收集绘制命令并按图层提交
    ///
    /// # 错误
    /// 有渲染器引用了不存在的图层时，在提交任何内容之前返回错误
    pub fn render(&self, time: &GameTime, backend: &mut dyn RenderBackend) -> Result<()> {
        let mut queue = RenderQueue::new();
        for root in self.live_roots() {
            root.render(time, &mut queue);
        }

        let mut unknown: Vec<&str> = queue
            .layer_names()
            .filter(|name| self.layer(name).is_none())
            .collect();
        unknown.sort_unstable();
        if let Some(name) = unknown.first() {
            return Err(ResourceError::LayerNotFound(name.to_string()).into());
        }

        let view = self.camera_view();
        trace!(viewport = ?backend.viewport(), commands = queue.len(), "Rendering scene");
        backend.begin_frame(self.background)?;
        for layer in self.layers() {
            let mut commands = queue.take(layer.name());
            layer.sort_commands(&mut commands);

            backend.begin_layer(layer, &view)?;
            for command in &commands {
                backend.draw(command)?;
            }
            backend.end_layer()?;
        }
        backend.end_frame()?;
        Ok(())
    }

    /// 销毁所有根对象、卸载内容、恢复默认图层
    fn clear(&mut self) {
        for root in self.roots.drain(..) {
            root.destroy();
        }
        self.layers.clear();
        self.layers.push(Layer::new(DEFAULT_LAYER, 0));
        self.content.unload_all();
        self.background = Color::CORNFLOWER_BLUE;
    }
}

fn find_camera(game_object: &GameObject) -> Option<View> {
    if !game_object.is_enabled() || game_object.is_destroyed() {
        return None;
    }
    if let Some(camera) = game_object
        .get_components::<Camera>()
        .into_iter()
        .find(|camera| camera.is_enabled())
    {
        return Some(camera.borrow().view(&game_object.placement()));
    }
    game_object.children().iter().find_map(find_camera)
}

/// 游戏舞台
pub struct GameStage {
    name: String,
    state: StageState,
    script: Box<dyn StageScript>,
    scene: Scene,
}

impl GameStage {
    pub fn new(name: impl Into<String>, script: Box<dyn StageScript>, source: Rc<dyn ContentSource>) -> Self {
        Self {
            name: name.into(),
            state: StageState::Registered,
            script,
            scene: Scene::new(source),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> StageState {
        self.state
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// 加载内容并初始化（已加载时不做任何事）
    ///
    /// 失败时场景被清空，舞台保持 `Registered`。
    pub fn load(&mut self) -> Result<()> {
        if self.state != StageState::Registered {
            return Ok(());
        }

        let result = self
            .script
            .load_content(&mut self.scene)
            .and_then(|_| self.script.initialize(&mut self.scene));

        if let Err(e) = result {
            warn!(stage = %self.name, "Failed to load stage: {}", e);
            self.scene.clear();
            return Err(e);
        }

        self.state = StageState::Loaded;
        info!(
            stage = %self.name,
            roots = self.scene.roots.len(),
            content = self.scene.content.len(),
            "Stage loaded"
        );
        Ok(())
    }

    pub(crate) fn activate(&mut self) {
        self.state = StageState::Active;
    }

    pub(crate) fn deactivate(&mut self) {
        if self.state == StageState::Active {
            self.state = StageState::Inactive;
        }
    }

    /// 卸载：调用脚本的 `unload`，销毁根对象并释放内容
    pub fn unload(&mut self) {
        if self.state == StageState::Registered {
            return;
        }
        self.script.unload(&mut self.scene);
        self.scene.clear();
        self.state = StageState::Registered;
        info!(stage = %self.name, "Stage unloaded");
    }

    pub fn is_active(&self) -> bool {
        self.state == StageState::Active
    }

    /// 更新脚本和场景，返回请求切换的舞台名称
    ///
    /// 不活动的舞台不会被更新。
    pub fn update(&mut self, time: &GameTime, input: Option<&Input>) -> Option<String> {
        if !self.is_active() {
            return None;
        }
        let script = &mut self.script;
        self.scene
            .update(time, input, |scene, frame| script.update(scene, frame))
    }

    /// 渲染场景（不活动的舞台不渲染）
    pub fn render(&self, time: &GameTime, backend: &mut dyn RenderBackend) -> Result<()> {
        if !self.is_active() {
            return Ok(());
        }
        self.scene.render(time, backend)
    }
}

impl std::fmt::Debug for GameStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameStage")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("roots", &self.scene.roots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentRef, SpriteRenderer};
    use crate::content::{MemoryContentSource, Texture};
    use crate::core::error::EngineError;
    use crate::core::math::Vector2;
    use crate::renderer::HeadlessBackend;
    use crate::stage::SortMode;
    use crate::testing::{Adopter, Counter, Spawner};

    fn source() -> Rc<dyn ContentSource> {
        Rc::new(MemoryContentSource::new())
    }

    fn sprite(key: &str) -> Rc<Texture> {
        Rc::new(Texture::solid(key, 2, 2, Color::WHITE))
    }

    struct EmptyScript;

    impl StageScript for EmptyScript {
        fn initialize(&mut self, _scene: &mut Scene) -> Result<()> {
            Ok(())
        }
    }

    struct FailingScript;

    impl StageScript for FailingScript {
        fn initialize(&mut self, scene: &mut Scene) -> Result<()> {
            scene.add_game_object(GameObject::new("orphan"))?;
            scene.load_content::<Texture>("missing")?;
            Ok(())
        }
    }

    #[test]
    fn test_default_layer_exists() {
        let scene = Scene::new(source());
        let layer = scene.layer(DEFAULT_LAYER).unwrap();
        assert_eq!(layer.order(), 0);
    }

    #[test]
    fn test_duplicate_layer_is_rejected() {
        let mut scene = Scene::new(source());
        scene.add_layer("background", -2).unwrap();
        assert!(matches!(
            scene.add_layer("background", 5).unwrap_err(),
            EngineError::Registration(RegistrationError::DuplicateLayer(_))
        ));
        assert!(scene.add_layer(DEFAULT_LAYER, 1).is_err());
    }

    #[test]
    fn test_layers_sorted_by_order_then_creation() {
        let mut scene = Scene::new(source());
        scene.add_layer("hud", 10).unwrap();
        scene.add_layer("background", -2).unwrap();
        scene.add_layer("particles", -1).unwrap();
        scene.add_layer("effects", 0).unwrap();

        let names: Vec<&str> = scene.layers().iter().map(|layer| layer.name()).collect();
        assert_eq!(names, ["background", "particles", DEFAULT_LAYER, "effects", "hud"]);
    }

    #[test]
    fn test_add_game_object_detaches_from_parent() {
        let mut scene = Scene::new(source());
        let parent = GameObject::new("parent");
        let child = GameObject::new("child");
        parent.add_child(&child).unwrap();

        scene.add_game_object(child.clone()).unwrap();
        scene.add_game_object(child.clone()).unwrap();
        assert!(child.parent().is_none());
        assert_eq!(scene.roots().len(), 1);
    }

    #[test]
    fn test_update_prunes_destroyed_roots_and_adds_spawned() {
        let mut scene = Scene::new(source());
        let doomed = scene.add_game_object(GameObject::new("doomed")).unwrap();
        scene
            .add_game_object(GameObject::new("spawner").add_component(Spawner::new("bullet")))
            .unwrap();
        doomed.destroy();

        scene.update(&GameTime::default(), None, |_, _| {});
        let names: Vec<String> = scene.roots().iter().map(|root| root.name()).collect();
        assert_eq!(names, ["spawner", "bullet"]);
    }

    #[test]
    fn test_spawned_objects_update_next_frame() {
        let mut scene = Scene::new(source());
        let counter = ComponentRef::new(Counter::default());
        let spawned = GameObject::new("late");
        spawned.attach_component(&counter).unwrap();

        let pending = spawned.clone();
        scene.update(&GameTime::default(), None, move |_, frame| frame.spawn(pending));
        assert_eq!(counter.borrow().updates, 0);

        scene.update(&GameTime::default(), None, |_, _| {});
        assert_eq!(counter.borrow().updates, 1);
    }

    #[test]
    fn test_render_submits_layers_in_order() {
        let mut scene = Scene::new(source());
        scene.background = Color::BLACK;
        scene
            .add_layer("background", -1)
            .unwrap()
            .sort = SortMode::BackToFront;

        scene
            .add_game_object(
                GameObject::new("ship").add_component(SpriteRenderer::new(sprite("ship"))),
            )
            .unwrap();
        for (key, depth) in [("near", 0.1), ("far", 0.9)] {
            scene
                .add_game_object(GameObject::new(key).add_component(
                    SpriteRenderer::on_layer("background", sprite(key)).with_depth(depth),
                ))
                .unwrap();
        }

        let mut backend = HeadlessBackend::new();
        scene.render(&GameTime::default(), &mut backend).unwrap();

        let frame = backend.last_frame().unwrap();
        assert_eq!(frame.clear_color, Color::BLACK);
        assert_eq!(frame.layer_names(), ["background", DEFAULT_LAYER]);
        let background: Vec<&str> = frame.layers[0]
            .commands
            .iter()
            .map(|c| c.texture.as_str())
            .collect();
        assert_eq!(background, ["far", "near"]);
        assert_eq!(frame.layers[1].commands.len(), 1);
    }

    #[test]
    fn test_render_skips_root_moved_under_another_root() {
        let mut scene = Scene::new(source());
        let world = scene
            .add_game_object(GameObject::new("world").set_position_xy(5.0, 5.0))
            .unwrap();
        let player = scene
            .add_game_object(
                GameObject::new("player")
                    .set_local_position(Vector2::new(10.0, 10.0))
                    .add_component(SpriteRenderer::new(sprite("player"))),
            )
            .unwrap();
        world.add_child(&player).unwrap();

        let mut backend = HeadlessBackend::new();
        scene.render(&GameTime::default(), &mut backend).unwrap();

        let frame = backend.last_frame().unwrap();
        assert_eq!(frame.command_count(), 1);
        assert_eq!(frame.layers[0].commands[0].position, Vector2::new(15.0, 15.0));
    }

    #[test]
    fn test_update_visits_reparented_root_once() {
        let mut scene = Scene::new(source());
        let counter = ComponentRef::new(Counter::default());
        let later = GameObject::new("later");
        let first = GameObject::new("first").add_component(Adopter::new(&later));
        first.attach_component(&counter).unwrap();
        scene.add_game_object(first.clone()).unwrap();
        scene.add_game_object(later.clone()).unwrap();

        scene.update(&GameTime::default(), None, |_, _| {});
        assert_eq!(counter.borrow().updates, 1);
        assert_eq!(first.parent(), Some(later));
        assert_eq!(scene.roots().len(), 1);

        scene.update(&GameTime::default(), None, |_, _| {});
        assert_eq!(counter.borrow().updates, 2);
    }

    #[test]
    fn test_render_unknown_layer_fails_before_submission() {
        let mut scene = Scene::new(source());
        scene
            .add_game_object(
                GameObject::new("ghost")
                    .add_component(SpriteRenderer::on_layer("nowhere", sprite("ghost"))),
            )
            .unwrap();

        let mut backend = HeadlessBackend::new();
        let err = scene.render(&GameTime::default(), &mut backend).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Resource(ResourceError::LayerNotFound(ref name)) if name == "nowhere"
        ));
        assert!(backend.frames().is_empty());
    }

    #[test]
    fn test_camera_view_from_first_enabled_camera() {
        let mut scene = Scene::new(source());
        let disabled = ComponentRef::new(Camera::new());
        let off = GameObject::new("off");
        off.attach_component(&disabled).unwrap();
        disabled.set_enabled(false);
        scene.add_game_object(off).unwrap();

        let rig = GameObject::new("rig").set_position_xy(640.0, 360.0);
        rig.add_child(&GameObject::new("camera").add_component(Camera::with_zoom(2.0)))
            .unwrap();
        scene.add_game_object(rig).unwrap();

        let view = scene.camera_view();
        assert_eq!(view.position, Vector2::new(640.0, 360.0));
        assert_eq!(view.zoom, 2.0);
        assert_eq!(Scene::new(source()).camera_view(), View::identity());
    }

    #[test]
    fn test_stage_lifecycle() {
        let mut stage = GameStage::new("main", Box::new(EmptyScript), source());
        assert_eq!(stage.state(), StageState::Registered);

        stage.load().unwrap();
        assert_eq!(stage.state(), StageState::Loaded);
        assert!(stage.update(&GameTime::default(), None).is_none());

        stage.activate();
        assert!(stage.is_active());
        stage.deactivate();
        assert_eq!(stage.state(), StageState::Inactive);

        stage.unload();
        assert_eq!(stage.state(), StageState::Registered);
    }

    #[test]
    fn test_failed_load_leaves_stage_registered() {
        let mut stage = GameStage::new("broken", Box::new(FailingScript), source());
        let err = stage.load().unwrap_err();
        assert!(matches!(
            err,
            EngineError::Resource(ResourceError::ContentNotFound { .. })
        ));
        assert_eq!(stage.state(), StageState::Registered);
        assert!(stage.scene().roots().is_empty());
    }

    #[test]
    fn test_unload_destroys_roots() {
        let mut stage = GameStage::new("main", Box::new(EmptyScript), source());
        stage.load().unwrap();
        let root = stage
            .scene_mut()
            .add_game_object(GameObject::new("ship"))
            .unwrap();
        stage.scene_mut().add_layer("hud", 1).unwrap();

        stage.unload();
        assert!(root.is_destroyed());
        assert!(stage.scene().roots().is_empty());
        assert!(stage.scene().layer("hud").is_none());
    }
}
