//! Stagehand - 无窗口演示宿主
//!
//! 以固定帧间隔驱动 `GameStageManager`，使用脚本化的键盘输入，
//! 并把每帧的绘制命令记录到 `HeadlessBackend`。
//!
//! # 使用方法
//!
//! ```bash
//! # 使用配置文件
//! cargo run
//!
//! # 从 main 舞台开始，运行 300 帧
//! cargo run -- --stage main --frames 300
//! ```
//!
//! # 演示流程
//!
//! ```text
//! title ──(Enter)──> main
//!                     │
//!                     └─ 方向键移动飞船，星空在背景图层按深度排序
//! ```

use std::path::Path;
use std::rc::Rc;

use stagehand::component::{
    Behavior, Camera, Component, ComponentContext, GameObject, Interfaces, SpriteRenderer,
};
use stagehand::content::{ContentSource, FileContentSource, MemoryContentSource, Texture};
use stagehand::core::input::{Control, Input, KeyboardMouse};
use stagehand::core::math::{Color, Vector2};
use stagehand::core::time::GameTime;
use stagehand::core::{log, Config, Result};
use stagehand::renderer::HeadlessBackend;
use stagehand::stage::{GameInitializer, GameStageManager, Scene, SortMode, StageRegistry, StageScript};
use stagehand::{app_error, app_info};
use tracing::debug;
use winit::event::ElementState;
use winit::keyboard::KeyCode;

/// 未配置 `max_frames` 时运行的帧数
const DEFAULT_FRAMES: u64 = 120;

/// 飞船速度（像素/秒）
const SHIP_SPEED: f32 = 240.0;

// ========== 演示游戏 ==========

struct DemoGame;

impl GameInitializer for DemoGame {
    fn initialize_controls(&mut self, input: &mut Input) -> Result<()> {
        input.add_control(Control::button("start", [KeyCode::Enter, KeyCode::Space]))?;
        input.add_control(Control::axis("horizontal", [KeyCode::ArrowLeft], [KeyCode::ArrowRight]))?;
        input.add_control(Control::axis("vertical", [KeyCode::ArrowUp], [KeyCode::ArrowDown]))?;
        Ok(())
    }

    fn register_stages(&mut self, registry: &mut StageRegistry) -> Result<()> {
        registry
            .register_initial("title", || TitleStage)?
            .register("main", || MainStage)?;
        Ok(())
    }
}

/// 标题画面
struct TitleStage;

impl StageScript for TitleStage {
    fn load_content(&mut self, scene: &mut Scene) -> Result<()> {
        let title = scene.load_content::<String>("title")?;
        app_info!(title = %title.trim(), "Title loaded");
        scene.load_content::<Texture>("logo")?;
        Ok(())
    }

    fn initialize(&mut self, scene: &mut Scene) -> Result<()> {
        scene.background = Color::BLACK;
        let logo = scene.get_content::<Texture>("logo")?;
        scene.add_game_object(
            GameObject::new("logo")
                .set_position_xy(640.0, 360.0)
                .add_component(SpriteRenderer::new(logo))
                .add_component(PressToStart),
        )?;
        Ok(())
    }
}

/// 游戏主舞台
struct MainStage;

impl StageScript for MainStage {
    fn load_content(&mut self, scene: &mut Scene) -> Result<()> {
        scene.load_content::<Texture>("ship")?;
        scene.load_content::<Texture>("star")?;
        Ok(())
    }

    fn initialize(&mut self, scene: &mut Scene) -> Result<()> {
        scene.add_layer("background", -1)?.sort = SortMode::BackToFront;

        let star = scene.get_content::<Texture>("star")?;
        let sky = GameObject::new("sky");
        for i in 0..8u8 {
            let depth = f32::from(i) / 8.0;
            sky.add_child(
                &GameObject::new(format!("star-{}", i))
                    .set_local_position(Vector2::new(f32::from(i) * 160.0, f32::from(i % 3) * 240.0))
                    .add_component(SpriteRenderer::on_layer("background", Rc::clone(&star)).with_depth(depth)),
            )?;
        }
        scene.add_game_object(sky)?;

        let ship = scene.get_content::<Texture>("ship")?;
        let player = scene.add_game_object(
            GameObject::new("ship")
                .set_position_xy(640.0, 600.0)
                .add_component(SpriteRenderer::new(ship))
                .add_component(ShipController::default()),
        )?;

        // 相机跟随飞船
        player.add_child(&GameObject::new("camera").add_component(Camera::new()))?;
        Ok(())
    }

    fn unload(&mut self, scene: &mut Scene) {
        if let Some(ship) = scene.find("ship") {
            debug!(position = ?ship.position(), "Ship position at unload");
        }
    }
}

/// 按下 start 后进入主舞台
struct PressToStart;

impl Component for PressToStart {
    fn interfaces(table: &mut Interfaces<'_, Self>) {
        table.behavior();
    }
}

impl Behavior for PressToStart {
    fn handle_input(&mut self, ctx: &ComponentContext<'_>, input: &Input) {
        if input.get_control("start").map(|c| c.was_pressed()).unwrap_or(false) {
            ctx.request_stage("main");
        }
    }
}

/// 方向键控制飞船
struct ShipController {
    direction: Vector2,
}

impl Default for ShipController {
    fn default() -> Self {
        Self {
            direction: Vector2::zeros(),
        }
    }
}

impl Component for ShipController {
    fn update(&mut self, ctx: &ComponentContext<'_>) {
        if self.direction == Vector2::zeros() {
            return;
        }
        let offset = self.direction * SHIP_SPEED * ctx.time().elapsed_secs();
        let ship = ctx.game_object();
        ship.set_local_position(ship.local_position() + offset);
    }

    fn interfaces(table: &mut Interfaces<'_, Self>) {
        table.behavior();
    }
}

impl Behavior for ShipController {
    fn handle_input(&mut self, _ctx: &ComponentContext<'_>, input: &Input) {
        let axis = |key: &str| input.get_control(key).map(|c| c.value()).unwrap_or(0.0);
        self.direction = Vector2::new(axis("horizontal"), axis("vertical"));
    }
}

// ========== 宿主 ==========

/// 内容目录存在时从磁盘读取，否则生成演示内容
fn content_source(config: &Config) -> Result<Rc<dyn ContentSource>> {
    let root = Path::new(&config.stages.content_root);
    if root.is_dir() {
        app_info!(root = %root.display(), "Loading content from disk");
        return Ok(Rc::new(FileContentSource::new(root)));
    }

    debug!("Content directory not found, using generated content");
    let png = |key: &str, size: u32, color: Color| Texture::solid(key, size, size, color).to_png_bytes();
    let source = MemoryContentSource::new()
        .with_text("title", &config.window.title)
        .with_bytes("logo", "png", png("logo", 64, Color::WHITE)?)
        .with_bytes("ship", "png", png("ship", 16, Color::rgb(0.9, 0.3, 0.2))?)
        .with_bytes("star", "png", png("star", 2, Color::rgb(1.0, 1.0, 0.8))?);
    Ok(Rc::new(source))
}

/// 脚本化输入：第 30 帧按下 Enter，之后按住右方向键
fn scripted_input(device: &mut KeyboardMouse, frame: u64) {
    match frame {
        30 => {
            device.on_keyboard_input(KeyCode::Enter, ElementState::Pressed);
        }
        31 => {
            device.on_keyboard_input(KeyCode::Enter, ElementState::Released);
        }
        40 => {
            device.on_keyboard_input(KeyCode::ArrowRight, ElementState::Pressed);
        }
        80 => {
            device.on_keyboard_input(KeyCode::ArrowRight, ElementState::Released);
        }
        _ => {}
    }
}

fn run(config: &Config) -> Result<()> {
    let source = content_source(config)?;
    let mut manager = GameStageManager::initialize(&mut DemoGame, source, &config.stages)?;

    let frames = config.timing.max_frames.unwrap_or(DEFAULT_FRAMES);
    let step = config.timing.frame_duration();
    let mut backend =
        HeadlessBackend::with_capacity(1).with_viewport(config.window.width, config.window.height);
    let mut device = KeyboardMouse::new();
    let mut time = GameTime::default();

    app_info!(frames, step = ?step, "Entering main loop...");
    for frame in 0..frames {
        scripted_input(&mut device, frame);

        time = if manager.is_first_update() {
            GameTime::default()
        } else {
            time.advance(step)
        };

        manager.update(&time, &device)?;
        manager.render(&time, &mut backend)?;
    }

    if let Some(frame) = backend.last_frame() {
        app_info!(
            stage = manager.active_stage_name().unwrap_or("none"),
            viewport = ?frame.viewport,
            layers = ?frame.layer_names(),
            commands = frame.command_count(),
            "Last frame"
        );
    }
    if let Some(ship) = manager.active_stage().and_then(|stage| stage.scene().find("ship")) {
        app_info!(position = ?ship.position(), "Ship");
    }
    Ok(())
}

/// 应用程序入口点
///
/// # 初始化流程
///
/// 1. 加载引擎配置文件（config.toml）
/// 2. 应用命令行参数覆盖
/// 3. 初始化日志系统
/// 4. 初始化舞台管理器并运行固定帧数
fn main() {
    // 1. 加载配置（在初始化日志之前）
    let mut config = Config::from_file_or_default("config.toml");

    // 2. 应用命令行参数
    config.apply_args(std::env::args());

    // 3. 验证配置
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    // 4. 初始化日志系统（使用配置中的设置）
    let log_file = if config.logging.file_output {
        Some(config.logging.log_file.as_str())
    } else {
        None
    };
    log::init_logger(config.logging.level, config.logging.file_output, log_file);
    app_info!(version = env!("CARGO_PKG_VERSION"), "Stagehand starting...");

    if let Err(e) = run(&config) {
        app_error!("Stagehand stopped: {}", e);
        eprintln!("Stagehand stopped: {}", e);
        std::process::exit(1);
    }
    app_info!("Shutting down");
}
