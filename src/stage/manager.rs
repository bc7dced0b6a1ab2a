//! 舞台管理器
//!
//! 持有输入控件、舞台注册表和已加载的舞台。宿主每帧调用
//! `update` 和 `render`，管理器负责轮询输入、驱动活动舞台，
//! 并在帧末应用舞台切换请求。

use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use super::registry::{GameInitializer, StageRegistry};
use super::stage::GameStage;
use crate::content::ContentSource;
use crate::core::config::StageConfig;
use crate::core::error::{RegistrationError, Result};
use crate::core::input::{Input, InputDevice};
use crate::core::time::GameTime;
use crate::renderer::RenderBackend;

/// 游戏舞台管理器
///
/// 任一时刻最多只有一个活动舞台；初始化成功后恰好有一个。
pub struct GameStageManager {
    input: Input,
    registry: StageRegistry,
    stages: HashMap<String, GameStage>,
    active: Option<String>,
    content_source: Rc<dyn ContentSource>,
    retain_inactive: bool,
    first_update: bool,
}

impl GameStageManager {
    /// 初始化管理器并激活初始舞台
    ///
    /// 依次调用初始化器的 `initialize_controls` 和 `register_stages`。
    ///
    /// # 错误
    /// - 没有注册任何舞台
    /// - 配置指定的初始舞台未注册
    /// - 初始舞台加载失败
    pub fn initialize(
        initializer: &mut dyn GameInitializer,
        content_source: Rc<dyn ContentSource>,
        config: &StageConfig,
    ) -> Result<Self> {
        let mut input = Input::new();
        initializer.initialize_controls(&mut input)?;

        let mut registry = StageRegistry::new();
        initializer.register_stages(&mut registry)?;
        if registry.is_empty() {
            return Err(RegistrationError::NoStages.into());
        }

        let initial = config
            .initial
            .clone()
            .or_else(|| registry.initial().map(str::to_string))
            .ok_or(RegistrationError::NoStages)?;

        crate::engine_info!(
            controls = input.len(),
            stages = registry.len(),
            initial = %initial,
            "Stage manager initialized"
        );

        let mut manager = Self {
            input,
            registry,
            stages: HashMap::new(),
            active: None,
            content_source,
            retain_inactive: config.retain_inactive,
            first_update: true,
        };
        manager.activate(&initial)?;
        Ok(manager)
    }

    /// 激活舞台
    ///
    /// 先加载目标舞台，成功后才停用当前舞台（按配置卸载或保留），
    /// 因此加载失败时当前舞台保持活动。激活已活动的舞台不做任何事。
    pub fn activate(&mut self, name: &str) -> Result<()> {
        if self.active.as_deref() == Some(name) {
            return Ok(());
        }

        if !self.stages.contains_key(name) {
            let script = self.registry.create(name)?;
            let stage = GameStage::new(name, script, Rc::clone(&self.content_source));
            self.stages.insert(name.to_string(), stage);
        }

        if let Some(stage) = self.stages.get_mut(name) {
            if let Err(e) = stage.load() {
                self.stages.remove(name);
                return Err(e);
            }
        }

        if let Some(previous) = self.active.take() {
            self.deactivate(&previous);
        }

        if let Some(stage) = self.stages.get_mut(name) {
            stage.activate();
        }
        self.active = Some(name.to_string());
        crate::engine_info!(stage = %name, "Stage activated");
        Ok(())
    }

    fn deactivate(&mut self, name: &str) {
        if self.retain_inactive {
            if let Some(stage) = self.stages.get_mut(name) {
                stage.deactivate();
                debug!(stage = %name, "Stage retained");
            }
        } else if let Some(mut stage) = self.stages.remove(name) {
            stage.deactivate();
            stage.unload();
        }
    }

    /// 每帧更新
    ///
    /// 轮询输入、更新活动舞台，然后应用本帧请求的舞台切换。
    pub fn update(&mut self, time: &GameTime, device: &dyn InputDevice) -> Result<()> {
        self.input.poll(device);

        let request = match self.active.as_ref().and_then(|name| self.stages.get_mut(name)) {
            Some(stage) => stage.update(time, Some(&self.input)),
            None => None,
        };
        self.first_update = false;

        if let Some(name) = request {
            crate::engine_info!(stage = %name, "Stage switch requested");
            if let Err(e) = self.activate(&name) {
                crate::engine_warn!(stage = %name, "Stage switch failed: {}", e);
                return Err(e);
            }
        }
        Ok(())
    }

    /// 渲染活动舞台
    pub fn render(&self, time: &GameTime, backend: &mut dyn RenderBackend) -> Result<()> {
        match self.active_stage() {
            Some(stage) => stage.render(time, backend),
            None => Ok(()),
        }
    }

    /// 第一次 `update` 完成之前为 true
    pub fn is_first_update(&self) -> bool {
        self.first_update
    }

    pub fn active_stage(&self) -> Option<&GameStage> {
        self.active.as_ref().and_then(|name| self.stages.get(name))
    }

    pub fn active_stage_mut(&mut self) -> Option<&mut GameStage> {
        self.active.as_ref().and_then(|name| self.stages.get_mut(name))
    }

    pub fn active_stage_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// 已加载（活动或保留）的舞台
    pub fn stage(&self, name: &str) -> Option<&GameStage> {
        self.stages.get(name)
    }

    pub fn input(&self) -> &Input {
        &self.input
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }
}

impl std::fmt::Debug for GameStageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameStageManager")
            .field("active", &self.active)
            .field("loaded", &self.stages.len())
            .field("registry", &self.registry)
            .field("first_update", &self.first_update)
            .finish()
    }
}
