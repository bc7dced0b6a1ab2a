//! 舞台注册表

use std::collections::HashMap;

use tracing::debug;

use super::stage::StageScript;
use crate::core::error::{RegistrationError, Result};
use crate::core::input::Input;

/// 游戏初始化器
///
/// 由游戏提供，在舞台管理器初始化时调用一次。
pub trait GameInitializer {
    /// 注册输入控件
    fn initialize_controls(&mut self, _input: &mut Input) -> Result<()> {
        Ok(())
    }

    /// 注册舞台
    fn register_stages(&mut self, registry: &mut StageRegistry) -> Result<()>;
}

/// 创建舞台脚本的工厂
pub type StageFactory = Box<dyn Fn() -> Box<dyn StageScript>>;

/// 名称到舞台工厂的映射
///
/// 记录注册顺序；没有指定初始舞台时，第一个注册的舞台就是初始舞台。
#[derive(Default)]
pub struct StageRegistry {
    factories: HashMap<String, StageFactory>,
    order: Vec<String>,
    initial: Option<String>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册舞台
    ///
    /// # 错误
    /// 同名舞台已注册
    pub fn register<S, F>(&mut self, name: impl Into<String>, factory: F) -> Result<&mut Self>
    where
        S: StageScript + 'static,
        F: Fn() -> S + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(RegistrationError::DuplicateStage(name).into());
        }

        debug!(stage = %name, "Stage registered");
        self.factories
            .insert(name.clone(), Box::new(move || Box::new(factory()) as Box<dyn StageScript>));
        self.order.push(name);
        Ok(self)
    }

    /// 注册舞台并指定为初始舞台
    pub fn register_initial<S, F>(&mut self, name: impl Into<String>, factory: F) -> Result<&mut Self>
    where
        S: StageScript + 'static,
        F: Fn() -> S + 'static,
    {
        let name = name.into();
        self.register(name.clone(), factory)?;
        self.initial = Some(name);
        Ok(self)
    }

    /// 指定已注册的舞台为初始舞台
    pub fn set_initial(&mut self, name: &str) -> Result<()> {
        if !self.contains(name) {
            return Err(RegistrationError::UnknownStage(name.to_string()).into());
        }
        self.initial = Some(name.to_string());
        Ok(())
    }

    /// 初始舞台：指定的，否则第一个注册的
    pub fn initial(&self) -> Option<&str> {
        self.initial
            .as_deref()
            .or_else(|| self.order.first().map(String::as_str))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// 按注册顺序排列的舞台名称
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// 创建舞台脚本
    pub fn create(&self, name: &str) -> Result<Box<dyn StageScript>> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| RegistrationError::UnknownStage(name.to_string()).into())
    }
}

impl std::fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageRegistry")
            .field("stages", &self.order)
            .field("initial", &self.initial())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::EngineError;
    use crate::stage::Scene;

    struct Blank;

    impl StageScript for Blank {
        fn initialize(&mut self, _scene: &mut Scene) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_register_keeps_order() {
        let mut registry = StageRegistry::new();
        registry
            .register("title", || Blank)
            .unwrap()
            .register("gameplay", || Blank)
            .unwrap();

        assert_eq!(registry.names(), ["title", "gameplay"]);
        assert_eq!(registry.initial(), Some("title"));
        assert!(registry.create("gameplay").is_ok());
    }

    #[test]
    fn test_duplicate_stage_is_rejected() {
        let mut registry = StageRegistry::new();
        registry.register("title", || Blank).unwrap();
        let err = registry.register("title", || Blank).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Registration(RegistrationError::DuplicateStage(ref name)) if name == "title"
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_initial_stage_designation() {
        let mut registry = StageRegistry::new();
        registry.register("title", || Blank).unwrap();
        registry.register_initial("gameplay", || Blank).unwrap();
        assert_eq!(registry.initial(), Some("gameplay"));

        assert!(registry.set_initial("credits").is_err());
        registry.set_initial("title").unwrap();
        assert_eq!(registry.initial(), Some("title"));
    }

    #[test]
    fn test_empty_registry() {
        let registry = StageRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.initial(), None);
        assert!(matches!(
            registry.create("title"),
            Err(EngineError::Registration(RegistrationError::UnknownStage(_)))
        ));
    }
}
