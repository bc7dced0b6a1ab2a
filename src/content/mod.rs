//! 内容管理模块
//!
//! 舞台在加载阶段按键加载内容，之后组件通过键共享只读访问。
//! 具体的数据来源由 `ContentSource` 提供，解码由各内容类型的 `Content` 实现负责。
//!
//! # 使用示例
//!
//! ```
//! use std::rc::Rc;
//! use stagehand::content::{ContentManager, MemoryContentSource};
//!
//! let source = Rc::new(MemoryContentSource::new().with_text("intro", "Press start"));
//! let mut content = ContentManager::new(source);
//!
//! content.load::<String>("intro").unwrap();
//! assert_eq!(content.get::<String>("intro").unwrap().as_str(), "Press start");
//! ```

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::rc::Rc;

use anyhow::Context;
use tracing::debug;

use crate::core::error::{EngineError, ResourceError, Result};

mod source;
mod texture;

pub use source::{ContentSource, FileContentSource, MemoryContentSource};
pub use texture::Texture;

/// 可以从原始字节加载的内容类型
pub trait Content: Any + Sized {
    /// 内容文件的扩展名
    const EXTENSION: &'static str;

    /// 解码原始字节
    fn decode(key: &str, bytes: Vec<u8>) -> anyhow::Result<Self>;
}

impl Content for String {
    const EXTENSION: &'static str = "txt";

    fn decode(_key: &str, bytes: Vec<u8>) -> anyhow::Result<Self> {
        Ok(String::from_utf8(bytes)?)
    }
}

/// 按键管理已加载的内容
pub struct ContentManager {
    source: Rc<dyn ContentSource>,
    items: HashMap<String, Rc<dyn Any>>,
}

impl ContentManager {
    pub fn new(source: Rc<dyn ContentSource>) -> Self {
        Self {
            source,
            items: HashMap::new(),
        }
    }

    /// 加载内容
    ///
    /// 已加载的键直接返回缓存（类型不符时返回错误）。
    pub fn load<T: Content>(&mut self, key: &str) -> Result<Rc<T>> {
        if self.items.contains_key(key) {
            return self.get::<T>(key);
        }

        let bytes = self.source.read(key, T::EXTENSION)?;
        let item = T::decode(key, bytes)
            .with_context(|| format!("failed to decode content '{key}' as {}", type_name::<T>()))
            .map_err(EngineError::External)?;

        debug!(key, kind = type_name::<T>(), "Content loaded");
        let item = Rc::new(item);
        self.items.insert(key.to_string(), item.clone());
        Ok(item)
    }

    /// 直接放入一个已构建的内容
    pub fn insert<T: Content>(&mut self, key: &str, item: T) -> Rc<T> {
        let item = Rc::new(item);
        self.items.insert(key.to_string(), item.clone());
        item
    }

    /// 获取已加载的内容
    pub fn get<T: Content>(&self, key: &str) -> Result<Rc<T>> {
        let item = self
            .items
            .get(key)
            .ok_or_else(|| ResourceError::ContentNotLoaded(key.to_string()))?;

        Rc::clone(item)
            .downcast::<T>()
            .map_err(|_| {
                ResourceError::ContentTypeMismatch {
                    key: key.to_string(),
                    expected: type_name::<T>(),
                }
                .into()
            })
    }

    pub fn is_loaded(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 卸载全部内容
    pub fn unload_all(&mut self) {
        if !self.items.is_empty() {
            debug!(count = self.items.len(), "Content unloaded");
        }
        self.items.clear();
    }

    pub fn source(&self) -> &Rc<dyn ContentSource> {
        &self.source
    }
}

impl std::fmt::Debug for ContentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&String> = self.items.keys().collect();
        keys.sort();
        f.debug_struct("ContentManager").field("items", &keys).finish()
    }
}
