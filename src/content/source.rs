//! 内容源
//!
//! 内容按 `键 + 扩展名` 定位，例如键 `ship` 的纹理对应 `ship.png`。

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::trace;

use crate::core::error::{ResourceError, Result};

/// 原始内容数据的来源
pub trait ContentSource {
    /// 读取键对应的原始字节
    fn read(&self, key: &str, extension: &str) -> Result<Vec<u8>>;
}

fn file_name(key: &str, extension: &str) -> String {
    if extension.is_empty() {
        key.to_string()
    } else {
        format!("{key}.{extension}")
    }
}

/// 从目录读取内容
#[derive(Debug, Clone)]
pub struct FileContentSource {
    root: PathBuf,
}

impl FileContentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

impl ContentSource for FileContentSource {
    fn read(&self, key: &str, extension: &str) -> Result<Vec<u8>> {
        let path = self.root.join(file_name(key, extension));
        trace!(path = %path.display(), "Reading content file");

        std::fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ResourceError::ContentNotFound {
                key: key.to_string(),
                path,
            }
            .into(),
            _ => e.into(),
        })
    }
}

/// 内存中的内容（用于测试和无头运行）
#[derive(Debug, Clone, Default)]
pub struct MemoryContentSource {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryContentSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入键和扩展名对应的数据
    pub fn insert(&mut self, key: &str, extension: &str, bytes: Vec<u8>) {
        self.entries.insert(file_name(key, extension), bytes);
    }

    pub fn with_bytes(mut self, key: &str, extension: &str, bytes: Vec<u8>) -> Self {
        self.insert(key, extension, bytes);
        self
    }

    /// 插入文本内容（`.txt`）
    pub fn with_text(self, key: &str, text: &str) -> Self {
        self.with_bytes(key, "txt", text.as_bytes().to_vec())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ContentSource for MemoryContentSource {
    fn read(&self, key: &str, extension: &str) -> Result<Vec<u8>> {
        let name = file_name(key, extension);
        self.entries.get(&name).cloned().ok_or_else(|| {
            ResourceError::ContentNotFound {
                key: key.to_string(),
                path: PathBuf::from(name),
            }
            .into()
        })
    }
}
