//! 无头渲染后端
//!
//! 不访问任何图形设备，只记录每帧提交的图层和绘制命令。

use anyhow::{bail, Context};
use tracing::trace;

use super::{DrawCommand, RenderBackend, View};
use crate::core::math::Color;
use crate::stage::Layer;

/// 一个图层的提交记录
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedLayer {
    pub name: String,
    pub view: View,
    pub commands: Vec<DrawCommand>,
}

/// 一帧的提交记录
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFrame {
    pub clear_color: Color,
    /// 视口尺寸（宽, 高）
    pub viewport: (u32, u32),
    pub layers: Vec<RecordedLayer>,
}

impl RecordedFrame {
    /// 图层名称（按提交顺序）
    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|layer| layer.name.as_str()).collect()
    }

    pub fn command_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.commands.len()).sum()
    }
}

/// 记录提交内容的渲染后端
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    frames: Vec<RecordedFrame>,
    current: Option<RecordedFrame>,
    /// 保留的最大帧数，0 表示不限
    capacity: usize,
    viewport: (u32, u32),
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 只保留最近 `capacity` 帧
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// 设置视口尺寸，记录在之后的每一帧中
    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = (width, height);
        self
    }

    /// 已完成的帧
    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&RecordedFrame> {
        self.frames.last()
    }

    fn frame_mut(&mut self) -> anyhow::Result<&mut RecordedFrame> {
        self.current.as_mut().context("no frame in progress")
    }

    fn layer_mut(&mut self) -> anyhow::Result<&mut RecordedLayer> {
        self.frame_mut()?
            .layers
            .last_mut()
            .context("no layer in progress")
    }
}

impl RenderBackend for HeadlessBackend {
    fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    fn begin_frame(&mut self, clear_color: Color) -> anyhow::Result<()> {
        if self.current.is_some() {
            bail!("begin_frame called twice without end_frame");
        }
        self.current = Some(RecordedFrame {
            clear_color,
            viewport: self.viewport,
            layers: Vec::new(),
        });
        Ok(())
    }

    fn begin_layer(&mut self, layer: &Layer, view: &View) -> anyhow::Result<()> {
        self.frame_mut()?.layers.push(RecordedLayer {
            name: layer.name().to_string(),
            view: *view,
            commands: Vec::new(),
        });
        Ok(())
    }

    fn draw(&mut self, command: &DrawCommand) -> anyhow::Result<()> {
        self.layer_mut()?.commands.push(command.clone());
        Ok(())
    }

    fn end_layer(&mut self) -> anyhow::Result<()> {
        self.layer_mut().map(|_| ())
    }

    fn end_frame(&mut self) -> anyhow::Result<()> {
        let frame = self.current.take().context("end_frame without begin_frame")?;
        trace!(
            layers = frame.layers.len(),
            commands = frame.command_count(),
            "Headless frame recorded"
        );
        self.frames.push(frame);
        if self.capacity > 0 && self.frames.len() > self.capacity {
            let overflow = self.frames.len() - self.capacity;
            self.frames.drain(..overflow);
        }
        Ok(())
    }
}
