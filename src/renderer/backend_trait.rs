//! 统一的渲染后端接口
//!
//! 舞台只通过这个接口提交绘制命令，具体的图形 API（或无头记录器）
//! 由宿主程序选择。

use crate::core::math::Color;
use crate::stage::Layer;

use super::{DrawCommand, View};

/// 统一的渲染后端接口
///
/// 每帧的调用顺序固定为：
///
/// ```text
/// begin_frame
///   begin_layer  draw*  end_layer     (按图层顺序重复)
/// end_frame
/// ```
///
/// 所有方法都返回 `anyhow::Result`，后端自身的错误原样向上传播。
///
/// # 示例
///
/// ```ignore
/// let mut backend = HeadlessBackend::new();
/// manager.render(&time, &mut backend)?;
/// ```
pub trait RenderBackend {
    /// 视口尺寸（宽, 高）
    fn viewport(&self) -> (u32, u32);

    /// 开始一帧，并用背景色清屏
    fn begin_frame(&mut self, clear_color: Color) -> anyhow::Result<()>;

    /// 开始一个图层
    ///
    /// # 参数
    ///
    /// * `layer` - 图层及其绘制状态（混合、采样、排序）
    /// * `view` - 舞台相机的视图
    fn begin_layer(&mut self, layer: &Layer, view: &View) -> anyhow::Result<()>;

    /// 绘制一条命令（已按图层的排序方式排好）
    fn draw(&mut self, command: &DrawCommand) -> anyhow::Result<()>;

    /// 结束当前图层
    fn end_layer(&mut self) -> anyhow::Result<()>;

    /// 结束并呈现这一帧
    fn end_frame(&mut self) -> anyhow::Result<()>;
}
