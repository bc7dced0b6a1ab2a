//! 帧时间

use std::time::Duration;

/// 一帧的时间信息
///
/// 由宿主循环在每帧调用 `update`/`render` 时传入。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GameTime {
    /// 自开始以来的总时间
    pub total: Duration,
    /// 距上一帧的时间
    pub elapsed: Duration,
    /// 帧序号
    pub frame: u64,
}

impl GameTime {
    pub fn new(total: Duration, elapsed: Duration) -> Self {
        Self { total, elapsed, frame: 0 }
    }

    /// 上一帧耗时（秒）
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// 总时间（秒）
    pub fn total_secs(&self) -> f32 {
        self.total.as_secs_f32()
    }

    /// 前进一帧，返回新的帧时间
    pub fn advance(&self, delta: Duration) -> Self {
        Self {
            total: self.total + delta,
            elapsed: delta,
            frame: self.frame + 1,
        }
    }
}
