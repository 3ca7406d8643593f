//! 时钟域转换
//!
//! 首条有效记录到达时捕获 `(device_t0, wall_t0)`，之后所有样本按
//! `wall_t0 + (device_ts - device_t0) / 1e6` 映射到墙钟时间轴。
//! 捕获后不再重新同步。

/// 设备时钟到墙钟的一次性锚点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockAnchor {
    device_t0_us: f64,
    wall_t0: f64,
}

impl ClockAnchor {
    /// 以首条记录的设备时间戳与当前墙钟时间建立锚点
    pub fn capture(device_t0_us: f64, wall_t0: f64) -> Self {
        Self {
            device_t0_us,
            wall_t0,
        }
    }

    /// 设备时间戳 (微秒) 转墙钟时间 (秒)
    pub fn to_wall(&self, device_us: f64) -> f64 {
        self.wall_t0 + (device_us - self.device_t0_us) / 1_000_000.0
    }

    pub fn device_t0_us(&self) -> f64 {
        self.device_t0_us
    }

    pub fn wall_t0(&self) -> f64 {
        self.wall_t0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_maps_first_record_to_wall_t0() {
        let anchor = ClockAnchor::capture(5_000_000.0, 1_700_000_000.0);
        assert_eq!(anchor.to_wall(5_000_000.0), 1_700_000_000.0);
    }

    #[test]
    fn test_anchor_offsets_in_seconds() {
        let anchor = ClockAnchor::capture(1_000.0, 100.0);
        assert!((anchor.to_wall(501_000.0) - 100.5).abs() < 1e-9);
        // device counter behind the anchor maps before wall_t0
        assert!((anchor.to_wall(0.0) - 99.999).abs() < 1e-9);
    }
}
