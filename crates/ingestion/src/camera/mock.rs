//! Mock 相机
//!
//! 生成随帧号平移的 RGB 渐变图像。

use contracts::{CameraFrame, CameraSource, ContractError};

/// Mock 相机源
#[derive(Debug, Clone)]
pub struct MockCamera {
    width: u32,
    height: u32,
    frame_index: u64,
    /// 每 N 帧返回一次"无帧" (None = 从不)
    drop_every: Option<u64>,
}

impl MockCamera {
    /// 创建新的 Mock 相机
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame_index: 0,
            drop_every: None,
        }
    }

    /// 周期性丢帧
    pub fn with_drop_every(mut self, every: u64) -> Self {
        self.drop_every = (every > 0).then_some(every);
        self
    }

    fn render(&self) -> Vec<u8> {
        let (w, h) = (self.width as usize, self.height as usize);
        let shift = (self.frame_index * 4) as usize;
        let mut data = Vec::with_capacity(w * h * 3);
        for y in 0..h {
            for x in 0..w {
                let r = ((x + shift) * 255 / w.max(1)) as u8;
                let g = (y * 255 / h.max(1)) as u8;
                let b = (((x + y) / 2 + shift) % 256) as u8;
                data.extend_from_slice(&[r, g, b]);
            }
        }
        data
    }
}

impl CameraSource for MockCamera {
    fn name(&self) -> &str {
        "mock-camera"
    }

    fn read_frame(&mut self) -> Result<Option<CameraFrame>, ContractError> {
        self.frame_index += 1;
        if let Some(every) = self.drop_every {
            if self.frame_index % every == 0 {
                return Ok(None);
            }
        }
        CameraFrame::new(self.width, self.height, self.render()).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_has_rgb_layout() {
        let mut camera = MockCamera::new(8, 4);
        let frame = camera.read_frame().unwrap().unwrap();
        assert_eq!(frame.data().len(), 8 * 4 * 3);
    }

    #[test]
    fn test_frames_change_over_time() {
        let mut camera = MockCamera::new(16, 16);
        let a = camera.read_frame().unwrap().unwrap();
        let b = camera.read_frame().unwrap().unwrap();
        assert_ne!(a.data(), b.data());
    }

    #[test]
    fn test_drop_every() {
        let mut camera = MockCamera::new(4, 4).with_drop_every(3);
        assert!(camera.read_frame().unwrap().is_some());
        assert!(camera.read_frame().unwrap().is_some());
        assert!(camera.read_frame().unwrap().is_none());
        assert!(camera.read_frame().unwrap().is_some());
    }
}
