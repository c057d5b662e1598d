use anyhow::Result;
use time::OffsetDateTime;

#[derive(Debug, Clone)]
pub struct Frame {
    pub seq: u64,
    pub width: u32,
    pub height: u32,
    pub captured_unix_ms: i64,
    /// 8-bit grayscale, row major.
    pub pixels: Vec<u8>,
}

/// Camera-like video source feeding the video panel.
pub trait FrameSource: Send {
    fn grab(&mut self) -> Result<Frame>;
}

/// Synthetic moving gradient used when no downlink is attached.
#[derive(Debug, Clone)]
pub struct TestPattern {
    width: u32,
    height: u32,
    seq: u64,
}

impl TestPattern {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, seq: 0 }
    }
}

impl Default for TestPattern {
    fn default() -> Self {
        Self::new(320, 240)
    }
}

impl FrameSource for TestPattern {
    fn grab(&mut self) -> Result<Frame> {
        anyhow::ensure!(self.width > 0 && self.height > 0, "test pattern has no pixels");
        self.seq += 1;
        let shift = self.seq as u32;
        let pixels = (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| ((x + y + shift) & 0xff) as u8))
            .collect();
        Ok(Frame {
            seq: self.seq,
            width: self.width,
            height: self.height,
            captured_unix_ms: (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64,
            pixels,
        })
    }
}
