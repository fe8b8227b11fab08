//! Seam to the video source.

/// Reference to the frame currently shown by the video source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// Monotonic frame counter of the source
    pub sequence: u64,
}

/// Source of camera frames
pub trait VideoSource {
    /// Pixel dimensions of the current frame
    fn dimensions(&self) -> (u32, u32);

    /// Whether the source can call back when a new frame is decoded
    fn supports_frame_callback(&self) -> bool;

    /// The frame to run detection on
    fn current_frame(&self) -> VideoFrame;
}

/// Fixed-size source that advances one frame per call to [`StaticVideo::advance`]
#[derive(Debug, Clone)]
pub struct StaticVideo {
    width: u32,
    height: u32,
    sequence: u64,
    frame_callbacks: bool,
}

impl StaticVideo {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            sequence: 0,
            frame_callbacks: true,
        }
    }

    /// Simulate a source without new-frame callbacks
    #[must_use]
    pub fn without_frame_callbacks(mut self) -> Self {
        self.frame_callbacks = false;
        self
    }

    pub fn advance(&mut self) {
        self.sequence += 1;
    }
}

impl VideoSource for StaticVideo {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn supports_frame_callback(&self) -> bool {
        self.frame_callbacks
    }

    fn current_frame(&self) -> VideoFrame {
        VideoFrame {
            width: self.width,
            height: self.height,
            sequence: self.sequence,
        }
    }
}
