//! Frame sources feeding the sampler.
//!
//! A source owns its underlying input (decoded buffers or files on disk) and
//! yields frames strictly in order. The sampler takes ownership of the source
//! for the duration of a pass, so every handle it holds is released when the
//! pass returns, whether it succeeded, failed or was cancelled.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use emo_models::{frame_timestamp, PersonLandmarks};
use image::DynamicImage;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// File extensions accepted by [`ImageSequenceSource`].
pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// A decoded, timestamped frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Frame index within the input (0-based)
    pub index: u64,
    /// Timestamp in seconds
    pub timestamp: f64,
    /// Decoded image
    pub image: DynamicImage,
    /// Landmarks decoded alongside the frame, if the producer already ran the model
    pub landmarks: Option<Vec<PersonLandmarks>>,
}

impl Frame {
    pub fn new(index: u64, timestamp: f64, image: DynamicImage) -> Self {
        Self {
            index,
            timestamp,
            image,
            landmarks: None,
        }
    }

    pub fn with_landmarks(mut self, landmarks: Vec<PersonLandmarks>) -> Self {
        self.landmarks = Some(landmarks);
        self
    }
}

/// Stream-level information known before scanning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInfo {
    /// Total number of frames
    pub frame_count: u64,
    /// Nominal frame rate
    pub fps: f64,
    /// Frame width in pixels (0 if unknown)
    pub width: u32,
    /// Frame height in pixels (0 if unknown)
    pub height: u32,
}

impl StreamInfo {
    pub fn new(frame_count: u64, fps: f64) -> Self {
        Self {
            frame_count,
            fps,
            width: 0,
            height: 0,
        }
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        frame_timestamp(self.frame_count, self.fps)
    }

    /// Timestamps are derived from `fps`, so it must be positive and finite.
    pub fn validate(&self) -> MediaResult<()> {
        validate_fps(self.fps)
    }
}

fn validate_fps(fps: f64) -> MediaResult<()> {
    if fps.is_finite() && fps > 0.0 {
        Ok(())
    } else {
        Err(MediaError::invalid_config(format!(
            "fps must be positive, got {}",
            fps
        )))
    }
}

/// Sequential frame input.
pub trait FrameSource: Send {
    /// Stream information, available before the first read.
    fn info(&self) -> StreamInfo;

    /// Read and decode the next frame. `Ok(None)` marks the end of the stream.
    fn next_frame(&mut self) -> MediaResult<Option<Frame>>;

    /// Advance past the next frame without needing its pixels.
    ///
    /// Returns `false` at end of stream. Sources that can avoid decoding
    /// should override this.
    fn skip_frame(&mut self) -> MediaResult<bool> {
        Ok(self.next_frame()?.is_some())
    }
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn info(&self) -> StreamInfo {
        (**self).info()
    }

    fn next_frame(&mut self) -> MediaResult<Option<Frame>> {
        (**self).next_frame()
    }

    fn skip_frame(&mut self) -> MediaResult<bool> {
        (**self).skip_frame()
    }
}

/// Frames already decoded in memory (webcam buffers, uploads decoded upstream, tests).
pub struct MemoryFrameSource {
    frames: VecDeque<Frame>,
    info: StreamInfo,
}

impl MemoryFrameSource {
    /// Create a source from decoded frames. Frames must be in index order.
    pub fn new(frames: Vec<Frame>, fps: f64) -> Self {
        let (width, height) = frames
            .first()
            .map(|f| (f.image.width(), f.image.height()))
            .unwrap_or((0, 0));
        let info = StreamInfo {
            frame_count: frames.len() as u64,
            fps,
            width,
            height,
        };
        Self {
            frames: frames.into(),
            info,
        }
    }

    /// Create a source from images, assigning indices and timestamps from `fps`.
    pub fn from_images(images: Vec<DynamicImage>, fps: f64) -> Self {
        let frames = images
            .into_iter()
            .enumerate()
            .map(|(i, image)| Frame::new(i as u64, frame_timestamp(i as u64, fps), image))
            .collect();
        Self::new(frames, fps)
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for MemoryFrameSource {
    fn info(&self) -> StreamInfo {
        self.info
    }

    fn next_frame(&mut self) -> MediaResult<Option<Frame>> {
        Ok(self.frames.pop_front())
    }

    fn skip_frame(&mut self) -> MediaResult<bool> {
        Ok(self.frames.pop_front().is_some())
    }
}

/// A directory of still images treated as consecutive frames, ordered by file name.
///
/// Files are only opened when a frame is actually read; skipped frames are
/// never decoded.
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    cursor: usize,
    info: StreamInfo,
}

impl ImageSequenceSource {
    /// Open a directory of frames.
    pub fn open(dir: impl AsRef<Path>, fps: f64) -> MediaResult<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(MediaError::FileNotFound(dir.to_path_buf()));
        }
        validate_fps(fps)?;

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)
            .map_err(|e| MediaError::stream_read_at(format!("cannot list frames: {e}"), dir))?
        {
            let path = entry?.path();
            if is_supported_image(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let (width, height) = match paths.first() {
            Some(first) => image::image_dimensions(first).map_err(|e| {
                MediaError::stream_read_at(format!("cannot read frame header: {e}"), first)
            })?,
            None => (0, 0),
        };

        debug!(
            dir = %dir.display(),
            frames = paths.len(),
            width,
            height,
            "Opened image sequence"
        );

        Ok(Self {
            info: StreamInfo {
                frame_count: paths.len() as u64,
                fps,
                width,
                height,
            },
            paths,
            cursor: 0,
        })
    }
}

impl FrameSource for ImageSequenceSource {
    fn info(&self) -> StreamInfo {
        self.info
    }

    fn next_frame(&mut self) -> MediaResult<Option<Frame>> {
        let Some(path) = self.paths.get(self.cursor) else {
            return Ok(None);
        };
        let index = self.cursor as u64;
        self.cursor += 1;

        let image = image::open(path)
            .map_err(|e| MediaError::stream_read_at(format!("cannot decode frame {index}: {e}"), path))?;

        Ok(Some(Frame::new(
            index,
            frame_timestamp(index, self.info.fps),
            image,
        )))
    }

    fn skip_frame(&mut self) -> MediaResult<bool> {
        if self.cursor >= self.paths.len() {
            return Ok(false);
        }
        self.cursor += 1;
        Ok(true)
    }
}

fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            SUPPORTED_IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
