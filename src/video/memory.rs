// In-memory video backend

use super::probe::VideoInfo;
use super::{BgrFrame, FrameReader, FrameWriter, VideoBackend};
use crate::error::WatermarkError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct MemorySource {
    info: VideoInfo,
    frames: Arc<Vec<BgrFrame>>,
    fail_after: Option<usize>,
}

/// [`VideoBackend`] over frames held in memory.
///
/// Sources are registered up front by path. A sink's frames only become
/// visible through [`written`](Self::written) once it is finished, the same
/// way a real encoder only leaves a playable file after a clean close.
#[derive(Default)]
pub struct MemoryVideoBackend {
    sources: Mutex<HashMap<PathBuf, MemorySource>>,
    outputs: Arc<Mutex<HashMap<PathBuf, (VideoInfo, Vec<BgrFrame>)>>>,
    open: Arc<AtomicUsize>,
}

impl MemoryVideoBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_source(&self, path: impl Into<PathBuf>, info: VideoInfo, frames: Vec<BgrFrame>) {
        self.sources.lock().insert(
            path.into(),
            MemorySource {
                info,
                frames: Arc::new(frames),
                fail_after: None,
            },
        );
    }

    /// Make reads from `path` fail once `frames` frames were delivered.
    pub fn fail_after(&self, path: impl AsRef<Path>, frames: usize) {
        if let Some(source) = self.sources.lock().get_mut(path.as_ref()) {
            source.fail_after = Some(frames);
        }
    }

    /// Frames of a finished sink.
    pub fn written(&self, path: impl AsRef<Path>) -> Option<(VideoInfo, Vec<BgrFrame>)> {
        self.outputs.lock().get(path.as_ref()).cloned()
    }

    /// Readers and writers not yet dropped.
    pub fn open_handles(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

impl VideoBackend for MemoryVideoBackend {
    fn open_source(
        &self,
        path: &Path,
    ) -> Result<(VideoInfo, Box<dyn FrameReader>), WatermarkError> {
        let sources = self.sources.lock();
        let source = sources
            .get(path)
            .ok_or_else(|| WatermarkError::decode(path, "no such video"))?;

        let reader = MemoryFrameReader {
            path: path.to_path_buf(),
            frames: Arc::clone(&source.frames),
            next: 0,
            fail_after: source.fail_after,
            _handle: HandleGuard::open(&self.open),
        };
        Ok((source.info, Box::new(reader)))
    }

    fn open_sink(
        &self,
        path: &Path,
        info: &VideoInfo,
    ) -> Result<Box<dyn FrameWriter>, WatermarkError> {
        Ok(Box::new(MemoryFrameWriter {
            path: path.to_path_buf(),
            info: *info,
            frames: Vec::new(),
            outputs: Arc::clone(&self.outputs),
            _handle: HandleGuard::open(&self.open),
        }))
    }
}

/// Counts a handle as open until dropped.
struct HandleGuard(Arc<AtomicUsize>);

impl HandleGuard {
    fn open(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for HandleGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct MemoryFrameReader {
    path: PathBuf,
    frames: Arc<Vec<BgrFrame>>,
    next: usize,
    fail_after: Option<usize>,
    _handle: HandleGuard,
}

impl FrameReader for MemoryFrameReader {
    fn read_frame(&mut self) -> Result<Option<BgrFrame>, WatermarkError> {
        if self.fail_after == Some(self.next) {
            return Err(WatermarkError::decode(
                &self.path,
                format!("corrupt frame at index {}", self.next),
            ));
        }
        let frame = self.frames.get(self.next).cloned();
        if frame.is_some() {
            self.next += 1;
        }
        Ok(frame)
    }
}

struct MemoryFrameWriter {
    path: PathBuf,
    info: VideoInfo,
    frames: Vec<BgrFrame>,
    outputs: Arc<Mutex<HashMap<PathBuf, (VideoInfo, Vec<BgrFrame>)>>>,
    _handle: HandleGuard,
}

impl FrameWriter for MemoryFrameWriter {
    fn write_frame(&mut self, frame: &BgrFrame) -> Result<(), WatermarkError> {
        if frame.width() != self.info.width || frame.height() != self.info.height {
            return Err(WatermarkError::encode(&self.path, "frame size mismatch"));
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<(), WatermarkError> {
        let frames = std::mem::take(&mut self.frames);
        self.outputs
            .lock()
            .insert(self.path.clone(), (self.info, frames));
        Ok(())
    }
}
