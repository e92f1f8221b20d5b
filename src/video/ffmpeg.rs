//! Frame source and sink over `ffmpeg` raw-video pipes.
//!
//! The decoder writes packed BGR24 frames to its stdout; the encoder reads
//! them from its stdin. Both processes are owned by an [`FfmpegProcess`]
//! that kills and reaps the child when dropped, so an early return from
//! the compositor never leaves a process or open output file behind.

use super::probe::{probe_video, VideoInfo};
use super::{BgrFrame, FrameReader, FrameWriter, VideoBackend};
use crate::config::VideoConfig;
use crate::error::WatermarkError;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};

/// Containers that carry a fourcc codec tag.
const TAGGED_CONTAINERS: &[&str] = &["mp4", "m4v", "mov", "avi"];

/// [`VideoBackend`] backed by the `ffmpeg` and `ffprobe` executables.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    codec: String,
    codec_tag: Option<String>,
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::from_config(&VideoConfig::default())
    }
}

impl FfmpegBackend {
    pub fn from_config(config: &VideoConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg_path.clone(),
            ffprobe: config.ffprobe_path.clone(),
            codec: config.codec.clone(),
            codec_tag: config.codec_tag.clone(),
        }
    }

    fn decoder_command(&self, source: &Path) -> Command {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-hide_banner", "-nostdin", "-loglevel", "error", "-autorotate", "-i"]);
        cmd.arg(source);
        cmd.args([
            "-map", "0:v:0",
            "-an", "-sn", "-dn",
            "-vsync", "0",
            "-f", "rawvideo",
            "-pix_fmt", "bgr24",
            "pipe:1",
        ]);
        cmd
    }

    fn encoder_command(&self, output: &Path, info: &VideoInfo) -> Command {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-hide_banner", "-loglevel", "error", "-y"]);
        cmd.args(["-f", "rawvideo", "-pix_fmt", "bgr24"]);
        cmd.arg("-s").arg(format!("{}x{}", info.width, info.height));
        cmd.arg("-r").arg(info.frame_rate.to_string());
        cmd.args(["-i", "pipe:0", "-an", "-c:v"]);
        cmd.arg(&self.codec);
        if let Some(tag) = self.codec_tag.as_deref().filter(|_| carries_codec_tag(output)) {
            cmd.arg("-tag:v").arg(tag);
        }
        cmd.args(["-pix_fmt", "yuv420p"]);
        cmd.arg(output);
        cmd
    }

    /// One black frame in the output's container and codec.
    fn seed_command(&self, seed: &Path, info: &VideoInfo) -> Command {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-hide_banner", "-nostdin", "-loglevel", "error", "-y"]);
        cmd.args(["-f", "lavfi", "-i"]);
        cmd.arg(format!(
            "color=c=black:s={}x{}:r={}",
            info.width, info.height, info.frame_rate
        ));
        cmd.args(["-frames:v", "1", "-an", "-c:v"]);
        cmd.arg(&self.codec);
        if let Some(tag) = self.codec_tag.as_deref().filter(|_| carries_codec_tag(seed)) {
            cmd.arg("-tag:v").arg(tag);
        }
        cmd.args(["-pix_fmt", "yuv420p"]);
        cmd.arg(seed);
        cmd
    }

    /// Stream-copy the seed's headers into `output` without any frames.
    fn empty_copy_command(&self, seed: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-hide_banner", "-nostdin", "-loglevel", "error", "-y", "-i"]);
        cmd.arg(seed);
        cmd.args(["-map", "0:v:0", "-c", "copy", "-frames:v", "0"]);
        cmd.arg(output);
        cmd
    }

    /// Write a valid video file at `output` that holds no frames.
    fn write_empty_video(&self, output: &Path, info: &VideoInfo) -> Result<(), WatermarkError> {
        let seed = seed_path(output);
        let result = run_to_completion(self.seed_command(&seed, info))
            .and_then(|()| run_to_completion(self.empty_copy_command(&seed, output)))
            .map_err(|message| WatermarkError::encode(output, message));

        if let Err(e) = std::fs::remove_file(&seed) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(seed = %seed.display(), error = %e, "Failed to remove seed video");
            }
        }
        result
    }
}

/// Hidden sibling of `output` with the same extension.
fn seed_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!(".seed-{}", name))
}

/// Run a short ffmpeg job. `Err` carries the exit status and stderr.
fn run_to_completion(mut command: Command) -> Result<(), String> {
    let output = command
        .stdin(Stdio::null())
        .output()
        .map_err(|e| format!("failed to start ffmpeg: {}", e))?;
    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(format!("ffmpeg exited with {}: {}", output.status, stderr.trim()))
    }
}

fn carries_codec_tag(output: &Path) -> bool {
    output
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| TAGGED_CONTAINERS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl VideoBackend for FfmpegBackend {
    fn open_source(
        &self,
        path: &Path,
    ) -> Result<(VideoInfo, Box<dyn FrameReader>), WatermarkError> {
        let info = probe_video(&self.ffprobe, path)?;
        let reader = FfmpegFrameReader::spawn(self.decoder_command(path), path, &info)?;
        tracing::debug!(
            source = %path.display(),
            width = info.width,
            height = info.height,
            fps = %info.frame_rate,
            "Opened video decoder"
        );
        Ok((info, Box::new(reader)))
    }

    fn open_sink(
        &self,
        path: &Path,
        info: &VideoInfo,
    ) -> Result<Box<dyn FrameWriter>, WatermarkError> {
        let writer = FfmpegFrameWriter::spawn(self.clone(), path, info)?;
        tracing::debug!(
            output = %path.display(),
            codec = %self.codec,
            fps = %info.frame_rate,
            "Opened video encoder"
        );
        Ok(Box::new(writer))
    }
}

/// A running ffmpeg child with its stderr drained on a helper thread.
struct FfmpegProcess {
    child: Option<Child>,
    stderr: Option<JoinHandle<String>>,
}

impl FfmpegProcess {
    fn new(mut child: Child) -> Self {
        let stderr = child.stderr.take().map(drain_stderr);
        Self {
            child: Some(child),
            stderr,
        }
    }

    /// Wait for exit. `Err` carries the exit status and ffmpeg's stderr.
    fn wait(&mut self) -> Result<(), String> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child.wait().map_err(|e| e.to_string())?;
        let stderr = self.collect_stderr();
        if status.success() {
            Ok(())
        } else {
            Err(format!("ffmpeg exited with {}: {}", status, stderr.trim()))
        }
    }

    fn collect_stderr(&mut self) -> String {
        self.stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default()
    }
}

impl Drop for FfmpegProcess {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        self.collect_stderr();
    }
}

fn drain_stderr(mut stderr: ChildStderr) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stderr.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Fill `buf` as far as the stream allows. Returns the bytes read; less
/// than `buf.len()` only at end of stream.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Decoded frames from an `ffmpeg` child process.
pub struct FfmpegFrameReader {
    // Dropped before `process` so the child sees a closed pipe.
    stdout: Option<ChildStdout>,
    process: FfmpegProcess,
    path: PathBuf,
    width: u32,
    height: u32,
    frames_read: u64,
}

impl FfmpegFrameReader {
    fn spawn(mut command: Command, path: &Path, info: &VideoInfo) -> Result<Self, WatermarkError> {
        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| WatermarkError::decode(path, format!("failed to start ffmpeg: {}", e)))?;

        let stdout = child.stdout.take();
        Ok(Self {
            stdout,
            process: FfmpegProcess::new(child),
            path: path.to_path_buf(),
            width: info.width,
            height: info.height,
            frames_read: 0,
        })
    }
}

impl FrameReader for FfmpegFrameReader {
    fn read_frame(&mut self) -> Result<Option<BgrFrame>, WatermarkError> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let mut buf = vec![0u8; BgrFrame::byte_len(self.width, self.height)];
        let filled = read_full(stdout, &mut buf)
            .map_err(|e| WatermarkError::decode(&self.path, format!("failed to read frame: {}", e)))?;

        if filled == buf.len() {
            self.frames_read += 1;
            return BgrFrame::from_raw(self.width, self.height, buf)
                .map(Some)
                .ok_or_else(|| WatermarkError::decode(&self.path, "frame size mismatch"));
        }

        // End of stream: close our end and collect the exit status.
        self.stdout = None;
        let exit = self.process.wait();
        if filled > 0 {
            return Err(WatermarkError::decode(
                &self.path,
                format!(
                    "truncated frame after {} frames ({} of {} bytes)",
                    self.frames_read,
                    filled,
                    buf.len()
                ),
            ));
        }
        exit.map_err(|message| WatermarkError::decode(&self.path, message))?;
        Ok(None)
    }
}

/// Frames piped into an `ffmpeg` encoder.
pub struct FfmpegFrameWriter {
    // Dropped before `process` so the child sees end of input.
    stdin: Option<ChildStdin>,
    process: FfmpegProcess,
    backend: FfmpegBackend,
    path: PathBuf,
    info: VideoInfo,
    frames_written: u64,
}

impl FfmpegFrameWriter {
    fn spawn(backend: FfmpegBackend, path: &Path, info: &VideoInfo) -> Result<Self, WatermarkError> {
        let mut child = backend
            .encoder_command(path, info)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| WatermarkError::encode(path, format!("failed to start ffmpeg: {}", e)))?;

        let stdin = child.stdin.take();
        Ok(Self {
            stdin,
            process: FfmpegProcess::new(child),
            backend,
            path: path.to_path_buf(),
            info: *info,
            frames_written: 0,
        })
    }

    fn encoder_failure(&mut self, cause: io::Error) -> WatermarkError {
        self.stdin = None;
        let message = match self.process.wait() {
            Err(exit) => exit,
            Ok(()) => format!("failed to write frame: {}", cause),
        };
        WatermarkError::encode(&self.path, message)
    }
}

impl FrameWriter for FfmpegFrameWriter {
    fn write_frame(&mut self, frame: &BgrFrame) -> Result<(), WatermarkError> {
        if frame.width() != self.info.width || frame.height() != self.info.height {
            return Err(WatermarkError::encode(
                &self.path,
                format!(
                    "frame is {}x{}, encoder expects {}x{}",
                    frame.width(),
                    frame.height(),
                    self.info.width,
                    self.info.height
                ),
            ));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(WatermarkError::encode(&self.path, "encoder input already closed"));
        };
        if let Err(e) = stdin.write_all(frame.as_bytes()) {
            return Err(self.encoder_failure(e));
        }
        self.frames_written += 1;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<(), WatermarkError> {
        if let Some(mut stdin) = self.stdin.take() {
            if let Err(e) = stdin.flush() {
                return Err(self.encoder_failure(e));
            }
        }
        let exit = self.process.wait();

        if self.frames_written == 0 {
            if let Err(message) = exit {
                tracing::debug!(output = %self.path.display(), %message, "Encoder saw no frames");
            }
            return self.backend.write_empty_video(&self.path, &self.info);
        }

        exit.map_err(|message| WatermarkError::encode(&self.path, message))
    }
}
