use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::assets::decode::load_rgba;
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, ensure_parent_dir};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{CancelToken, Canvas};
use crate::foundation::error::{ReelError, ReelResult};
use crate::mood::Mood;
use crate::render::frame::FrameRGBA;
use crate::render::sequencer::Frame;

/// Description of a finished video.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoArtifact {
    pub path: PathBuf,
    /// `frame_count / fps`.
    pub estimated_duration_seconds: f64,
    pub resolution: Canvas,
    pub frame_count: u64,
    /// Soundtrack mood, present only when music was requested.
    pub mood: Option<Mood>,
}

/// Stream `frames` into `sink` in index order. Returns the number of frames pushed.
///
/// A stored frame that cannot be read, or has the wrong size, is replaced by a blank frame
/// rather than failing the encode.
pub fn encode_to_sink(
    frames: &[Frame],
    canvas: Canvas,
    fps: u32,
    sink: &mut dyn FrameSink,
    cancel: &CancelToken,
) -> ReelResult<u64> {
    if frames.is_empty() {
        return Err(ReelError::encoding("no frames to encode"));
    }
    if frames.windows(2).any(|w| w[0].index >= w[1].index) {
        return Err(ReelError::encoding("frames are not in strictly increasing index order"));
    }

    sink.begin(SinkConfig {
        width: canvas.width,
        height: canvas.height,
        fps,
    })?;

    // Hold frames repeat the same file; decode it once per run.
    let mut current: Option<(&Path, FrameRGBA)> = None;
    let mut substituted = 0u64;
    for frame in frames {
        cancel.check()?;
        let reuse = matches!(&current, Some((p, _)) if *p == frame.path.as_path());
        if !reuse {
            let decoded = match load_rgba(&frame.path) {
                Ok(img) if img.dimensions() == (canvas.width, canvas.height) => {
                    FrameRGBA::from_image(img)
                }
                Ok(img) => {
                    tracing::warn!(index = frame.index.0, got = ?img.dimensions(), "frame has wrong size, substituting blank");
                    substituted += 1;
                    FrameRGBA::blank(canvas)
                }
                Err(e) => {
                    tracing::warn!(index = frame.index.0, error = %e, "unreadable frame, substituting blank");
                    substituted += 1;
                    FrameRGBA::blank(canvas)
                }
            };
            current = Some((frame.path.as_path(), decoded));
        }
        if let Some((_, data)) = &current {
            sink.push_frame(frame.index, data)?;
        }
    }
    sink.end()?;

    if substituted > 0 {
        tracing::warn!(substituted, "encode finished with blank substitutions");
    }
    Ok(frames.len() as u64)
}

/// Encode `frames` to an MP4 at `out_path`.
///
/// The video is written to a staging file next to `out_path` and renamed into place only once
/// the encoder has finished, so a failed or cancelled encode leaves any existing file at
/// `out_path` untouched and no partial output behind.
#[tracing::instrument(skip(frames, cancel), fields(frames = frames.len(), out = %out_path.display()))]
pub fn encode(
    frames: &[Frame],
    canvas: Canvas,
    fps: u32,
    out_path: &Path,
    cancel: &CancelToken,
) -> ReelResult<VideoArtifact> {
    encode_staged(frames, canvas, fps, out_path, cancel, |staging| {
        FfmpegSink::new(FfmpegSinkOpts::new(staging))
    })
}

fn encode_staged<S: FrameSink>(
    frames: &[Frame],
    canvas: Canvas,
    fps: u32,
    out_path: &Path,
    cancel: &CancelToken,
    make_sink: impl FnOnce(&Path) -> S,
) -> ReelResult<VideoArtifact> {
    if frames.is_empty() {
        return Err(ReelError::encoding("no frames to encode"));
    }
    if fps == 0 {
        return Err(ReelError::encoding("fps must be non-zero"));
    }

    ensure_parent_dir(out_path)?;
    let parent = out_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    // Removed on drop unless persisted below.
    let staging = tempfile::Builder::new()
        .prefix(".tripreel-")
        .suffix(".mp4")
        .tempfile_in(parent)
        .map_err(|e| {
            ReelError::encoding(format!(
                "create staging file in '{}': {e}",
                parent.display()
            ))
        })?
        .into_temp_path();

    let staging_path: &Path = &staging;
    let mut sink = make_sink(staging_path);
    let result = encode_to_sink(frames, canvas, fps, &mut sink, cancel);
    drop(sink);
    let frame_count = result.map_err(|e| match e {
        ReelError::Cancelled | ReelError::Encoding(_) => e,
        other => ReelError::encoding(other.to_string()),
    })?;

    staging.persist(out_path).map_err(|e| {
        ReelError::encoding(format!(
            "move encoded video into '{}': {}",
            out_path.display(),
            e.error
        ))
    })?;

    let artifact = VideoArtifact {
        path: out_path.to_path_buf(),
        estimated_duration_seconds: frame_count as f64 / f64::from(fps),
        resolution: canvas,
        frame_count,
        mood: None,
    };
    tracing::info!(
        path = %artifact.path.display(),
        seconds = artifact.estimated_duration_seconds,
        "video encoded"
    );
    Ok(artifact)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/encoder.rs"]
mod tests;
