//! Encoding: frame sinks and the frame-sequence encoder.
//!
//! Sinks consume frames in strictly increasing index order.

/// MP4 output via the system `ffmpeg`.
pub mod ffmpeg;
/// Generic frame sink trait and the in-memory sink.
pub mod sink;
/// Stored frame sequence -> sink, plus the resulting artifact description.
pub mod encoder;

pub use encoder::{VideoArtifact, encode, encode_to_sink};
pub use ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use sink::{FrameSink, InMemorySink, SinkConfig};
