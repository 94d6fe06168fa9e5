//! Itinerary to captioned MP4 slideshow.
//!
//! Pipeline stages, each usable on its own:
//! - [`assets`]: activity -> search query -> cached local image, with placeholder fallback
//! - [`select`]: coverage-preserving down-sampling of the resolved images
//! - [`render`]: compositing, captions, transitions and frame sequencing
//! - [`encode`]: frame sinks and MP4 output through the system `ffmpeg`
//! - [`mood`]: soundtrack mood label
//!
//! [`pipeline::Pipeline`] drives them end to end.
#![forbid(unsafe_code)]

pub mod assets;
pub mod config;
pub mod encode;
pub mod foundation;
pub mod itinerary;
pub mod mood;
pub mod pipeline;
pub mod render;
pub mod select;

pub use assets::resolver::{
    CandidateImage, FallbackReason, ImageOrigin, ImageResolver, ResolveSession,
};
pub use assets::source::{Downloader, ImageSource, SourceError, SourceKind};
pub use config::{DEFAULT_SEED, Quality, RenderConfig, ResolverConfig, Settings};
pub use encode::{FrameSink, InMemorySink, VideoArtifact};
pub use foundation::core::{CancelToken, Canvas, FrameIndex};
pub use foundation::error::{ReelError, ReelResult};
pub use itinerary::{Activity, Itinerary, Period};
pub use mood::{Mood, determine_mood};
pub use pipeline::{Pipeline, default_video_path};
pub use select::{SelectedImage, select};
