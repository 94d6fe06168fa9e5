//! End-to-end render: itinerary -> resolved images -> selection -> frames -> video.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::assets::resolver::{ImageResolver, ResolveSession};
use crate::config::{RenderConfig, Settings};
use crate::encode::encoder::{VideoArtifact, encode, encode_to_sink};
use crate::encode::sink::FrameSink;
use crate::foundation::core::CancelToken;
use crate::foundation::error::{ReelError, ReelResult};
use crate::itinerary::Itinerary;
use crate::mood::itinerary_mood;
use crate::render::caption::Captioner;
use crate::render::sequencer::{RenderedFrames, render_frames};
use crate::select::{SelectedImage, select};

/// `{videos_dir}/{destination_slug}_{YYYYmmdd_HHMMSS}.mp4`
pub fn default_video_path(videos_dir: &Path, itinerary: &Itinerary, now: DateTime<Local>) -> PathBuf {
    videos_dir.join(format!(
        "{}_{}.mp4",
        itinerary.destination_slug(),
        now.format("%Y%m%d_%H%M%S")
    ))
}

pub struct Pipeline {
    resolver: ImageResolver,
    captioner: Captioner,
    frames_dir: PathBuf,
    videos_dir: PathBuf,
    seed: u64,
}

impl Pipeline {
    pub fn new(
        resolver: ImageResolver,
        captioner: Captioner,
        frames_dir: impl Into<PathBuf>,
        videos_dir: impl Into<PathBuf>,
        seed: u64,
    ) -> Self {
        Self {
            resolver,
            captioner,
            frames_dir: frames_dir.into(),
            videos_dir: videos_dir.into(),
            seed,
        }
    }

    pub fn from_settings(settings: &Settings) -> ReelResult<Self> {
        settings.validate()?;
        Ok(Self::new(
            ImageResolver::from_config(&settings.resolver)?,
            Captioner::with_system_fonts(),
            &settings.frames_dir,
            &settings.videos_dir,
            settings.seed,
        ))
    }

    pub fn resolver(&self) -> &ImageResolver {
        &self.resolver
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Resolve an image for every activity and pick the ones that will be shown.
    #[tracing::instrument(skip_all, fields(destination = %itinerary.destination))]
    pub fn select_images(
        &self,
        itinerary: &Itinerary,
        cfg: &RenderConfig,
        cancel: &CancelToken,
    ) -> ReelResult<Vec<SelectedImage>> {
        let activities = itinerary.activities();
        if activities.is_empty() {
            return Err(ReelError::nothing_to_render("itinerary has no activities"));
        }

        let session = ResolveSession::new();
        let candidates =
            self.resolver
                .resolve_all(&session, &itinerary.destination, &activities, cancel)?;
        if candidates.is_empty() {
            return Err(ReelError::nothing_to_render("no candidate images"));
        }

        let total = candidates.len();
        let selected = select(candidates, cfg.max_images, self.seed);
        tracing::info!(candidates = total, selected = selected.len(), "images selected");
        Ok(selected)
    }

    fn frames(
        &self,
        itinerary: &Itinerary,
        cfg: &RenderConfig,
        cancel: &CancelToken,
    ) -> ReelResult<RenderedFrames> {
        cfg.validate()?;
        let selected = self.select_images(itinerary, cfg, cancel)?;
        render_frames(
            &selected,
            cfg,
            self.seed,
            &self.frames_dir,
            &self.captioner,
            cancel,
        )
    }

    /// Render `itinerary` to an MP4 at `out_path`, or under the videos directory when `None`.
    #[tracing::instrument(skip_all, fields(destination = %itinerary.destination))]
    pub fn render_itinerary(
        &self,
        itinerary: &Itinerary,
        cfg: &RenderConfig,
        out_path: Option<&Path>,
        cancel: &CancelToken,
    ) -> ReelResult<VideoArtifact> {
        let out = out_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_video_path(&self.videos_dir, itinerary, Local::now()));

        let rendered = self.frames(itinerary, cfg, cancel)?;
        let mut artifact = encode(&rendered.frames, rendered.canvas, cfg.fps, &out, cancel)?;
        drop(rendered);

        artifact.mood = cfg.music.then(|| itinerary_mood(itinerary));
        Ok(artifact)
    }

    /// Same as [`Pipeline::render_itinerary`] but streams frames into `sink`.
    /// Returns the number of frames written.
    pub fn render_itinerary_to_sink(
        &self,
        itinerary: &Itinerary,
        cfg: &RenderConfig,
        sink: &mut dyn FrameSink,
        cancel: &CancelToken,
    ) -> ReelResult<u64> {
        let rendered = self.frames(itinerary, cfg, cancel)?;
        encode_to_sink(&rendered.frames, rendered.canvas, cfg.fps, sink, cancel)
    }

    /// Empty the image cache. Returns the number of files removed.
    pub fn clear_cache(&self) -> ReelResult<usize> {
        self.resolver.clear_cache(&ResolveSession::new())
    }
}

#[cfg(test)]
#[path = "../tests/unit/pipeline/pipeline.rs"]
mod tests;
