//! Render, resolver and application settings.
//!
//! Everything is serde-friendly with per-field defaults so a partial JSON file is enough.
//! Credentials can be supplied through the environment instead of the settings file.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};

/// Fixed default seed for rotation, transition choice and intra-day shuffling.
pub const DEFAULT_SEED: u64 = 0x7472_6970_7265_656c;

/// Per-render parameters supplied by the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub fps: u32,
    pub image_duration_s: f64,
    pub transition_duration_s: f64,
    pub width: u32,
    pub height: u32,
    pub max_images: usize,
    pub captions: bool,
    pub music: bool,
    /// Worker threads for compositing and transitions; `None` uses rayon's default.
    pub threads: Option<usize>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fps: 24,
            image_duration_s: 3.0,
            transition_duration_s: 1.0,
            width: 1920,
            height: 1080,
            max_images: 15,
            captions: true,
            music: true,
            threads: None,
        }
    }
}

/// Output resolution presets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    /// 1280x720
    Standard,
    /// 1920x1080
    High,
}

impl Quality {
    pub fn canvas(self) -> Canvas {
        match self {
            Self::Standard => Canvas {
                width: 1280,
                height: 720,
            },
            Self::High => Canvas {
                width: 1920,
                height: 1080,
            },
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> ReelResult<()> {
        if self.fps == 0 {
            return Err(ReelError::validation("render fps must be non-zero"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ReelError::validation(
                "render width/height must be non-zero",
            ));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            // yuv420p output needs even dimensions.
            return Err(ReelError::validation(
                "render width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if self.max_images == 0 {
            return Err(ReelError::validation("max_images must be >= 1"));
        }
        if self.threads == Some(0) {
            return Err(ReelError::validation(
                "render 'threads' must be >= 1 when set",
            ));
        }
        for (name, v) in [
            ("image_duration_s", self.image_duration_s),
            ("transition_duration_s", self.transition_duration_s),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(ReelError::validation(format!(
                    "{name} must be finite and >= 0"
                )));
            }
        }
        if self.hold_frames() == 0 {
            return Err(ReelError::validation(
                "image_duration_s is too short to produce a single frame at this fps",
            ));
        }
        Ok(())
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        let c = quality.canvas();
        self.width = c.width;
        self.height = c.height;
        self
    }

    /// `round(fps * image_duration_s)`
    pub fn hold_frames(&self) -> u64 {
        (f64::from(self.fps) * self.image_duration_s).round().max(0.0) as u64
    }

    /// `round(fps * transition_duration_s)`
    pub fn transition_frames(&self) -> u64 {
        (f64::from(self.fps) * self.transition_duration_s)
            .round()
            .max(0.0) as u64
    }
}

/// Image resolver settings: cache location, credentials, network bounds.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub cache_dir: PathBuf,
    pub unsplash_access_key: Option<String>,
    pub pexels_api_key: Option<String>,
    /// Enables text-to-image generation as an additional source.
    pub huggingface_api_key: Option<String>,
    pub timeout_s: u64,
    /// Worker threads used by `resolve_all`; 1 keeps resolution sequential.
    pub workers: usize,
    pub per_page: u32,
    /// Serve images from the built-in scene catalog when no credentialed source answers.
    pub curated_catalog: bool,
    pub images_per_activity: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("data").join("images"),
            unsplash_access_key: None,
            pexels_api_key: None,
            huggingface_api_key: None,
            timeout_s: 10,
            workers: 1,
            per_page: 30,
            curated_catalog: false,
            images_per_activity: 1,
        }
    }
}

// Keys must not end up in logs.
impl std::fmt::Debug for ResolverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverConfig")
            .field("cache_dir", &self.cache_dir)
            .field("unsplash_access_key", &self.unsplash_access_key.is_some())
            .field("pexels_api_key", &self.pexels_api_key.is_some())
            .field("huggingface_api_key", &self.huggingface_api_key.is_some())
            .field("timeout_s", &self.timeout_s)
            .field("workers", &self.workers)
            .field("per_page", &self.per_page)
            .field("curated_catalog", &self.curated_catalog)
            .field("images_per_activity", &self.images_per_activity)
            .finish()
    }
}

impl ResolverConfig {
    /// Defaults overlaid with `UNSPLASH_ACCESS_KEY`, `PEXELS_API_KEY`, `HUGGINGFACE_API_KEY` and
    /// `TRIPREEL_CACHE_DIR`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env();
        cfg
    }

    /// Fill unset credentials and the cache dir from the environment.
    pub fn apply_env(&mut self) {
        if is_blank(self.unsplash_access_key.as_deref()) {
            self.unsplash_access_key = non_empty_env("UNSPLASH_ACCESS_KEY");
        }
        if is_blank(self.pexels_api_key.as_deref()) {
            self.pexels_api_key = non_empty_env("PEXELS_API_KEY");
        }
        if is_blank(self.huggingface_api_key.as_deref()) {
            self.huggingface_api_key = non_empty_env("HUGGINGFACE_API_KEY");
        }
        if let Some(dir) = non_empty_env("TRIPREEL_CACHE_DIR") {
            self.cache_dir = PathBuf::from(dir);
        }
    }

    pub fn validate(&self) -> ReelResult<()> {
        if self.workers == 0 {
            return Err(ReelError::validation("resolver workers must be >= 1"));
        }
        if self.timeout_s == 0 {
            return Err(ReelError::validation("resolver timeout_s must be >= 1"));
        }
        // Per-activity indices are spaced 10 apart.
        if !(1..=10).contains(&self.images_per_activity) {
            return Err(ReelError::validation(
                "resolver images_per_activity must be in 1..=10",
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_s)
    }
}

fn is_blank(v: Option<&str>) -> bool {
    v.map(|s| s.trim().is_empty()).unwrap_or(true)
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Top-level settings file.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub render: RenderConfig,
    pub resolver: ResolverConfig,
    /// Parent directory for per-render temporary frame directories.
    pub frames_dir: PathBuf,
    pub videos_dir: PathBuf,
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            render: RenderConfig::default(),
            resolver: ResolverConfig::default(),
            frames_dir: PathBuf::from("data").join("frames"),
            videos_dir: PathBuf::from("data").join("videos"),
            seed: DEFAULT_SEED,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or defaults when the file does not exist.
    ///
    /// Environment credentials are applied on top in both cases.
    pub fn load(path: &Path) -> ReelResult<Self> {
        let mut settings = if path.exists() {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read settings '{}'", path.display()))?;
            serde_json::from_str::<Settings>(&text)
                .with_context(|| format!("parse settings '{}'", path.display()))?
        } else {
            tracing::debug!(path = %path.display(), "settings file not found, using defaults");
            Self::default()
        };
        settings.resolver.apply_env();
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> ReelResult<()> {
        self.render.validate()?;
        self.resolver.validate()
    }
}

#[cfg(test)]
#[path = "../tests/unit/config/config.rs"]
mod tests;
