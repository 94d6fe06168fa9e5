//! Frame planning and parallel frame synthesis.
//!
//! A [`FramePlan`] fixes, up front, what every output frame shows. Rendering then composites each
//! still once, synthesizes transition frames in parallel and writes them to a [`FrameStore`]
//! in a temporary directory. Hold frames share one stored file per still.

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rayon::prelude::*;

use crate::config::RenderConfig;
use crate::foundation::core::{CancelToken, Canvas, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::caption::Captioner;
use crate::render::compositor::compose_still;
use crate::render::frame::FrameRGBA;
use crate::render::transitions::{TransitionKind, transition};
use crate::select::SelectedImage;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlanOp {
    Hold {
        image: usize,
    },
    Transition {
        from: usize,
        to: usize,
        kind: TransitionKind,
        progress: f32,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct FramePlan {
    ops: Vec<PlanOp>,
    kinds: Vec<TransitionKind>,
}

impl FramePlan {
    /// `hold_frames` per image, and `transition_frames` per adjacent pair at
    /// `progress = j / transition_frames`, one kind per pair drawn from `rng`.
    pub fn build<R: rand::Rng + ?Sized>(
        images: usize,
        hold_frames: u64,
        transition_frames: u64,
        rng: &mut R,
    ) -> ReelResult<Self> {
        if images == 0 {
            return Err(ReelError::nothing_to_render("no images were selected"));
        }

        let kinds: Vec<TransitionKind> = (1..images).map(|_| TransitionKind::pick(rng)).collect();
        let total = Self::expected_len(images, hold_frames, transition_frames);
        let mut ops = Vec::with_capacity(total as usize);

        for i in 0..images {
            ops.extend((0..hold_frames).map(|_| PlanOp::Hold { image: i }));
            if i + 1 < images {
                let kind = kinds[i];
                ops.extend((0..transition_frames).map(|j| PlanOp::Transition {
                    from: i,
                    to: i + 1,
                    kind,
                    progress: j as f32 / transition_frames as f32,
                }));
            }
        }
        Ok(Self { ops, kinds })
    }

    /// `n*hold + (n-1)*transition`.
    pub fn expected_len(images: usize, hold_frames: u64, transition_frames: u64) -> u64 {
        if images == 0 {
            return 0;
        }
        images as u64 * hold_frames + (images as u64 - 1) * transition_frames
    }

    pub fn ops(&self) -> &[PlanOp] {
        &self.ops
    }

    pub fn kinds(&self) -> &[TransitionKind] {
        &self.kinds
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// One output frame: its position and the stored PNG holding its pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub index: FrameIndex,
    pub path: PathBuf,
}

/// Temporary directory of rendered frame PNGs. Removed on drop, including on error or
/// cancellation.
#[derive(Debug)]
pub struct FrameStore {
    dir: tempfile::TempDir,
}

impl FrameStore {
    pub fn create_in(parent: &Path) -> ReelResult<Self> {
        std::fs::create_dir_all(parent).map_err(|e| {
            ReelError::composition(format!(
                "create frames directory '{}': {e}",
                parent.display()
            ))
        })?;
        let dir = tempfile::Builder::new()
            .prefix("render-")
            .tempdir_in(parent)
            .map_err(|e| {
                ReelError::composition(format!(
                    "create temp frame directory in '{}': {e}",
                    parent.display()
                ))
            })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, name: &str, frame: &FrameRGBA) -> ReelResult<PathBuf> {
        let path = self.dir.path().join(name);
        frame
            .write_png(&path)
            .map_err(|e| ReelError::composition(format!("{e:#}")))?;
        Ok(path)
    }
}

/// Output of [`render_frames`]: frames in index order, backed by `store`.
#[derive(Debug)]
pub struct RenderedFrames {
    pub canvas: Canvas,
    pub frames: Vec<Frame>,
    pub plan: FramePlan,
    store: FrameStore,
}

impl RenderedFrames {
    pub fn store_dir(&self) -> &Path {
        self.store.dir()
    }
}

/// Composite, sequence and store every frame for `images`.
#[tracing::instrument(skip_all, fields(images = images.len()))]
pub fn render_frames(
    images: &[SelectedImage],
    cfg: &RenderConfig,
    seed: u64,
    frames_parent: &Path,
    captioner: &Captioner,
    cancel: &CancelToken,
) -> ReelResult<RenderedFrames> {
    cfg.validate()?;
    let canvas = cfg.canvas();
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let plan = FramePlan::build(
        images.len(),
        cfg.hold_frames(),
        cfg.transition_frames(),
        &mut rng,
    )?;
    tracing::info!(
        frames = plan.len(),
        canvas = %canvas,
        kinds = ?plan.kinds(),
        "frame plan built"
    );

    let store = FrameStore::create_in(frames_parent)?;
    let pool = build_thread_pool(cfg.threads)?;

    let stills: Vec<FrameRGBA> = pool.install(|| {
        images
            .par_iter()
            .map(|img| {
                let caption = cfg.captions.then_some(img.caption.as_str());
                compose_still(&img.path, caption, canvas, captioner)
            })
            .collect()
    });
    cancel.check()?;

    let still_paths: Vec<PathBuf> = pool.install(|| {
        stills
            .par_iter()
            .enumerate()
            .map(|(i, f)| store.write(&format!("still_{i:04}.png"), f))
            .collect::<ReelResult<Vec<_>>>()
    })?;

    let transition_paths: Vec<(usize, PathBuf)> = pool.install(|| {
        plan.ops()
            .par_iter()
            .enumerate()
            .filter_map(|(idx, op)| match *op {
                PlanOp::Transition {
                    from,
                    to,
                    kind,
                    progress,
                } => Some((idx, from, to, kind, progress)),
                PlanOp::Hold { .. } => None,
            })
            .map(|(idx, from, to, kind, progress)| {
                cancel.check()?;
                let frame = transition(&stills[from], &stills[to], kind, progress)?;
                let path = store.write(&format!("frame_{idx:06}.png"), &frame)?;
                Ok((idx, path))
            })
            .collect::<ReelResult<Vec<_>>>()
    })?;

    let mut transition_iter = transition_paths.into_iter();
    let mut frames = Vec::with_capacity(plan.len());
    for (idx, op) in plan.ops().iter().enumerate() {
        let path = match *op {
            PlanOp::Hold { image } => still_paths[image].clone(),
            PlanOp::Transition { .. } => match transition_iter.next() {
                Some((t_idx, path)) if t_idx == idx => path,
                _ => {
                    return Err(ReelError::composition(format!(
                        "transition frame {idx} missing from render output"
                    )));
                }
            },
        };
        frames.push(Frame {
            index: FrameIndex(idx as u64),
            path,
        });
    }

    tracing::info!(frames = frames.len(), dir = %store.dir().display(), "frames rendered");
    Ok(RenderedFrames {
        canvas,
        frames,
        plan,
        store,
    })
}

fn build_thread_pool(threads: Option<usize>) -> ReelResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(ReelError::validation(
            "render 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ReelError::composition(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/render/sequencer.rs"]
mod tests;
