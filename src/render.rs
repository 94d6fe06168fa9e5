pub mod caption;
pub mod compositor;
pub mod frame;
pub mod sequencer;
pub mod transitions;

pub use caption::Captioner;
pub use frame::FrameRGBA;
pub use sequencer::{Frame, FramePlan, FrameStore, PlanOp, RenderedFrames, render_frames};
pub use transitions::TransitionKind;
