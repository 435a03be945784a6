pub mod animator;

pub use animator::{AnimationState, ProgressAnimator, ProgressFrame, EASING_FACTOR, SNAP_THRESHOLD};
