use crate::config::AnimationConfig;

/// Fraction of the remaining distance covered per frame.
pub const EASING_FACTOR: f64 = 0.15;
/// Below this distance the displayed value jumps straight to the target.
pub const SNAP_THRESHOLD: f64 = 0.5;

const MAX_PERCENT: f64 = 100.0;

/// Displayed and requested progress, in percent.
///
/// `running` is true exactly while another step is pending, which is exactly
/// while `current != target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    pub current: f64,
    pub target: f64,
    pub running: bool,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            current: 0.0,
            target: 0.0,
            running: false,
        }
    }
}

/// What a renderer needs to draw one animation frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressFrame {
    pub percent: f64,
}

impl ProgressFrame {
    pub fn ratio(&self) -> f64 {
        (self.percent / MAX_PERCENT).clamp(0.0, 1.0)
    }

    /// Bar width in cells for a track `total` cells wide.
    pub fn width(&self, total: u16) -> u16 {
        (self.ratio() * f64::from(total)).round() as u16
    }

    pub fn label(&self) -> String {
        format!("{}%", self.percent.round() as u32)
    }
}

/// Eases the displayed percentage toward the latest target one frame at a time.
#[derive(Debug, Clone)]
pub struct ProgressAnimator {
    state: AnimationState,
    easing_factor: f64,
    snap_threshold: f64,
}

impl Default for ProgressAnimator {
    fn default() -> Self {
        Self::new(EASING_FACTOR, SNAP_THRESHOLD)
    }
}

impl ProgressAnimator {
    pub fn new(easing_factor: f64, snap_threshold: f64) -> Self {
        Self {
            state: AnimationState::default(),
            easing_factor,
            snap_threshold,
        }
    }

    pub fn from_config(config: &AnimationConfig) -> Self {
        Self::new(config.easing_factor, config.snap_threshold)
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn frame(&self) -> ProgressFrame {
        ProgressFrame {
            percent: self.state.current,
        }
    }

    /// Point the animation at a new target without touching the displayed value.
    /// Returns true when this call started the animation.
    pub fn set_target(&mut self, value: f64) -> bool {
        let value = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, MAX_PERCENT)
        };

        self.state.target = value;
        if value == self.state.current {
            self.state.running = false;
            return false;
        }

        let started = !self.state.running;
        self.state.running = true;
        started
    }

    /// Advance one frame. A no-op while idle.
    pub fn step(&mut self) -> ProgressFrame {
        if self.state.running {
            let state = &mut self.state;
            state.current += (state.target - state.current) * self.easing_factor;
            if (state.target - state.current).abs() < self.snap_threshold {
                state.current = state.target;
            }
            state.running = state.current != state.target;
        }
        self.frame()
    }

    pub fn reset(&mut self) {
        self.state = AnimationState::default();
    }
}
