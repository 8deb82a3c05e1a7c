/// Accumulated scene time in seconds.
///
/// Kept in `f64` so long sessions do not lose the sub-frame precision the
/// colour cycles depend on. Never runs backwards.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SceneClock {
    elapsed: f64,
    frames: u64,
}

impl SceneClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by `dt` seconds and count a frame. Negative or non-finite
    /// steps advance by zero.
    pub fn advance(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += f64::from(dt);
        } else if dt != 0.0 {
            tracing::debug!(dt, "ignoring invalid time step");
        }
        self.frames += 1;
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Number of `advance` calls so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
