//! Time-driven light animation. Every function here takes the accumulated
//! scene clock, never a frame delta, so results do not depend on frame rate.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Period of the global colour-multiplier sawtooth, in seconds.
pub const COLOUR_MULTIPLIER_PERIOD: f64 = 5.0;

/// 2 s triangle wave: 0 at even seconds, 1 at odd seconds.
pub fn pulse_factor(clock: f64) -> f32 {
    let t = clock.rem_euclid(2.0);
    (if t <= 1.0 { t } else { 2.0 - t }) as f32
}

/// On during odd whole seconds, off during even ones.
pub fn blink_on(clock: f64) -> bool {
    clock.floor().rem_euclid(2.0) == 1.0
}

/// Offset from an orbit anchor after `clock` seconds. Positive speed orbits
/// clockwise seen from above.
pub fn orbit_offset(radius: f32, speed: f32, clock: f64) -> Vec3 {
    let angle = -(f64::from(speed) * clock);
    Vec3::new(angle.cos() as f32, 0.0, angle.sin() as f32) * radius
}

/// Sawtooth in `[0, 1)` over [`COLOUR_MULTIPLIER_PERIOD`].
pub fn colour_multiplier(clock: f64) -> f32 {
    (clock.rem_euclid(COLOUR_MULTIPLIER_PERIOD) / COLOUR_MULTIPLIER_PERIOD) as f32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
        }
    }
}

/// How a light's current colour follows the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ColourCycle {
    /// Always the initial colour.
    #[default]
    Steady,
    /// Scale one channel (or the whole colour) by [`pulse_factor`].
    Pulse {
        #[serde(default)]
        channel: Option<Channel>,
    },
    /// Initial colour while [`blink_on`], black otherwise.
    Blink,
}

impl ColourCycle {
    pub fn colour(self, initial: Vec3, clock: f64) -> Vec3 {
        match self {
            Self::Steady => initial,
            Self::Pulse { channel: None } => initial * pulse_factor(clock),
            Self::Pulse {
                channel: Some(channel),
            } => {
                let mut colour = initial;
                colour[channel.index()] *= pulse_factor(clock);
                colour
            }
            Self::Blink => {
                if blink_on(clock) {
                    initial
                } else {
                    Vec3::ZERO
                }
            }
        }
    }
}
