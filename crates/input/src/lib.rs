//! Input: an immutable per-frame snapshot of held keys and the fixed-rate
//! control routine that turns key states into pose changes.
//!
//! # Invariants
//! - Core code only reads snapshots; only the platform layer builds them.
//! - Camera and models share one control routine, differing only in bindings.

pub mod control;
pub mod key;

pub use control::{ControlKeys, ControlRates, drive};
pub use key::{InputSnapshot, Key};

pub fn crate_info() -> &'static str {
    "shadelab-input v0.1.0"
}
