//! Shared types for the shadelab renderer: stable handles and entity pose.
//!
//! # Invariants
//! - Handles are small integers allocated by their owner and never reused.
//! - A pose's matrix is always `Translation * Rotation * Scale` (column vectors).

mod pose;
mod types;

pub use pose::{Pose, rotation_matrix};
pub use types::{EntityId, GeometryHandle, TechniqueHandle, TextureHandle};

pub fn crate_info() -> &'static str {
    "shadelab-common v0.1.0"
}
