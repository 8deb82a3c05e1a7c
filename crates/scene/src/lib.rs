//! Scene core: entities and lights, the camera and scene clock, and the
//! per-frame update and render passes that drive a [`ShaderParamSink`].
//!
//! # Invariants
//! - An entity's world matrix is a cache. Pose setters mark it stale; only
//!   `update_matrix` recomputes it, and update does so for every entity each frame.
//! - An entity is drawn with the technique its geometry was loaded for. The
//!   layout check happens once, in [`Scene::load`].
//! - Light colours are functions of the accumulated clock, never of `dt`.
//! - Update pushes the global parameter set exactly once per frame.
//! - Render rebinds everything each draw needs; nothing leaks between entities.
//! - Entity ids are never reused; teardown runs newest first.
//!
//! [`ShaderParamSink`]: shadelab_render::ShaderParamSink

pub mod animation;
pub mod arena;
pub mod camera;
pub mod clock;
pub mod config;
pub mod entity;
pub mod error;
pub mod light;
mod render;
mod scene;
mod update;

pub use animation::{Channel, ColourCycle};
pub use arena::EntityArena;
pub use camera::Camera;
pub use clock::SceneClock;
pub use config::{
    CameraConfig, ConfigError, ControlPreset, EntityConfig, LightConfig, MotionConfig, SceneConfig,
};
pub use entity::{Entity, Material};
pub use error::SceneError;
pub use light::{LightMotion, LightRig, LightState};
pub use scene::Scene;

pub fn crate_info() -> &'static str {
    "shadelab-scene v0.1.0"
}
