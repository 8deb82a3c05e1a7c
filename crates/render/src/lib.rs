//! Rendering interface: renderer-agnostic techniques, scene parameters, the
//! shader-parameter sink and the asset-loading collaborators.
//!
//! # Invariants
//! - The technique registry is resolved once and read-only afterwards.
//! - Geometry is always loaded for a technique; its streams are checked
//!   against that technique's layout at load time, never at draw time.
//! - Nothing here owns scene state: the scene pushes values, backends consume them.
//!
//! [`HeadlessBackend`] implements every collaborator without a GPU; the wgpu
//! backend lives in `shadelab-render-wgpu`.

mod headless;
mod loader;
mod params;
mod sink;
mod technique;

pub use headless::HeadlessBackend;
pub use loader::{
    BUILTIN_GEOMETRY, BUILTIN_PREFIX, BUILTIN_TEXTURES, GeometryLoader, LoadError,
    LoadedGeometry, TechniqueProvider, TextureLoader, builtin_name, requested_attributes,
};
pub use params::{
    LightParams, MAX_LIGHTS, MatrixSlot, ScalarSlot, SceneParams, TextureSlot, VectorSlot,
};
pub use sink::{RecordingSink, ShaderParamSink, SinkCall};
pub use technique::{
    RegistryError, TechniqueBinding, TechniqueKind, TechniqueRegistry, VertexAttributes,
};

pub fn crate_info() -> &'static str {
    "shadelab-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
