//! wgpu backend for the scene renderer.
//!
//! [`WgpuRenderer`] implements every collaborator the scene needs: the
//! technique provider, geometry and texture loaders, and the shader-parameter
//! sink. Meshes come from builtin primitives or OBJ files (tobj); textures from
//! builtin patterns or PNG/JPEG files (image).
//!
//! # Invariants
//! - One pipeline per technique, compiled up front. A technique handle is the
//!   technique's index in `TechniqueKind::ALL`.
//! - Vertex streams are separate buffers; a pipeline binds only the streams
//!   its technique reads, in location order.
//! - Sink calls stage values on the CPU. Nothing touches the GPU until `present`.
//! - Diffuse textures are sRGB; normal maps are linear.

mod gpu;
pub mod mesh;
mod overlay;
mod shaders;
pub mod texture;
mod uniforms;

pub use gpu::{GpuError, WgpuRenderer, read_mesh, read_texture, request_device};
pub use overlay::Overlay;

pub fn crate_info() -> &'static str {
    "shadelab-render-wgpu v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("wgpu"));
    }
}
