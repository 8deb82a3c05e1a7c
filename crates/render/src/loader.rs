use crate::params::TextureSlot;
use crate::technique::{TechniqueKind, VertexAttributes};
use shadelab_common::{GeometryHandle, TechniqueHandle, TextureHandle};

/// Prefix for procedurally generated assets, e.g. `builtin:cube`.
pub const BUILTIN_PREFIX: &str = "builtin:";

/// Procedural meshes every backend provides.
pub const BUILTIN_GEOMETRY: &[&str] = &["cube", "sphere", "floor"];

/// Procedural textures every backend provides.
pub const BUILTIN_TEXTURES: &[&str] = &["white", "checker", "bricks", "flat-normal", "bumps"];

/// Split `builtin:name` into `Some("name")`; file paths yield `None`.
pub fn builtin_name(file: &str) -> Option<&str> {
    file.strip_prefix(BUILTIN_PREFIX)
}

/// Errors from geometry and texture loading.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("unknown builtin asset: {0}")]
    UnknownBuiltin(String),
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to decode {file}: {reason}")]
    Decode { file: String, reason: String },
}

/// Geometry uploaded for a particular technique.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadedGeometry {
    pub handle: GeometryHandle,
    /// Vertex streams actually present in the uploaded buffers.
    pub attributes: VertexAttributes,
    pub index_count: u32,
}

/// Compiled effect lookup: technique name to program handle.
pub trait TechniqueProvider {
    fn lookup_technique(&self, name: &str) -> Option<TechniqueHandle>;
}

/// Loads mesh files into backend vertex/index buffers.
pub trait GeometryLoader {
    /// Load `file` with the vertex streams `technique` needs. `tangents`
    /// requests the extra per-vertex tangent set used by normal mapping.
    fn load_geometry(
        &mut self,
        file: &str,
        technique: TechniqueKind,
        tangents: bool,
    ) -> Result<LoadedGeometry, LoadError>;
}

/// Loads image files into shader resources.
pub trait TextureLoader {
    /// `slot` tells the backend how the texels are interpreted (colour data
    /// versus normal vectors).
    fn load_texture(&mut self, file: &str, slot: TextureSlot) -> Result<TextureHandle, LoadError>;
}

/// Streams a loader builds for `technique`: its required layout, plus
/// tangents when asked for.
pub fn requested_attributes(technique: TechniqueKind, tangents: bool) -> VertexAttributes {
    let mut attrs = technique.required_attributes();
    if tangents {
        attrs |= VertexAttributes::TANGENT;
    }
    attrs
}
