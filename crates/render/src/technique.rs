use crate::loader::TechniqueProvider;
use crate::params::TextureSlot;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use shadelab_common::TechniqueHandle;

bitflags! {
    /// Per-vertex attribute streams a mesh carries or a technique consumes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct VertexAttributes: u8 {
        const POSITION = 1 << 0;
        const NORMAL = 1 << 1;
        const UV = 1 << 2;
        const TANGENT = 1 << 3;
    }
}

/// The fixed set of shading techniques, by their shader-side names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TechniqueKind {
    /// Flat `ModelColour`, no texture, no lighting.
    PlainColour,
    /// Unlit diffuse texture.
    VertexTex,
    /// Unlit diffuse texture scaled by the global colour multiplier.
    VertexChangingTex,
    /// Per-pixel two-light Blinn-Phong over a diffuse/specular texture.
    VertexLitTex,
    /// `VertexLitTex` with a tangent-space normal map.
    NormalMapping,
    /// `NormalMapping` with parallax offset from the normal map's alpha height.
    NormalMappingPara,
}

impl TechniqueKind {
    pub const ALL: [Self; 6] = [
        Self::PlainColour,
        Self::VertexTex,
        Self::VertexChangingTex,
        Self::VertexLitTex,
        Self::NormalMapping,
        Self::NormalMappingPara,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::PlainColour => "PlainColour",
            Self::VertexTex => "VertexTex",
            Self::VertexChangingTex => "VertexChangingTex",
            Self::VertexLitTex => "VertexLitTex",
            Self::NormalMapping => "NormalMapping",
            Self::NormalMappingPara => "NormalMappingPara",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Vertex streams the technique's vertex stage reads.
    pub fn required_attributes(self) -> VertexAttributes {
        use VertexAttributes as A;
        match self {
            Self::PlainColour => A::POSITION,
            Self::VertexTex | Self::VertexChangingTex => A::POSITION | A::UV,
            Self::VertexLitTex => A::POSITION | A::NORMAL | A::UV,
            Self::NormalMapping | Self::NormalMappingPara => {
                A::POSITION | A::NORMAL | A::UV | A::TANGENT
            }
        }
    }

    /// Texture slots that must be bound before every draw with this technique.
    pub fn texture_slots(self) -> &'static [TextureSlot] {
        match self {
            Self::PlainColour => &[],
            Self::VertexTex | Self::VertexChangingTex | Self::VertexLitTex => {
                &[TextureSlot::Diffuse]
            }
            Self::NormalMapping | Self::NormalMappingPara => {
                &[TextureSlot::Diffuse, TextureSlot::Normal]
            }
        }
    }

    /// Whether the technique reads the per-entity `ModelColour`.
    pub fn uses_model_colour(self) -> bool {
        matches!(self, Self::PlainColour)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// A resolved technique: the backend's program handle plus the vertex layout
/// geometry must provide to be drawn with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TechniqueBinding {
    pub kind: TechniqueKind,
    pub handle: TechniqueHandle,
    pub layout: VertexAttributes,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("technique {0:?} not found in the compiled effect")]
    MissingTechnique(&'static str),
}

/// Name-to-program mapping, built once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct TechniqueRegistry {
    // Indexed by `TechniqueKind` discriminant; every kind is present.
    bindings: Vec<TechniqueBinding>,
}

impl TechniqueRegistry {
    /// Look up every known technique. A single missing name fails the whole
    /// registry.
    pub fn resolve<P: TechniqueProvider + ?Sized>(provider: &P) -> Result<Self, RegistryError> {
        let mut bindings = Vec::with_capacity(TechniqueKind::ALL.len());
        for kind in TechniqueKind::ALL {
            let handle = provider
                .lookup_technique(kind.name())
                .ok_or(RegistryError::MissingTechnique(kind.name()))?;
            tracing::debug!(technique = kind.name(), ?handle, "technique resolved");
            bindings.push(TechniqueBinding {
                kind,
                handle,
                layout: kind.required_attributes(),
            });
        }
        tracing::info!("resolved {} techniques", bindings.len());
        Ok(Self { bindings })
    }

    pub fn get(&self, kind: TechniqueKind) -> &TechniqueBinding {
        &self.bindings[kind.index()]
    }

    pub fn lookup(&self, name: &str) -> Option<&TechniqueBinding> {
        TechniqueKind::from_name(name).map(|k| self.get(k))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TechniqueBinding> {
        self.bindings.iter()
    }
}
