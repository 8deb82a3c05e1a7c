use crate::config::ConfigError;
use shadelab_render::{LoadError, RegistryError, TechniqueKind, TextureSlot, VertexAttributes};

/// Why a scene failed to initialise. Any of these aborts the load.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("entity {entity:?}: failed to load geometry {file:?}: {source}")]
    Geometry {
        entity: String,
        file: String,
        #[source]
        source: LoadError,
    },
    #[error("entity {entity:?}: failed to load texture {file:?}: {source}")]
    Texture {
        entity: String,
        file: String,
        #[source]
        source: LoadError,
    },
    #[error(
        "entity {entity:?}: geometry {file:?} lacks {missing:?} required by {}",
        technique.name()
    )]
    IncompatibleLayout {
        entity: String,
        file: String,
        technique: TechniqueKind,
        missing: VertexAttributes,
    },
    #[error("entity {entity:?}: {} needs a {} texture", technique.name(), slot.name())]
    MissingTexture {
        entity: String,
        technique: TechniqueKind,
        slot: TextureSlot,
    },
    #[error("duplicate entity name {0:?}")]
    DuplicateName(String),
    #[error("light {light:?} orbits unknown entity {anchor:?}")]
    UnknownAnchor { light: String, anchor: String },
    #[error("light {0:?} cannot orbit itself")]
    SelfAnchor(String),
    #[error("light {0:?} is part of an orbit anchor cycle")]
    AnchorCycle(String),
    #[error("{count} lights configured, at most {max} supported")]
    TooManyLights { count: usize, max: usize },
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_entity() {
        let e = SceneError::MissingTexture {
            entity: "Cube".into(),
            technique: TechniqueKind::NormalMapping,
            slot: TextureSlot::Normal,
        };
        assert_eq!(e.to_string(), "entity \"Cube\": NormalMapping needs a NormalMap texture");

        let e = SceneError::TooManyLights { count: 3, max: 2 };
        assert_eq!(e.to_string(), "3 lights configured, at most 2 supported");
    }

    #[test]
    fn load_errors_are_sources() {
        use std::error::Error as _;
        let e = SceneError::Geometry {
            entity: "Floor".into(),
            file: "floor.obj".into(),
            source: LoadError::NotFound("floor.obj".into()),
        };
        assert!(e.source().is_some());
        assert!(e.to_string().contains("asset not found"));
    }
}
