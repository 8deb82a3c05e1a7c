//! YAML scene description.
//!
//! Everything [`crate::Scene::load`] needs: camera, global lighting, and the
//! ordered entity list. Entity order is creation order, which is also draw
//! order and light-slot order. Angles are in degrees here and converted to
//! radians on load.

use crate::animation::ColourCycle;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use shadelab_input::{ControlKeys, ControlRates};
use shadelab_render::{TechniqueKind, TextureSlot};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    /// Back-buffer clear colour, RGBA.
    pub clear_colour: [f32; 4],
    pub ambient_colour: Vec3,
    pub specular_power: f32,
    pub parallax_depth: f32,
    /// Rates shared by every model with a control preset.
    pub model_rates: ControlRates,
    pub entities: Vec<EntityConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    /// Euler angles in degrees.
    pub rotation: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub keys: ControlKeys,
    pub rates: ControlRates,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(-15.0, 20.0, -40.0),
            rotation: Vec3::new(13.0, 18.0, 0.0),
            fov_degrees: 45.0,
            near: 0.1,
            far: 10_000.0,
            keys: ControlKeys::CAMERA,
            rates: ControlRates::CAMERA,
        }
    }
}

/// Which key bindings drive an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlPreset {
    Model,
    Camera,
    Custom(ControlKeys),
}

impl ControlPreset {
    pub fn keys(self) -> ControlKeys {
        match self {
            Self::Model => ControlKeys::MODEL,
            Self::Camera => ControlKeys::CAMERA,
            Self::Custom(keys) => keys,
        }
    }
}

/// Where a light sits each frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MotionConfig {
    /// Stays at its configured position.
    #[default]
    Fixed,
    /// Circles the named entity in the horizontal plane.
    Orbit {
        anchor: String,
        radius: f32,
        /// Radians per second.
        speed: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightConfig {
    pub colour: Vec3,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub cycle: ColourCycle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityConfig {
    pub name: String,
    /// Mesh file or `builtin:<name>`.
    pub geometry: String,
    pub technique: TechniqueKind,
    /// Ask the loader for tangents even when the technique does not need them.
    #[serde(default)]
    pub tangents: bool,
    #[serde(default)]
    pub position: Vec3,
    /// Euler angles in degrees.
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "unit_scale")]
    pub scale: f32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub textures: BTreeMap<TextureSlot, String>,
    /// Flat colour for techniques that read `ModelColour`.
    #[serde(default)]
    pub colour: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<ControlPreset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light: Option<LightConfig>,
}

fn unit_scale() -> f32 {
    1.0
}

impl EntityConfig {
    pub fn new(name: &str, geometry: &str, technique: TechniqueKind) -> Self {
        Self {
            name: name.to_string(),
            geometry: geometry.to_string(),
            technique,
            tangents: false,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: 1.0,
            textures: BTreeMap::new(),
            colour: Vec3::ZERO,
            control: None,
            light: None,
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn scaled(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_tangents(mut self) -> Self {
        self.tangents = true;
        self
    }

    pub fn texture(mut self, slot: TextureSlot, file: &str) -> Self {
        self.textures.insert(slot, file.to_string());
        self
    }

    pub fn controlled(mut self, preset: ControlPreset) -> Self {
        self.control = Some(preset);
        self
    }

    pub fn light(mut self, light: LightConfig) -> Self {
        self.light = Some(light);
        self
    }
}

impl Default for SceneConfig {
    /// The demo scene: one of each technique, a floor and two lights.
    fn default() -> Self {
        use crate::animation::Channel;
        use TechniqueKind::*;
        use TextureSlot::{Diffuse, Normal};

        let entities = vec![
            EntityConfig::new("Cube", "builtin:cube", VertexTex)
                .at(Vec3::new(0.0, 10.0, 0.0))
                .texture(Diffuse, "builtin:bricks")
                .controlled(ControlPreset::Model),
            EntityConfig::new("NormalCube", "builtin:cube", NormalMapping)
                .with_tangents()
                .at(Vec3::new(-20.0, 10.0, 50.0))
                .texture(Diffuse, "builtin:checker")
                .texture(Normal, "builtin:bumps"),
            EntityConfig::new("Sphere", "builtin:sphere", VertexChangingTex)
                .at(Vec3::new(30.0, 20.0, 50.0))
                .scaled(0.5)
                .texture(Diffuse, "builtin:checker"),
            EntityConfig::new("LitCube", "builtin:cube", VertexLitTex)
                .at(Vec3::new(0.0, 10.0, 40.0))
                .texture(Diffuse, "builtin:bricks")
                .controlled(ControlPreset::Model),
            EntityConfig::new("LitSphere", "builtin:sphere", VertexLitTex)
                .at(Vec3::new(-45.0, 10.0, 50.0))
                .scaled(0.5)
                .texture(Diffuse, "builtin:checker"),
            EntityConfig::new("ParallaxCube", "builtin:cube", NormalMappingPara)
                .with_tangents()
                .at(Vec3::new(25.0, 10.0, 20.0))
                .texture(Diffuse, "builtin:bricks")
                .texture(Normal, "builtin:bumps"),
            EntityConfig::new("Floor", "builtin:floor", VertexTex)
                .texture(Diffuse, "builtin:checker"),
            EntityConfig::new("Light1", "builtin:sphere", PlainColour)
                .at(Vec3::new(30.0, 10.0, 0.0))
                .scaled(0.1)
                .light(LightConfig {
                    colour: Vec3::new(1.0, 0.0, 0.7),
                    motion: MotionConfig::Orbit {
                        anchor: "Cube".to_string(),
                        radius: 20.0,
                        speed: 0.5,
                    },
                    cycle: ColourCycle::Blink,
                }),
            EntityConfig::new("Light2", "builtin:sphere", PlainColour)
                .at(Vec3::new(-20.0, 30.0, 50.0))
                .scaled(0.2)
                .light(LightConfig {
                    colour: Vec3::new(1.0, 0.8, 0.2),
                    motion: MotionConfig::Fixed,
                    cycle: ColourCycle::Pulse {
                        channel: Some(Channel::Blue),
                    },
                }),
        ];

        Self {
            camera: CameraConfig::default(),
            clear_colour: [0.2, 0.2, 0.3, 1.0],
            ambient_colour: Vec3::splat(0.2),
            specular_power: 256.0,
            parallax_depth: 0.08,
            model_rates: ControlRates::MODEL,
            entities,
        }
    }
}

impl SceneConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.display(), entities = config.entities.len(), "scene config read");
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    pub fn entity(&self, name: &str) -> Option<&EntityConfig> {
        self.entities.iter().find(|e| e.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scene_has_one_of_each_technique() {
        let config = SceneConfig::default();
        for kind in TechniqueKind::ALL {
            assert!(
                config.entities.iter().any(|e| e.technique == kind),
                "{kind:?} unused"
            );
        }
        let lights = config.entities.iter().filter(|e| e.light.is_some()).count();
        assert_eq!(lights, 2);
    }

    #[test]
    fn yaml_round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.yaml");
        let config = SceneConfig::default();
        config.save(&path).unwrap();
        assert_eq!(SceneConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn sparse_yaml_fills_defaults() {
        let yaml = r#"
specular_power: 32.0
entities:
  - name: Box
    geometry: builtin:cube
    technique: VertexTex
    position: [1.0, 2.0, 3.0]
    textures:
      Diffuse: builtin:white
  - name: Lamp
    geometry: builtin:sphere
    technique: PlainColour
    scale: 0.25
    light:
      colour: [1.0, 1.0, 1.0]
      motion: { kind: orbit, anchor: Box, radius: 5.0, speed: 1.0 }
      cycle: { kind: pulse, channel: red }
"#;
        let config = SceneConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.specular_power, 32.0);
        assert_eq!(config.clear_colour, [0.2, 0.2, 0.3, 1.0]);
        assert_eq!(config.camera, CameraConfig::default());

        let boxed = config.entity("Box").unwrap();
        assert_eq!(boxed.scale, 1.0);
        assert_eq!(boxed.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(boxed.textures[&TextureSlot::Diffuse], "builtin:white");

        let light = config.entity("Lamp").unwrap().light.as_ref().unwrap();
        assert!(matches!(light.motion, MotionConfig::Orbit { radius, .. } if radius == 5.0));
        assert_eq!(
            light.cycle,
            ColourCycle::Pulse {
                channel: Some(crate::animation::Channel::Red)
            }
        );
    }

    #[test]
    fn bad_yaml_is_reported() {
        let err = SceneConfig::from_yaml_str("entities: 12").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
        let missing = SceneConfig::from_file("/no/such/scene.yaml").unwrap_err();
        assert!(matches!(missing, ConfigError::Io(_)));
    }

    #[test]
    fn presets_map_to_bindings() {
        assert_eq!(ControlPreset::Model.keys(), ControlKeys::MODEL);
        assert_eq!(ControlPreset::Camera.keys(), ControlKeys::CAMERA);
    }
}
