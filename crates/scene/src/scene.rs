use crate::arena::EntityArena;
use crate::camera::Camera;
use crate::clock::SceneClock;
use crate::config::{EntityConfig, LightConfig, MotionConfig, SceneConfig};
use crate::entity::{Entity, Material};
use crate::error::SceneError;
use crate::light::{LightMotion, LightRig, LightState};
use glam::Vec3;
use shadelab_common::{EntityId, Pose, TextureHandle};
use shadelab_input::{ControlKeys, ControlRates};
use shadelab_render::{
    GeometryLoader, MAX_LIGHTS, SceneParams, TechniqueProvider, TechniqueRegistry, TextureLoader,
    TextureSlot,
};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Everything one running scene owns: entities, techniques, camera, clock
/// and lighting constants.
///
/// Built by [`Scene::load`], driven by `update` and `render` once per frame,
/// and ended with [`Scene::teardown`].
#[derive(Debug)]
pub struct Scene {
    pub(crate) entities: EntityArena,
    names: BTreeMap<String, EntityId>,
    techniques: TechniqueRegistry,
    pub(crate) camera: Camera,
    pub(crate) camera_keys: ControlKeys,
    pub(crate) camera_rates: ControlRates,
    pub(crate) model_rates: ControlRates,
    pub(crate) clock: SceneClock,
    pub(crate) lights: Vec<LightRig>,
    /// Indices into `lights`, every orbit anchor before the lights circling it.
    pub(crate) placement: Vec<usize>,
    pub(crate) clear_colour: [f32; 4],
    pub(crate) params: SceneParams,
}

type TextureCache = BTreeMap<(String, TextureSlot), TextureHandle>;

impl Scene {
    /// Resolve techniques, load every entity's assets, and place everything
    /// at clock zero. Any failure aborts the whole load.
    pub fn load<B>(config: &SceneConfig, backend: &mut B) -> Result<Self, SceneError>
    where
        B: TechniqueProvider + GeometryLoader + TextureLoader + ?Sized,
    {
        let _span = tracing::info_span!("scene_load", entities = config.entities.len()).entered();
        let techniques = TechniqueRegistry::resolve(&*backend)?;

        let mut entities = EntityArena::new();
        let mut names = BTreeMap::new();
        let mut textures = TextureCache::new();
        let mut pending_lights = Vec::new();

        for ec in &config.entities {
            if names.contains_key(&ec.name) {
                return Err(SceneError::DuplicateName(ec.name.clone()));
            }
            let entity = Self::load_entity(ec, &techniques, &mut textures, backend)?;
            let id = entities.insert(entity);
            names.insert(ec.name.clone(), id);
            if let Some(light) = &ec.light {
                pending_lights.push((id, ec.name.as_str(), light));
            }
            tracing::info!(entity = %ec.name, %id, technique = ec.technique.name(), "entity created");
        }

        let lights = Self::rig_lights(&pending_lights, &names)?;
        let placement = Self::placement_order(&lights, &pending_lights)?;

        let cam = &config.camera;
        let mut camera = Camera::new(Pose {
            position: cam.position,
            rotation: degrees_to_radians(cam.rotation),
            scale: Vec3::ONE,
        });
        camera.fov_y = cam.fov_degrees.to_radians();
        camera.near = cam.near;
        camera.far = cam.far;

        let mut scene = Self {
            entities,
            names,
            techniques,
            camera,
            camera_keys: cam.keys,
            camera_rates: cam.rates,
            model_rates: config.model_rates,
            clock: SceneClock::new(),
            lights,
            placement,
            clear_colour: config.clear_colour,
            params: SceneParams {
                ambient_colour: config.ambient_colour,
                specular_power: config.specular_power,
                parallax_depth: config.parallax_depth,
                ..SceneParams::default()
            },
        };
        // A frame rendered before the first update sees the clock-zero state.
        scene.camera.update_matrices();
        scene.animate_lights();
        for (_, e) in scene.entities.iter_mut() {
            e.update_matrix();
        }
        scene.refresh_params();

        tracing::info!(
            entities = scene.entities.len(),
            lights = scene.lights.len(),
            textures = textures.len(),
            "scene loaded"
        );
        Ok(scene)
    }

    fn load_entity<B>(
        ec: &EntityConfig,
        techniques: &TechniqueRegistry,
        textures: &mut TextureCache,
        backend: &mut B,
    ) -> Result<Entity, SceneError>
    where
        B: GeometryLoader + TextureLoader + ?Sized,
    {
        let binding = *techniques.get(ec.technique);
        let geometry = backend
            .load_geometry(&ec.geometry, ec.technique, ec.tangents)
            .map_err(|source| SceneError::Geometry {
                entity: ec.name.clone(),
                file: ec.geometry.clone(),
                source,
            })?;
        let missing = binding.layout.difference(geometry.attributes);
        if !missing.is_empty() {
            return Err(SceneError::IncompatibleLayout {
                entity: ec.name.clone(),
                file: ec.geometry.clone(),
                technique: ec.technique,
                missing,
            });
        }

        let mut material = Material {
            colour: ec.colour,
            ..Material::default()
        };
        for &slot in ec.technique.texture_slots() {
            let Some(file) = ec.textures.get(&slot) else {
                return Err(SceneError::MissingTexture {
                    entity: ec.name.clone(),
                    technique: ec.technique,
                    slot,
                });
            };
            let handle = match textures.entry((file.clone(), slot)) {
                Entry::Occupied(cached) => *cached.get(),
                Entry::Vacant(vacant) => {
                    let handle = backend.load_texture(file, slot).map_err(|source| {
                        SceneError::Texture {
                            entity: ec.name.clone(),
                            file: file.clone(),
                            source,
                        }
                    })?;
                    *vacant.insert(handle)
                }
            };
            match slot {
                TextureSlot::Diffuse => material.diffuse = Some(handle),
                TextureSlot::Normal => material.normal = Some(handle),
            }
        }
        for slot in ec.textures.keys() {
            if !ec.technique.texture_slots().contains(slot) {
                tracing::warn!(entity = %ec.name, slot = slot.name(), "texture not used by technique, skipped");
            }
        }

        let pose = Pose {
            position: ec.position,
            rotation: degrees_to_radians(ec.rotation),
            scale: Vec3::splat(ec.scale),
        };
        let mut entity = Entity::new(&ec.name, geometry.handle, binding, material).with_pose(pose);
        if let Some(preset) = ec.control {
            entity = entity.with_control(preset.keys());
        }
        if let Some(light) = &ec.light {
            entity = entity.with_light(LightState::new(light.colour));
        }
        tracing::debug!(
            entity = %ec.name,
            geometry = ?geometry.handle,
            attributes = ?geometry.attributes,
            "entity assets loaded"
        );
        Ok(entity)
    }

    fn rig_lights(
        pending: &[(EntityId, &str, &LightConfig)],
        names: &BTreeMap<String, EntityId>,
    ) -> Result<Vec<LightRig>, SceneError> {
        if pending.len() > MAX_LIGHTS {
            return Err(SceneError::TooManyLights {
                count: pending.len(),
                max: MAX_LIGHTS,
            });
        }
        pending
            .iter()
            .map(|&(entity, name, light)| {
                let motion = match &light.motion {
                    MotionConfig::Fixed => LightMotion::Fixed,
                    MotionConfig::Orbit {
                        anchor,
                        radius,
                        speed,
                    } => {
                        let anchor_id =
                            names
                                .get(anchor)
                                .copied()
                                .ok_or_else(|| SceneError::UnknownAnchor {
                                    light: name.to_string(),
                                    anchor: anchor.clone(),
                                })?;
                        if anchor_id == entity {
                            return Err(SceneError::SelfAnchor(name.to_string()));
                        }
                        LightMotion::Orbit {
                            anchor: anchor_id,
                            radius: *radius,
                            speed: *speed,
                        }
                    }
                };
                Ok(LightRig {
                    entity,
                    motion,
                    cycle: light.cycle,
                })
            })
            .collect()
    }

    /// Order lights so each one is placed after the light it orbits, if any.
    /// Lights anchored to plain entities keep their creation order.
    fn placement_order(
        rigs: &[LightRig],
        pending: &[(EntityId, &str, &LightConfig)],
    ) -> Result<Vec<usize>, SceneError> {
        let index_of: BTreeMap<EntityId, usize> =
            rigs.iter().enumerate().map(|(i, rig)| (rig.entity, i)).collect();
        let mut placed = vec![false; rigs.len()];
        let mut order = Vec::with_capacity(rigs.len());
        for start in 0..rigs.len() {
            let mut chain = Vec::new();
            let mut next = Some(start);
            while let Some(i) = next {
                if placed[i] {
                    break;
                }
                if chain.contains(&i) {
                    return Err(SceneError::AnchorCycle(pending[i].1.to_string()));
                }
                chain.push(i);
                next = match rigs[i].motion {
                    LightMotion::Orbit { anchor, .. } => index_of.get(&anchor).copied(),
                    LightMotion::Fixed => None,
                };
            }
            for &i in chain.iter().rev() {
                placed[i] = true;
                order.push(i);
            }
        }
        Ok(order)
    }

    /// Load the YAML file at `path` and build a scene from it.
    pub fn load_file<B>(path: impl AsRef<std::path::Path>, backend: &mut B) -> Result<Self, SceneError>
    where
        B: TechniqueProvider + GeometryLoader + TextureLoader + ?Sized,
    {
        let config = SceneConfig::from_file(path)?;
        Self::load(&config, backend)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn id_of(&self, name: &str) -> Option<EntityId> {
        self.names.get(name).copied()
    }

    pub fn entity_by_name(&self, name: &str) -> Option<&Entity> {
        self.id_of(name).and_then(|id| self.entities.get(id))
    }

    /// Entities in creation order, which is also draw order.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn techniques(&self) -> &TechniqueRegistry {
        &self.techniques
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn clock(&self) -> &SceneClock {
        &self.clock
    }

    /// Lights in slot order.
    pub fn lights(&self) -> &[LightRig] {
        &self.lights
    }

    /// Parameters as last pushed (or as prepared by load).
    pub fn params(&self) -> &SceneParams {
        &self.params
    }

    pub fn clear_colour(&self) -> [f32; 4] {
        self.clear_colour
    }

    /// Destroy every entity, newest first. Returns their names in the order
    /// they were dropped.
    pub fn teardown(mut self) -> Vec<String> {
        let _span = tracing::info_span!("scene_teardown").entered();
        let mut dropped = Vec::with_capacity(self.entities.len());
        for (id, entity) in self.entities.drain_reverse() {
            tracing::info!(entity = entity.name(), %id, "entity destroyed");
            dropped.push(entity.name().to_string());
        }
        self.names.clear();
        self.lights.clear();
        self.placement.clear();
        dropped
    }
}

fn degrees_to_radians(degrees: Vec3) -> Vec3 {
    Vec3::new(
        degrees.x.to_radians(),
        degrees.y.to_radians(),
        degrees.z.to_radians(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::ColourCycle;
    use crate::config::{ControlPreset, EntityConfig};
    use shadelab_render::{
        HeadlessBackend, LoadError, RegistryError, TechniqueKind, VertexAttributes,
    };

    fn load(config: &SceneConfig) -> Result<Scene, SceneError> {
        Scene::load(config, &mut HeadlessBackend::new())
    }

    fn lamp(name: &str, motion: MotionConfig) -> EntityConfig {
        EntityConfig::new(name, "builtin:sphere", TechniqueKind::PlainColour).light(LightConfig {
            colour: Vec3::ONE,
            motion,
            cycle: ColourCycle::Steady,
        })
    }

    #[test]
    fn default_scene_loads() {
        let mut backend = HeadlessBackend::new();
        let scene = Scene::load(&SceneConfig::default(), &mut backend).unwrap();
        assert_eq!(scene.entity_count(), 9);
        assert_eq!(scene.lights().len(), 2);
        assert_eq!(scene.id_of("Floor"), Some(EntityId(6)));
        assert!(scene.entities().all(|(_, e)| !e.is_stale()));

        let cube = scene.entity_by_name("Cube").unwrap();
        assert_eq!(cube.technique().kind, TechniqueKind::VertexTex);
        assert!(cube.control_keys().is_some());
    }

    #[test]
    fn textures_are_loaded_once_per_file_and_slot() {
        let mut backend = HeadlessBackend::new();
        let scene = Scene::load(&SceneConfig::default(), &mut backend).unwrap();
        // bricks, checker (diffuse) and bumps (normal)
        assert_eq!(backend.texture_loads().len(), 3);

        let cube = scene.entity_by_name("Cube").unwrap().material().diffuse;
        let lit = scene.entity_by_name("LitCube").unwrap().material().diffuse;
        assert!(cube.is_some());
        assert_eq!(cube, lit);
    }

    #[test]
    fn geometry_is_loaded_for_its_technique() {
        let mut backend = HeadlessBackend::new();
        Scene::load(&SceneConfig::default(), &mut backend).unwrap();
        let (file, attributes) = &backend.geometry_loads()[1];
        assert_eq!(file, "builtin:cube");
        assert!(attributes.contains(VertexAttributes::TANGENT));
    }

    #[test]
    fn rotation_is_configured_in_degrees() {
        let mut config = SceneConfig::default();
        config.entities[0].rotation = Vec3::new(0.0, 90.0, 0.0);
        let scene = load(&config).unwrap();
        let cube = scene.entity_by_name("Cube").unwrap();
        assert!((cube.rotation().y - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn missing_technique_aborts() {
        let mut backend = HeadlessBackend::new().without_technique("NormalMappingPara");
        let err = Scene::load(&SceneConfig::default(), &mut backend).unwrap_err();
        assert!(matches!(
            err,
            SceneError::Registry(RegistryError::MissingTechnique("NormalMappingPara"))
        ));
        assert!(backend.geometry_loads().is_empty());
    }

    #[test]
    fn geometry_failure_aborts() {
        let mut config = SceneConfig::default();
        config.entities[2].geometry = "media/no-such-mesh.obj".into();
        let err = load(&config).unwrap_err();
        match err {
            SceneError::Geometry { entity, source, .. } => {
                assert_eq!(entity, "Sphere");
                assert!(matches!(source, LoadError::NotFound(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn layout_mismatch_aborts() {
        let mut backend = HeadlessBackend::new()
            .with_geometry_attributes("builtin:sphere", VertexAttributes::POSITION);
        let err = Scene::load(&SceneConfig::default(), &mut backend).unwrap_err();
        match err {
            SceneError::IncompatibleLayout {
                entity, missing, ..
            } => {
                assert_eq!(entity, "Sphere");
                assert_eq!(missing, VertexAttributes::UV);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn texture_failure_aborts() {
        let mut config = SceneConfig::default();
        config.entities[0]
            .textures
            .insert(TextureSlot::Diffuse, "no/such/bricks.png".into());
        assert!(matches!(
            load(&config),
            Err(SceneError::Texture { ref entity, .. }) if entity == "Cube"
        ));
    }

    #[test]
    fn missing_texture_slot_aborts() {
        let mut config = SceneConfig::default();
        config.entities[1].textures.remove(&TextureSlot::Normal);
        assert!(matches!(
            load(&config),
            Err(SceneError::MissingTexture {
                slot: TextureSlot::Normal,
                ..
            })
        ));
    }

    #[test]
    fn duplicate_name_aborts() {
        let mut config = SceneConfig::default();
        let copy = config.entities[0].clone();
        config.entities.push(copy);
        assert!(matches!(load(&config), Err(SceneError::DuplicateName(n)) if n == "Cube"));
    }

    #[test]
    fn unknown_or_self_anchor_aborts() {
        let mut config = SceneConfig {
            entities: vec![lamp(
                "Lamp",
                MotionConfig::Orbit {
                    anchor: "Nowhere".into(),
                    radius: 1.0,
                    speed: 1.0,
                },
            )],
            ..SceneConfig::default()
        };
        assert!(matches!(load(&config), Err(SceneError::UnknownAnchor { .. })));

        config.entities[0].light.as_mut().unwrap().motion = MotionConfig::Orbit {
            anchor: "Lamp".into(),
            radius: 1.0,
            speed: 1.0,
        };
        assert!(matches!(load(&config), Err(SceneError::SelfAnchor(_))));
    }

    #[test]
    fn mutually_anchored_lights_abort() {
        let orbit = |anchor: &str| MotionConfig::Orbit {
            anchor: anchor.into(),
            radius: 2.0,
            speed: 1.0,
        };
        let config = SceneConfig {
            entities: vec![lamp("A", orbit("B")), lamp("B", orbit("A"))],
            ..SceneConfig::default()
        };
        assert!(matches!(load(&config), Err(SceneError::AnchorCycle(name)) if name == "A"));
    }

    #[test]
    fn anchor_lights_are_placed_first() {
        let config = SceneConfig {
            entities: vec![
                lamp(
                    "Moon",
                    MotionConfig::Orbit {
                        anchor: "Planet".into(),
                        radius: 2.0,
                        speed: 1.0,
                    },
                ),
                lamp("Planet", MotionConfig::Fixed),
            ],
            ..SceneConfig::default()
        };
        let scene = load(&config).unwrap();
        assert_eq!(scene.placement, vec![1, 0]);
        // Slots still follow creation order.
        assert_eq!(scene.lights()[0].entity, scene.id_of("Moon").unwrap());
    }

    #[test]
    fn third_light_aborts() {
        let mut config = SceneConfig::default();
        config.entities.push(lamp("Light3", MotionConfig::Fixed));
        assert!(matches!(
            load(&config),
            Err(SceneError::TooManyLights { count: 3, max: 2 })
        ));
    }

    #[test]
    fn orbit_light_starts_beside_its_anchor() {
        let scene = load(&SceneConfig::default()).unwrap();
        let light = scene.entity_by_name("Light1").unwrap();
        assert!(light.position().abs_diff_eq(Vec3::new(20.0, 10.0, 0.0), 1e-4));
        // Blink is off during the first second.
        assert_eq!(light.light().unwrap().colour(), Vec3::ZERO);
    }

    #[test]
    fn custom_preset_and_flat_colour_carry_through() {
        let mut config = SceneConfig::default();
        config.entities[4].colour = Vec3::new(0.1, 0.2, 0.3);
        config.entities[4].control = Some(ControlPreset::Custom(ControlKeys::CAMERA));
        let scene = load(&config).unwrap();
        let e = scene.entity_by_name("LitSphere").unwrap();
        assert_eq!(e.material().colour, Vec3::new(0.1, 0.2, 0.3));
        assert_eq!(e.control_keys(), Some(&ControlKeys::CAMERA));
    }

    #[test]
    fn load_file_reads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.yaml");
        SceneConfig::default().save(&path).unwrap();
        let scene = Scene::load_file(&path, &mut HeadlessBackend::new()).unwrap();
        assert_eq!(scene.entity_count(), 9);

        let err = Scene::load_file(dir.path().join("absent.yaml"), &mut HeadlessBackend::new());
        assert!(matches!(err, Err(SceneError::Config(_))));
    }

    #[test]
    fn teardown_drops_newest_first() {
        let scene = load(&SceneConfig::default()).unwrap();
        let dropped = scene.teardown();
        assert_eq!(dropped.first().map(String::as_str), Some("Light2"));
        assert_eq!(dropped.last().map(String::as_str), Some("Cube"));
        assert_eq!(dropped.len(), 9);
    }
}
