use crate::light::LightState;
use glam::{Mat4, Vec3};
use shadelab_common::{GeometryHandle, Pose, TextureHandle};
use shadelab_input::{ControlKeys, ControlRates, InputSnapshot, drive};
use shadelab_render::{TechniqueBinding, TextureSlot};

/// Textures and flat colour an entity binds before drawing. Texture handles
/// are shared with every other entity that loaded the same file.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Material {
    pub diffuse: Option<TextureHandle>,
    pub normal: Option<TextureHandle>,
    /// `ModelColour` for flat-colour techniques.
    pub colour: Vec3,
}

impl Material {
    pub fn texture(&self, slot: TextureSlot) -> Option<TextureHandle> {
        match slot {
            TextureSlot::Diffuse => self.diffuse,
            TextureSlot::Normal => self.normal,
        }
    }
}

/// A placed object: a model, or a light when [`Entity::light`] is set.
///
/// The world matrix is a cache. Pose setters only mark it stale;
/// [`Entity::update_matrix`] recomputes it and [`Entity::world_matrix`]
/// never does.
#[derive(Debug, Clone)]
pub struct Entity {
    name: String,
    pose: Pose,
    world: Mat4,
    stale: bool,
    geometry: GeometryHandle,
    technique: TechniqueBinding,
    material: Material,
    control: Option<ControlKeys>,
    light: Option<LightState>,
}

impl Entity {
    /// A model drawn with `technique`, which its geometry was loaded for.
    pub fn new(
        name: impl Into<String>,
        geometry: GeometryHandle,
        technique: TechniqueBinding,
        material: Material,
    ) -> Self {
        Self {
            name: name.into(),
            pose: Pose::default(),
            world: Mat4::IDENTITY,
            stale: true,
            geometry,
            technique,
            material,
            control: None,
            light: None,
        }
    }

    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self.stale = true;
        self
    }

    pub fn with_control(mut self, keys: ControlKeys) -> Self {
        self.control = Some(keys);
        self
    }

    pub fn with_light(mut self, light: LightState) -> Self {
        self.light = Some(light);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn position(&self) -> Vec3 {
        self.pose.position
    }

    pub fn rotation(&self) -> Vec3 {
        self.pose.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.pose.scale
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.pose.position = position;
        self.stale = true;
    }

    /// Euler angles in radians.
    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.pose.rotation = rotation;
        self.stale = true;
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.pose.scale = scale;
        self.stale = true;
    }

    pub fn set_uniform_scale(&mut self, scale: f32) {
        self.set_scale(Vec3::splat(scale));
    }

    /// Recompute the cached world matrix from the current pose.
    pub fn update_matrix(&mut self) {
        self.world = self.pose.matrix();
        self.stale = false;
    }

    /// The matrix as of the last [`Entity::update_matrix`].
    pub fn world_matrix(&self) -> Mat4 {
        self.world
    }

    /// Whether the pose changed since the matrix was last computed.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Apply one frame of keyboard control if the entity has a binding.
    /// Returns whether the pose was touched.
    pub fn control(&mut self, dt: f32, input: &InputSnapshot, rates: &ControlRates) -> bool {
        let Some(keys) = self.control else {
            return false;
        };
        let touched = drive(&mut self.pose, dt, input, &keys, rates);
        self.stale |= touched;
        touched
    }

    pub fn control_keys(&self) -> Option<&ControlKeys> {
        self.control.as_ref()
    }

    pub fn geometry(&self) -> GeometryHandle {
        self.geometry
    }

    pub fn technique(&self) -> &TechniqueBinding {
        &self.technique
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn light(&self) -> Option<&LightState> {
        self.light.as_ref()
    }

    pub fn light_mut(&mut self) -> Option<&mut LightState> {
        self.light.as_mut()
    }

    pub fn is_light(&self) -> bool {
        self.light.is_some()
    }

    /// Colour for flat-colour techniques: a light shows its current colour,
    /// anything else its material colour.
    pub fn flat_colour(&self) -> Vec3 {
        self.light
            .map_or(self.material.colour, |light| light.colour())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadelab_common::{TechniqueHandle, rotation_matrix};
    use shadelab_input::Key;
    use shadelab_render::TechniqueKind;

    fn cube() -> Entity {
        let technique = TechniqueBinding {
            kind: TechniqueKind::VertexTex,
            handle: TechniqueHandle(1),
            layout: TechniqueKind::VertexTex.required_attributes(),
        };
        Entity::new("cube", GeometryHandle(0), technique, Material::default())
    }

    #[test]
    fn world_matrix_composes_scale_rotation_translation() {
        let mut e = cube();
        let position = Vec3::new(3.0, -2.0, 7.5);
        let rotation = Vec3::new(0.3, 1.2, -0.4);
        e.set_position(position);
        e.set_rotation(rotation);
        e.set_uniform_scale(2.5);
        e.update_matrix();

        let expected = Mat4::from_translation(position)
            * rotation_matrix(rotation)
            * Mat4::from_scale(Vec3::splat(2.5));
        assert!(e.world_matrix().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn matrix_is_stale_until_updated() {
        let mut e = cube();
        e.update_matrix();
        assert!(!e.is_stale());

        e.set_position(Vec3::new(10.0, 0.0, 0.0));
        assert!(e.is_stale());
        // Reading does not recompute.
        assert_eq!(e.world_matrix(), Mat4::IDENTITY);

        e.update_matrix();
        assert_eq!(e.world_matrix().w_axis.truncate(), Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn update_matrix_is_idempotent() {
        let mut e = cube().with_pose(Pose {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Vec3::new(0.1, 0.2, 0.3),
            scale: Vec3::splat(0.5),
        });
        e.update_matrix();
        let first = e.world_matrix();
        e.update_matrix();
        assert_eq!(first, e.world_matrix());
    }

    #[test]
    fn uncontrolled_entity_ignores_keys() {
        let mut e = cube();
        let input: InputSnapshot = [Key::Period].into_iter().collect();
        assert!(!e.control(1.0, &input, &ControlRates::MODEL));
        assert_eq!(e.position(), Vec3::ZERO);
    }

    #[test]
    fn controlled_entity_moves_and_goes_stale() {
        let mut e = cube().with_control(ControlKeys::MODEL);
        e.update_matrix();
        let input: InputSnapshot = [Key::Period].into_iter().collect();
        assert!(e.control(0.5, &input, &ControlRates::MODEL));
        assert!(e.position().abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), 1e-5));
        assert!(e.is_stale());
    }

    #[test]
    fn flat_colour_prefers_light_colour() {
        let mut e = cube();
        assert_eq!(e.flat_colour(), Vec3::ZERO);
        e = e.with_light(LightState::new(Vec3::new(1.0, 0.0, 0.7)));
        e.light_mut().unwrap().set_colour(Vec3::X);
        assert!(e.is_light());
        assert_eq!(e.flat_colour(), Vec3::X);
    }

    #[test]
    fn material_texture_by_slot() {
        let m = Material {
            diffuse: Some(TextureHandle(3)),
            ..Material::default()
        };
        assert_eq!(m.texture(TextureSlot::Diffuse), Some(TextureHandle(3)));
        assert_eq!(m.texture(TextureSlot::Normal), None);
    }
}
