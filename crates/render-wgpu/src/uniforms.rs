//! CPU-side staging for one frame: the values sink calls set, packed the
//! way the shader's uniform blocks lay them out.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use shadelab_common::{GeometryHandle, TechniqueHandle, TextureHandle};
use shadelab_render::{MAX_LIGHTS, MatrixSlot, ScalarSlot, TextureSlot, VectorSlot};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct LightUniform {
    pub position: [f32; 4],
    pub colour: [f32; 4],
}

/// Mirrors `Globals` in the technique shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct GlobalUniforms {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub lights: [LightUniform; MAX_LIGHTS],
    pub ambient: [f32; 4],
    /// Specular power, colour multiplier, parallax depth, unused.
    pub scalars: [f32; 4],
}

impl Default for GlobalUniforms {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY.to_cols_array_2d(),
            proj: Mat4::IDENTITY.to_cols_array_2d(),
            camera_pos: [0.0; 4],
            lights: [LightUniform::zeroed(); MAX_LIGHTS],
            ambient: [0.0; 4],
            scalars: [1.0, 1.0, 0.0, 0.0],
        }
    }
}

/// Mirrors `Object` in the technique shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct ObjectUniforms {
    pub world: [[f32; 4]; 4],
    pub colour: [f32; 4],
}

pub(crate) const GLOBALS_SIZE: u64 = std::mem::size_of::<GlobalUniforms>() as u64;
pub(crate) const OBJECT_SIZE: u64 = std::mem::size_of::<ObjectUniforms>() as u64;

/// Round `size` up to a multiple of `alignment`.
pub(crate) fn align_to(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment.max(1)) * alignment.max(1)
}

fn extend(v: Vec3) -> [f32; 4] {
    v.extend(0.0).to_array()
}

/// Diffuse and normal map bound at draw time. `None` falls back to the
/// renderer's default white and flat-normal textures.
pub(crate) type TextureKey = (Option<TextureHandle>, Option<TextureHandle>);

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DrawRecord {
    pub geometry: GeometryHandle,
    pub technique: TechniqueHandle,
    pub object: ObjectUniforms,
    pub textures: TextureKey,
}

/// Everything recorded between two presents.
#[derive(Debug, Clone)]
pub(crate) struct FrameState {
    pub globals: GlobalUniforms,
    pub clear_colour: [f32; 4],
    pub clear_depth: f32,
    world: Mat4,
    model_colour: Vec3,
    diffuse: Option<TextureHandle>,
    normal: Option<TextureHandle>,
    draws: Vec<DrawRecord>,
}

impl Default for FrameState {
    fn default() -> Self {
        Self {
            globals: GlobalUniforms::default(),
            clear_colour: [0.0, 0.0, 0.0, 1.0],
            clear_depth: 1.0,
            world: Mat4::IDENTITY,
            model_colour: Vec3::ONE,
            diffuse: None,
            normal: None,
            draws: Vec::new(),
        }
    }
}

impl FrameState {
    pub fn clear(&mut self, colour: [f32; 4], depth: f32) {
        self.clear_colour = colour;
        self.clear_depth = depth;
    }

    pub fn set_matrix(&mut self, slot: MatrixSlot, value: Mat4) {
        match slot {
            MatrixSlot::World => self.world = value,
            MatrixSlot::View => self.globals.view = value.to_cols_array_2d(),
            MatrixSlot::Projection => self.globals.proj = value.to_cols_array_2d(),
        }
    }

    pub fn set_vector(&mut self, slot: VectorSlot, value: Vec3) {
        match slot {
            VectorSlot::CameraPosition => self.globals.camera_pos = extend(value),
            VectorSlot::AmbientColour => self.globals.ambient = extend(value),
            VectorSlot::ModelColour => self.model_colour = value,
            VectorSlot::LightPosition(i) | VectorSlot::LightColour(i) if i >= MAX_LIGHTS => {
                tracing::trace!(slot = slot.name(), index = i, "light slot out of range");
            }
            VectorSlot::LightPosition(i) => self.globals.lights[i].position = extend(value),
            VectorSlot::LightColour(i) => self.globals.lights[i].colour = extend(value),
        }
    }

    pub fn set_scalar(&mut self, slot: ScalarSlot, value: f32) {
        let i = match slot {
            ScalarSlot::SpecularPower => 0,
            ScalarSlot::ColourMultiplier => 1,
            ScalarSlot::ParallaxDepth => 2,
        };
        self.globals.scalars[i] = value;
    }

    pub fn set_texture(&mut self, slot: TextureSlot, texture: TextureHandle) {
        match slot {
            TextureSlot::Diffuse => self.diffuse = Some(texture),
            TextureSlot::Normal => self.normal = Some(texture),
        }
    }

    /// Snapshot the per-object bindings for a draw.
    pub fn record(&mut self, geometry: GeometryHandle, technique: TechniqueHandle) {
        self.draws.push(DrawRecord {
            geometry,
            technique,
            object: ObjectUniforms {
                world: self.world.to_cols_array_2d(),
                colour: self.model_colour.extend(1.0).to_array(),
            },
            textures: (self.diffuse, self.normal),
        });
    }

    /// Hand over the frame's draws; bound values stay as they are.
    pub fn take_draws(&mut self) -> Vec<DrawRecord> {
        std::mem::take(&mut self.draws)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_sizes_match_the_shader() {
        assert_eq!(GLOBALS_SIZE, 240);
        assert_eq!(OBJECT_SIZE, 80);
        assert_eq!(GLOBALS_SIZE % 16, 0);
    }

    #[test]
    fn alignment_rounds_up() {
        assert_eq!(align_to(80, 256), 256);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(257, 256), 512);
        assert_eq!(align_to(80, 0), 80);
    }

    #[test]
    fn globals_follow_sink_calls() {
        let mut frame = FrameState::default();
        frame.set_vector(VectorSlot::LightPosition(1), Vec3::new(1.0, 2.0, 3.0));
        frame.set_vector(VectorSlot::LightColour(0), Vec3::X);
        frame.set_vector(VectorSlot::LightColour(5), Vec3::ONE);
        frame.set_scalar(ScalarSlot::ColourMultiplier, 0.4);
        frame.set_matrix(MatrixSlot::View, Mat4::from_translation(Vec3::Z));

        assert_eq!(frame.globals.lights[1].position, [1.0, 2.0, 3.0, 0.0]);
        assert_eq!(frame.globals.lights[0].colour, [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(frame.globals.scalars[1], 0.4);
        assert_eq!(frame.globals.view[3], [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn draws_snapshot_current_bindings() {
        let mut frame = FrameState::default();
        frame.set_matrix(MatrixSlot::World, Mat4::from_translation(Vec3::X));
        frame.set_texture(TextureSlot::Diffuse, TextureHandle(3));
        frame.record(GeometryHandle(0), TechniqueHandle(1));

        frame.set_matrix(MatrixSlot::World, Mat4::IDENTITY);
        frame.set_vector(VectorSlot::ModelColour, Vec3::new(0.5, 0.0, 0.0));
        frame.record(GeometryHandle(1), TechniqueHandle(0));

        let draws = frame.take_draws();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].object.world[3], [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(draws[0].textures, (Some(TextureHandle(3)), None));
        assert_eq!(draws[1].object.colour, [0.5, 0.0, 0.0, 1.0]);
        assert!(frame.take_draws().is_empty());
    }
}
