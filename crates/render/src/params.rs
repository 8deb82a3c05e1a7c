use crate::sink::ShaderParamSink;
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Number of point lights the shaders read.
pub const MAX_LIGHTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixSlot {
    World,
    View,
    Projection,
}

impl MatrixSlot {
    pub fn name(self) -> &'static str {
        match self {
            Self::World => "WorldMatrix",
            Self::View => "ViewMatrix",
            Self::Projection => "ProjMatrix",
        }
    }
}

/// Three-float vector parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VectorSlot {
    CameraPosition,
    LightPosition(usize),
    LightColour(usize),
    AmbientColour,
    ModelColour,
}

impl VectorSlot {
    pub fn name(self) -> &'static str {
        match self {
            Self::CameraPosition => "CameraPos",
            Self::LightPosition(0) => "Light1Pos",
            Self::LightPosition(1) => "Light2Pos",
            Self::LightPosition(_) => "LightPos(out of range)",
            Self::LightColour(0) => "Light1Colour",
            Self::LightColour(1) => "Light2Colour",
            Self::LightColour(_) => "LightColour(out of range)",
            Self::AmbientColour => "AmbientColour",
            Self::ModelColour => "ModelColour",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarSlot {
    SpecularPower,
    ColourMultiplier,
    ParallaxDepth,
}

impl ScalarSlot {
    pub fn name(self) -> &'static str {
        match self {
            Self::SpecularPower => "SpecularPower",
            Self::ColourMultiplier => "colourMulti",
            Self::ParallaxDepth => "ParallaxDepth",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TextureSlot {
    Diffuse,
    Normal,
}

impl TextureSlot {
    pub fn name(self) -> &'static str {
        match self {
            Self::Diffuse => "DiffuseMap",
            Self::Normal => "NormalMap",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LightParams {
    pub position: Vec3,
    pub colour: Vec3,
}

/// Everything the shaders read that is shared by all draws in a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneParams {
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec3,
    pub lights: [LightParams; MAX_LIGHTS],
    pub ambient_colour: Vec3,
    pub specular_power: f32,
    pub colour_multiplier: f32,
    pub parallax_depth: f32,
}

impl Default for SceneParams {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            camera_position: Vec3::ZERO,
            lights: [LightParams::default(); MAX_LIGHTS],
            ambient_colour: Vec3::ZERO,
            specular_power: 1.0,
            colour_multiplier: 1.0,
            parallax_depth: 0.0,
        }
    }
}

impl SceneParams {
    /// Write the whole set to the sink.
    pub fn push<S: ShaderParamSink + ?Sized>(&self, sink: &mut S) {
        sink.set_matrix(MatrixSlot::View, self.view);
        sink.set_matrix(MatrixSlot::Projection, self.projection);
        sink.set_vector(VectorSlot::CameraPosition, self.camera_position);
        for (i, light) in self.lights.iter().enumerate() {
            sink.set_vector(VectorSlot::LightPosition(i), light.position);
            sink.set_vector(VectorSlot::LightColour(i), light.colour);
        }
        sink.set_vector(VectorSlot::AmbientColour, self.ambient_colour);
        sink.set_scalar(ScalarSlot::SpecularPower, self.specular_power);
        sink.set_scalar(ScalarSlot::ColourMultiplier, self.colour_multiplier);
        sink.set_scalar(ScalarSlot::ParallaxDepth, self.parallax_depth);
    }
}
