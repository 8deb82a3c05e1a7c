use crate::animation::ColourCycle;
use glam::Vec3;
use shadelab_common::EntityId;

/// Colour state carried by light entities.
///
/// Holds data only. How the current colour evolves over time is decided by
/// the scene, per light, not by the light itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightState {
    initial_colour: Vec3,
    current_colour: Vec3,
}

impl LightState {
    /// A light whose current colour starts at its initial colour.
    pub fn new(initial_colour: Vec3) -> Self {
        Self {
            initial_colour,
            current_colour: initial_colour,
        }
    }

    pub fn initial_colour(&self) -> Vec3 {
        self.initial_colour
    }

    /// Set the base colour. Only meant for scene setup.
    pub fn set_initial_colour(&mut self, colour: Vec3) {
        self.initial_colour = colour;
    }

    pub fn colour(&self) -> Vec3 {
        self.current_colour
    }

    pub fn set_colour(&mut self, colour: Vec3) {
        self.current_colour = colour;
    }
}

/// Where a light is placed each frame, with anchors resolved to ids.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightMotion {
    Fixed,
    Orbit {
        anchor: EntityId,
        radius: f32,
        speed: f32,
    },
}

/// A light entity together with the policy that animates it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightRig {
    pub entity: EntityId,
    pub motion: LightMotion,
    pub cycle: ColourCycle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_initial_colour() {
        let l = LightState::new(Vec3::new(1.0, 0.8, 0.2));
        assert_eq!(l.colour(), l.initial_colour());
    }

    #[test]
    fn current_colour_is_independent_of_initial() {
        let mut l = LightState::new(Vec3::ONE);
        l.set_colour(Vec3::ZERO);
        assert_eq!(l.colour(), Vec3::ZERO);
        assert_eq!(l.initial_colour(), Vec3::ONE);
    }
}
