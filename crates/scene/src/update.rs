use crate::animation::{colour_multiplier, orbit_offset};
use crate::light::LightMotion;
use crate::scene::Scene;
use shadelab_input::InputSnapshot;
use shadelab_render::{LightParams, MAX_LIGHTS, ShaderParamSink};

impl Scene {
    /// Advance the scene by `dt` seconds and push this frame's global shader
    /// parameters to `sink`, exactly once.
    ///
    /// Order: clock, camera, controlled entities, lights (position, then
    /// colour), every world matrix, parameters. Negative or non-finite `dt`
    /// counts as zero.
    pub fn update<S: ShaderParamSink + ?Sized>(
        &mut self,
        dt: f32,
        input: &InputSnapshot,
        sink: &mut S,
    ) {
        self.clock.advance(dt);
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };

        self.camera
            .control(dt, input, &self.camera_keys, &self.camera_rates);
        self.camera.update_matrices();

        let rates = self.model_rates;
        for (_, entity) in self.entities.iter_mut() {
            entity.control(dt, input, &rates);
        }

        self.animate_lights();

        for (_, entity) in self.entities.iter_mut() {
            entity.update_matrix();
        }

        self.refresh_params();
        self.params.push(sink);
        tracing::trace!(
            clock = self.clock.elapsed(),
            frame = self.clock.frames(),
            "scene updated"
        );
    }

    /// Place orbiting lights around their anchors and recompute every
    /// light's current colour from the clock. Anchors that are themselves
    /// lights are placed first, so positions depend only on the clock.
    pub(crate) fn animate_lights(&mut self) {
        let clock = self.clock.elapsed();
        for &index in &self.placement {
            let rig = &self.lights[index];
            if let LightMotion::Orbit {
                anchor,
                radius,
                speed,
            } = rig.motion
            {
                let centre = self.entities[anchor].position();
                self.entities[rig.entity].set_position(centre + orbit_offset(radius, speed, clock));
            }
            if let Some(light) = self.entities[rig.entity].light_mut() {
                let colour = rig.cycle.colour(light.initial_colour(), clock);
                light.set_colour(colour);
            }
        }
    }

    /// Copy camera, light and clock-driven values into the parameter set.
    /// Unfilled light slots stay black.
    pub(crate) fn refresh_params(&mut self) {
        let mut lights = [LightParams::default(); MAX_LIGHTS];
        for (slot, rig) in lights.iter_mut().zip(&self.lights) {
            let entity = &self.entities[rig.entity];
            *slot = LightParams {
                position: entity.position(),
                colour: entity.flat_colour(),
            };
        }
        self.params.view = self.camera.view_matrix();
        self.params.projection = self.camera.projection_matrix();
        self.params.camera_position = self.camera.position();
        self.params.lights = lights;
        self.params.colour_multiplier = colour_multiplier(self.clock.elapsed());
    }
}
