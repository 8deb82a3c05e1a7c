use crate::scene::Scene;
use shadelab_input::InputSnapshot;
use shadelab_render::{MatrixSlot, ShaderParamSink, VectorSlot};

impl Scene {
    /// Draw every entity, in creation order, with the technique it was
    /// loaded for, then present.
    ///
    /// Each entity binds its world matrix, every texture its technique reads,
    /// and `ModelColour` where used, before its draw. Nothing is assumed to
    /// survive from the previous entity's draw.
    pub fn render<S: ShaderParamSink + ?Sized>(&self, sink: &mut S) {
        sink.clear(self.clear_colour, 1.0);
        sink.set_matrix(MatrixSlot::View, self.camera.view_matrix());
        sink.set_matrix(MatrixSlot::Projection, self.camera.projection_matrix());

        for (id, entity) in self.entities.iter() {
            let technique = entity.technique();
            sink.set_matrix(MatrixSlot::World, entity.world_matrix());
            for &slot in technique.kind.texture_slots() {
                if let Some(texture) = entity.material().texture(slot) {
                    sink.set_texture(slot, texture);
                }
            }
            if technique.kind.uses_model_colour() {
                sink.set_vector(VectorSlot::ModelColour, entity.flat_colour());
            }
            sink.draw(entity.geometry(), technique.handle);
            tracing::trace!(entity = entity.name(), %id, technique = technique.kind.name(), "drawn");
        }

        sink.present();
    }

    /// One full frame: update, then render.
    pub fn frame<S: ShaderParamSink + ?Sized>(
        &mut self,
        dt: f32,
        input: &InputSnapshot,
        sink: &mut S,
    ) {
        self.update(dt, input, sink);
        self.render(sink);
    }
}
