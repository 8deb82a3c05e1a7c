use crate::params::{MatrixSlot, ScalarSlot, TextureSlot, VectorSlot};
use glam::{Mat4, Vec3};
use shadelab_common::{GeometryHandle, TechniqueHandle, TextureHandle};
use std::fmt::Write as _;

/// Where the scene sends shader parameters and draw calls.
///
/// Values set through the sink stay bound until overwritten. The scene does
/// not rely on that between entities: it rebinds everything a draw needs.
pub trait ShaderParamSink {
    /// Clear the colour target to `colour` and the depth buffer to `depth`.
    fn clear(&mut self, colour: [f32; 4], depth: f32);
    fn set_matrix(&mut self, slot: MatrixSlot, value: Mat4);
    /// Three floats (12 bytes).
    fn set_vector(&mut self, slot: VectorSlot, value: Vec3);
    fn set_scalar(&mut self, slot: ScalarSlot, value: f32);
    fn set_texture(&mut self, slot: TextureSlot, texture: TextureHandle);
    /// Draw `geometry` with the currently bound parameters.
    fn draw(&mut self, geometry: GeometryHandle, technique: TechniqueHandle);
    /// Finish the frame and hand it to the display.
    fn present(&mut self);
}

/// One call made on a [`RecordingSink`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SinkCall {
    Clear { colour: [f32; 4], depth: f32 },
    Matrix(MatrixSlot, Mat4),
    Vector(VectorSlot, Vec3),
    Scalar(ScalarSlot, f32),
    Texture(TextureSlot, TextureHandle),
    Draw {
        geometry: GeometryHandle,
        technique: TechniqueHandle,
    },
    Present,
}

/// Sink that records calls in order. Used headless and in tests.
///
/// History is bounded: a `present` drops everything before the frame it
/// ends, so at most the presented frame and the one being built are kept.
/// Draw and present totals are counted across the whole run.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    calls: Vec<SinkCall>,
    draws: usize,
    presents: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[SinkCall] {
        &self.calls
    }

    /// Drop everything recorded so far, totals included.
    pub fn reset(&mut self) {
        self.calls.clear();
        self.draws = 0;
        self.presents = 0;
    }

    /// Draws since creation or the last `reset`.
    pub fn draw_count(&self) -> usize {
        self.draws
    }

    /// Presents since creation or the last `reset`.
    pub fn present_count(&self) -> usize {
        self.presents
    }

    /// Calls made since the previous `Present` (or since recording began),
    /// excluding a trailing `Present`.
    pub fn last_frame(&self) -> &[SinkCall] {
        let end = match self.calls.last() {
            Some(SinkCall::Present) => self.calls.len() - 1,
            _ => self.calls.len(),
        };
        let start = self.calls[..end]
            .iter()
            .rposition(|c| matches!(c, SinkCall::Present))
            .map_or(0, |i| i + 1);
        &self.calls[start..end]
    }

    /// Human-readable listing of the last frame's draws.
    pub fn summary(&self) -> String {
        let frame = self.last_frame();
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame ({} calls, {} draws) ===",
            frame.len(),
            frame
                .iter()
                .filter(|c| matches!(c, SinkCall::Draw { .. }))
                .count()
        );
        let mut world = None;
        let mut colour = None;
        for call in frame {
            match call {
                SinkCall::Matrix(MatrixSlot::World, m) => world = Some(m.w_axis.truncate()),
                SinkCall::Vector(VectorSlot::ModelColour, c) => colour = Some(*c),
                SinkCall::Draw {
                    geometry,
                    technique,
                } => {
                    let p = world.take().unwrap_or(Vec3::ZERO);
                    let _ = write!(
                        out,
                        "  draw geometry={} technique={} at ({:.2}, {:.2}, {:.2})",
                        geometry.0, technique.0, p.x, p.y, p.z
                    );
                    if let Some(c) = colour.take() {
                        let _ = write!(out, " colour=({:.2}, {:.2}, {:.2})", c.x, c.y, c.z);
                    }
                    out.push('\n');
                }
                _ => {}
            }
        }
        out
    }
}

impl ShaderParamSink for RecordingSink {
    fn clear(&mut self, colour: [f32; 4], depth: f32) {
        self.calls.push(SinkCall::Clear { colour, depth });
    }

    fn set_matrix(&mut self, slot: MatrixSlot, value: Mat4) {
        self.calls.push(SinkCall::Matrix(slot, value));
    }

    fn set_vector(&mut self, slot: VectorSlot, value: Vec3) {
        self.calls.push(SinkCall::Vector(slot, value));
    }

    fn set_scalar(&mut self, slot: ScalarSlot, value: f32) {
        self.calls.push(SinkCall::Scalar(slot, value));
    }

    fn set_texture(&mut self, slot: TextureSlot, texture: TextureHandle) {
        self.calls.push(SinkCall::Texture(slot, texture));
    }

    fn draw(&mut self, geometry: GeometryHandle, technique: TechniqueHandle) {
        self.draws += 1;
        self.calls.push(SinkCall::Draw {
            geometry,
            technique,
        });
    }

    fn present(&mut self) {
        if let Some(end) = self.calls.iter().rposition(|c| matches!(c, SinkCall::Present)) {
            self.calls.drain(..=end);
        }
        self.presents += 1;
        self.calls.push(SinkCall::Present);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let mut sink = RecordingSink::new();
        sink.clear([0.0; 4], 1.0);
        sink.set_matrix(MatrixSlot::World, Mat4::IDENTITY);
        sink.draw(GeometryHandle(1), TechniqueHandle(2));
        sink.present();

        assert_eq!(sink.calls().len(), 4);
        assert_eq!(sink.draw_count(), 1);
        assert_eq!(sink.present_count(), 1);
        assert_eq!(sink.calls()[3], SinkCall::Present);
    }

    #[test]
    fn last_frame_skips_earlier_frames() {
        let mut sink = RecordingSink::new();
        sink.draw(GeometryHandle(1), TechniqueHandle(0));
        sink.present();
        sink.set_scalar(ScalarSlot::SpecularPower, 8.0);
        sink.draw(GeometryHandle(2), TechniqueHandle(0));
        sink.present();

        let frame = sink.last_frame();
        assert_eq!(frame.len(), 2);
        assert_eq!(
            frame[1],
            SinkCall::Draw {
                geometry: GeometryHandle(2),
                technique: TechniqueHandle(0)
            }
        );
    }

    #[test]
    fn summary_lists_draws() {
        let mut sink = RecordingSink::new();
        sink.set_matrix(
            MatrixSlot::World,
            Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)),
        );
        sink.set_vector(VectorSlot::ModelColour, Vec3::X);
        sink.draw(GeometryHandle(4), TechniqueHandle(0));

        let text = sink.summary();
        assert!(text.contains("1 draws"));
        assert!(text.contains("geometry=4"));
        assert!(text.contains("(1.00, 2.00, 3.00)"));
        assert!(text.contains("colour=(1.00, 0.00, 0.00)"));
    }

    #[test]
    fn reset_clears_history() {
        let mut sink = RecordingSink::new();
        sink.draw(GeometryHandle(1), TechniqueHandle(0));
        sink.present();
        sink.reset();
        assert!(sink.calls().is_empty());
        assert_eq!((sink.draw_count(), sink.present_count()), (0, 0));
    }

    #[test]
    fn history_is_bounded_but_totals_are_kept() {
        let mut sink = RecordingSink::new();
        for frame in 0..10_000 {
            sink.clear([0.0; 4], 1.0);
            sink.set_scalar(ScalarSlot::ColourMultiplier, frame as f32);
            sink.draw(GeometryHandle(1), TechniqueHandle(0));
            sink.draw(GeometryHandle(2), TechniqueHandle(0));
            sink.present();
        }
        assert_eq!(sink.draw_count(), 20_000);
        assert_eq!(sink.present_count(), 10_000);
        assert_eq!(sink.calls().len(), 5);
        assert_eq!(sink.last_frame()[1], SinkCall::Scalar(ScalarSlot::ColourMultiplier, 9_999.0));

        // The presented frame stays until the next one is presented.
        sink.clear([0.0; 4], 1.0);
        assert_eq!(sink.calls().len(), 6);
        assert_eq!(sink.last_frame(), &[SinkCall::Clear { colour: [0.0; 4], depth: 1.0 }]);
    }
}
