use crate::loader::{
    BUILTIN_GEOMETRY, BUILTIN_TEXTURES, GeometryLoader, LoadError, LoadedGeometry,
    TechniqueProvider, TextureLoader, builtin_name, requested_attributes,
};
use crate::params::{MatrixSlot, ScalarSlot, TextureSlot, VectorSlot};
use crate::sink::{RecordingSink, ShaderParamSink};
use crate::technique::{TechniqueKind, VertexAttributes};
use glam::{Mat4, Vec3};
use shadelab_common::{GeometryHandle, TechniqueHandle, TextureHandle};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// GPU-less backend: resolves techniques and assets by name and records
/// every sink call.
///
/// Builtin assets always load. File assets must exist on disk; their
/// contents are not parsed, so a geometry file is assumed to carry whatever
/// streams were requested unless overridden with
/// [`HeadlessBackend::with_geometry_attributes`].
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    sink: RecordingSink,
    missing_techniques: BTreeSet<String>,
    geometry_overrides: BTreeMap<String, VertexAttributes>,
    geometries: Vec<(String, VertexAttributes)>,
    textures: Vec<(String, TextureSlot)>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend the effect was compiled without `name`.
    pub fn without_technique(mut self, name: &str) -> Self {
        self.missing_techniques.insert(name.to_string());
        self
    }

    /// Force the streams reported for `file`, regardless of the technique.
    pub fn with_geometry_attributes(mut self, file: &str, attributes: VertexAttributes) -> Self {
        self.geometry_overrides.insert(file.to_string(), attributes);
        self
    }

    pub fn sink(&self) -> &RecordingSink {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut RecordingSink {
        &mut self.sink
    }

    /// Every geometry load so far, in order: file and streams.
    pub fn geometry_loads(&self) -> &[(String, VertexAttributes)] {
        &self.geometries
    }

    /// Every texture load so far, in order.
    pub fn texture_loads(&self) -> &[(String, TextureSlot)] {
        &self.textures
    }

    fn check_file(file: &str) -> Result<(), LoadError> {
        if Path::new(file).is_file() {
            Ok(())
        } else {
            Err(LoadError::NotFound(file.to_string()))
        }
    }
}

impl TechniqueProvider for HeadlessBackend {
    fn lookup_technique(&self, name: &str) -> Option<TechniqueHandle> {
        if self.missing_techniques.contains(name) {
            return None;
        }
        TechniqueKind::ALL
            .iter()
            .position(|k| k.name() == name)
            .map(|i| TechniqueHandle(i as u32))
    }
}

impl GeometryLoader for HeadlessBackend {
    fn load_geometry(
        &mut self,
        file: &str,
        technique: TechniqueKind,
        tangents: bool,
    ) -> Result<LoadedGeometry, LoadError> {
        match builtin_name(file) {
            Some(name) if !BUILTIN_GEOMETRY.contains(&name) => {
                return Err(LoadError::UnknownBuiltin(name.to_string()));
            }
            Some(_) => {}
            None => {
                Self::check_file(file)?;
                if !file.ends_with(".obj") {
                    return Err(LoadError::UnsupportedFormat(file.to_string()));
                }
            }
        }
        let attributes = self
            .geometry_overrides
            .get(file)
            .copied()
            .unwrap_or_else(|| requested_attributes(technique, tangents));
        let handle = GeometryHandle(self.geometries.len() as u32);
        self.geometries.push((file.to_string(), attributes));
        tracing::debug!(file, ?handle, ?attributes, "headless geometry loaded");
        Ok(LoadedGeometry {
            handle,
            attributes,
            index_count: 0,
        })
    }
}

impl TextureLoader for HeadlessBackend {
    fn load_texture(&mut self, file: &str, slot: TextureSlot) -> Result<TextureHandle, LoadError> {
        match builtin_name(file) {
            Some(name) if !BUILTIN_TEXTURES.contains(&name) => {
                return Err(LoadError::UnknownBuiltin(name.to_string()));
            }
            Some(_) => {}
            None => Self::check_file(file)?,
        }
        let handle = TextureHandle(self.textures.len() as u32);
        self.textures.push((file.to_string(), slot));
        tracing::debug!(file, ?handle, "headless texture loaded");
        Ok(handle)
    }
}

impl ShaderParamSink for HeadlessBackend {
    fn clear(&mut self, colour: [f32; 4], depth: f32) {
        self.sink.clear(colour, depth);
    }

    fn set_matrix(&mut self, slot: MatrixSlot, value: Mat4) {
        self.sink.set_matrix(slot, value);
    }

    fn set_vector(&mut self, slot: VectorSlot, value: Vec3) {
        self.sink.set_vector(slot, value);
    }

    fn set_scalar(&mut self, slot: ScalarSlot, value: f32) {
        self.sink.set_scalar(slot, value);
    }

    fn set_texture(&mut self, slot: TextureSlot, texture: TextureHandle) {
        self.sink.set_texture(slot, texture);
    }

    fn draw(&mut self, geometry: GeometryHandle, technique: TechniqueHandle) {
        self.sink.draw(geometry, technique);
    }

    fn present(&mut self) {
        self.sink.present();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::technique::TechniqueRegistry;

    #[test]
    fn resolves_all_techniques() {
        let backend = HeadlessBackend::new();
        let reg = TechniqueRegistry::resolve(&backend).unwrap();
        assert_eq!(reg.get(TechniqueKind::PlainColour).handle, TechniqueHandle(0));
    }

    #[test]
    fn missing_technique_is_reported() {
        let backend = HeadlessBackend::new().without_technique("VertexTex");
        assert!(backend.lookup_technique("VertexTex").is_none());
        assert!(TechniqueRegistry::resolve(&backend).is_err());
    }

    #[test]
    fn builtin_geometry_carries_requested_streams() {
        let mut backend = HeadlessBackend::new();
        let g = backend
            .load_geometry("builtin:cube", TechniqueKind::NormalMapping, true)
            .unwrap();
        assert_eq!(g.handle, GeometryHandle(0));
        assert!(g.attributes.contains(TechniqueKind::NormalMapping.required_attributes()));
        assert_eq!(backend.geometry_loads().len(), 1);
    }

    #[test]
    fn unknown_assets_fail() {
        let mut backend = HeadlessBackend::new();
        assert!(matches!(
            backend.load_geometry("builtin:teapot", TechniqueKind::VertexTex, false),
            Err(LoadError::UnknownBuiltin(_))
        ));
        assert!(matches!(
            backend.load_texture("no/such/file.png", TextureSlot::Diffuse),
            Err(LoadError::NotFound(_))
        ));
    }

    #[test]
    fn override_reports_fixed_streams() {
        let mut backend = HeadlessBackend::new()
            .with_geometry_attributes("builtin:sphere", VertexAttributes::POSITION);
        let g = backend
            .load_geometry("builtin:sphere", TechniqueKind::VertexLitTex, false)
            .unwrap();
        assert_eq!(g.attributes, VertexAttributes::POSITION);
    }

    #[test]
    fn sink_calls_are_recorded() {
        let mut backend = HeadlessBackend::new();
        backend.draw(GeometryHandle(0), TechniqueHandle(0));
        backend.present();
        assert_eq!(backend.sink().draw_count(), 1);
    }
}
