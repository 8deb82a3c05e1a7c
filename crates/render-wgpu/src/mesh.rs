//! CPU-side meshes: builtin primitives and OBJ files, stored as separate
//! per-attribute streams so a pipeline binds only the streams it reads.

use glam::{Vec2, Vec3};
use shadelab_render::{LoadError, VertexAttributes};
use std::f32::consts::{PI, TAU};
use std::path::Path;

/// Edge length of `builtin:cube`.
pub const CUBE_SIZE: f32 = 10.0;
/// Radius of `builtin:sphere`.
pub const SPHERE_RADIUS: f32 = 10.0;
/// Width of the square `builtin:floor`.
pub const FLOOR_SIZE: f32 = 400.0;
/// Texture repeats across the floor.
const FLOOR_TILES: f32 = 20.0;

/// Triangle list with optional attribute streams. Every present stream has
/// one entry per position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub tangents: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Streams this mesh can provide.
    pub fn attributes(&self) -> VertexAttributes {
        let n = self.positions.len();
        let mut attrs = VertexAttributes::POSITION;
        if n > 0 && self.normals.len() == n {
            attrs |= VertexAttributes::NORMAL;
        }
        if n > 0 && self.uvs.len() == n {
            attrs |= VertexAttributes::UV;
        }
        if n > 0 && self.tangents.len() == n {
            attrs |= VertexAttributes::TANGENT;
        }
        attrs
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Push a quad from four corners in order around its edge.
    fn quad(&mut self, corners: [Vec3; 4], normal: Vec3, uv_scale: f32) {
        let base = self.positions.len() as u32;
        let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        for (corner, uv) in corners.iter().zip(uvs) {
            self.positions.push(corner.to_array());
            self.normals.push(normal.to_array());
            self.uvs.push([uv[0] * uv_scale, uv[1] * uv_scale]);
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Fill normals from face geometry when the source had none.
    pub fn generate_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(self.positions[i as usize]));
            let face = (b - a).cross(c - a);
            for &i in tri {
                normals[i as usize] += face;
            }
        }
        self.normals = normals
            .into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
            .collect();
    }

    /// Per-vertex tangents (direction of increasing U) from positions, UVs
    /// and normals, orthogonalised against the normal. No-op without UVs.
    pub fn generate_tangents(&mut self) {
        let n = self.positions.len();
        if self.uvs.len() != n || n == 0 {
            return;
        }
        if self.normals.len() != n {
            self.generate_normals();
        }
        let mut accum = vec![Vec3::ZERO; n];
        for tri in self.indices.chunks_exact(3) {
            let idx = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let [p0, p1, p2] = idx.map(|i| Vec3::from(self.positions[i]));
            let [t0, t1, t2] = idx.map(|i| Vec2::from(self.uvs[i]));
            let (e1, e2) = (p1 - p0, p2 - p0);
            let (d1, d2) = (t1 - t0, t2 - t0);
            let det = d1.x * d2.y - d2.x * d1.y;
            if det.abs() < f32::EPSILON {
                continue;
            }
            let tangent = (e1 * d2.y - e2 * d1.y) / det;
            for i in idx {
                accum[i] += tangent;
            }
        }
        self.tangents = accum
            .into_iter()
            .zip(&self.normals)
            .map(|(t, n)| {
                let n = Vec3::from(*n);
                (t - n * n.dot(t))
                    .try_normalize()
                    .unwrap_or_else(|| n.any_orthonormal_vector())
                    .to_array()
            })
            .collect();
    }
}

/// Axis-aligned cube centred on the origin, one texture per face.
pub fn cube(size: f32) -> MeshData {
    let h = size * 0.5;
    let mut mesh = MeshData::default();
    let faces = [
        (Vec3::Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::X, Vec3::Y),
        (Vec3::X, Vec3::Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::NEG_Z),
    ];
    for (normal, right, up) in faces {
        let centre = normal * h;
        let (r, u) = (right * h, up * h);
        // Top-left, top-right, bottom-right, bottom-left, seen from outside.
        mesh.quad(
            [centre - r + u, centre + r + u, centre + r - u, centre - r - u],
            normal,
            1.0,
        );
    }
    mesh
}

/// UV sphere centred on the origin.
pub fn sphere(radius: f32, rings: u32, segments: u32) -> MeshData {
    let rings = rings.max(2);
    let segments = segments.max(3);
    let mut mesh = MeshData::default();
    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let theta = v * PI;
        for seg in 0..=segments {
            let u = seg as f32 / segments as f32;
            let phi = u * TAU;
            let normal = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
            mesh.positions.push((normal * radius).to_array());
            mesh.normals.push(normal.to_array());
            mesh.uvs.push([u, v]);
        }
    }
    let stride = segments + 1;
    for ring in 0..rings {
        for seg in 0..segments {
            let a = ring * stride + seg;
            let b = a + stride;
            mesh.indices
                .extend_from_slice(&[a, a + 1, b + 1, a, b + 1, b]);
        }
    }
    mesh
}

/// Square in the XZ plane facing +Y, texture repeated `tiles` times per side.
pub fn floor(size: f32, tiles: f32) -> MeshData {
    let h = size * 0.5;
    let mut mesh = MeshData::default();
    mesh.quad(
        [
            Vec3::new(-h, 0.0, h),
            Vec3::new(h, 0.0, h),
            Vec3::new(h, 0.0, -h),
            Vec3::new(-h, 0.0, -h),
        ],
        Vec3::Y,
        tiles,
    );
    mesh
}

/// Mesh for a `builtin:` name, if there is one.
pub fn builtin(name: &str) -> Option<MeshData> {
    match name {
        "cube" => Some(cube(CUBE_SIZE)),
        "sphere" => Some(sphere(SPHERE_RADIUS, 24, 32)),
        "floor" => Some(floor(FLOOR_SIZE, FLOOR_TILES)),
        _ => None,
    }
}

/// Load every model in an OBJ file into one mesh.
///
/// OBJ is right-handed with V up; positions and normals are mirrored in Z
/// and V is flipped to match the left-handed world and top-left texture
/// origin. Missing normals are generated; missing UVs stay missing.
pub fn load_obj(path: &Path) -> Result<MeshData, LoadError> {
    let file = path.display().to_string();
    if !path.is_file() {
        return Err(LoadError::NotFound(file));
    }
    let options = tobj::LoadOptions {
        single_index: true,
        triangulate: true,
        ..Default::default()
    };
    let (models, _materials) = tobj::load_obj(path, &options).map_err(|e| LoadError::Decode {
        file: file.clone(),
        reason: e.to_string(),
    })?;

    let mut mesh = MeshData::default();
    let mut all_normals = true;
    let mut all_uvs = true;
    for model in &models {
        let m = &model.mesh;
        let base = mesh.positions.len() as u32;
        let count = m.positions.len() / 3;
        mesh.positions
            .extend(m.positions.chunks_exact(3).map(|p| [p[0], p[1], -p[2]]));
        if m.normals.len() == count * 3 {
            mesh.normals
                .extend(m.normals.chunks_exact(3).map(|n| [n[0], n[1], -n[2]]));
        } else {
            all_normals = false;
        }
        if m.texcoords.len() == count * 2 {
            mesh.uvs
                .extend(m.texcoords.chunks_exact(2).map(|t| [t[0], 1.0 - t[1]]));
        } else {
            all_uvs = false;
        }
        // Mirroring flips handedness, so swap winding to keep faces outward.
        for tri in m.indices.chunks_exact(3) {
            mesh.indices
                .extend_from_slice(&[base + tri[0], base + tri[2], base + tri[1]]);
        }
    }
    if mesh.positions.is_empty() {
        return Err(LoadError::Decode {
            file,
            reason: "no geometry".into(),
        });
    }
    if !all_uvs {
        mesh.uvs.clear();
    }
    if !all_normals {
        mesh.generate_normals();
    }
    tracing::debug!(
        file,
        models = models.len(),
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "obj loaded"
    );
    Ok(mesh)
}
