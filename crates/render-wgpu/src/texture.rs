//! CPU-side RGBA8 images: procedural builtins and decoded image files.
//!
//! Diffuse textures carry a specular mask in alpha. Normal maps store a
//! tangent-space normal in RGB and a height in alpha for parallax.

use glam::Vec3;
use image::GenericImageView;
use shadelab_render::LoadError;
use std::f32::consts::TAU;
use std::path::Path;

const BUILTIN_SIZE: u32 = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 rows.
    pub rgba: Vec<u8>,
}

impl TextureData {
    fn from_fn(width: u32, height: u32, texel: impl Fn(f32, f32) -> [u8; 4]) -> Self {
        let mut rgba = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let u = (x as f32 + 0.5) / width as f32;
                let v = (y as f32 + 0.5) / height as f32;
                rgba.extend_from_slice(&texel(u, v));
            }
        }
        Self {
            width,
            height,
            rgba,
        }
    }

    pub fn solid(colour: [u8; 4]) -> Self {
        Self::from_fn(1, 1, |_, _| colour)
    }

    pub fn texel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [self.rgba[i], self.rgba[i + 1], self.rgba[i + 2], self.rgba[i + 3]]
    }
}

/// Texture for a `builtin:` name, if there is one.
pub fn builtin(name: &str) -> Option<TextureData> {
    let size = BUILTIN_SIZE;
    match name {
        "white" => Some(TextureData::solid([255, 255, 255, 255])),
        "flat-normal" => Some(TextureData::solid([128, 128, 255, 255])),
        "checker" => Some(TextureData::from_fn(size, size, checker)),
        "bricks" => Some(TextureData::from_fn(size, size, bricks)),
        "bumps" => Some(TextureData::from_fn(size, size, bumps)),
        _ => None,
    }
}

fn checker(u: f32, v: f32) -> [u8; 4] {
    let cell = ((u * 8.0) as u32 + (v * 8.0) as u32) % 2;
    if cell == 0 {
        [220, 220, 220, 96]
    } else {
        [70, 80, 95, 32]
    }
}

fn bricks(u: f32, v: f32) -> [u8; 4] {
    let rows = 8.0;
    let row = (v * rows) as u32;
    let offset = if row % 2 == 0 { 0.0 } else { 0.5 };
    let bu = (u * 4.0 + offset).fract();
    let bv = (v * rows).fract();
    let mortar = bu < 0.04 || bv < 0.08;
    if mortar {
        [190, 185, 175, 8]
    } else {
        // Cheap per-brick shade variation.
        let seed = (row * 7 + ((u * 4.0 + offset) as u32) * 13) % 5;
        let shade = 150 + seed as u8 * 12;
        [shade, (shade as f32 * 0.45) as u8, (shade as f32 * 0.35) as u8, 160]
    }
}

fn bump_height(u: f32, v: f32) -> f32 {
    0.5 + 0.5 * (u * TAU * 4.0).sin() * (v * TAU * 4.0).sin()
}

fn bumps(u: f32, v: f32) -> [u8; 4] {
    let e = 1.0 / BUILTIN_SIZE as f32;
    let slope = 0.08;
    let du = (bump_height(u + e, v) - bump_height(u - e, v)) / (2.0 * e);
    let dv = (bump_height(u, v + e) - bump_height(u, v - e)) / (2.0 * e);
    let n = Vec3::new(-du * slope, -dv * slope, 1.0).normalize();
    let encode = |c: f32| ((c * 0.5 + 0.5) * 255.0).round() as u8;
    [
        encode(n.x),
        encode(n.y),
        encode(n.z),
        (bump_height(u, v) * 255.0).round() as u8,
    ]
}

/// Decode an image file to RGBA8.
pub fn load_file(path: &Path) -> Result<TextureData, LoadError> {
    let file = path.display().to_string();
    if !path.is_file() {
        return Err(LoadError::NotFound(file));
    }
    let img = image::open(path).map_err(|e| match e {
        image::ImageError::Unsupported(_) => LoadError::UnsupportedFormat(file.clone()),
        other => LoadError::Decode {
            file: file.clone(),
            reason: other.to_string(),
        },
    })?;
    let (width, height) = img.dimensions();
    tracing::debug!(file, width, height, "image decoded");
    Ok(TextureData {
        width,
        height,
        rgba: img.to_rgba8().into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_have_full_size() {
        for name in shadelab_render::BUILTIN_TEXTURES {
            let tex = builtin(name).unwrap();
            assert_eq!(tex.rgba.len(), (tex.width * tex.height * 4) as usize, "{name}");
        }
        assert!(builtin("marble").is_none());
    }

    #[test]
    fn flat_normal_points_out_of_the_surface() {
        let tex = builtin("flat-normal").unwrap();
        assert_eq!(tex.texel(0, 0), [128, 128, 255, 255]);
    }

    #[test]
    fn bump_normals_lean_towards_positive_z() {
        let tex = builtin("bumps").unwrap();
        for (x, y) in [(0, 0), (40, 17), (128, 200)] {
            let [r, g, b, _] = tex.texel(x, y);
            let n = Vec3::new(r as f32, g as f32, b as f32) / 127.5 - Vec3::ONE;
            assert!(n.z > 0.5);
            assert!((n.length() - 1.0).abs() < 0.05);
        }
    }

    #[test]
    fn checker_alternates() {
        let tex = builtin("checker").unwrap();
        let cell = BUILTIN_SIZE / 8;
        assert_ne!(tex.texel(0, 0), tex.texel(cell, 0));
        assert_eq!(tex.texel(0, 0), tex.texel(cell, cell));
    }

    #[test]
    fn png_round_trip_through_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        image::RgbaImage::from_pixel(2, 3, image::Rgba([255, 0, 0, 255]))
            .save(&path)
            .unwrap();
        let tex = load_file(&path).unwrap();
        assert_eq!((tex.width, tex.height), (2, 3));
        assert_eq!(tex.texel(1, 2), [255, 0, 0, 255]);
    }

    #[test]
    fn bad_files_are_reported() {
        assert!(matches!(
            load_file(Path::new("/no/such/texture.png")),
            Err(LoadError::NotFound(_))
        ));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.png");
        std::fs::write(&path, b"not a png").unwrap();
        assert!(load_file(&path).is_err());
    }
}
