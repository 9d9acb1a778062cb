//! Surface materials: one per mesh.

use glam::Vec2;
use globe_texture::RasterImage;

use crate::shader::ShaderProgram;

/// Which faces are rasterized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
    Double,
}

/// How fragments combine with the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Blending {
    /// Overwrite.
    Opaque,
    /// Straight-alpha source-over.
    Alpha,
    /// `src + dst`.
    Additive,
}

/// Specular-lit, normal-mapped opaque surface.
#[derive(Clone, Debug)]
pub struct PhongMaterial {
    pub color: RasterImage,
    pub normal: RasterImage,
    pub specular: RasterImage,
    pub normal_scale: Vec2,
    pub shininess: f32,
}

impl PhongMaterial {
    pub fn new(color: RasterImage, normal: RasterImage, specular: RasterImage) -> Self {
        Self {
            color,
            normal,
            specular,
            normal_scale: Vec2::splat(0.8),
            shininess: 100.0,
        }
    }
}

/// Diffuse-only translucent surface.
#[derive(Clone, Debug)]
pub struct LambertMaterial {
    pub map: RasterImage,
    pub opacity: f32,
    /// Fragments with alpha at or below this are discarded.
    pub alpha_test: f32,
    pub depth_write: bool,
}

impl LambertMaterial {
    pub fn new(map: RasterImage) -> Self {
        Self {
            map,
            opacity: 0.8,
            alpha_test: 0.1,
            depth_write: false,
        }
    }
}

/// A custom program plus its fixed-function state.
#[derive(Clone, Debug)]
pub struct ShaderMaterial {
    pub program: ShaderProgram,
    pub side: Side,
    pub blending: Blending,
    pub depth_write: bool,
    pub depth_test: bool,
}

#[derive(Clone, Debug)]
pub enum SurfaceMaterial {
    Phong(PhongMaterial),
    Lambert(LambertMaterial),
    Shader(ShaderMaterial),
}

impl SurfaceMaterial {
    pub fn side(&self) -> Side {
        match self {
            SurfaceMaterial::Phong(_) | SurfaceMaterial::Lambert(_) => Side::Front,
            SurfaceMaterial::Shader(s) => s.side,
        }
    }

    pub fn blending(&self) -> Blending {
        match self {
            SurfaceMaterial::Phong(_) => Blending::Opaque,
            SurfaceMaterial::Lambert(_) => Blending::Alpha,
            SurfaceMaterial::Shader(s) => s.blending,
        }
    }

    pub fn depth_write(&self) -> bool {
        match self {
            SurfaceMaterial::Phong(_) => true,
            SurfaceMaterial::Lambert(l) => l.depth_write,
            SurfaceMaterial::Shader(s) => s.depth_write,
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.blending() != Blending::Opaque
    }

    /// Rasters sampled by this material, in binding order.
    pub fn textures(&self) -> Vec<&RasterImage> {
        match self {
            SurfaceMaterial::Phong(p) => vec![&p.color, &p.normal, &p.specular],
            SurfaceMaterial::Lambert(l) => vec![&l.map],
            SurfaceMaterial::Shader(s) => match &s.program {
                ShaderProgram::Atmosphere(_) => Vec::new(),
                ShaderProgram::Galaxy { texture, .. } => vec![texture],
            },
        }
    }

    pub fn program(&self) -> Option<&ShaderProgram> {
        match self {
            SurfaceMaterial::Shader(s) => Some(&s.program),
            _ => None,
        }
    }

    pub fn program_mut(&mut self) -> Option<&mut ShaderProgram> {
        match self {
            SurfaceMaterial::Shader(s) => Some(&mut s.program),
            _ => None,
        }
    }
}
