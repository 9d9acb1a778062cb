//! Fixed-schema uniforms for the two custom shader programs.
//!
//! Each program owns a plain record of its parameters. Per-frame updates
//! write the fields in place; the GPU copy is packed with `to_gpu`.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use globe_texture::RasterImage;

/// Rim glow of the atmosphere shell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtmosphereUniforms {
    /// Direction the rim term is measured against (the eye position).
    pub view_vector: Vec3,
    /// Seconds since the loop started.
    pub time: f32,
    /// Base glow color, linear RGB.
    pub glow_color: Vec3,
    /// Rim offset: `intensity = (c - fresnel)^2`.
    pub c: f32,
    /// Rim falloff exponent.
    pub p: f32,
}

impl Default for AtmosphereUniforms {
    fn default() -> Self {
        Self {
            view_vector: Vec3::new(0.0, 0.0, 12.0),
            time: 0.0,
            glow_color: hex_rgb(0x87ceeb),
            c: 0.8,
            p: 3.0,
        }
    }
}

impl AtmosphereUniforms {
    pub fn to_gpu(&self) -> AtmosphereUniformsGpu {
        AtmosphereUniformsGpu {
            view_vector_time: self.view_vector.extend(self.time).to_array(),
            glow_color_c: self.glow_color.extend(self.c).to_array(),
            params: [self.p, 0.0, 0.0, 0.0],
        }
    }
}

/// GPU layout of [`AtmosphereUniforms`], 48 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct AtmosphereUniformsGpu {
    /// xyz = view vector, w = time.
    pub view_vector_time: [f32; 4],
    /// xyz = glow color, w = c.
    pub glow_color_c: [f32; 4],
    /// x = p, yzw = padding.
    pub params: [f32; 4],
}

/// Slow rotation and brightness pulse of the galaxy backdrop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GalaxyUniforms {
    pub time: f32,
    pub brightness: f32,
}

impl Default for GalaxyUniforms {
    fn default() -> Self {
        Self {
            time: 0.0,
            brightness: 0.8,
        }
    }
}

impl GalaxyUniforms {
    pub fn to_gpu(&self) -> GalaxyUniformsGpu {
        GalaxyUniformsGpu {
            time: self.time,
            brightness: self.brightness,
            _padding: [0.0; 2],
        }
    }
}

/// GPU layout of [`GalaxyUniforms`], 16 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GalaxyUniformsGpu {
    pub time: f32,
    pub brightness: f32,
    pub _padding: [f32; 2],
}

/// A custom program with its uniforms and sampled textures.
#[derive(Clone, Debug)]
pub enum ShaderProgram {
    Atmosphere(AtmosphereUniforms),
    Galaxy {
        uniforms: GalaxyUniforms,
        texture: RasterImage,
    },
}

impl ShaderProgram {
    pub fn name(&self) -> &'static str {
        match self {
            ShaderProgram::Atmosphere(_) => "atmosphere",
            ShaderProgram::Galaxy { .. } => "galaxy",
        }
    }

    /// Packed uniform bytes for upload.
    pub fn uniform_bytes(&self) -> Vec<u8> {
        match self {
            ShaderProgram::Atmosphere(u) => bytemuck::bytes_of(&u.to_gpu()).to_vec(),
            ShaderProgram::Galaxy { uniforms, .. } => {
                bytemuck::bytes_of(&uniforms.to_gpu()).to_vec()
            }
        }
    }

    /// Advance the program's clock.
    pub fn set_time(&mut self, time: f32) {
        match self {
            ShaderProgram::Atmosphere(u) => u.time = time,
            ShaderProgram::Galaxy { uniforms, .. } => uniforms.time = time,
        }
    }
}

/// Decode one sRGB-encoded channel in `[0, 1]` to linear light.
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// An sRGB `0xRRGGBB` color as linear RGB in `[0, 1]`.
///
/// Uniform colors are shaded in linear space and encoded once by the sRGB
/// surface, so authored hex values are decoded here.
pub fn hex_rgb(rgb: u32) -> Vec3 {
    let channel = |shift: u32| srgb_to_linear(((rgb >> shift) & 0xff) as f32 / 255.0);
    Vec3::new(channel(16), channel(8), channel(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atmosphere_defaults() {
        let u = AtmosphereUniforms::default();
        assert_eq!(u.c, 0.8);
        assert_eq!(u.p, 3.0);
        // #87ceeb decoded to linear light.
        assert!((u.glow_color - Vec3::new(0.2423, 0.6172, 0.8308)).length() < 1e-3);
    }

    #[test]
    fn test_hex_rgb_decodes_srgb() {
        assert_eq!(hex_rgb(0x000000), Vec3::ZERO);
        assert!((hex_rgb(0xffffff) - Vec3::ONE).length() < 1e-6);

        let grey = hex_rgb(0x808080);
        assert!((grey.x - 0.2159).abs() < 1e-3);
        assert_eq!(grey.x, grey.z);
        assert!(grey.x < 128.0 / 255.0);
    }

    #[test]
    fn test_srgb_to_linear_segments() {
        assert!((srgb_to_linear(0.04) - 0.04 / 12.92).abs() < 1e-7);
        assert!((srgb_to_linear(0.5) - 0.2140).abs() < 1e-3);
        assert_eq!(srgb_to_linear(1.0), 1.0);
    }

    #[test]
    fn test_atmosphere_gpu_layout() {
        assert_eq!(std::mem::size_of::<AtmosphereUniformsGpu>(), 48);
        assert_eq!(std::mem::size_of::<AtmosphereUniformsGpu>() % 16, 0);
        assert_eq!(std::mem::offset_of!(AtmosphereUniformsGpu, glow_color_c), 16);
        assert_eq!(std::mem::offset_of!(AtmosphereUniformsGpu, params), 32);
    }

    #[test]
    fn test_atmosphere_packing() {
        let u = AtmosphereUniforms {
            view_vector: Vec3::new(1.0, 2.0, 3.0),
            time: 4.5,
            ..Default::default()
        };
        let gpu = u.to_gpu();
        assert_eq!(gpu.view_vector_time, [1.0, 2.0, 3.0, 4.5]);
        assert_eq!(gpu.glow_color_c[3], 0.8);
        assert_eq!(gpu.params[0], 3.0);
    }

    #[test]
    fn test_galaxy_gpu_layout() {
        assert_eq!(std::mem::size_of::<GalaxyUniformsGpu>(), 16);
        let gpu = GalaxyUniforms::default().to_gpu();
        assert_eq!(gpu.brightness, 0.8);
        assert_eq!(gpu.time, 0.0);
    }

    #[test]
    fn test_set_time_writes_in_place() {
        let mut program = ShaderProgram::Atmosphere(AtmosphereUniforms::default());
        program.set_time(2.0);
        let ShaderProgram::Atmosphere(u) = &program else {
            panic!("expected atmosphere");
        };
        assert_eq!(u.time, 2.0);
        assert_eq!(program.uniform_bytes().len(), 48);
    }
}
