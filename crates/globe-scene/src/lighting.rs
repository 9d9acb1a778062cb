//! The fixed light set of the contact scene.
//!
//! [`LightRig`] describes the CPU-side lights, while [`LightsUniform`] is the
//! GPU-side representation read by the phong and lambert pipelines.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::shader::hex_rgb;

/// Directional lights the GPU uniform has room for.
pub const MAX_DIRECTIONAL_LIGHTS: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightKind {
    Ambient,
    /// Shines from `position` toward the origin.
    Directional { position: Vec3 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    /// Linear RGB color (not premultiplied by intensity).
    pub color: Vec3,
    pub intensity: f32,
    pub cast_shadow: bool,
}

impl Light {
    pub fn ambient(color: u32, intensity: f32) -> Self {
        Self {
            kind: LightKind::Ambient,
            color: hex_rgb(color),
            intensity,
            cast_shadow: false,
        }
    }

    pub fn directional(color: u32, intensity: f32, position: Vec3) -> Self {
        Self {
            kind: LightKind::Directional { position },
            color: hex_rgb(color),
            intensity,
            cast_shadow: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LightRig {
    lights: Vec<Light>,
}

impl LightRig {
    /// Dim fill, a bright sun, a cool rim and faint starlight.
    pub fn contact_page() -> Self {
        let mut rig = Self::default();
        rig.add(Light::ambient(0x404040, 0.1));
        rig.add(Light::directional(0xffffff, 1.2, Vec3::new(5.0, 2.0, 5.0)));
        rig.add(Light::directional(0x4169e1, 0.3, Vec3::new(-5.0, -2.0, -5.0)));
        rig.add(Light::ambient(0x9bb5ff, 0.05));
        rig
    }

    pub fn add(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Sum of every ambient light's `color × intensity`.
    pub fn ambient(&self) -> Vec3 {
        self.lights
            .iter()
            .filter(|l| l.kind == LightKind::Ambient)
            .map(|l| l.color * l.intensity)
            .sum()
    }

    /// Pack for upload. Directional lights past [`MAX_DIRECTIONAL_LIGHTS`]
    /// are dropped with a warning.
    pub fn to_uniform(&self) -> LightsUniform {
        let mut uniform = LightsUniform {
            ambient: self.ambient().extend(0.0).to_array(),
            directional: [DirectionalLightUniform::zeroed(); MAX_DIRECTIONAL_LIGHTS],
        };

        let mut count = 0;
        for light in &self.lights {
            let LightKind::Directional { position } = light.kind else {
                continue;
            };
            if count == MAX_DIRECTIONAL_LIGHTS {
                log::warn!("Directional light ignored: uniform holds {MAX_DIRECTIONAL_LIGHTS}");
                continue;
            }
            let to_light = position.normalize_or_zero();
            uniform.directional[count] = DirectionalLightUniform {
                direction_intensity: to_light.extend(light.intensity).to_array(),
                color_padding: light.color.extend(0.0).to_array(),
            };
            count += 1;
        }
        uniform.ambient[3] = count as f32;
        uniform
    }
}

/// One directional light, 32 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct DirectionalLightUniform {
    /// xyz = unit vector toward the light, w = intensity.
    pub direction_intensity: [f32; 4],
    /// xyz = color (linear RGB), w = padding.
    pub color_padding: [f32; 4],
}

/// All lights, 80 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LightsUniform {
    /// xyz = summed ambient radiance, w = number of directional lights in use.
    pub ambient: [f32; 4],
    pub directional: [DirectionalLightUniform; MAX_DIRECTIONAL_LIGHTS],
}
