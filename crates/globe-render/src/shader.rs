//! Scene programs and the shader module cache.

use log::{debug, info};
use std::{collections::HashMap, sync::Arc};
use wgpu::{ShaderModuleDescriptor, ShaderSource};

use globe_scene::{ShaderProgram, SurfaceMaterial};

use crate::texture::TextureRole;

const COMMON_SOURCE: &str = include_str!("shaders/common.wgsl");

/// One WGSL program per kind of surface material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderFamily {
    Phong,
    Lambert,
    Atmosphere,
    Galaxy,
}

impl ShaderFamily {
    pub const ALL: [ShaderFamily; 4] = [
        ShaderFamily::Phong,
        ShaderFamily::Lambert,
        ShaderFamily::Atmosphere,
        ShaderFamily::Galaxy,
    ];

    pub fn for_material(material: &SurfaceMaterial) -> Self {
        match material {
            SurfaceMaterial::Phong(_) => ShaderFamily::Phong,
            SurfaceMaterial::Lambert(_) => ShaderFamily::Lambert,
            SurfaceMaterial::Shader(s) => match s.program {
                ShaderProgram::Atmosphere(_) => ShaderFamily::Atmosphere,
                ShaderProgram::Galaxy { .. } => ShaderFamily::Galaxy,
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShaderFamily::Phong => "phong",
            ShaderFamily::Lambert => "lambert",
            ShaderFamily::Atmosphere => "atmosphere",
            ShaderFamily::Galaxy => "galaxy",
        }
    }

    fn body(self) -> &'static str {
        match self {
            ShaderFamily::Phong => include_str!("shaders/phong.wgsl"),
            ShaderFamily::Lambert => include_str!("shaders/lambert.wgsl"),
            ShaderFamily::Atmosphere => include_str!("shaders/atmosphere.wgsl"),
            ShaderFamily::Galaxy => include_str!("shaders/galaxy.wgsl"),
        }
    }

    /// Full WGSL source: the shared bindings followed by the program.
    pub fn source(self) -> String {
        format!("{COMMON_SOURCE}\n{}", self.body())
    }

    /// Whether group 1 carries a program uniform at binding 1.
    pub fn has_program_uniform(self) -> bool {
        matches!(self, ShaderFamily::Atmosphere | ShaderFamily::Galaxy)
    }

    /// Formats of the sampled textures, in binding order. Matches
    /// [`SurfaceMaterial::textures`].
    pub fn texture_roles(self) -> &'static [TextureRole] {
        match self {
            ShaderFamily::Phong => &[TextureRole::Color, TextureRole::Data, TextureRole::Data],
            ShaderFamily::Lambert | ShaderFamily::Galaxy => &[TextureRole::Color],
            ShaderFamily::Atmosphere => &[],
        }
    }
}

/// Compiled shader modules, one per family, created on first use.
#[derive(Default)]
pub struct ShaderLibrary {
    modules: HashMap<ShaderFamily, Arc<wgpu::ShaderModule>>,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached module for `family`, compiling it if needed.
    pub fn get_or_load(
        &mut self,
        device: &wgpu::Device,
        family: ShaderFamily,
    ) -> Arc<wgpu::ShaderModule> {
        if let Some(module) = self.modules.get(&family) {
            debug!("Reusing shader '{}'", family.name());
            return Arc::clone(module);
        }

        let module = Arc::new(device.create_shader_module(ShaderModuleDescriptor {
            label: Some(family.name()),
            source: ShaderSource::Wgsl(family.source().into()),
        }));
        info!("Loaded shader '{}'", family.name());
        self.modules.insert(family, Arc::clone(&module));
        module
    }

    pub fn get(&self, family: ShaderFamily) -> Option<Arc<wgpu::ShaderModule>> {
        self.modules.get(&family).cloned()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::create_test_device_queue;
    use globe_scene::{AtmosphereUniforms, Blending, LambertMaterial, ShaderMaterial, Side};
    use globe_texture::{Canvas, WrapMode};

    #[test]
    fn test_sources_share_bindings_and_entry_points() {
        for family in ShaderFamily::ALL {
            let source = family.source();
            assert!(source.starts_with(COMMON_SOURCE), "{}", family.name());
            assert!(source.contains("fn vs_main"), "{}", family.name());
            assert!(source.contains("fn fs_main"), "{}", family.name());
        }
    }

    #[test]
    fn test_texture_bindings_follow_program_uniform() {
        let phong = ShaderFamily::Phong.source();
        assert!(phong.contains("@group(1) @binding(4) var surface_sampler"));

        let galaxy = ShaderFamily::Galaxy.source();
        assert!(galaxy.contains("@group(1) @binding(1) var<uniform> galaxy"));
        assert!(galaxy.contains("@group(1) @binding(3) var galaxy_sampler"));
        assert!(ShaderFamily::Galaxy.has_program_uniform());
        assert!(!ShaderFamily::Lambert.has_program_uniform());
    }

    #[test]
    fn test_lambert_keeps_texels_at_alpha_threshold() {
        let lambert = ShaderFamily::Lambert.source();
        assert!(lambert.contains("if (alpha < mesh.params.y)"));
        assert!(!lambert.contains("alpha <= mesh.params.y"));
    }

    #[test]
    fn test_family_for_material() {
        let map = Canvas::new(2, 2).finish(WrapMode::Repeat, WrapMode::Repeat);
        let clouds = SurfaceMaterial::Lambert(LambertMaterial::new(map));
        assert_eq!(ShaderFamily::for_material(&clouds), ShaderFamily::Lambert);
        assert_eq!(clouds.textures().len(), ShaderFamily::Lambert.texture_roles().len());

        let glow = SurfaceMaterial::Shader(ShaderMaterial {
            program: ShaderProgram::Atmosphere(AtmosphereUniforms::default()),
            side: Side::Back,
            blending: Blending::Additive,
            depth_write: true,
            depth_test: true,
        });
        assert_eq!(ShaderFamily::for_material(&glow), ShaderFamily::Atmosphere);
        assert!(ShaderFamily::Atmosphere.texture_roles().is_empty());
    }

    #[test]
    fn test_library_caches_modules() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };
        let mut library = ShaderLibrary::new();
        assert!(library.is_empty());

        for family in ShaderFamily::ALL {
            library.get_or_load(&device, family);
        }
        let first = library.get(ShaderFamily::Phong).unwrap();
        let again = library.get_or_load(&device, ShaderFamily::Phong);

        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(library.len(), 4);
    }
}
