//! The scene graph (a flat mesh list) and the builder that assembles it.

use glam::Vec3;
use globe_texture::RasterImage;

use crate::geometry::SphereGeometry;
use crate::lighting::LightRig;
use crate::material::{
    Blending, LambertMaterial, PhongMaterial, ShaderMaterial, Side, SurfaceMaterial,
};
use crate::mesh::{Mesh, MeshKind};
use crate::shader::{AtmosphereUniforms, GalaxyUniforms, ShaderProgram};

pub const PLANET_RADIUS: f32 = 4.0;
/// Half a percent above the surface.
pub const CLOUD_RADIUS: f32 = PLANET_RADIUS * 1.005;
pub const ATMOSPHERE_RADIUS: f32 = PLANET_RADIUS * 1.15;
pub const BACKGROUND_RADIUS: f32 = 150.0;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("scene already has a {0:?} mesh")]
    DuplicateMesh(MeshKind),
}

/// Append-only list of meshes plus the light rig.
#[derive(Debug, Default)]
pub struct Scene {
    meshes: Vec<Mesh>,
    lights: LightRig,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mesh. Each kind may appear once.
    pub fn add(&mut self, mesh: Mesh) -> Result<(), SceneError> {
        if self.mesh(mesh.kind).is_some() {
            return Err(SceneError::DuplicateMesh(mesh.kind));
        }
        log::debug!(
            "Scene: added {} ({} vertices)",
            mesh.kind.label(),
            mesh.geometry.vertex_count()
        );
        self.meshes.push(mesh);
        Ok(())
    }

    /// Meshes in insertion order.
    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn mesh(&self, kind: MeshKind) -> Option<&Mesh> {
        self.meshes.iter().find(|m| m.kind == kind)
    }

    pub fn mesh_mut(&mut self, kind: MeshKind) -> Option<&mut Mesh> {
        self.meshes.iter_mut().find(|m| m.kind == kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = MeshKind> + '_ {
        self.meshes.iter().map(|m| m.kind)
    }

    pub fn set_lights(&mut self, lights: LightRig) {
        self.lights = lights;
    }

    pub fn lights(&self) -> &LightRig {
        &self.lights
    }
}

/// Builds the four contact-scene meshes.
#[derive(Clone, Copy, Debug)]
pub struct SceneBuilder {
    pub planet_segments: u32,
    pub background_segments: u32,
    /// Initial atmosphere view vector; the loop overwrites it every frame.
    pub eye: Vec3,
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self {
            planet_segments: 128,
            background_segments: 64,
            eye: Vec3::new(0.0, 0.0, 12.0),
        }
    }
}

impl SceneBuilder {
    /// Galaxy sphere seen from inside.
    pub fn background(&self, galaxy: RasterImage) -> Mesh {
        let material = SurfaceMaterial::Shader(ShaderMaterial {
            program: ShaderProgram::Galaxy {
                uniforms: GalaxyUniforms::default(),
                texture: galaxy,
            },
            side: Side::Back,
            blending: Blending::Alpha,
            depth_write: false,
            depth_test: true,
        });
        Mesh::new(
            MeshKind::Background,
            SphereGeometry::new(
                BACKGROUND_RADIUS,
                self.background_segments,
                self.background_segments,
            ),
            material,
        )
    }

    pub fn planet(&self, color: RasterImage, bump: RasterImage, specular: RasterImage) -> Mesh {
        Mesh::new(
            MeshKind::Planet,
            self.shell(PLANET_RADIUS),
            SurfaceMaterial::Phong(PhongMaterial::new(color, bump, specular)),
        )
    }

    pub fn clouds(&self, map: RasterImage) -> Mesh {
        Mesh::new(
            MeshKind::Clouds,
            self.shell(CLOUD_RADIUS),
            SurfaceMaterial::Lambert(LambertMaterial::new(map)),
        )
    }

    /// Additive rim glow, drawn from the back faces.
    pub fn atmosphere(&self) -> Mesh {
        let material = SurfaceMaterial::Shader(ShaderMaterial {
            program: ShaderProgram::Atmosphere(AtmosphereUniforms {
                view_vector: self.eye,
                ..AtmosphereUniforms::default()
            }),
            side: Side::Back,
            blending: Blending::Additive,
            depth_write: true,
            depth_test: true,
        });
        Mesh::new(
            MeshKind::Atmosphere,
            self.shell(ATMOSPHERE_RADIUS),
            material,
        )
    }

    fn shell(&self, radius: f32) -> SphereGeometry {
        SphereGeometry::new(radius, self.planet_segments, self.planet_segments)
    }
}
