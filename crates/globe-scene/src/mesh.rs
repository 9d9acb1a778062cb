use glam::Mat4;

use crate::geometry::SphereGeometry;
use crate::material::SurfaceMaterial;

/// The four meshes of the contact scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MeshKind {
    Background,
    Planet,
    Clouds,
    Atmosphere,
}

impl MeshKind {
    /// Fixed draw order: backdrop first, additive glow last.
    pub const DRAW_ORDER: [MeshKind; 4] = [
        MeshKind::Background,
        MeshKind::Planet,
        MeshKind::Clouds,
        MeshKind::Atmosphere,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MeshKind::Background => "background",
            MeshKind::Planet => "planet",
            MeshKind::Clouds => "clouds",
            MeshKind::Atmosphere => "atmosphere",
        }
    }
}

/// Geometry and material placed at the origin, spun about +Y.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub kind: MeshKind,
    pub geometry: SphereGeometry,
    pub material: SurfaceMaterial,
    /// Rotation about +Y in radians.
    pub rotation_y: f32,
}

impl Mesh {
    pub fn new(kind: MeshKind, geometry: SphereGeometry, material: SurfaceMaterial) -> Self {
        Self {
            kind,
            geometry,
            material,
            rotation_y: 0.0,
        }
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_y(self.rotation_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_draw_order_backdrop_first_glow_last() {
        assert_eq!(MeshKind::DRAW_ORDER[0], MeshKind::Background);
        assert_eq!(MeshKind::DRAW_ORDER[3], MeshKind::Atmosphere);
    }

    #[test]
    fn test_labels_unique() {
        let labels: HashSet<_> = MeshKind::DRAW_ORDER.iter().map(|k| k.label()).collect();
        assert_eq!(labels.len(), MeshKind::DRAW_ORDER.len());
    }
}
