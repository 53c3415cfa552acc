use glam::{Mat4, Vec3};

use crate::rendering::{DrawCommand, FrameContext, FrameLight, Material, MeshId, TextureId};

/// Static sun: the scene's primary light source plus its visible emissive
/// sphere. Fog is disabled on the sphere so it never grays out at distance.
pub struct Sun {
    pub position: Vec3,
    pub scale: f32,
    ambient: Vec3,
    diffuse: Vec3,
    specular: Vec3,
}

impl Sun {
    pub fn new() -> Self {
        Self {
            position: Vec3::new(-20.0, 50.0, -70.0),
            scale: 10.0,
            ambient: Vec3::splat(0.22),
            diffuse: Vec3::new(1.0, 0.95, 0.85),
            specular: Vec3::new(1.0, 1.0, 0.9),
        }
    }

    /// The primary light fed into the frame uniforms.
    pub fn light(&self) -> FrameLight {
        FrameLight {
            position: self.position,
            ambient: self.ambient,
            diffuse: self.diffuse,
            specular: self.specular,
        }
    }

    pub fn render(&self, frame: &mut FrameContext) {
        let model = Mat4::from_translation(self.position) * Mat4::from_scale(Vec3::splat(self.scale));
        // The light sits at the sphere's own center, so every visible fragment
        // has normal·lightDir <= 0 and the diffuse term is zero. All apparent
        // brightness comes from the ambient term, which is why the ambient
        // coefficient is cranked far above 1.
        frame.draw(
            DrawCommand::new(
                MeshId::Sphere,
                model,
                Material::new(Vec3::ZERO, Vec3::new(5.0, 4.75, 4.0), Vec3::ZERO, 1.0),
            )
            .textured(TextureId::Sun),
        );
    }
}

impl Default for Sun {
    fn default() -> Self {
        Self::new()
    }
}
