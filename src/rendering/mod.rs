//! Rendering module: frame submission types, camera, procedural meshes and
//! textures, digit rendering, and the wgpu renderer.
//!
//! The simulation side never touches GPU objects. It fills a [`FrameContext`]
//! with draw commands and frame-wide uniforms; the renderer executes the list.

pub mod camera;
pub mod digits;
pub mod meshes;
pub mod renderer;
pub mod shaders;
pub mod textures;

pub use camera::{Camera, CameraMode};
pub use renderer::Renderer;

use glam::{Mat4, Vec2, Vec3};

/// Common vertex type for all scene geometry.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Identifies a mesh owned by the renderer's mesh library. A draw command
/// naming a mesh that was never built is skipped, not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshId {
    Ground,
    RoadSegment,
    Building(usize),
    Arm,
    WatchBody,
    WatchDial,
    /// Unit quad centered at the origin, facing +Z, with UVs.
    Quad,
    /// Unit quad with its lower-left corner at the origin; digit segments.
    Cell,
    Sphere,
}

/// Identifies a texture owned by the renderer's texture library. Missing
/// textures fall back to an untextured draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureId {
    Road,
    Ecg,
    Battery,
    Arrow,
    Warning,
    Sun,
}

/// Phong material triple plus shininess.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub diffuse: Vec3,
    pub ambient: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
}

impl Material {
    pub fn new(diffuse: Vec3, ambient: Vec3, specular: Vec3, shininess: f32) -> Self {
        Self {
            diffuse,
            ambient,
            specular,
            shininess,
        }
    }

    /// Flat UI color: diffuse and ambient equal, no specular response.
    pub fn flat(color: Vec3) -> Self {
        Self::new(color, color, Vec3::ZERO, 1.0)
    }
}

/// Point light description fed into the frame uniforms.
#[derive(Clone, Copy, Debug)]
pub struct FrameLight {
    pub position: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

/// One draw submission: mesh + model transform + material state. The model
/// matrix is set immediately before the draw; nothing persists between
/// commands.
#[derive(Clone, Copy, Debug)]
pub struct DrawCommand {
    pub mesh: MeshId,
    pub model: Mat4,
    pub material: Material,
    pub texture: Option<TextureId>,
    pub uv_offset: Vec2,
    pub uv_scale: Vec2,
    pub fog: bool,
}

impl DrawCommand {
    pub fn new(mesh: MeshId, model: Mat4, material: Material) -> Self {
        Self {
            mesh,
            model,
            material,
            texture: None,
            uv_offset: Vec2::ZERO,
            uv_scale: Vec2::ONE,
            fog: false,
        }
    }

    pub fn textured(mut self, texture: TextureId) -> Self {
        self.texture = Some(texture);
        self
    }

    /// Shifts and scales the sampled UV window; the ECG strip scrolls with
    /// this instead of re-uploading vertices.
    pub fn uv_window(mut self, offset: Vec2, scale: Vec2) -> Self {
        self.uv_offset = offset;
        self.uv_scale = scale;
        self
    }

    pub fn fogged(mut self) -> Self {
        self.fog = true;
        self
    }
}

/// Frame-wide uniform state: matrices, lights and fog.
#[derive(Clone, Copy, Debug)]
pub struct FrameUniforms {
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec3,
    pub light: FrameLight,
    pub watch_light: Option<FrameLight>,
    pub fog_color: Vec3,
    pub fog_density: f32,
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            camera_position: Vec3::ZERO,
            light: FrameLight {
                position: Vec3::new(0.0, 10.0, 0.0),
                ambient: Vec3::splat(0.2),
                diffuse: Vec3::splat(0.8),
                specular: Vec3::ONE,
            },
            watch_light: None,
            fog_color: Vec3::splat(0.7),
            fog_density: 0.0,
        }
    }
}

/// Per-frame submission buffer filled by the scene and drained by the
/// renderer. Rebuilt from scratch every frame.
#[derive(Default)]
pub struct FrameContext {
    pub uniforms: FrameUniforms,
    pub commands: Vec<DrawCommand>,
}

impl FrameContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, uniforms: FrameUniforms) {
        self.uniforms = uniforms;
        self.commands.clear();
    }

    pub fn draw(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("shader missing: {0}")]
    ShaderMissing(&'static str),
}

pub type RenderResult<T> = Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_context_begin_clears_commands() {
        let mut frame = FrameContext::new();
        frame.draw(DrawCommand::new(
            MeshId::Ground,
            Mat4::IDENTITY,
            Material::flat(Vec3::ONE),
        ));
        assert_eq!(frame.commands.len(), 1);
        frame.begin(FrameUniforms::default());
        assert!(frame.commands.is_empty());
    }

    #[test]
    fn test_draw_command_defaults() {
        let cmd = DrawCommand::new(MeshId::Quad, Mat4::IDENTITY, Material::flat(Vec3::ONE));
        assert!(cmd.texture.is_none());
        assert!(!cmd.fog);
        assert_eq!(cmd.uv_scale, Vec2::ONE);
        let cmd = cmd.textured(TextureId::Ecg).fogged();
        assert_eq!(cmd.texture, Some(TextureId::Ecg));
        assert!(cmd.fog);
    }
}
