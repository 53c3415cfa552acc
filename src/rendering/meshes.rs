//! Procedural geometry. Everything in the scene is built at startup from
//! these generators and uploaded once into owned GPU buffers; draw functions
//! never create resources lazily.

use std::collections::HashMap;
use std::f32::consts::TAU;

use glam::Vec3;
use wgpu::util::DeviceExt;

use super::{MeshId, Vertex};
use crate::config::Config;

/// Number of distinct building silhouettes in the skyline set.
pub const BUILDING_KINDS: usize = 4;

/// CPU-side mesh: interleaved vertices plus a triangle index list.
#[derive(Default, Clone)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Appends another mesh, translated. Used to compose multi-part models
    /// (forearm + fist) into a single buffer.
    pub fn merge(&mut self, other: &MeshData, offset: Vec3) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(other.vertices.iter().map(|v| {
            let p = Vec3::from_array(v.position) + offset;
            Vertex::new(p.to_array(), v.normal, v.uv)
        }));
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }
}

/// Flat grid on the XZ plane at y = 0, normal +Y, UVs tiled `uv_tile` times.
pub fn plane(width: f32, depth: f32, subdivisions: u32, uv_tile: f32) -> MeshData {
    let mut mesh = MeshData::default();
    let n = subdivisions.max(1);
    for z in 0..=n {
        for x in 0..=n {
            let fx = x as f32 / n as f32;
            let fz = z as f32 / n as f32;
            mesh.vertices.push(Vertex::new(
                [(fx - 0.5) * width, 0.0, (fz - 0.5) * depth],
                [0.0, 1.0, 0.0],
                [fx * uv_tile, fz * uv_tile],
            ));
        }
    }
    let stride = n + 1;
    for z in 0..n {
        for x in 0..n {
            let i = z * stride + x;
            mesh.indices
                .extend_from_slice(&[i, i + stride, i + 1, i + 1, i + stride, i + stride + 1]);
        }
    }
    mesh
}

/// One road segment: a quad on the XZ plane centered at the origin, one UV
/// repeat along its length.
pub fn road_segment(width: f32, length: f32) -> MeshData {
    let hw = width / 2.0;
    let hl = length / 2.0;
    MeshData {
        vertices: vec![
            Vertex::new([-hw, 0.0, -hl], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex::new([hw, 0.0, -hl], [0.0, 1.0, 0.0], [1.0, 0.0]),
            Vertex::new([hw, 0.0, hl], [0.0, 1.0, 0.0], [1.0, 1.0]),
            Vertex::new([-hw, 0.0, hl], [0.0, 1.0, 0.0], [0.0, 1.0]),
        ],
        indices: vec![0, 2, 1, 0, 3, 2],
    }
}

/// Axis-aligned box with its base on y = 0, per-face normals.
pub fn box_on_ground(width: f32, height: f32, depth: f32) -> MeshData {
    let hw = width / 2.0;
    let hd = depth / 2.0;
    let (y0, y1) = (0.0, height);
    let faces: [([Vec3; 4], Vec3); 6] = [
        // +Z
        (
            [
                Vec3::new(-hw, y0, hd),
                Vec3::new(hw, y0, hd),
                Vec3::new(hw, y1, hd),
                Vec3::new(-hw, y1, hd),
            ],
            Vec3::Z,
        ),
        // -Z
        (
            [
                Vec3::new(hw, y0, -hd),
                Vec3::new(-hw, y0, -hd),
                Vec3::new(-hw, y1, -hd),
                Vec3::new(hw, y1, -hd),
            ],
            Vec3::NEG_Z,
        ),
        // +X
        (
            [
                Vec3::new(hw, y0, hd),
                Vec3::new(hw, y0, -hd),
                Vec3::new(hw, y1, -hd),
                Vec3::new(hw, y1, hd),
            ],
            Vec3::X,
        ),
        // -X
        (
            [
                Vec3::new(-hw, y0, -hd),
                Vec3::new(-hw, y0, hd),
                Vec3::new(-hw, y1, hd),
                Vec3::new(-hw, y1, -hd),
            ],
            Vec3::NEG_X,
        ),
        // +Y
        (
            [
                Vec3::new(-hw, y1, hd),
                Vec3::new(hw, y1, hd),
                Vec3::new(hw, y1, -hd),
                Vec3::new(-hw, y1, -hd),
            ],
            Vec3::Y,
        ),
        // -Y
        (
            [
                Vec3::new(-hw, y0, -hd),
                Vec3::new(hw, y0, -hd),
                Vec3::new(hw, y0, hd),
                Vec3::new(-hw, y0, hd),
            ],
            Vec3::NEG_Y,
        ),
    ];

    let mut mesh = MeshData::default();
    let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    for (corners, normal) in faces {
        let base = mesh.vertices.len() as u32;
        for (corner, uv) in corners.iter().zip(uvs) {
            mesh.vertices
                .push(Vertex::new(corner.to_array(), normal.to_array(), uv));
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh
}

/// Skyline silhouettes, round-robin assigned to buildings by the street.
pub fn building(kind: usize) -> MeshData {
    let (w, h, d) = match kind % BUILDING_KINDS {
        0 => (6.0, 12.0, 6.0),
        1 => (5.0, 25.0, 5.0),
        2 => (4.0, 18.0, 4.0),
        _ => (8.0, 10.0, 8.0),
    };
    box_on_ground(w, h, d)
}

/// Forearm plus fist, modeled at OBJ scale; the hand transform shrinks it to
/// arm proportions.
pub fn arm() -> MeshData {
    let mut mesh = box_on_ground(3.0, 2.5, 14.0);
    let fist = box_on_ground(3.6, 3.6, 4.0);
    mesh.merge(&fist, Vec3::new(0.0, -0.5, -8.5));
    mesh
}

/// Short cylinder along +Z: the watch body.
pub fn watch_body(radius: f32, thickness: f32, segments: u32) -> MeshData {
    let mut mesh = MeshData::default();
    let n = segments.max(3);
    let hz = thickness / 2.0;

    // Side band.
    for i in 0..=n {
        let a = i as f32 / n as f32 * TAU;
        let (x, y) = (a.cos() * radius, a.sin() * radius);
        let normal = [a.cos(), a.sin(), 0.0];
        let u = i as f32 / n as f32;
        mesh.vertices.push(Vertex::new([x, y, -hz], normal, [u, 0.0]));
        mesh.vertices.push(Vertex::new([x, y, hz], normal, [u, 1.0]));
    }
    for i in 0..n {
        let b = i * 2;
        mesh.indices
            .extend_from_slice(&[b, b + 2, b + 1, b + 1, b + 2, b + 3]);
    }

    // Front and back caps.
    for &(z, normal) in &[(hz, Vec3::Z), (-hz, Vec3::NEG_Z)] {
        let center = mesh.vertices.len() as u32;
        mesh.vertices
            .push(Vertex::new([0.0, 0.0, z], normal.to_array(), [0.5, 0.5]));
        for i in 0..=n {
            let a = i as f32 / n as f32 * TAU;
            mesh.vertices.push(Vertex::new(
                [a.cos() * radius, a.sin() * radius, z],
                normal.to_array(),
                [0.5 + a.cos() * 0.5, 0.5 + a.sin() * 0.5],
            ));
        }
        for i in 0..n {
            let (a, b) = (center + 1 + i, center + 2 + i);
            if z > 0.0 {
                mesh.indices.extend_from_slice(&[center, a, b]);
            } else {
                mesh.indices.extend_from_slice(&[center, b, a]);
            }
        }
    }
    mesh
}

/// Filled circle facing +Z; the watch dial background.
pub fn disc(radius: f32, segments: u32) -> MeshData {
    let mut mesh = MeshData::default();
    let n = segments.max(3);
    mesh.vertices
        .push(Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.5, 0.5]));
    for i in 0..=n {
        let a = i as f32 / n as f32 * TAU;
        mesh.vertices.push(Vertex::new(
            [a.cos() * radius, a.sin() * radius, 0.0],
            [0.0, 0.0, 1.0],
            [0.5 + a.cos() * 0.5, 0.5 + a.sin() * 0.5],
        ));
    }
    for i in 0..n {
        mesh.indices.extend_from_slice(&[0, 1 + i, 2 + i]);
    }
    mesh
}

/// Unit quad centered at the origin facing +Z.
pub fn quad_centered() -> MeshData {
    MeshData {
        vertices: vec![
            Vertex::new([-0.5, -0.5, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
            Vertex::new([0.5, -0.5, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
            Vertex::new([0.5, 0.5, 0.0], [0.0, 0.0, 1.0], [1.0, 1.0]),
            Vertex::new([-0.5, 0.5, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

/// Unit quad with its lower-left corner at the origin; digit segments scale
/// this directly into place.
pub fn cell() -> MeshData {
    MeshData {
        vertices: vec![
            Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
            Vertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
            Vertex::new([1.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 1.0]),
            Vertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

/// Unit UV sphere; the sun scales it up.
pub fn uv_sphere(stacks: u32, slices: u32) -> MeshData {
    let mut mesh = MeshData::default();
    let stacks = stacks.max(3);
    let slices = slices.max(3);
    for i in 0..=stacks {
        let v = i as f32 / stacks as f32;
        let phi = v * std::f32::consts::PI;
        for j in 0..=slices {
            let u = j as f32 / slices as f32;
            let theta = u * TAU;
            let p = Vec3::new(
                phi.sin() * theta.cos(),
                phi.cos(),
                phi.sin() * theta.sin(),
            );
            mesh.vertices.push(Vertex::new(p.to_array(), p.to_array(), [u, v]));
        }
    }
    let stride = slices + 1;
    for i in 0..stacks {
        for j in 0..slices {
            let a = i * stride + j;
            let b = a + stride;
            mesh.indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }
    mesh
}

/// Mesh with its data resident on the GPU.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, label: &str, data: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
        }
    }
}

/// All scene meshes, built once during renderer construction. Lookup returns
/// `None` for anything that was never built; callers skip the draw.
pub struct MeshLibrary {
    meshes: HashMap<MeshId, GpuMesh>,
}

impl MeshLibrary {
    pub fn build(device: &wgpu::Device, config: &Config) -> Self {
        let mut meshes = HashMap::new();
        let mut add = |id: MeshId, label: &str, data: MeshData| {
            meshes.insert(id, GpuMesh::upload(device, label, &data));
        };

        add(MeshId::Ground, "ground", plane(200.0, 400.0, 20, 40.0));
        add(
            MeshId::RoadSegment,
            "road_segment",
            road_segment(config.road_width, config.segment_length),
        );
        for kind in 0..BUILDING_KINDS {
            add(MeshId::Building(kind), "building", building(kind));
        }
        add(MeshId::Arm, "arm", arm());
        add(MeshId::WatchBody, "watch_body", watch_body(0.3, 0.04, 32));
        add(MeshId::WatchDial, "watch_dial", disc(0.5, 32));
        add(MeshId::Quad, "quad", quad_centered());
        add(MeshId::Cell, "cell", cell());
        add(MeshId::Sphere, "sphere", uv_sphere(32, 32));

        Self { meshes }
    }

    pub fn get(&self, id: MeshId) -> Option<&GpuMesh> {
        self.meshes.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_counts() {
        let mesh = plane(10.0, 10.0, 4, 1.0);
        assert_eq!(mesh.vertices.len(), 25);
        assert_eq!(mesh.indices.len(), 4 * 4 * 6);
    }

    #[test]
    fn test_box_has_per_face_normals() {
        let mesh = box_on_ground(2.0, 3.0, 4.0);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        for v in &mesh.vertices {
            let n = Vec3::from_array(v.normal);
            assert!((n.length() - 1.0).abs() < 1e-6);
            assert!(v.position[1] >= 0.0 && v.position[1] <= 3.0);
        }
    }

    #[test]
    fn test_sphere_normals_are_unit_radial() {
        let mesh = uv_sphere(8, 8);
        for v in &mesh.vertices {
            let p = Vec3::from_array(v.position);
            let n = Vec3::from_array(v.normal);
            assert!((p.length() - 1.0).abs() < 1e-5);
            assert!((n - p).length() < 1e-5);
        }
    }

    #[test]
    fn test_merge_translates_and_reindexes() {
        let mut a = quad_centered();
        let before = a.vertices.len();
        let b = quad_centered();
        a.merge(&b, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(a.vertices.len(), before * 2);
        assert!(a.vertices[before].position[0] > 9.0);
        assert!(a.indices[before / 4 * 6..].iter().all(|&i| i >= before as u32));
    }

    #[test]
    fn test_every_building_kind_builds() {
        for kind in 0..BUILDING_KINDS {
            let mesh = building(kind);
            assert!(!mesh.vertices.is_empty());
            assert_eq!(mesh.indices.len() % 3, 0);
        }
    }

    #[test]
    fn test_indices_in_range() {
        for mesh in [
            plane(5.0, 5.0, 3, 1.0),
            watch_body(0.3, 0.04, 16),
            disc(0.5, 16),
            uv_sphere(6, 6),
            arm(),
        ] {
            let max = mesh.vertices.len() as u32;
            assert!(mesh.indices.iter().all(|&i| i < max));
        }
    }
}
