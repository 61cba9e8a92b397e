use std::collections::BTreeSet;
use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::scene::{GridHelper, Shape};

/// Floats per vertex: position followed by a normal (meshes) or a color
/// (line sets).
pub const VERTEX_STRIDE: usize = 6;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }

    fn push_vertex(&mut self, position: Vec3, normal: Vec3) -> u32 {
        let index = self.vertex_count() as u32;
        self.vertices.extend_from_slice(&position.to_array());
        self.vertices.extend_from_slice(&normal.to_array());
        index
    }

    pub fn position(&self, index: u32) -> Vec3 {
        let start = index as usize * VERTEX_STRIDE;
        Vec3::from_slice(&self.vertices[start..start + 3])
    }

    /// Unique triangle edges as a line-list index buffer.
    pub fn edge_indices(&self) -> Vec<u32> {
        let mut edges = BTreeSet::new();
        for triangle in self.indices.chunks_exact(3) {
            for (a, b) in [
                (triangle[0], triangle[1]),
                (triangle[1], triangle[2]),
                (triangle[2], triangle[0]),
            ] {
                edges.insert((a.min(b), a.max(b)));
            }
        }
        edges.into_iter().flat_map(|(a, b)| [a, b]).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineData {
    pub vertices: Vec<f32>,
}

impl LineData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }

    fn push_segment(&mut self, from: Vec3, to: Vec3, color: Vec3) {
        for point in [from, to] {
            self.vertices.extend_from_slice(&point.to_array());
            self.vertices.extend_from_slice(&color.to_array());
        }
    }
}

pub fn mesh_for_shape(shape: &Shape) -> MeshData {
    match *shape {
        Shape::Box {
            width,
            height,
            depth,
        } => box_mesh(Vec3::new(width, height, depth)),
        Shape::Sphere {
            radius,
            width_segments,
            height_segments,
        } => sphere_mesh(radius, width_segments, height_segments),
        Shape::Plane { width, height } => plane_mesh(width, height),
    }
}

pub fn box_mesh(size: Vec3) -> MeshData {
    // (normal, u, v) with u x v == normal so faces wind counter-clockwise.
    const FACES: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];
    let half = size * 0.5;
    let mut mesh = MeshData::default();
    for (normal, u, v) in FACES {
        let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
        let base = mesh.vertex_count() as u32;
        for (su, sv) in corners {
            mesh.push_vertex((normal + u * su + v * sv) * half, normal);
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh
}

pub fn sphere_mesh(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);
    let mut mesh = MeshData::default();
    let mut grid = Vec::with_capacity(height_segments as usize + 1);

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        let mut row = Vec::with_capacity(width_segments as usize + 1);
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let normal = Vec3::new(
                -(u * TAU).cos() * (v * PI).sin(),
                (v * PI).cos(),
                (u * TAU).sin() * (v * PI).sin(),
            );
            row.push(mesh.push_vertex(normal * radius, normal));
        }
        grid.push(row);
    }

    for iy in 0..height_segments as usize {
        for ix in 0..width_segments as usize {
            let a = grid[iy][ix + 1];
            let b = grid[iy][ix];
            let c = grid[iy + 1][ix];
            let d = grid[iy + 1][ix + 1];
            if iy != 0 {
                mesh.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments as usize - 1 {
                mesh.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
    mesh
}

/// Plane in the XY plane facing +Z.
pub fn plane_mesh(width: f32, height: f32) -> MeshData {
    let (hw, hh) = (width * 0.5, height * 0.5);
    let mut mesh = MeshData::default();
    for (x, y) in [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)] {
        mesh.push_vertex(Vec3::new(x, y, 0.0), Vec3::Z);
    }
    mesh.indices.extend_from_slice(&[0, 1, 2, 0, 2, 3]);
    mesh
}

pub fn grid_lines(grid: &GridHelper) -> LineData {
    let divisions = grid.divisions.max(1);
    let step = grid.size / divisions as f32;
    let half = grid.size * 0.5;
    let center = divisions / 2;
    let mut lines = LineData::default();
    for i in 0..=divisions {
        let k = -half + i as f32 * step;
        let color = if i == center {
            grid.center_color
        } else {
            grid.line_color
        };
        lines.push_segment(
            Vec3::new(-half, grid.height, k),
            Vec3::new(half, grid.height, k),
            color,
        );
        lines.push_segment(
            Vec3::new(k, grid.height, -half),
            Vec3::new(k, grid.height, half),
            color,
        );
    }
    lines
}

pub fn axes_lines(size: f32) -> LineData {
    let mut lines = LineData::default();
    lines.push_segment(Vec3::ZERO, Vec3::X * size, Vec3::new(1.0, 0.0, 0.0));
    lines.push_segment(Vec3::ZERO, Vec3::Y * size, Vec3::new(0.0, 1.0, 0.0));
    lines.push_segment(Vec3::ZERO, Vec3::Z * size, Vec3::new(0.0, 0.0, 1.0));
    lines
}

/// Coarse wire sphere used to mark a point light's position.
pub fn wire_sphere_lines(center: Vec3, radius: f32, color: Vec3) -> LineData {
    let sphere = sphere_mesh(radius, 4, 2);
    let mut lines = LineData::default();
    for pair in sphere.edge_indices().chunks_exact(2) {
        lines.push_segment(
            center + sphere.position(pair[0]),
            center + sphere.position(pair[1]),
            color,
        );
    }
    lines
}
