//! Rendering seam: a frame snapshot, the surface trait that draws it and
//! the two surfaces the hosts use.

mod common;
pub mod gpu;
pub mod headless;

use glam::{Mat4, Vec3};

use crate::camera::Camera;
use crate::error::RenderError;
use crate::mesh::{self, LineData};
use crate::scene::{EntityId, GridHelper, Material, Shape};
use crate::scene_graph::SceneGraph;

pub use gpu::Renderer;
pub use headless::HeadlessSurface;

pub trait RenderSurface {
    fn size(&self) -> (u32, u32);

    fn resize(&mut self, size: (u32, u32));

    fn draw(&mut self, frame: &FrameSnapshot) -> Result<(), RenderError>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraParams {
    pub view_proj: Mat4,
    pub position: Vec3,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightParams {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub distance: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawItem {
    pub entity: EntityId,
    pub shape: Shape,
    pub model: Mat4,
    pub material: Material,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LineSource {
    Grid(GridHelper),
    Axes { size: f32 },
    LightMarker { size: f32, color: Vec3 },
}

impl LineSource {
    pub fn cache_key(&self) -> String {
        format!("{self:?}")
    }

    pub fn lines(&self) -> LineData {
        match *self {
            LineSource::Grid(grid) => mesh::grid_lines(&grid),
            LineSource::Axes { size } => mesh::axes_lines(size),
            LineSource::LightMarker { size, color } => {
                mesh::wire_sphere_lines(Vec3::ZERO, size, color)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSet {
    pub source: LineSource,
    pub model: Mat4,
}

/// Everything needed to draw one frame, copied out of the live scene.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSnapshot {
    pub camera: CameraParams,
    /// Ambient color premultiplied by intensity; black while hidden.
    pub ambient: Vec3,
    pub point_light: Option<LightParams>,
    /// Opaque items first, then transparent ones.
    pub items: Vec<DrawItem>,
    pub lines: Vec<LineSet>,
}

impl FrameSnapshot {
    pub fn capture(graph: &SceneGraph, camera: &Camera) -> Self {
        let lights = &graph.lights;
        let ambient = if lights.ambient.visible {
            lights.ambient.color * lights.ambient.intensity
        } else {
            Vec3::ZERO
        };
        let point_light = lights.point.visible.then_some(LightParams {
            position: lights.point.position,
            color: lights.point.color,
            intensity: lights.point.intensity,
            distance: lights.point.distance,
        });

        let mut items: Vec<DrawItem> = graph
            .objects()
            .iter()
            .filter(|object| object.visible)
            .map(|object| DrawItem {
                entity: object.id,
                shape: object.shape,
                model: object.transform.matrix(),
                material: object.material,
            })
            .collect();
        items.sort_by_key(|item| item.material.transparent);

        let helpers = &graph.helpers;
        let mut lines = Vec::new();
        if helpers.grid.visible {
            lines.push(LineSet {
                source: LineSource::Grid(helpers.grid),
                model: Mat4::IDENTITY,
            });
        }
        if helpers.axes.visible {
            lines.push(LineSet {
                source: LineSource::Axes {
                    size: helpers.axes.size,
                },
                model: Mat4::IDENTITY,
            });
        }
        if helpers.point_light.visible {
            lines.push(LineSet {
                source: LineSource::LightMarker {
                    size: helpers.point_light.size,
                    color: helpers.point_light.color,
                },
                model: Mat4::from_translation(lights.point.position),
            });
        }

        Self {
            camera: CameraParams {
                view_proj: camera.view_proj(),
                position: camera.position,
            },
            ambient,
            point_light,
            items,
            lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::scene::{create_scene, SceneVariant};

    fn capture(graph: &SceneGraph) -> FrameSnapshot {
        FrameSnapshot::capture(graph, &Camera::new(&CameraConfig::default(), 1.5))
    }

    #[test]
    fn transparent_ground_draws_last() {
        let graph = SceneGraph::instantiate(&create_scene(SceneVariant::Sphere));
        let frame = capture(&graph);
        assert_eq!(frame.items.len(), 2);
        assert_eq!(frame.items[0].shape.kind(), "sphere");
        assert_eq!(frame.items[1].shape.kind(), "plane");
    }

    #[test]
    fn hidden_helpers_and_lights_are_skipped() {
        let mut graph = SceneGraph::instantiate(&create_scene(SceneVariant::Cube));
        let frame = capture(&graph);
        assert_eq!(frame.lines.len(), 1);
        assert!(matches!(frame.lines[0].source, LineSource::Grid(_)));
        assert!(frame.point_light.is_some());

        graph.helpers.axes.visible = true;
        graph.helpers.point_light.visible = true;
        graph.lights.point.visible = false;
        graph.lights.ambient.visible = false;
        let frame = capture(&graph);
        assert_eq!(frame.lines.len(), 3);
        assert_eq!(frame.point_light, None);
        assert_eq!(frame.ambient, Vec3::ZERO);
    }

    #[test]
    fn light_marker_follows_light() {
        let mut graph = SceneGraph::instantiate(&create_scene(SceneVariant::Cube));
        graph.helpers.point_light.visible = true;
        let frame = capture(&graph);
        let marker = frame
            .lines
            .iter()
            .find(|set| matches!(set.source, LineSource::LightMarker { .. }))
            .unwrap();
        assert_eq!(
            marker.model.transform_point3(Vec3::ZERO),
            Vec3::new(-2.0, 3.0, 3.0)
        );
    }
}
