use std::f32::consts::FRAC_PI_2;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::color::{self, BLACK, ORANGE, WHITE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SceneVariant {
    Cube,
    Sphere,
}

impl SceneVariant {
    pub const ALL: [SceneVariant; 2] = [SceneVariant::Cube, SceneVariant::Sphere];

    pub fn index(self) -> usize {
        match self {
            SceneVariant::Cube => 0,
            SceneVariant::Sphere => 1,
        }
    }

    pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    /// Resolves raw user input (a button attribute, a CLI argument) to a
    /// variant. Anything that is not a known index falls back to scene 0.
    pub fn resolve(raw: &str) -> SceneResolution {
        match raw.trim().parse::<i64>().ok().and_then(Self::from_index) {
            Some(variant) => SceneResolution {
                variant,
                fell_back: false,
            },
            None => SceneResolution {
                variant: Self::ALL[0],
                fell_back: true,
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SceneVariant::Cube => "cube",
            SceneVariant::Sphere => "sphere",
        }
    }
}

impl fmt::Display for SceneVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.index())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneResolution {
    pub variant: SceneVariant,
    /// The input did not name a scene and scene 0 was substituted.
    pub fell_back: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(u64);

impl SceneId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Box {
        width: f32,
        height: f32,
        depth: f32,
    },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Plane {
        width: f32,
        height: f32,
    },
}

impl Shape {
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Box { .. } => "box",
            Shape::Sphere { .. } => "sphere",
            Shape::Plane { .. } => "plane",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialKind {
    Standard,
    Lambert,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub kind: MaterialKind,
    pub color: Vec3,
    pub emissive: Vec3,
    pub emissive_intensity: f32,
    pub metalness: f32,
    pub roughness: f32,
    pub opacity: f32,
    pub transparent: bool,
    pub wireframe: bool,
    pub double_sided: bool,
}

impl Material {
    pub fn standard(color: Vec3, metalness: f32, roughness: f32) -> Self {
        Self {
            kind: MaterialKind::Standard,
            color,
            emissive: BLACK,
            emissive_intensity: 1.0,
            metalness,
            roughness,
            opacity: 1.0,
            transparent: false,
            wireframe: false,
            double_sided: false,
        }
    }

    pub fn lambert(color: Vec3) -> Self {
        Self {
            kind: MaterialKind::Lambert,
            metalness: 0.0,
            roughness: 1.0,
            ..Self::standard(color, 0.0, 1.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    /// Euler angles in radians, applied X then Y then Z.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    /// Object-to-world matrix: scale, then rotation, then translation.
    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: EntityId,
    pub name: String,
    pub shape: Shape,
    pub material: Material,
    pub transform: Transform,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub color: Vec3,
    pub intensity: f32,
    /// Range after which the light has no effect; zero means unlimited.
    pub distance: f32,
    pub position: Vec3,
    pub cast_shadow: bool,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientLight {
    pub color: Vec3,
    pub intensity: f32,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneLights {
    pub point: PointLight,
    pub ambient: AmbientLight,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxesHelper {
    pub size: f32,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLightHelper {
    pub size: f32,
    pub color: Vec3,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridHelper {
    pub size: f32,
    pub divisions: u32,
    pub center_color: Vec3,
    pub line_color: Vec3,
    pub height: f32,
    pub visible: bool,
}

/// Non-renderable visual aids shown alongside the objects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneHelpers {
    pub axes: AxesHelper,
    pub point_light: PointLightHelper,
    pub grid: GridHelper,
}

/// Immutable description of one scene.
///
/// Created by [`create_scene`]; the live copy that animation and editing
/// mutate is a [`SceneGraph`](crate::scene_graph::SceneGraph).
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDescriptor {
    id: SceneId,
    variant: SceneVariant,
    objects: Vec<SceneObject>,
    lights: SceneLights,
    helpers: SceneHelpers,
    subject: EntityId,
}

impl SceneDescriptor {
    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn variant(&self) -> SceneVariant {
        self.variant
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn lights(&self) -> &SceneLights {
        &self.lights
    }

    pub fn helpers(&self) -> &SceneHelpers {
        &self.helpers
    }

    pub fn subject_id(&self) -> EntityId {
        self.subject
    }

    pub fn subject(&self) -> &SceneObject {
        self.objects
            .iter()
            .find(|object| object.id == self.subject)
            .unwrap_or(&self.objects[0])
    }

    /// The point the camera orbits around: the first object's position.
    pub fn origin(&self) -> Vec3 {
        self.objects[0].transform.position
    }
}

pub fn create_scene(variant: SceneVariant) -> SceneDescriptor {
    let subject = match variant {
        SceneVariant::Cube => cube(EntityId(0)),
        SceneVariant::Sphere => sphere(EntityId(0)),
    };
    let subject_id = subject.id;
    let objects = vec![subject, ground_plane(EntityId(1))];

    SceneDescriptor {
        id: SceneId::next(),
        variant,
        objects,
        lights: stage_lights(),
        helpers: stage_helpers(),
        subject: subject_id,
    }
}

fn cube(id: EntityId) -> SceneObject {
    let side = 1.0;
    SceneObject {
        id,
        name: "Cube".to_string(),
        shape: Shape::Box {
            width: side,
            height: side,
            depth: side,
        },
        material: Material::standard(color::from_rgb8(0xf6, 0x9f, 0x1f), 0.5, 0.7),
        transform: Transform {
            position: Vec3::new(0.0, 0.5, 0.0),
            ..Transform::default()
        },
        cast_shadow: true,
        receive_shadow: false,
        visible: true,
    }
}

fn sphere(id: EntityId) -> SceneObject {
    SceneObject {
        id,
        name: "Sphere".to_string(),
        shape: Shape::Sphere {
            radius: 1.0,
            width_segments: 32,
            height_segments: 16,
        },
        material: Material::standard(color::from_rgb8(0, 0, 255), 0.5, 0.7),
        transform: Transform {
            position: Vec3::new(0.0, 0.5, 0.0),
            ..Transform::default()
        },
        cast_shadow: true,
        receive_shadow: false,
        visible: true,
    }
}

fn ground_plane(id: EntityId) -> SceneObject {
    let mut material = Material::lambert(color::from_rgb8(128, 128, 128));
    material.emissive = color::from_rgb8(0, 128, 128);
    material.emissive_intensity = 0.2;
    material.double_sided = true;
    material.transparent = true;
    material.opacity = 0.4;

    SceneObject {
        id,
        name: "Plane".to_string(),
        shape: Shape::Plane {
            width: 3.0,
            height: 3.0,
        },
        material,
        transform: Transform {
            rotation: Vec3::new(FRAC_PI_2, 0.0, 0.0),
            ..Transform::default()
        },
        cast_shadow: false,
        receive_shadow: true,
        visible: true,
    }
}

fn stage_lights() -> SceneLights {
    SceneLights {
        point: PointLight {
            color: color::from_rgb8(0xff, 0xdc, 0xa8),
            intensity: 1.2,
            distance: 100.0,
            position: Vec3::new(-2.0, 3.0, 3.0),
            cast_shadow: true,
            visible: true,
        },
        ambient: AmbientLight {
            color: WHITE,
            intensity: 0.4,
            visible: true,
        },
    }
}

fn stage_helpers() -> SceneHelpers {
    SceneHelpers {
        axes: AxesHelper {
            size: 4.0,
            visible: false,
        },
        point_light: PointLightHelper {
            size: 1.0,
            color: ORANGE,
            visible: false,
        },
        grid: GridHelper {
            size: 20.0,
            divisions: 20,
            center_color: color::from_rgb8(0, 128, 128),
            line_color: color::from_rgb8(169, 169, 169),
            height: -0.01,
            visible: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_shapes(scene: &SceneDescriptor, kind: &str) -> usize {
        scene
            .objects()
            .iter()
            .filter(|object| object.shape.kind() == kind)
            .count()
    }

    #[test]
    fn cube_scene_has_one_cube_and_one_plane() {
        let scene = create_scene(SceneVariant::Cube);
        assert_eq!(scene.objects().len(), 2);
        assert_eq!(count_shapes(&scene, "box"), 1);
        assert_eq!(count_shapes(&scene, "plane"), 1);
        assert_eq!(scene.subject().name, "Cube");
    }

    #[test]
    fn sphere_scene_has_one_sphere_and_one_plane() {
        let scene = create_scene(SceneVariant::Sphere);
        assert_eq!(scene.objects().len(), 2);
        assert_eq!(count_shapes(&scene, "sphere"), 1);
        assert_eq!(count_shapes(&scene, "plane"), 1);
        assert_eq!(scene.subject().name, "Sphere");
    }

    #[test]
    fn subject_is_member_of_objects() {
        for variant in SceneVariant::ALL {
            let scene = create_scene(variant);
            assert!(!scene.objects().is_empty());
            assert!(scene
                .objects()
                .iter()
                .any(|object| object.id == scene.subject_id()));
            assert_eq!(scene.origin(), scene.objects()[0].transform.position);
        }
    }

    #[test]
    fn every_call_builds_a_new_descriptor() {
        let first = create_scene(SceneVariant::Cube);
        let second = create_scene(SceneVariant::Cube);
        assert_ne!(first.id(), second.id());
        assert_eq!(first.objects(), second.objects());
    }

    #[test]
    fn resolve_falls_back_to_first_scene() {
        assert_eq!(
            SceneVariant::resolve(" 1 "),
            SceneResolution {
                variant: SceneVariant::Sphere,
                fell_back: false
            }
        );
        for raw in ["-1", "2", "abc", "", "1.5"] {
            let resolution = SceneVariant::resolve(raw);
            assert_eq!(resolution.variant, SceneVariant::Cube, "input {raw:?}");
            assert!(resolution.fell_back);
        }
    }
}
