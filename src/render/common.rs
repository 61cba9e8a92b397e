use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4};

use crate::scene::MaterialKind;

use super::{DrawItem, FrameSnapshot};

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct GlobalUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    /// xyz position, w cutoff distance (zero for no cutoff).
    pub light_position: [f32; 4],
    /// rgb color, w intensity (zero while the light is hidden).
    pub light_color: [f32; 4],
    pub ambient: [f32; 4],
}

impl GlobalUniform {
    pub fn from_frame(frame: &FrameSnapshot) -> Self {
        let (light_position, light_color) = match frame.point_light {
            Some(light) => (
                light.position.extend(light.distance).into(),
                light.color.extend(light.intensity).into(),
            ),
            None => ([0.0; 4], [0.0; 4]),
        };
        Self {
            view_proj: frame.camera.view_proj.to_cols_array_2d(),
            camera_position: frame.camera.position.extend(1.0).into(),
            light_position,
            light_color,
            ambient: frame.ambient.extend(1.0).into(),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct ObjectConstants {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
    /// rgb color, a opacity.
    pub color: [f32; 4],
    /// rgb emissive, w emissive intensity.
    pub emissive: [f32; 4],
    /// x metalness, y roughness, z one for lambert shading.
    pub surface: [f32; 4],
}

impl ObjectConstants {
    pub fn for_item(item: &DrawItem) -> Self {
        let material = &item.material;
        let opacity = if material.transparent {
            material.opacity
        } else {
            1.0
        };
        let lambert = match material.kind {
            MaterialKind::Standard => 0.0,
            MaterialKind::Lambert => 1.0,
        };
        Self {
            model: item.model.to_cols_array_2d(),
            normal: normal_matrix(item.model),
            color: material.color.extend(opacity).into(),
            emissive: material.emissive.extend(material.emissive_intensity).into(),
            surface: [material.metalness, material.roughness, lambert, 0.0],
        }
    }

    /// Constants for helper line sets, which only use the model matrix.
    pub fn for_lines(model: Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal: normal_matrix(model),
            color: [1.0; 4],
            emissive: [0.0; 4],
            surface: [0.0; 4],
        }
    }
}

fn normal_matrix(model: Mat4) -> [[f32; 4]; 3] {
    let cols = Mat3::from_mat4(model).inverse().transpose().to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}

pub(crate) const SHADER: &str = r#"
struct GlobalUniform {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    light_position: vec4<f32>,
    light_color: vec4<f32>,
    ambient: vec4<f32>,
}

struct ObjectConstants {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
    color: vec4<f32>,
    emissive: vec4<f32>,
    surface: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> globals: GlobalUniform;

@group(1) @binding(0)
var<uniform> object: ObjectConstants;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world_position = object.model * vec4<f32>(input.position, 1.0);
    out.position = globals.view_proj * world_position;
    out.world_pos = world_position.xyz;

    let world_normal = mat3x3<f32>(
        object.normal[0].xyz,
        object.normal[1].xyz,
        object.normal[2].xyz
    ) * input.normal;

    out.normal = normalize(world_normal);
    return out;
}

@fragment
fn fs_main(input: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    var normal = normalize(input.normal);
    if (!front) {
        normal = -normal;
    }

    let to_light = globals.light_position.xyz - input.world_pos;
    let distance = length(to_light);
    let light_dir = to_light / max(distance, 0.0001);
    var attenuation = 1.0;
    if (globals.light_position.w > 0.0) {
        let falloff = clamp(1.0 - distance / globals.light_position.w, 0.0, 1.0);
        attenuation = falloff * falloff;
    }
    let radiance = globals.light_color.xyz * globals.light_color.w * attenuation;

    let metalness = object.surface.x;
    let roughness = object.surface.y;
    let diffuse = max(dot(normal, light_dir), 0.0) * radiance;

    var specular = vec3<f32>(0.0);
    if (object.surface.z < 0.5) {
        let view_dir = normalize(globals.camera_position.xyz - input.world_pos);
        let halfway = normalize(light_dir + view_dir);
        let shininess = mix(96.0, 4.0, roughness);
        let strength = pow(max(dot(normal, halfway), 0.0), shininess) * (1.0 - roughness);
        let tint = mix(vec3<f32>(0.04), object.color.rgb, metalness);
        specular = tint * strength * radiance;
    }

    let base = object.color.rgb * (1.0 - 0.5 * metalness);
    let emissive = object.emissive.rgb * object.emissive.w;
    let lit = base * (globals.ambient.rgb + diffuse) + specular + emissive;
    return vec4<f32>(lit, object.color.a);
}

struct LineInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
}

struct LineOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec3<f32>,
}

@vertex
fn vs_line(input: LineInput) -> LineOutput {
    var out: LineOutput;
    out.position = globals.view_proj * object.model * vec4<f32>(input.position, 1.0);
    out.color = input.color;
    return out;
}

@fragment
fn fs_line(input: LineOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(input.color, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{create_scene, SceneVariant};
    use glam::Vec3;

    fn item_for(index: usize) -> DrawItem {
        let scene = create_scene(SceneVariant::Cube);
        let object = &scene.objects()[index];
        DrawItem {
            entity: object.id,
            shape: object.shape,
            model: object.transform.matrix(),
            material: object.material,
        }
    }

    #[test]
    fn opaque_materials_ignore_opacity() {
        let mut item = item_for(0);
        item.material.opacity = 0.3;
        assert_eq!(ObjectConstants::for_item(&item).color[3], 1.0);
        item.material.transparent = true;
        assert_eq!(ObjectConstants::for_item(&item).color[3], 0.3);
    }

    #[test]
    fn ground_plane_uses_lambert_shading() {
        let constants = ObjectConstants::for_item(&item_for(1));
        assert_eq!(constants.surface[2], 1.0);
        assert_eq!(constants.emissive[3], 0.2);
    }

    #[test]
    fn normal_matrix_of_translation_is_identity() {
        let normal = normal_matrix(Mat4::from_translation(Vec3::new(3.0, 2.0, 1.0)));
        assert_eq!(normal[0], [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(normal[1], [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(normal[2], [0.0, 0.0, 1.0, 0.0]);
    }
}
