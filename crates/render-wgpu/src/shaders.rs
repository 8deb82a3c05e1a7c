use shadelab_render::TechniqueKind;

/// Vertex and fragment entry points for a technique in [`TECHNIQUE_SHADER`].
pub fn entry_points(kind: TechniqueKind) -> (&'static str, &'static str) {
    match kind {
        TechniqueKind::PlainColour => ("vs_plain", "fs_plain"),
        TechniqueKind::VertexTex => ("vs_tex", "fs_tex"),
        TechniqueKind::VertexChangingTex => ("vs_tex", "fs_changing_tex"),
        TechniqueKind::VertexLitTex => ("vs_lit", "fs_lit"),
        TechniqueKind::NormalMapping => ("vs_normal", "fs_normal"),
        TechniqueKind::NormalMappingPara => ("vs_normal", "fs_parallax"),
    }
}

/// Every technique in one module. Vertex inputs use fixed locations:
/// 0 position, 1 normal, 2 uv, 3 tangent.
pub const TECHNIQUE_SHADER: &str = r#"
struct Globals {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    light1_pos: vec4<f32>,
    light1_colour: vec4<f32>,
    light2_pos: vec4<f32>,
    light2_colour: vec4<f32>,
    ambient: vec4<f32>,
    // x: specular power, y: colour multiplier, z: parallax depth
    scalars: vec4<f32>,
};

struct Object {
    world: mat4x4<f32>,
    colour: vec4<f32>,
};

@group(0) @binding(0) var<uniform> globals: Globals;
@group(1) @binding(0) var<uniform> object: Object;
@group(2) @binding(0) var diffuse_map: texture_2d<f32>;
@group(2) @binding(1) var normal_map: texture_2d<f32>;
@group(2) @binding(2) var linear_sampler: sampler;

fn project(world_pos: vec4<f32>) -> vec4<f32> {
    return globals.proj * globals.view * world_pos;
}

struct Lighting {
    diffuse: vec3<f32>,
    specular: vec3<f32>,
};

fn point_light(light_pos: vec3<f32>, colour: vec3<f32>, world_pos: vec3<f32>, n: vec3<f32>, to_camera: vec3<f32>) -> Lighting {
    let to_light = normalize(light_pos - world_pos);
    let halfway = normalize(to_light + to_camera);
    var out: Lighting;
    out.diffuse = colour * max(dot(n, to_light), 0.0);
    out.specular = colour * pow(max(dot(n, halfway), 0.0), globals.scalars.x);
    return out;
}

// Blinn-Phong over both lights; diffuse alpha is the specular mask.
fn shade(world_pos: vec3<f32>, n: vec3<f32>, albedo: vec4<f32>) -> vec4<f32> {
    let to_camera = normalize(globals.camera_pos.xyz - world_pos);
    let l1 = point_light(globals.light1_pos.xyz, globals.light1_colour.rgb, world_pos, n, to_camera);
    let l2 = point_light(globals.light2_pos.xyz, globals.light2_colour.rgb, world_pos, n, to_camera);
    let diffuse = globals.ambient.rgb + l1.diffuse + l2.diffuse;
    let specular = l1.specular + l2.specular;
    return vec4<f32>(albedo.rgb * diffuse + specular * albedo.a, 1.0);
}

// PlainColour

struct PlainOut {
    @builtin(position) clip: vec4<f32>,
};

@vertex
fn vs_plain(@location(0) position: vec3<f32>) -> PlainOut {
    var out: PlainOut;
    out.clip = project(object.world * vec4<f32>(position, 1.0));
    return out;
}

@fragment
fn fs_plain() -> @location(0) vec4<f32> {
    return vec4<f32>(object.colour.rgb, 1.0);
}

// VertexTex, VertexChangingTex

struct TexOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_tex(@location(0) position: vec3<f32>, @location(2) uv: vec2<f32>) -> TexOut {
    var out: TexOut;
    out.clip = project(object.world * vec4<f32>(position, 1.0));
    out.uv = uv;
    return out;
}

@fragment
fn fs_tex(in: TexOut) -> @location(0) vec4<f32> {
    let albedo = textureSample(diffuse_map, linear_sampler, in.uv);
    return vec4<f32>(albedo.rgb, 1.0);
}

@fragment
fn fs_changing_tex(in: TexOut) -> @location(0) vec4<f32> {
    let albedo = textureSample(diffuse_map, linear_sampler, in.uv);
    return vec4<f32>(albedo.rgb * globals.scalars.y, 1.0);
}

// VertexLitTex

struct LitOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_lit(
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
) -> LitOut {
    let world_pos = object.world * vec4<f32>(position, 1.0);
    var out: LitOut;
    out.clip = project(world_pos);
    out.world_pos = world_pos.xyz;
    out.normal = (object.world * vec4<f32>(normal, 0.0)).xyz;
    out.uv = uv;
    return out;
}

@fragment
fn fs_lit(in: LitOut) -> @location(0) vec4<f32> {
    let albedo = textureSample(diffuse_map, linear_sampler, in.uv);
    return shade(in.world_pos, normalize(in.normal), albedo);
}

// NormalMapping, NormalMappingPara

struct NormalOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) tangent: vec3<f32>,
};

@vertex
fn vs_normal(
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) tangent: vec3<f32>,
) -> NormalOut {
    let world_pos = object.world * vec4<f32>(position, 1.0);
    var out: NormalOut;
    out.clip = project(world_pos);
    out.world_pos = world_pos.xyz;
    out.normal = (object.world * vec4<f32>(normal, 0.0)).xyz;
    out.tangent = (object.world * vec4<f32>(tangent, 0.0)).xyz;
    out.uv = uv;
    return out;
}

fn tangent_frame(in: NormalOut) -> mat3x3<f32> {
    let n = normalize(in.normal);
    let t = normalize(in.tangent - dot(in.tangent, n) * n);
    let b = cross(n, t);
    return mat3x3<f32>(t, b, n);
}

fn mapped_normal(tbn: mat3x3<f32>, uv: vec2<f32>) -> vec3<f32> {
    let ts = textureSample(normal_map, linear_sampler, uv).rgb * 2.0 - 1.0;
    return normalize(tbn * ts);
}

@fragment
fn fs_normal(in: NormalOut) -> @location(0) vec4<f32> {
    let tbn = tangent_frame(in);
    let albedo = textureSample(diffuse_map, linear_sampler, in.uv);
    return shade(in.world_pos, mapped_normal(tbn, in.uv), albedo);
}

@fragment
fn fs_parallax(in: NormalOut) -> @location(0) vec4<f32> {
    let tbn = tangent_frame(in);
    let to_camera = transpose(tbn) * normalize(globals.camera_pos.xyz - in.world_pos);
    // Height lives in the normal map's alpha; lower texels shift further.
    let height = textureSample(normal_map, linear_sampler, in.uv).a;
    let uv = in.uv - to_camera.xy * ((1.0 - height) * globals.scalars.z);
    let albedo = textureSample(diffuse_map, linear_sampler, uv);
    return shade(in.world_pos, mapped_normal(tbn, uv), albedo);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_entry_point_exists() {
        for kind in TechniqueKind::ALL {
            let (vs, fs) = entry_points(kind);
            assert!(TECHNIQUE_SHADER.contains(&format!("fn {vs}(")), "{vs}");
            assert!(TECHNIQUE_SHADER.contains(&format!("fn {fs}(")), "{fs}");
        }
    }

    #[test]
    fn bind_groups_are_declared() {
        for group in ["@group(0)", "@group(1)", "@group(2) @binding(2)"] {
            assert!(TECHNIQUE_SHADER.contains(group));
        }
    }
}
