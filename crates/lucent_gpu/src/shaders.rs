//! WGSL shaders for the glass pipeline
//!
//! - `GLASS_SHADER`: rounded-rect glass over a captured backdrop
//!   (refraction, chromatic aberration, tone curve, rim light, drop shadow)
//! - `BLUR_SHADER`: one direction of a separable Gaussian blur
//!
//! Both draw a full-surface quad as a 4-vertex triangle strip with no vertex
//! buffers. The shape and color helpers in `GLASS_SHADER` mirror
//! `lucent_core::shape` name for name.

/// WGSL shader for the glass panel
pub const GLASS_SHADER: &str = r#"
// ============================================================================
// Lucent Liquid Glass Shader
// ============================================================================

struct GlassUniforms {
    // Surface size in pixels
    size: vec2<f32>,
    // Corner radius in pixels (already clamped to the shape)
    corner_radius: f32,
    // Refraction band width in pixels
    edge_width: f32,
    distortion_strength: f32,
    // 1.0 for dark appearance
    is_dark: f32,
    // Device pixels per point
    scale: f32,
    _pad: f32,
    // (shadow radius px, shadow opacity, chroma multiplier, rim intensity)
    aux: vec4<f32>,
}

@group(0) @binding(0) var<uniform> uniforms: GlassUniforms;
@group(0) @binding(1) var backdrop_texture: texture_2d<f32>;
@group(0) @binding(2) var backdrop_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

const GRADIENT_EPSILON: f32 = 0.5;
const LIGHT_LIFT: f32 = 0.18;
const LIGHT_DAMPING: f32 = 0.6;
const DARK_FLOOR: f32 = 0.12;
const DARK_MIX: f32 = 0.8;
const CHROMA_SPREAD: f32 = 0.08;
const RIM_MIX: f32 = 0.45;
const WHITE_RIM: vec3<f32> = vec3<f32>(1.0, 1.0, 1.0);
const BLUE_RIM: vec3<f32> = vec3<f32>(0.55, 0.7, 1.0);
const LIGHT_DIRECTION: vec2<f32> = vec2<f32>(-0.70710678, -0.70710678);

// ============================================================================
// Vertex Shader
// ============================================================================

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    // Strip order: (0,0) (1,0) (0,1) (1,1)
    let uv = vec2<f32>(f32(vertex_index & 1u), f32(vertex_index >> 1u));
    var out: VertexOutput;
    out.position = vec4<f32>(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0, 0.0, 1.0);
    out.uv = uv;
    return out;
}

// ============================================================================
// Shape
// ============================================================================

fn rounded_rect_sdf(p: vec2<f32>, half_size: vec2<f32>, radius: f32) -> f32 {
    let q = abs(p) - half_size + vec2<f32>(radius);
    return min(max(q.x, q.y), 0.0) + length(max(q, vec2<f32>(0.0))) - radius;
}

fn sdf_gradient(p: vec2<f32>, half_size: vec2<f32>, radius: f32) -> vec2<f32> {
    let ex = vec2<f32>(GRADIENT_EPSILON, 0.0);
    let ey = vec2<f32>(0.0, GRADIENT_EPSILON);
    let g = vec2<f32>(
        rounded_rect_sdf(p + ex, half_size, radius) - rounded_rect_sdf(p - ex, half_size, radius),
        rounded_rect_sdf(p + ey, half_size, radius) - rounded_rect_sdf(p - ey, half_size, radius),
    );
    let len = length(g);
    if (len < 1e-4) {
        return vec2<f32>(0.0, -1.0);
    }
    return g / len;
}

fn edge_norm(d: f32, edge_width: f32) -> f32 {
    if (edge_width <= 0.0) {
        return 1.0;
    }
    return clamp(-d / edge_width, 0.0, 1.0);
}

fn lens_falloff(norm: f32) -> f32 {
    let t = 1.0 - clamp(norm, 0.0, 1.0);
    return 1.0 - sqrt(max(1.0 - t * t, 0.0));
}

fn aberration_weight(norm: f32) -> f32 {
    let t = 1.0 - clamp(norm, 0.0, 1.0);
    return t * t;
}

// ============================================================================
// Color
// ============================================================================

fn srgb_to_linear(c: vec3<f32>) -> vec3<f32> {
    let lo = c / 12.92;
    let hi = pow((max(c, vec3<f32>(0.0)) + vec3<f32>(0.055)) / 1.055, vec3<f32>(2.4));
    return select(hi, lo, c <= vec3<f32>(0.04045));
}

fn linear_to_srgb(c: vec3<f32>) -> vec3<f32> {
    let lo = c * 12.92;
    let hi = 1.055 * pow(max(c, vec3<f32>(0.0)), vec3<f32>(1.0 / 2.4)) - vec3<f32>(0.055);
    return select(hi, lo, c <= vec3<f32>(0.0031308));
}

fn luma(c: vec3<f32>) -> f32 {
    return dot(c, vec3<f32>(0.2126, 0.7152, 0.0722));
}

fn tone_map(c: vec3<f32>, is_dark: bool) -> vec3<f32> {
    if (is_dark) {
        let gray = vec3<f32>(DARK_FLOOR);
        return clamp(gray + (c - gray) * DARK_MIX, vec3<f32>(0.0), vec3<f32>(1.0));
    }
    let l = clamp(luma(c), 0.0, 1.0);
    let damping = 1.0 - l * l * LIGHT_DAMPING;
    return clamp(c + (vec3<f32>(1.0) - c) * LIGHT_LIFT * damping, vec3<f32>(0.0), vec3<f32>(1.0));
}

// rgb = rim color, a = strength
fn rim_light(normal: vec2<f32>, norm: f32, intensity: f32) -> vec4<f32> {
    let facing = dot(normal, LIGHT_DIRECTION);
    let color = mix(BLUE_RIM, WHITE_RIM, facing * 0.5 + 0.5);
    let strength = pow(1.0 - clamp(norm, 0.0, 1.0), 3.0) * max(intensity, 0.0);
    return vec4<f32>(color, strength);
}

fn sample_backdrop(uv: vec2<f32>) -> vec4<f32> {
    return textureSampleLevel(backdrop_texture, backdrop_sampler, clamp(uv, vec2<f32>(0.0), vec2<f32>(1.0)), 0.0);
}

// ============================================================================
// Fragment Shader
// ============================================================================

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let size = uniforms.size;
    let shadow_radius = max(uniforms.aux.x, 0.0);
    let shadow_opacity = clamp(uniforms.aux.y, 0.0, 1.0);

    // The shadow band is carved out of the surface bounds
    let shape_half = max(size * 0.5 - vec2<f32>(shadow_radius), vec2<f32>(0.0));
    let radius = min(uniforms.corner_radius, min(shape_half.x, shape_half.y));
    let p = in.uv * size - size * 0.5;
    let d = rounded_rect_sdf(p, shape_half, radius);

    var shadow_alpha = 0.0;
    if (d > 0.5) {
        if (shadow_radius <= 0.0 || d >= shadow_radius) {
            discard;
        }
        let t = 1.0 - d / shadow_radius;
        shadow_alpha = shadow_opacity * t * t;
    }

    // (a) lens refraction
    let norm = edge_norm(d, uniforms.edge_width);
    let normal = sdf_gradient(p, shape_half, radius);
    let lens = lens_falloff(norm);
    let refraction = -normal * lens * uniforms.distortion_strength * uniforms.edge_width / size;

    // (b) chromatic aberration
    let ca = aberration_weight(norm) * CHROMA_SPREAD * uniforms.aux.z;
    let green = sample_backdrop(in.uv + refraction);
    let red = sample_backdrop(in.uv + refraction * (1.0 + ca)).r;
    let blue = sample_backdrop(in.uv + refraction * (1.0 - ca)).b;

    // Backdrop is premultiplied
    let backdrop = vec3<f32>(red, green.g, blue) / max(green.a, 1e-4);

    // (c) tone curve in linear space
    var color = tone_map(srgb_to_linear(clamp(backdrop, vec3<f32>(0.0), vec3<f32>(1.0))), uniforms.is_dark > 0.5);

    // (d) rim light
    let rim = rim_light(normal, norm, uniforms.aux.w);
    color = mix(color, rim.rgb, clamp(rim.a * RIM_MIX, 0.0, 1.0));
    color = linear_to_srgb(color);

    // (e) composite over the shadow (black)
    let coverage = clamp(0.5 - d, 0.0, 1.0);
    let alpha = coverage + shadow_alpha * (1.0 - coverage);
    let rgb = color * coverage / max(alpha, 1e-4);
    return clamp(vec4<f32>(rgb, alpha), vec4<f32>(0.0), vec4<f32>(1.0));
}
"#;

/// WGSL shader for one separable Gaussian pass
pub const BLUR_SHADER: &str = r#"
// ============================================================================
// Lucent Separable Gaussian Blur
// ============================================================================

struct BlurUniforms {
    // (1, 0) horizontal or (0, 1) vertical
    direction: vec2<f32>,
    texel_size: vec2<f32>,
    // Taps on each side of the center
    taps: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
    // Half-kernel weights, center first, packed four per vec4
    weights: array<vec4<f32>, 16>,
}

@group(0) @binding(0) var<uniform> blur: BlurUniforms;
@group(0) @binding(1) var input_texture: texture_2d<f32>;
@group(0) @binding(2) var input_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    let uv = vec2<f32>(f32(vertex_index & 1u), f32(vertex_index >> 1u));
    var out: VertexOutput;
    out.position = vec4<f32>(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0, 0.0, 1.0);
    out.uv = uv;
    return out;
}

fn weight(i: u32) -> f32 {
    return blur.weights[i / 4u][i % 4u];
}

@fragment
fn fs_gaussian(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel_step = blur.direction * blur.texel_size;
    var sum = textureSampleLevel(input_texture, input_sampler, in.uv, 0.0) * weight(0u);
    for (var i = 1u; i <= blur.taps; i = i + 1u) {
        let offset = texel_step * f32(i);
        let pair = textureSampleLevel(input_texture, input_sampler, in.uv + offset, 0.0)
            + textureSampleLevel(input_texture, input_sampler, in.uv - offset, 0.0);
        sum = sum + pair * weight(i);
    }
    return sum;
}
"#;
