//! WGSL generation for the GPU backend.
//!
//! Shaders are assembled from the config so wave sources and gradient stops
//! are baked in as constants. The uniform structs below are uploaded with
//! bytemuck and must match their WGSL declarations field for field.

use bytemuck::{Pod, Zeroable};

use crate::backend::{TARGET_LIFT, WAVE_X, WAVE_Y};
use crate::config::SwarmConfig;
use crate::particle::WGSL_STRUCT;
use crate::wave::WaveField;

/// Per-frame simulation parameters (96 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub(crate) struct SimParams {
    pub anchor: [f32; 2],
    /// Breathing clock in milliseconds, reduced to one period.
    pub time: f32,
    pub dt: f32,
    pub breathe_speed: f32,
    pub breathe_amount: f32,
    pub spring_force: f32,
    pub damping: f32,
    pub combo_glow: f32,
    pub color_shift: f32,
    pub scale_burst: f32,
    pub velocity_burst: f32,
    pub flicker_alpha: f32,
    pub music_intensity: f32,
    pub celebrate_hue: f32,
    pub particle_count: u32,
    pub canvas: [f32; 2],
    pub wave_amplitude: f32,
    pub frame_seed: u32,
    pub size_min: f32,
    pub size_range: f32,
    /// Wave clock in seconds, reduced to one period.
    pub wave_time: f32,
    pub _padding: f32,
}

const _: () = assert!(std::mem::size_of::<SimParams>() == 96);

const SIM_PARAMS_WGSL: &str = r#"struct SimParams {
    anchor: vec2<f32>,
    time: f32,
    dt: f32,
    breathe_speed: f32,
    breathe_amount: f32,
    spring_force: f32,
    damping: f32,
    combo_glow: f32,
    color_shift: f32,
    scale_burst: f32,
    velocity_burst: f32,
    flicker_alpha: f32,
    music_intensity: f32,
    celebrate_hue: f32,
    particle_count: u32,
    canvas: vec2<f32>,
    wave_amplitude: f32,
    frame_seed: u32,
    size_min: f32,
    size_range: f32,
    wave_time: f32,
    pad0: f32,
};"#;

/// Render-pass uniforms (32 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub(crate) struct RenderUniforms {
    pub canvas: [f32; 2],
    /// Wave time in seconds.
    pub time: f32,
    pub combo_glow: f32,
    pub color_shift: f32,
    pub flicker_alpha: f32,
    pub celebrate_hue: f32,
    pub _padding: f32,
}

const _: () = assert!(std::mem::size_of::<RenderUniforms>() == 32);

const RENDER_UNIFORMS_WGSL: &str = r#"struct RenderUniforms {
    canvas: vec2<f32>,
    time: f32,
    combo_glow: f32,
    color_shift: f32,
    flicker_alpha: f32,
    celebrate_hue: f32,
    pad0: f32,
};"#;

/// PCG hash, plus a helper that advances a seed and returns a float in [0, 1).
const RNG_WGSL: &str = r#"fn hash(n: u32) -> u32 {
    let state = n * 747796405u + 2891336453u;
    let word = ((state >> ((state >> 28u) + 4u)) ^ state) * 277803737u;
    return (word >> 22u) ^ word;
}

fn rand01(seed: ptr<function, u32>) -> f32 {
    *seed = hash(*seed);
    return f32(*seed >> 8u) / 16777216.0;
}"#;

/// Compute shader with two entry points: `main` advances every particle,
/// `apply_homes` copies the staging buffer into `particles[i].home`.
pub fn compute_shader(config: &SwarmConfig) -> String {
    let wave = WaveField::new(config.wave).to_wgsl();
    format!(
        r#"{particle}

{params}

@group(0) @binding(0) var<uniform> params: SimParams;
@group(0) @binding(1) var<storage, read_write> particles: array<Particle>;
@group(0) @binding(2) var<storage, read> homes: array<vec2<f32>>;

const TAU: f32 = 6.283185307179586;

{wave}

{rng}

@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) global_id: vec3<u32>) {{
    let index = global_id.x;
    if index >= params.particle_count {{
        return;
    }}

    var p = particles[index];
    var seed = index * 3u + params.frame_seed * 2654435769u;

    let breathe = sin(params.time * params.breathe_speed) * params.breathe_amount;
    let wave = interference(p.home, params.wave_time, p.phase) * params.wave_amplitude;
    let spring_target = vec2<f32>(
        params.anchor.x + p.home.x + wave * {wave_x:?},
        params.anchor.y - {lift:?} + p.home.y + breathe + wave * {wave_y:?},
    );

    p.velocity += (spring_target - p.position) * params.spring_force;
    if params.velocity_burst > 0.0 {{
        let angle = rand01(&seed) * TAU;
        p.velocity += vec2<f32>(cos(angle), sin(angle)) * rand01(&seed) * params.velocity_burst;
    }}
    p.velocity *= params.damping;
    p.position += p.velocity;
    p.size = params.size_min + rand01(&seed) * params.size_range + params.scale_burst;

    particles[index] = p;
}}

@compute @workgroup_size(256)
fn apply_homes(@builtin(global_invocation_id) global_id: vec3<u32>) {{
    let index = global_id.x;
    if index >= arrayLength(&homes) || index >= arrayLength(&particles) {{
        return;
    }}
    particles[index].home = homes[index];
}}
"#,
        particle = WGSL_STRUCT,
        params = SIM_PARAMS_WGSL,
        wave = wave,
        rng = RNG_WGSL,
        wave_x = WAVE_X,
        wave_y = WAVE_Y,
        lift = TARGET_LIFT,
    )
}

/// Instanced billboard shader. Six vertices per particle, soft round
/// sprites, colored by the same palette function the CPU path uses.
pub fn render_shader(config: &SwarmConfig) -> String {
    let wave = WaveField::new(config.wave).to_wgsl();
    let palette = config.palette.to_wgsl();
    format!(
        r#"{particle}

{uniforms_decl}

@group(0) @binding(0) var<uniform> uniforms: RenderUniforms;
@group(0) @binding(1) var<storage, read> particles: array<Particle>;

{wave}

{palette}

struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) uv: vec2<f32>,
}};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @builtin(instance_index) instance_index: u32,
) -> VertexOutput {{
    var quad = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );

    let p = particles[instance_index];
    let corner = quad[vertex_index];
    let pixel = p.position + corner * p.size * 0.5;
    let ndc = vec2<f32>(
        pixel.x / uniforms.canvas.x * 2.0 - 1.0,
        1.0 - pixel.y / uniforms.canvas.y * 2.0,
    );

    let wave = interference(p.home, uniforms.time, p.phase);

    var out: VertexOutput;
    out.clip_position = vec4<f32>(ndc, 0.0, 1.0);
    out.color = particle_color(
        p.color_blend,
        wave,
        p.phase,
        uniforms.color_shift,
        uniforms.combo_glow,
        uniforms.flicker_alpha,
        uniforms.celebrate_hue,
    );
    out.uv = corner;
    return out;
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let dist = length(in.uv);
    if dist > 1.0 {{
        discard;
    }}
    let soft = 1.0 - smoothstep(0.6, 1.0, dist);
    return vec4<f32>(in.color.rgb, in.color.a * soft);
}}
"#,
        particle = WGSL_STRUCT,
        uniforms_decl = RENDER_UNIFORMS_WGSL,
        wave = wave,
        palette = palette,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WaveConfig;

    /// Validates WGSL code using naga.
    fn validate_wgsl(code: &str) -> Result<(), String> {
        let module = naga::front::wgsl::parse_str(code)
            .map_err(|e| format!("WGSL parse error: {:?}", e))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| format!("WGSL validation error: {:?}", e))?;

        Ok(())
    }

    #[test]
    fn test_compute_shader_is_valid() {
        let shader = compute_shader(&SwarmConfig::default());
        validate_wgsl(&shader).expect("compute shader should be valid");
        assert!(shader.contains("fn main("));
        assert!(shader.contains("fn apply_homes("));
        assert!(shader.contains("@workgroup_size(256)"));
    }

    #[test]
    fn test_render_shader_is_valid() {
        let shader = render_shader(&SwarmConfig::default());
        validate_wgsl(&shader).expect("render shader should be valid");
        assert!(shader.contains("fn vs_main("));
        assert!(shader.contains("fn fs_main("));
    }

    #[test]
    fn test_compute_matches_cpu_equations() {
        let shader = compute_shader(&SwarmConfig::default());
        assert!(shader.contains("sin(params.time * params.breathe_speed) * params.breathe_amount"));
        assert!(shader.contains("interference(p.home, params.wave_time, p.phase) * params.wave_amplitude"));
        assert!(shader.contains("params.anchor.x + p.home.x + wave * 0.3"));
        assert!(shader.contains("params.anchor.y - 20.0 + p.home.y + breathe + wave * 0.2"));
        assert!(shader.contains("p.velocity += (spring_target - p.position) * params.spring_force"));
        assert!(shader.contains("p.velocity *= params.damping"));
        assert!(shader.contains("p.position += p.velocity"));
        assert!(shader.contains("params.size_min + rand01(&seed) * params.size_range + params.scale_burst"));
    }

    #[test]
    fn test_config_is_baked_in() {
        let config = SwarmConfig::default().with_wave(WaveConfig {
            frequency: 0.25,
            ..WaveConfig::default()
        });
        let compute = compute_shader(&config);
        let render = render_shader(&config);
        assert!(compute.contains("const WAVE_FREQ: f32 = 0.25;"));
        assert!(render.contains("const WAVE_FREQ: f32 = 0.25;"));
        validate_wgsl(&compute).expect("compute shader should be valid");
        validate_wgsl(&render).expect("render shader should be valid");
    }

    #[test]
    fn test_render_shader_uses_palette() {
        let shader = render_shader(&SwarmConfig::default());
        assert!(shader.contains("const GOLD"));
        assert!(shader.contains("particle_color("));
        assert!(shader.contains("discard"));
    }
}
