//! GPU simulation backend.
//!
//! Particles live in one storage buffer. A compute pass advances them each
//! update and an instanced render pass reads the same buffer as read-only
//! storage, so nothing is read back to the CPU in steady state.

mod shaders;

use std::sync::Arc;

use wgpu::util::DeviceExt;

pub use shaders::{compute_shader, render_shader};
use shaders::{RenderUniforms, SimParams};

use crate::backend::FrameParams;
use crate::canvas::BlendMode;
use crate::config::SwarmConfig;
use crate::error::GpuError;
use crate::model::HomePositions;
use crate::particle::Particle;
use crate::reactions::ModifierBundle;
use crate::wave::WaveField;

const WORKGROUP_SIZE: u32 = 256;

/// Device and queue shared with the host renderer.
#[derive(Clone, Debug)]
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
}

impl GpuContext {
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        Self { device, queue }
    }

    /// Negotiate an adapter and device, optionally compatible with a surface.
    ///
    /// The adapter is returned so callers can query surface capabilities.
    pub async fn request(
        instance: &wgpu::Instance,
        compatible_surface: Option<&wgpu::Surface<'_>>,
    ) -> Result<(Self, wgpu::Adapter), GpuError> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Swarm Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        log::info!("Using GPU adapter: {}", adapter.get_info().name);
        Ok((Self::new(Arc::new(device), Arc::new(queue)), adapter))
    }
}

/// Compute and render pipelines over a particle storage buffer.
pub struct GpuBackend {
    ctx: GpuContext,
    compute_pipeline: wgpu::ComputePipeline,
    homes_pipeline: wgpu::ComputePipeline,
    render_pipeline: wgpu::RenderPipeline,
    compute_bind_group: wgpu::BindGroup,
    render_bind_group: wgpu::BindGroup,
    params_buffer: wgpu::Buffer,
    render_uniform_buffer: wgpu::Buffer,
    homes_buffer: wgpu::Buffer,
    homes: Vec<[f32; 2]>,
    num_particles: u32,
    config: SwarmConfig,
    wave: WaveField,
    frame_seed: u32,
    wave_time: f32,
}

impl GpuBackend {
    /// Build buffers and pipelines for `particles`.
    ///
    /// Creation runs inside a validation error scope; shader or pipeline
    /// errors come back as [`GpuError::Validation`].
    pub fn new(
        ctx: &GpuContext,
        format: wgpu::TextureFormat,
        particles: &[Particle],
        config: &SwarmConfig,
    ) -> Result<Self, GpuError> {
        if particles.is_empty() {
            return Err(GpuError::EmptyParticles);
        }
        let device = &ctx.device;
        let num_particles = particles.len() as u32;

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let particle_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Buffer"),
            contents: bytemuck::cast_slice(particles),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });

        let homes: Vec<[f32; 2]> = particles.iter().map(|p| p.home).collect();
        let homes_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Home Staging Buffer"),
            contents: bytemuck::cast_slice(&homes),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });

        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sim Params Buffer"),
            contents: bytemuck::bytes_of(&SimParams::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let render_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Render Uniform Buffer"),
            contents: bytemuck::bytes_of(&RenderUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        // Compute: params, particles (rw), home staging (ro)
        let compute_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Compute Bind Group Layout"),
                entries: &[
                    buffer_entry(0, wgpu::ShaderStages::COMPUTE, wgpu::BufferBindingType::Uniform),
                    buffer_entry(
                        1,
                        wgpu::ShaderStages::COMPUTE,
                        wgpu::BufferBindingType::Storage { read_only: false },
                    ),
                    buffer_entry(
                        2,
                        wgpu::ShaderStages::COMPUTE,
                        wgpu::BufferBindingType::Storage { read_only: true },
                    ),
                ],
            });

        let compute_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Compute Bind Group"),
            layout: &compute_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: particle_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: homes_buffer.as_entire_binding(),
                },
            ],
        });

        // Render: uniforms, particles (ro)
        let render_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Render Bind Group Layout"),
                entries: &[
                    buffer_entry(0, wgpu::ShaderStages::VERTEX, wgpu::BufferBindingType::Uniform),
                    buffer_entry(
                        1,
                        wgpu::ShaderStages::VERTEX,
                        wgpu::BufferBindingType::Storage { read_only: true },
                    ),
                ],
            });

        let render_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Render Bind Group"),
            layout: &render_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: render_uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: particle_buffer.as_entire_binding(),
                },
            ],
        });

        // Compute pipelines
        let compute_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Compute Shader"),
            source: wgpu::ShaderSource::Wgsl(compute_shader(config).into()),
        });

        let compute_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Compute Pipeline Layout"),
                bind_group_layouts: &[&compute_bind_group_layout],
                push_constant_ranges: &[],
            });

        let compute_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Compute Pipeline"),
            layout: Some(&compute_pipeline_layout),
            module: &compute_module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let homes_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Apply Homes Pipeline"),
            layout: Some(&compute_pipeline_layout),
            module: &compute_module,
            entry_point: Some("apply_homes"),
            compilation_options: Default::default(),
            cache: None,
        });

        // Render pipeline
        let render_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Render Shader"),
            source: wgpu::ShaderSource::Wgsl(render_shader(config).into()),
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&render_bind_group_layout],
                push_constant_ranges: &[],
            });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &render_module,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &render_module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(BlendMode::Additive.to_wgpu()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(GpuError::Validation(error.to_string()));
        }

        log::debug!("GPU backend ready with {} particles", num_particles);

        Ok(Self {
            ctx: ctx.clone(),
            compute_pipeline,
            homes_pipeline,
            render_pipeline,
            compute_bind_group,
            render_bind_group,
            params_buffer,
            render_uniform_buffer,
            homes_buffer,
            homes,
            num_particles,
            config: config.clone(),
            wave: WaveField::new(config.wave),
            frame_seed: 0,
            wave_time: 0.0,
        })
    }

    pub fn particle_count(&self) -> u32 {
        self.num_particles
    }

    /// Home offsets as last uploaded.
    pub fn homes(&self) -> &[[f32; 2]] {
        &self.homes
    }

    /// Write this frame's parameters and dispatch the simulation pass.
    pub fn update(&mut self, frame: &FrameParams, modifiers: &ModifierBundle) {
        let params = SimParams {
            anchor: frame.target.to_array(),
            time: frame.breathe_time_ms(&self.config.breathe),
            wave_time: frame.wave_time(&self.config.wave),
            dt: frame.dt,
            breathe_speed: self.config.breathe.speed,
            breathe_amount: self.config.breathe.amount,
            spring_force: self.config.spring_force * frame.spring_scale,
            damping: self.config.damping,
            combo_glow: frame.combo_glow,
            color_shift: modifiers.color_shift,
            scale_burst: modifiers.scale_burst,
            velocity_burst: modifiers.velocity_burst,
            flicker_alpha: modifiers.flicker_alpha,
            music_intensity: frame.music_intensity,
            celebrate_hue: modifiers.celebrate_hue,
            particle_count: self.num_particles,
            canvas: self.config.canvas.to_array(),
            wave_amplitude: self.wave.amplitude(frame.music_intensity),
            frame_seed: self.frame_seed,
            size_min: self.config.size_min,
            size_range: self.config.size_range,
            _padding: 0.0,
        };
        self.ctx
            .queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));

        self.dispatch(&self.compute_pipeline, "Compute Pass");

        self.frame_seed = self.frame_seed.wrapping_add(1);
        self.wave_time = frame.wave_time(&self.config.wave);
    }

    /// Upload new home offsets and copy them into the particle buffer.
    ///
    /// Positions and velocities are left alone, so particles spring toward
    /// the new shape on the following updates.
    pub fn write_home_positions(&mut self, homes: &HomePositions) {
        for (slot, home) in self.homes.iter_mut().zip(homes.iter()) {
            *slot = home.to_array();
        }
        self.ctx
            .queue
            .write_buffer(&self.homes_buffer, 0, bytemuck::cast_slice(&self.homes));

        self.dispatch(&self.homes_pipeline, "Apply Homes Pass");
    }

    /// Record the particle draw into a pass owned by the host.
    ///
    /// The pass must target the format given to [`GpuBackend::new`] and have
    /// no depth attachment.
    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>, modifiers: &ModifierBundle, combo_glow: f32) {
        let uniforms = RenderUniforms {
            canvas: self.config.canvas.to_array(),
            time: self.wave_time,
            combo_glow,
            color_shift: modifiers.color_shift,
            flicker_alpha: modifiers.flicker_alpha,
            celebrate_hue: modifiers.celebrate_hue,
            _padding: 0.0,
        };
        self.ctx
            .queue
            .write_buffer(&self.render_uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        pass.set_pipeline(&self.render_pipeline);
        pass.set_bind_group(0, &self.render_bind_group, &[]);
        pass.draw(0..6, 0..self.num_particles);
    }

    fn dispatch(&self, pipeline: &wgpu::ComputePipeline, label: &str) {
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Swarm Compute Encoder"),
            });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(label),
                timestamp_writes: None,
            });

            compute_pass.set_pipeline(pipeline);
            compute_pass.set_bind_group(0, &self.compute_bind_group, &[]);

            let workgroups = self.num_particles.div_ceil(WORKGROUP_SIZE);
            compute_pass.dispatch_workgroups(workgroups, 1, 1);
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
    }
}

fn buffer_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    ty: wgpu::BufferBindingType,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}
