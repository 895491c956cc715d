//! SDF-based WebGPU pipeline for the game scene
//!
//! Renders the entire scene in the fragment shader using signed distance
//! fields; the CPU side only uploads entity data each frame.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::consts::{CANNON_BARREL_LENGTH, CANNON_BASE_RADIUS};
use crate::sim::GameState;

/// Maximum enemies drawn per frame
const MAX_ENEMIES: usize = 64;
/// Maximum bullets drawn per frame
const MAX_BULLETS: usize = 64;
/// Maximum rockets drawn per frame
const MAX_ROCKETS: usize = 16;
/// Maximum particles drawn per frame
const MAX_PARTICLES: usize = 256;
/// Maximum trail points drawn per frame (all projectiles pooled)
const MAX_TRAIL: usize = 1024;

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    resolution: [f32; 2],  // offset 0 - physical pixels
    bounds: [f32; 2],      // offset 8 - sim space (CSS pixels)
    time: f32,             // offset 16
    cannon_angle: f32,     // offset 20
    cannon_pos: [f32; 2],  // offset 24 (8-byte aligned for WGSL vec2)
    barrel_length: f32,    // offset 32
    base_radius: f32,      // offset 36
    enemy_count: u32,      // offset 40
    bullet_count: u32,     // offset 44
    rocket_count: u32,     // offset 48
    particle_count: u32,   // offset 52
    trail_count: u32,      // offset 56
    _pad: u32,             // pad to 64 bytes
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct EnemyData {
    pos: [f32; 2],  // offset 0
    radius: f32,    // offset 8
    rotation: f32,  // offset 12
    color: u32,     // offset 16 - packed 0xRRGGBB
    _pad: [u32; 3], // pad to 32 bytes
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct BulletData {
    pos: [f32; 2], // offset 0
    radius: f32,   // offset 8
    life: f32,     // offset 12
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct RocketData {
    pos: [f32; 2],  // offset 0
    heading: f32,   // offset 8
    radius: f32,    // offset 12
    life: f32,      // offset 16
    _pad: [f32; 3], // pad to 32 bytes
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct TrailPointData {
    pos: [f32; 2], // offset 0
    alpha: f32,    // offset 8
    kind: u32,     // offset 12 - 0 = bullet, 1 = rocket
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct ParticleData {
    pos: [f32; 2],  // offset 0
    size: f32,      // offset 8
    life: f32,      // offset 12
    color: u32,     // offset 16 - packed 0xRRGGBB
    _pad: [u32; 3], // pad to 32 bytes
}

// ============================================================================
// SCENE RENDER STATE
// ============================================================================

pub struct SceneRenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub pipeline: wgpu::RenderPipeline,

    globals_buffer: wgpu::Buffer,
    enemies_buffer: wgpu::Buffer,
    bullets_buffer: wgpu::Buffer,
    rockets_buffer: wgpu::Buffer,
    trail_buffer: wgpu::Buffer,
    particles_buffer: wgpu::Buffer,

    bind_group: wgpu::BindGroup,

    pub size: (u32, u32),
}

impl SceneRenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
    ) -> Self {
        let (device, queue) = super::request_device(adapter).await;
        let config = super::configure_surface(&surface, adapter, &device, width, height);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("scene_shader.wgsl").into()),
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals {
                resolution: [width as f32, height as f32],
                bounds: [width as f32, height as f32],
                time: 0.0,
                cannon_angle: 0.0,
                cannon_pos: [0.0, 0.0],
                barrel_length: CANNON_BARREL_LENGTH,
                base_radius: CANNON_BASE_RADIUS,
                enemy_count: 0,
                bullet_count: 0,
                rocket_count: 0,
                particle_count: 0,
                trail_count: 0,
                _pad: 0,
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let enemies_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("enemies"),
            size: (std::mem::size_of::<EnemyData>() * MAX_ENEMIES) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bullets_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("bullets"),
            size: (std::mem::size_of::<BulletData>() * MAX_BULLETS) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let rockets_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("rockets"),
            size: (std::mem::size_of::<RocketData>() * MAX_ROCKETS) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let trail_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("trail"),
            size: (std::mem::size_of::<TrailPointData>() * MAX_TRAIL) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let particles_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("particles"),
            size: (std::mem::size_of::<ParticleData>() * MAX_PARTICLES) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let storage_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                storage_entry(1),
                storage_entry(2),
                storage_entry(3),
                storage_entry(4),
                storage_entry(5),
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: enemies_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: bullets_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: rockets_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: trail_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: particles_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[], // No vertex buffers - fullscreen triangle
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            globals_buffer,
            enemies_buffer,
            bullets_buffer,
            rockets_buffer,
            trail_buffer,
            particles_buffer,
            bind_group,
            size: (width, height),
        }
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Update GPU buffers from game state and render
    pub fn render(&mut self, state: &GameState, time: f64) -> Result<(), wgpu::SurfaceError> {
        // time is ms since page load from requestAnimationFrame
        let elapsed = (time / 1000.0) as f32;

        let enemy_count = state.enemies.len().min(MAX_ENEMIES) as u32;
        let bullet_count = state.bullets.len().min(MAX_BULLETS) as u32;
        let rocket_count = state.rockets.len().min(MAX_ROCKETS) as u32;
        let particle_count = state.particles.len().min(MAX_PARTICLES) as u32;

        // Update enemies
        let mut enemies_data = [EnemyData::zeroed(); MAX_ENEMIES];
        for (i, (_, enemy)) in state.enemies.iter().take(MAX_ENEMIES).enumerate() {
            enemies_data[i] = EnemyData {
                pos: [enemy.pos.x, enemy.pos.y],
                radius: enemy.radius,
                rotation: enemy.rotation,
                color: enemy.color,
                _pad: [0; 3],
            };
        }
        self.queue
            .write_buffer(&self.enemies_buffer, 0, bytemuck::cast_slice(&enemies_data));

        // Update bullets
        let mut bullets_data = [BulletData::zeroed(); MAX_BULLETS];
        for (i, (_, bullet)) in state.bullets.iter().take(MAX_BULLETS).enumerate() {
            bullets_data[i] = BulletData {
                pos: [bullet.pos.x, bullet.pos.y],
                radius: bullet.radius,
                life: bullet.life,
            };
        }
        self.queue
            .write_buffer(&self.bullets_buffer, 0, bytemuck::cast_slice(&bullets_data));

        // Update rockets
        let mut rockets_data = [RocketData::zeroed(); MAX_ROCKETS];
        for (i, (_, rocket)) in state.rockets.iter().take(MAX_ROCKETS).enumerate() {
            rockets_data[i] = RocketData {
                pos: [rocket.pos.x, rocket.pos.y],
                heading: rocket.heading,
                radius: rocket.radius,
                life: rocket.life,
                _pad: [0.0; 3],
            };
        }
        self.queue
            .write_buffer(&self.rockets_buffer, 0, bytemuck::cast_slice(&rockets_data));

        // Update trails: bullets first, then rockets, fading toward the tail
        let mut trail_data = vec![TrailPointData::zeroed(); MAX_TRAIL];
        let mut trail_idx = 0;
        for (_, bullet) in state.bullets.iter() {
            for (i, point) in bullet.trail.iter().enumerate() {
                if trail_idx >= MAX_TRAIL {
                    break;
                }
                trail_data[trail_idx] = TrailPointData {
                    pos: [point.x, point.y],
                    alpha: 1.0 - (i as f32 / bullet.trail.len().max(1) as f32),
                    kind: 0,
                };
                trail_idx += 1;
            }
        }
        for (_, rocket) in state.rockets.iter() {
            for (i, point) in rocket.trail.iter().enumerate() {
                if trail_idx >= MAX_TRAIL {
                    break;
                }
                trail_data[trail_idx] = TrailPointData {
                    pos: [point.x, point.y],
                    alpha: 1.0 - (i as f32 / rocket.trail.len().max(1) as f32),
                    kind: 1,
                };
                trail_idx += 1;
            }
        }
        self.queue
            .write_buffer(&self.trail_buffer, 0, bytemuck::cast_slice(&trail_data));

        // Update particles
        let mut particles_data = vec![ParticleData::zeroed(); MAX_PARTICLES];
        for (i, (_, particle)) in state.particles.iter().take(MAX_PARTICLES).enumerate() {
            particles_data[i] = ParticleData {
                pos: [particle.pos.x, particle.pos.y],
                size: particle.size,
                life: particle.life,
                color: particle.color,
                _pad: [0; 3],
            };
        }
        self.queue.write_buffer(
            &self.particles_buffer,
            0,
            bytemuck::cast_slice(&particles_data),
        );

        // Update globals
        let globals = Globals {
            resolution: [self.size.0 as f32, self.size.1 as f32],
            bounds: [state.bounds.x, state.bounds.y],
            time: elapsed,
            cannon_angle: state.cannon.angle,
            cannon_pos: [state.cannon.pos.x, state.cannon.pos.y],
            barrel_length: CANNON_BARREL_LENGTH,
            base_radius: CANNON_BASE_RADIUS,
            enemy_count,
            bullet_count,
            rocket_count,
            particle_count,
            trail_count: trail_idx as u32,
            _pad: 0,
        };
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

        // Render
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..3, 0..1); // Fullscreen triangle
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
