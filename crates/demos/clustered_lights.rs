//! Clustered lighting showcase
//!
//! A field of cubes over a ground plane, lit by a grid of animated colored
//! point lights plus one shadowing directional light. All scene content is
//! driven by a `Scene` struct – nothing is hardcoded in the renderer.
//!
//! Controls:
//!   WASD        – move forward/left/back/right
//!   Space/Shift – move up/down
//!   Mouse drag  – look around (click to grab cursor)
//!   Tab         – toggle depth-slice visualization
//!   Escape      – release cursor / exit

use lucerna::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowId},
};

const LIGHT_GRID: i32 = 4;

fn main() {
    env_logger::init();
    log::info!("Starting Lucerna clustered lighting demo");

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    let mut app = App { state: None };

    event_loop.run_app(&mut app).expect("Event loop error");
}

struct App {
    state: Option<AppState>,
}

struct AppState {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    surface_format: wgpu::TextureFormat,
    renderer: Renderer,
    last_frame: std::time::Instant,
    time: f32,
    meshes: Vec<GpuMesh>,
    ground: GpuMesh,
    debug_slices: bool,

    // Free-camera state
    cam_pos: glam::Vec3,
    cam_yaw: f32,
    cam_pitch: f32,
    keys: HashSet<KeyCode>,
    cursor_grabbed: bool,
    mouse_delta: (f32, f32),
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let window = Arc::new(
            event_loop
                .create_window(
                    Window::default_attributes()
                        .with_title("Lucerna – Clustered Lights")
                        .with_inner_size(winit::dpi::LogicalSize::new(1280u32, 720u32)),
                )
                .expect("Failed to create window"),
        );

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .expect("Failed to create surface");

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .expect("Failed to find adapter");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Main Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        ))
        .expect("Failed to create device");

        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let size = window.inner_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = Renderer::new(
            device.clone(),
            queue.clone(),
            RendererConfig {
                width: size.width,
                height: size.height,
                surface_format,
            },
        )
        .expect("Failed to create renderer");

        // A small city block of cubes for the lights to play over
        let mut meshes = Vec::new();
        for gx in -3i32..=3 {
            for gz in -3i32..=3 {
                if (gx + gz) % 2 == 0 {
                    let height = 0.4 + ((gx * 7 + gz * 13).rem_euclid(5)) as f32 * 0.35;
                    meshes.push(GpuMesh::cube(
                        &device,
                        [gx as f32 * 3.0, height, gz as f32 * 3.0],
                        height,
                    ));
                }
            }
        }
        let ground = GpuMesh::plane(&device, [0.0, 0.0, 0.0], 14.0);

        self.state = Some(AppState {
            window,
            surface,
            device,
            surface_format,
            renderer,
            last_frame: std::time::Instant::now(),
            time: 0.0,
            meshes,
            ground,
            debug_slices: false,
            cam_pos: glam::Vec3::new(0.0, 4.0, 14.0),
            cam_yaw: 0.0,
            cam_pitch: -0.25,
            keys: HashSet::new(),
            cursor_grabbed: false,
            mouse_delta: (0.0, 0.0),
        });
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(state) = &mut self.state else { return };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Shutting down");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => {
                if state.cursor_grabbed {
                    state.cursor_grabbed = false;
                    let _ = state.window.set_cursor_grab(CursorGrabMode::None);
                    state.window.set_cursor_visible(true);
                } else {
                    event_loop.exit();
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Tab),
                        ..
                    },
                ..
            } => {
                state.debug_slices = !state.debug_slices;
                state.renderer.set_debug_slices(state.debug_slices);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ks,
                        physical_key: PhysicalKey::Code(key),
                        ..
                    },
                ..
            } => match ks {
                ElementState::Pressed => {
                    state.keys.insert(key);
                }
                ElementState::Released => {
                    state.keys.remove(&key);
                }
            },
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if !state.cursor_grabbed {
                    let grabbed = state
                        .window
                        .set_cursor_grab(CursorGrabMode::Confined)
                        .or_else(|_| state.window.set_cursor_grab(CursorGrabMode::Locked))
                        .is_ok();
                    if grabbed {
                        state.window.set_cursor_visible(false);
                        state.cursor_grabbed = true;
                    }
                }
            }
            WindowEvent::Resized(size) if size.width > 0 && size.height > 0 => {
                let config = wgpu::SurfaceConfiguration {
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    format: state.surface_format,
                    width: size.width,
                    height: size.height,
                    present_mode: wgpu::PresentMode::Fifo,
                    alpha_mode: wgpu::CompositeAlphaMode::Auto,
                    view_formats: vec![],
                    desired_maximum_frame_latency: 2,
                };
                state.surface.configure(&state.device, &config);
                state.renderer.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                let now = std::time::Instant::now();
                let dt = (now - state.last_frame).as_secs_f32();
                state.last_frame = now;
                state.render(dt);
                state.window.request_redraw();
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        let Some(state) = &mut self.state else { return };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if state.cursor_grabbed {
                state.mouse_delta.0 += dx as f32;
                state.mouse_delta.1 += dy as f32;
            }
        }
    }

    fn about_to_wait(&mut self, _: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }
}

impl AppState {
    fn render(&mut self, dt: f32) {
        const SPEED: f32 = 6.0;
        const LOOK_SENS: f32 = 0.002;

        self.time += dt;

        // Mouse look – yaw left/right, pitch up/down
        self.cam_yaw += self.mouse_delta.0 * LOOK_SENS;
        self.cam_pitch = (self.cam_pitch + self.mouse_delta.1 * LOOK_SENS).clamp(-1.5, 1.5);
        self.mouse_delta = (0.0, 0.0);

        // Standard FPS basis: yaw=0 looks down -Z
        let (sy, cy) = self.cam_yaw.sin_cos();
        let (sp, cp) = self.cam_pitch.sin_cos();
        let forward = glam::Vec3::new(sy * cp, sp, -cy * cp);
        let right = glam::Vec3::new(cy, 0.0, sy);
        let up = glam::Vec3::Y;

        if self.keys.contains(&KeyCode::KeyW) {
            self.cam_pos += forward * SPEED * dt;
        }
        if self.keys.contains(&KeyCode::KeyS) {
            self.cam_pos -= forward * SPEED * dt;
        }
        if self.keys.contains(&KeyCode::KeyA) {
            self.cam_pos -= right * SPEED * dt;
        }
        if self.keys.contains(&KeyCode::KeyD) {
            self.cam_pos += right * SPEED * dt;
        }
        if self.keys.contains(&KeyCode::Space) {
            self.cam_pos += up * SPEED * dt;
        }
        if self.keys.contains(&KeyCode::ShiftLeft) {
            self.cam_pos -= up * SPEED * dt;
        }

        let size = self.window.inner_size();
        let aspect = size.width as f32 / size.height.max(1) as f32;

        let mut camera =
            Camera::new_perspective(std::f32::consts::FRAC_PI_4, aspect, 0.1, 2000.0);
        camera.position = self.cam_pos;
        camera.look_at(self.cam_pos + forward, glam::Vec3::Y);

        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(e) => {
                log::warn!("Surface error: {:?}", e);
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // ── Build scene ────────────────────────────────────────────────────────
        let mut sun = DirectionalLight::new(glam::Vec3::new(-0.4, -1.0, -0.3));
        sun.common.color = glam::Vec3::new(1.0, 0.96, 0.88);
        sun.common.strength = 1.4;
        sun.common.z_near = 1.0;
        sun.common.z_far = 300.0;
        sun.distance = 80.0;
        sun.ortho_box_size = 30.0;

        let mut scene = Scene::new()
            .with_sky([0.02, 0.03, 0.05])
            .with_ambient([0.4, 0.45, 0.6], 0.08)
            .with_directional_light(sun)
            .add_object(self.ground.clone());
        for mesh in &self.meshes {
            scene = scene.add_object(mesh.clone());
        }

        // A drifting grid of colored lights
        for ix in 0..LIGHT_GRID {
            for iz in 0..LIGHT_GRID {
                let phase = self.time * 0.6 + (ix * LIGHT_GRID + iz) as f32 * 0.7;
                let x = (ix - LIGHT_GRID / 2) as f32 * 6.0 + phase.sin() * 1.5;
                let z = (iz - LIGHT_GRID / 2) as f32 * 6.0 + phase.cos() * 1.5;
                let hue = (ix * LIGHT_GRID + iz) as f32 / (LIGHT_GRID * LIGHT_GRID) as f32;

                let mut light = PointLight::new(glam::Vec3::new(x, 1.8, z));
                light.common.color = glam::Vec3::new(
                    0.5 + 0.5 * (hue * std::f32::consts::TAU).sin(),
                    0.5 + 0.5 * (hue * std::f32::consts::TAU + 2.1).sin(),
                    0.5 + 0.5 * (hue * std::f32::consts::TAU + 4.2).sin(),
                );
                light.common.strength = 4.0;
                light.common.z_near = 0.1;
                light.common.z_far = 40.0;
                light.common.shadow_resolution = 512;
                light.range = 9.0;
                scene = scene.add_point_light(light);
            }
        }

        if let Err(e) = self.renderer.render_scene(&scene, &camera, &view, dt) {
            log::error!("Render error: {:?}", e);
        }

        output.present();
    }
}
