//! Scene description viewer
//!
//! Loads a JSON scene description (camera + lights), places it over a small
//! courtyard of cubes, and renders it. Pass a path to view your own scene
//! file; with no arguments the bundled courtyard scene is shown. A bad
//! description aborts startup with a message naming the problem.
//!
//! Light strength is pulsed per frame to show that mutating light fields
//! needs no reload.
//!
//! Controls:
//!   Tab    – toggle depth-slice visualization
//!   Escape – exit

use lucerna::prelude::*;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

fn main() {
    env_logger::init();
    log::info!("Starting Lucerna scene viewer");

    let config = match std::env::args().nth(1) {
        Some(path) => SceneConfig::from_path(&path).expect("Failed to read scene description"),
        None => SceneConfig::from_json(include_str!("scenes/courtyard.json"))
            .expect("Bundled scene description is valid"),
    };
    let (camera, lights) = config.build().expect("Scene description rejected");

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    let mut app = App {
        state: None,
        camera,
        lights,
    };

    event_loop.run_app(&mut app).expect("Event loop error");
}

struct App {
    state: Option<AppState>,
    camera: Camera,
    lights: SceneLights,
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
                        .with_title("Lucerna – Scene Viewer")
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

        // A courtyard: a ring of pillars around a center block
        let mut meshes = vec![GpuMesh::cube(&device, [0.0, 1.0, 0.0], 1.0)];
        for i in 0..8 {
            let angle = i as f32 / 8.0 * std::f32::consts::TAU;
            meshes.push(GpuMesh::cube(
                &device,
                [angle.cos() * 7.0, 1.5, angle.sin() * 7.0],
                0.6,
            ));
        }
        let ground = GpuMesh::plane(&device, [0.0, 0.0, 0.0], 16.0);

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
                        physical_key: PhysicalKey::Code(key),
                        ..
                    },
                ..
            } => match key {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::Tab => {
                    state.debug_slices = !state.debug_slices;
                    state.renderer.set_debug_slices(state.debug_slices);
                }
                _ => {}
            },
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
                self.camera
                    .set_aspect_ratio(size.width as f32 / size.height as f32);
            }
            WindowEvent::RedrawRequested => {
                let now = std::time::Instant::now();
                let dt = (now - state.last_frame).as_secs_f32();
                state.last_frame = now;
                state.time += dt;

                let output = match state.surface.get_current_texture() {
                    Ok(t) => t,
                    Err(e) => {
                        log::warn!("Surface error: {:?}", e);
                        return;
                    }
                };
                let view = output
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());

                let mut scene = Scene::new()
                    .with_sky([0.02, 0.03, 0.05])
                    .with_ambient([0.4, 0.45, 0.6], 0.08)
                    .with_directional_light(self.lights.directional)
                    .add_object(state.ground.clone());
                for mesh in &state.meshes {
                    scene = scene.add_object(mesh.clone());
                }
                for (index, light) in self.lights.points.iter().enumerate() {
                    let mut light = *light;
                    let pulse = (state.time * 1.3 + index as f32).sin() * 0.3 + 1.0;
                    light.common.strength *= pulse;
                    scene = scene.add_point_light(light);
                }

                if let Err(e) = state.renderer.render_scene(&scene, &self.camera, &view, dt) {
                    log::error!("Render error: {:?}", e);
                }

                output.present();
                state.window.request_redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }
}
