use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec3;
use shadelab_input::{InputSnapshot, Key};
use shadelab_render_wgpu::{Overlay, WgpuRenderer, request_device};
use shadelab_scene::{Scene, SceneConfig};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "shadelab-desktop", about = "Shadelab scene viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene file (YAML); the built-in scene when omitted
    #[arg(long)]
    scene: Option<PathBuf>,
}

fn map_key(code: KeyCode) -> Option<Key> {
    let key = match code {
        KeyCode::ArrowUp => Key::Up,
        KeyCode::ArrowDown => Key::Down,
        KeyCode::ArrowLeft => Key::Left,
        KeyCode::ArrowRight => Key::Right,
        KeyCode::KeyW => Key::W,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyI => Key::I,
        KeyCode::KeyJ => Key::J,
        KeyCode::KeyK => Key::K,
        KeyCode::KeyL => Key::L,
        KeyCode::KeyU => Key::U,
        KeyCode::KeyO => Key::O,
        KeyCode::Period => Key::Period,
        KeyCode::Comma => Key::Comma,
        KeyCode::Escape => Key::Escape,
        _ => return None,
    };
    Some(key)
}

/// Frame timing shown in the inspector.
struct FrameStats {
    last_frame: Instant,
    fps: f32,
}

impl FrameStats {
    fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            fps: 0.0,
        }
    }

    /// Seconds since the previous call, capped so a stall does not teleport
    /// controlled entities. Only call this for a frame that is rendered.
    fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> f32 {
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        if dt > 0.0 {
            self.fps = self.fps * 0.9 + (1.0 / dt) * 0.1;
        }
        dt.min(0.1)
    }
}

fn swatch(ui: &mut egui::Ui, colour: Vec3) {
    let (rect, _) = ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
    let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    ui.painter().rect_filled(
        rect,
        2.0,
        egui::Color32::from_rgb(to_u8(colour.x), to_u8(colour.y), to_u8(colour.z)),
    );
}

fn draw_ui(ctx: &EguiContext, scene: &Scene, stats: &FrameStats) {
    egui::SidePanel::left("inspector")
        .default_width(260.0)
        .show(ctx, |ui| {
            ui.heading("Scene");
            ui.label(format!(
                "Clock: {:.2}s  Frames: {}",
                scene.clock().elapsed(),
                scene.clock().frames()
            ));
            ui.label(format!("FPS: {:.0}", stats.fps));
            let cam = scene.camera().position();
            ui.label(format!("Camera: ({:.1}, {:.1}, {:.1})", cam.x, cam.y, cam.z));

            ui.separator();
            ui.heading("Lights");
            for rig in scene.lights() {
                let Some(entity) = scene.entity(rig.entity) else {
                    continue;
                };
                let Some(light) = entity.light() else {
                    continue;
                };
                let c = light.colour();
                ui.horizontal(|ui| {
                    swatch(ui, c);
                    ui.label(format!(
                        "{} ({:.2}, {:.2}, {:.2})",
                        entity.name(),
                        c.x,
                        c.y,
                        c.z
                    ));
                });
            }

            ui.separator();
            egui::CollapsingHeader::new(format!("Entities ({})", scene.entity_count()))
                .default_open(true)
                .show(ui, |ui| {
                    for (id, entity) in scene.entities() {
                        let p = entity.position();
                        ui.label(format!(
                            "{id} {}: {} at ({:.1}, {:.1}, {:.1})",
                            entity.name(),
                            entity.technique().kind.name(),
                            p.x,
                            p.y,
                            p.z
                        ));
                    }
                });

            ui.separator();
            ui.small("Arrows/WASD/./,: camera | IJKL/U/O: model | F1: inspector | Esc: quit");
        });
}

struct GpuApp {
    scene_config: SceneConfig,
    scene: Option<Scene>,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    config: Option<wgpu::SurfaceConfiguration>,
    renderer: Option<WgpuRenderer>,
    overlay: Option<Overlay>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    held: BTreeSet<Key>,
    stats: FrameStats,
    show_inspector: bool,
    error: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(scene_config: SceneConfig) -> Self {
        Self {
            scene_config,
            scene: None,
            window: None,
            surface: None,
            config: None,
            renderer: None,
            overlay: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            held: BTreeSet::new(),
            stats: FrameStats::new(),
            show_inspector: true,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("ShadeLab")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;
        let (adapter, device, queue) =
            pollster::block_on(request_device(&instance, Some(&surface)))?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let mut renderer =
            WgpuRenderer::new(device, queue, surface_format, config.width, config.height);
        let mut scene = Scene::load(&self.scene_config, &mut renderer)?;
        scene.camera_mut().set_aspect(config.width, config.height);

        let overlay = Overlay::new(&renderer);
        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            entities = scene.entity_count(),
            "viewer ready"
        );

        self.window = Some(window);
        self.surface = Some(surface);
        self.config = Some(config);
        self.renderer = Some(renderer);
        self.overlay = Some(overlay);
        self.egui_winit = Some(egui_winit);
        self.scene = Some(scene);
        self.stats = FrameStats::new();
        Ok(())
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(scene) = self.scene.take() {
            let dropped = scene.teardown();
            tracing::info!(entities = dropped.len(), "scene released");
        }
        event_loop.exit();
    }

    fn redraw(&mut self) {
        let input: InputSnapshot = self.held.iter().copied().collect();

        let (Some(scene), Some(renderer), Some(surface), Some(config), Some(window)) = (
            self.scene.as_mut(),
            self.renderer.as_mut(),
            self.surface.as_ref(),
            self.config.as_ref(),
            self.window.as_ref(),
        ) else {
            return;
        };

        let output = match surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                surface.configure(renderer.device(), config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        // A skipped frame's time carries into this one.
        let dt = self.stats.tick();

        renderer.begin_frame(
            output
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default()),
        );
        scene.frame(dt, &input, renderer);
        let Some(view) = renderer.end_frame() else {
            return;
        };

        if let (Some(egui_winit), Some(overlay)) = (self.egui_winit.as_mut(), self.overlay.as_mut()) {
            let raw_input = egui_winit.take_egui_input(window);
            let show = self.show_inspector;
            let stats = &self.stats;
            let mut full_output = self.egui_ctx.run(raw_input, |ctx| {
                if show {
                    draw_ui(ctx, scene, stats);
                }
            });
            let platform_output = std::mem::take(&mut full_output.platform_output);
            egui_winit.handle_platform_output(window, platform_output);
            overlay.paint(
                renderer,
                &self.egui_ctx,
                &view,
                full_output,
                [config.width, config.height],
            );
        }

        output.present();
        window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            tracing::error!("startup failed: {e:#}");
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(egui_winit), Some(window)) = (self.egui_winit.as_mut(), self.window.as_ref()) {
            let response = egui_winit.on_window_event(window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(new_size) => {
                if let (Some(surface), Some(renderer), Some(config)) =
                    (&self.surface, &mut self.renderer, &mut self.config)
                {
                    config.width = new_size.width.max(1);
                    config.height = new_size.height.max(1);
                    surface.configure(renderer.device(), config);
                    renderer.resize(config.width, config.height);
                    if let Some(scene) = &mut self.scene {
                        scene.camera_mut().set_aspect(config.width, config.height);
                    }
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => {
                let pressed = state == ElementState::Pressed;
                if code == KeyCode::F1 && pressed {
                    self.show_inspector = !self.show_inspector;
                }
                match map_key(code) {
                    Some(Key::Escape) if pressed => self.shutdown(event_loop),
                    Some(key) if pressed => {
                        self.held.insert(key);
                    }
                    Some(key) => {
                        self.held.remove(&key);
                    }
                    None => {}
                }
            }
            WindowEvent::Focused(false) => self.held.clear(),
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("shadelab-desktop starting");

    let scene_config = match &cli.scene {
        Some(path) => SceneConfig::from_file(path)
            .with_context(|| format!("reading scene {}", path.display()))?,
        None => SceneConfig::default(),
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(scene_config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
