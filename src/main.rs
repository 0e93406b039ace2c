// Demo binary: window, event loop, and egui chrome around the viewer core.

use spherical_viewer::{Renderer, Viewer, ViewerConfig, WindowFullscreen};

use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

use glam::Vec2;
use image::io::Reader as ImageReader;
use image::GenericImageView;
use std::fmt::Display;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

struct CliArgs {
    config: ViewerConfig,
    pan_deg: f32,
    tilt_deg: f32,
    zoom: f32,
    exclusive: bool,
}

fn main() {
    env_logger::init();

    let args = parse_args();

    let event_loop = EventLoop::new();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Spherical Viewer")
            .with_inner_size(LogicalSize::new(args.config.width, args.config.height))
            .build(&event_loop)
            .unwrap(),
    );

    let fullscreen = WindowFullscreen::new(window.clone(), args.exclusive);
    let mut viewer = Viewer::new(args.config, Box::new(fullscreen));
    viewer.set_ptz(args.pan_deg.to_radians(), args.tilt_deg.to_radians(), args.zoom);

    let max_texture_size = viewer.config().max_texture_size;
    let mut renderer = match pollster::block_on(Renderer::new(
        window.clone(),
        viewer.mesh(),
        max_texture_size,
    )) {
        Ok(renderer) => renderer,
        Err(e) => {
            log::error!("failed to initialize graphics: {e}");
            std::process::exit(1);
        }
    };
    log::info!("texture cap: {} px", renderer.max_texture_size());

    // Interaction state
    let mut cursor_pos = PhysicalPosition::new(0.0f64, 0.0f64);
    let mut modifiers = ModifiersState::default();

    // FPS accounting
    let mut last_frame_time = Instant::now();
    let mut frame_count = 0;
    let mut fps = 0.0;
    let mut show_fps = false;

    // UI state
    let mut is_loading = false;
    let mut current_src: Option<PathBuf> = None;

    // Decoded panoramas arrive from a background thread.
    let (tx, rx): (Sender<image::RgbaImage>, Receiver<image::RgbaImage>) = channel();

    if let Some(path) = viewer.config().src.clone() {
        is_loading = true;
        current_src = Some(path.clone());
        start_load_image(path, tx.clone());
    }

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        if let Ok(rgba) = rx.try_recv() {
            renderer.load_panorama(rgba);
            viewer.invalidate();
            is_loading = false;
        }

        match event {
            Event::WindowEvent { event, .. } => {
                // egui gets first refusal on every window event.
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                if response.consumed {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        viewer.stop();
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        renderer.resize(new_size);
                    }

                    WindowEvent::ModifiersChanged(state) => {
                        modifiers = state;
                    }

                    WindowEvent::KeyboardInput { input, .. } => {
                        if input.state == ElementState::Pressed {
                            match input.virtual_keycode {
                                Some(VirtualKeyCode::O) => {
                                    if let Some(path) = pick_image_file() {
                                        is_loading = true;
                                        current_src = Some(path.clone());
                                        start_load_image(path, tx.clone());
                                    }
                                }
                                Some(VirtualKeyCode::F11) => {
                                    viewer.toggle_fullscreen();
                                }
                                _ => {}
                            }
                        }
                    }

                    WindowEvent::MouseInput { state, button, .. } => {
                        if button == MouseButton::Left {
                            if state == ElementState::Pressed {
                                viewer.pointer_down(
                                    Vec2::new(cursor_pos.x as f32, cursor_pos.y as f32),
                                    Instant::now(),
                                );
                            } else {
                                viewer.pointer_up();
                            }
                        }
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        cursor_pos = position;
                        viewer.pointer_move(
                            Vec2::new(position.x as f32, position.y as f32),
                            modifiers.ctrl(),
                        );
                    }

                    WindowEvent::MouseWheel { delta, .. } => {
                        // Scroll-up means a negative zoom delta here; line
                        // steps approximate 100px of wheel travel.
                        let delta_y = match delta {
                            MouseScrollDelta::LineDelta(_, y) => -y * 100.0,
                            MouseScrollDelta::PixelDelta(pos) => -pos.y as f32,
                        };
                        viewer.wheel(delta_y);
                    }

                    WindowEvent::Touch(touch) => {
                        viewer.touch(
                            touch.id,
                            touch.phase,
                            Vec2::new(touch.location.x as f32, touch.location.y as f32),
                            Instant::now(),
                        );
                    }

                    WindowEvent::DroppedFile(path) => {
                        is_loading = true;
                        current_src = Some(path.clone());
                        start_load_image(path, tx.clone());
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                frame_count += 1;
                let now = Instant::now();
                if now.duration_since(last_frame_time).as_secs_f32() >= 1.0 {
                    fps = frame_count as f32 / now.duration_since(last_frame_time).as_secs_f32();
                    frame_count = 0;
                    last_frame_time = now;
                }

                if let Some(frame) =
                    viewer.tick(now, (renderer.size.width, renderer.size.height))
                {
                    renderer.set_view_matrix(frame.matrix);
                }

                let mut next_image = None;
                let mut quit = false;
                let render_result = renderer.render_with_ui(&window, |ctx| {
                    draw_ui(
                        ctx,
                        &mut viewer,
                        &current_src,
                        &mut next_image,
                        &mut quit,
                        &mut show_fps,
                        fps,
                        is_loading,
                    );
                });

                if let Some(path) = next_image {
                    is_loading = true;
                    current_src = Some(path.clone());
                    start_load_image(path, tx.clone());
                }
                if quit {
                    viewer.stop();
                    *control_flow = ControlFlow::Exit;
                }

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                    Err(e) => log::error!("render error: {e:?}"),
                }
            }

            Event::MainEventsCleared => {
                if viewer.is_running() {
                    window.request_redraw();
                }
            }

            _ => {}
        }
    });
}

fn pick_image_file() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter("Images", &["jpg", "jpeg", "png", "bmp"])
        .pick_file()
}

fn start_load_image(path: PathBuf, tx: Sender<image::RgbaImage>) {
    thread::spawn(move || {
        log::info!("loading panorama from {}", path.display());

        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                log::error!("cannot open {}: {e}", path.display());
                return;
            }
        };
        let reader = BufReader::new(file);

        // Panoramas run big; lift the decoder's default size limits.
        let img_result = ImageReader::new(reader)
            .with_guessed_format()
            .map_err(image::ImageError::IoError)
            .and_then(|mut r| {
                r.no_limits();
                r.decode()
            });

        match img_result {
            Ok(img) => {
                let (w, h) = img.dimensions();
                log::info!("decoded {}x{} panorama", w, h);
                if tx.send(img.to_rgba8()).is_err() {
                    log::error!("viewer shut down before the panorama finished decoding");
                }
            }
            Err(e) => log::error!("cannot decode {}: {e}", path.display()),
        }
    });
}

fn draw_ui(
    ctx: &egui::Context,
    viewer: &mut Viewer,
    current_src: &Option<PathBuf>,
    next_image: &mut Option<PathBuf>,
    quit: &mut bool,
    show_fps: &mut bool,
    fps: f32,
    is_loading: bool,
) {
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open image…").clicked() {
                    ui.close_menu();
                    if let Some(path) = pick_image_file() {
                        *next_image = Some(path);
                    }
                }
                if ui.button("Log view command").clicked() {
                    log_view_command(viewer, current_src);
                    ui.close_menu();
                }
                if ui.button("Quit").clicked() {
                    *quit = true;
                }
            });

            ui.menu_button("View", |ui| {
                if ui.button("Reset view").clicked() {
                    viewer.set_ptz(0.0, 0.0, 0.0);
                    ui.close_menu();
                }
                if ui.button("Fullscreen").clicked() {
                    viewer.toggle_fullscreen();
                    ui.close_menu();
                }
                ui.separator();
                if ui.checkbox(show_fps, "Show FPS").clicked() {
                    ui.close_menu();
                }
            });
        });
    });

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if is_loading {
                ui.add(egui::Spinner::new());
                ui.label(egui::RichText::new("Loading…").color(egui::Color32::YELLOW));
                ui.label("|");
            }

            let ptz = viewer.ptz();
            ui.label(format!("Pan: {:.1}°", ptz.pan.to_degrees()));
            ui.label("|");
            ui.label(format!("Tilt: {:.1}°", ptz.tilt.to_degrees()));
            ui.label("|");
            ui.label(format!("Zoom: {:+.2}", ptz.zoom));

            if *show_fps {
                ui.label("|");
                ui.label(
                    egui::RichText::new(format!("FPS: {:.1}", fps)).color(egui::Color32::GREEN),
                );
            }
        });
    });
}

/// Prints the command line that reopens the current image at the current
/// orientation.
fn log_view_command(viewer: &Viewer, current_src: &Option<PathBuf>) {
    let ptz = viewer.ptz();
    let src = current_src
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "IMAGE".to_string());
    log::info!(
        "view command: spherical_viewer {src} --pan {:.2} --tilt {:.2} --zoom {:.3}",
        ptz.pan.to_degrees(),
        ptz.tilt.to_degrees(),
        ptz.zoom
    );
}

fn parse_args() -> CliArgs {
    let mut args = CliArgs {
        config: ViewerConfig::default(),
        pan_deg: 0.0,
        tilt_deg: 0.0,
        zoom: 0.0,
        exclusive: false,
    };

    let mut it = std::env::args().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--exclusive" => args.exclusive = true,
            "--width" => args.config.width = parse_value(&a, it.next()),
            "--height" => args.config.height = parse_value(&a, it.next()),
            "--hdiv" => {
                args.config.h_div = parse_value(&a, it.next());
                args.config.v_div = (args.config.h_div / 2).max(1);
            }
            "--att" => args.config.att = parse_value(&a, it.next()),
            "--max-texture" => args.config.max_texture_size = Some(parse_value(&a, it.next())),
            "--pan" => args.pan_deg = parse_value(&a, it.next()),
            "--tilt" => args.tilt_deg = parse_value(&a, it.next()),
            "--zoom" => args.zoom = parse_value(&a, it.next()),
            other if other.starts_with('-') => exit_usage(&format!("unknown option {other}")),
            other => args.config.src = Some(PathBuf::from(other)),
        }
    }

    if args.config.width == 0 || args.config.height == 0 {
        exit_usage("--width and --height must be positive");
    }
    if args.config.h_div == 0 {
        exit_usage("--hdiv must be positive");
    }
    if !(args.config.att > 0.0 && args.config.att < 1.0) {
        exit_usage("--att must lie strictly between 0 and 1");
    }

    args
}

fn parse_value<T: FromStr>(flag: &str, value: Option<String>) -> T
where
    T::Err: Display,
{
    let Some(value) = value else {
        exit_usage(&format!("{flag} needs a value"));
    };
    match value.parse() {
        Ok(v) => v,
        Err(e) => exit_usage(&format!("invalid value for {flag}: {e}")),
    }
}

fn exit_usage(message: &str) -> ! {
    eprintln!("error: {message}");
    eprintln!("run with --help for usage");
    std::process::exit(2);
}

fn print_usage() {
    println!(
        "\
Usage: spherical_viewer [IMAGE] [OPTIONS]

View an equirectangular panorama. Drag to look around, scroll or
ctrl-drag to zoom, double-click for fullscreen, O to open a file.

Options:
  --width N        window width in pixels (default 640)
  --height N       window height in pixels (default 360)
  --hdiv N         horizontal sphere subdivisions; vertical follows as N/2
                   (default 64)
  --att F          coast attenuation per tick, 0 < F < 1 (default 0.98)
  --max-texture N  cap the panorama texture dimension at N pixels
  --pan DEG        initial pan in degrees
  --tilt DEG       initial tilt in degrees
  --zoom F         initial zoom exponent, -5 to 5
  --exclusive      exclusive fullscreen instead of borderless
  -h, --help       print this help"
    );
}
