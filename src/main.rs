use std::path::PathBuf;

use clap::Parser;

use arness::config::RunConfig;
use arness::machine::Machine;

/// Run an iNES ROM against the emulator core.
#[derive(Parser, Debug)]
#[command(name = "nesdemo")]
#[command(about = "Run an iNES ROM headlessly or in a window", long_about = None)]
struct Args {
    /// Path to an iNES (.nes) ROM image.
    rom: PathBuf,

    /// Optional RunConfig TOML file (mirroring override, trace, cycle budget).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of frames to run before exiting (headless mode only).
    #[arg(short, long, default_value_t = 60)]
    frames: u32,

    /// Write the final frame to this PNG path instead of opening a window
    /// (requires the `screenshot` feature).
    #[arg(short, long)]
    screenshot: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => RunConfig::from_toml_file(path)?,
        None => RunConfig::default(),
    };

    if config.trace {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    }

    let rom_bytes = std::fs::read(&args.rom)?;
    let mut machine = Machine::new(config);
    machine.load(&rom_bytes)?;

    #[cfg(feature = "display")]
    if args.screenshot.is_none() {
        return display::run(machine);
    }

    for _ in 0..args.frames {
        machine.run_until_frame()?;
    }

    if let Some(path) = args.screenshot {
        save_screenshot(&machine, &path)?;
    }

    Ok(())
}

#[cfg(feature = "screenshot")]
fn save_screenshot(machine: &Machine, path: &std::path::Path) -> anyhow::Result<()> {
    use arness::ppu::{NES_HEIGHT, NES_WIDTH};
    use image::{ImageBuffer, Rgb};

    let buf = machine.framebuffer();
    let img: ImageBuffer<Rgb<u8>, _> =
        ImageBuffer::from_raw(NES_WIDTH as u32, NES_HEIGHT as u32, buf.to_vec())
            .ok_or_else(|| anyhow::anyhow!("framebuffer size mismatch"))?;
    img.save(path)?;
    Ok(())
}

#[cfg(not(feature = "screenshot"))]
fn save_screenshot(_machine: &Machine, _path: &std::path::Path) -> anyhow::Result<()> {
    anyhow::bail!("built without the `screenshot` feature")
}

#[cfg(feature = "display")]
mod display {
    use std::sync::Arc;

    use arness::controller::Button;
    use arness::machine::Machine;
    use arness::ppu::{NES_HEIGHT, NES_WIDTH};
    use pixels::{Pixels, SurfaceTexture};
    use winit::application::ApplicationHandler;
    use winit::event::{ElementState, KeyEvent, WindowEvent};
    use winit::event_loop::{ActiveEventLoop, EventLoop};
    use winit::keyboard::{Key, NamedKey};
    use winit::window::{Window, WindowId};

    pub fn run(machine: Machine) -> anyhow::Result<()> {
        let event_loop = EventLoop::new()?;
        let mut app = App {
            machine,
            window: None,
            pixels: None,
        };
        event_loop.run_app(&mut app)?;
        Ok(())
    }

    struct App {
        machine: Machine,
        window: Option<Arc<Window>>,
        pixels: Option<Pixels<'static>>,
    }

    impl ApplicationHandler for App {
        fn resumed(&mut self, event_loop: &ActiveEventLoop) {
            let attrs = Window::default_attributes()
                .with_title("nesdemo")
                .with_inner_size(winit::dpi::LogicalSize::new(
                    (NES_WIDTH * 2) as u32,
                    (NES_HEIGHT * 2) as u32,
                ));
            let window = Arc::new(event_loop.create_window(attrs).expect("create window"));
            let size = window.inner_size();
            let surface_texture = SurfaceTexture::new(size.width, size.height, window.clone());
            let pixels = Pixels::new(NES_WIDTH as u32, NES_HEIGHT as u32, surface_texture)
                .expect("create pixels surface");
            self.window = Some(window);
            self.pixels = Some(pixels);
        }

        fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
            match event {
                WindowEvent::CloseRequested => event_loop.exit(),
                WindowEvent::KeyboardInput {
                    event: KeyEvent { logical_key, state, .. },
                    ..
                } => self.handle_key(logical_key, state),
                WindowEvent::RedrawRequested => {
                    if let Err(err) = self.machine.run_until_frame() {
                        tracing::error!(%err, "cpu fault, stopping");
                        event_loop.exit();
                        return;
                    }
                    if let Some(pixels) = &mut self.pixels {
                        copy_framebuffer(self.machine.framebuffer(), pixels.frame_mut());
                        if let Err(err) = pixels.render() {
                            tracing::error!(%err, "pixels render failed");
                            event_loop.exit();
                        }
                    }
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
                _ => {}
            }
        }
    }

    impl App {
        fn handle_key(&mut self, key: Key, state: ElementState) {
            let pressed = state == ElementState::Pressed;
            let button = match key {
                Key::Character(ref c) if c == "z" => Button::A,
                Key::Character(ref c) if c == "x" => Button::B,
                Key::Named(NamedKey::Shift) => Button::Select,
                Key::Named(NamedKey::Enter) => Button::Start,
                Key::Named(NamedKey::ArrowUp) => Button::Up,
                Key::Named(NamedKey::ArrowDown) => Button::Down,
                Key::Named(NamedKey::ArrowLeft) => Button::Left,
                Key::Named(NamedKey::ArrowRight) => Button::Right,
                _ => return,
            };
            self.machine.set_button(button, pressed);
        }
    }

    /// RGB framebuffer -> pixels' RGBA surface.
    fn copy_framebuffer(src: &[u8], dst: &mut [u8]) {
        for (rgb, rgba) in src.chunks_exact(3).zip(dst.chunks_exact_mut(4)) {
            rgba[0] = rgb[0];
            rgba[1] = rgb[1];
            rgba[2] = rgb[2];
            rgba[3] = 0xFF;
        }
    }
}
