use std::path::PathBuf;

use anyhow::Result;
use glam::{IVec2, UVec2};
use pixels::{Pixels, SurfaceTexture};
use rfd::{FileDialog, MessageDialog, MessageLevel};
use tile_select::{
    config::{load_config, CONFIG_FILE_NAME},
    Session, TileError,
};
use winit::{
    dpi::LogicalSize,
    event::{
        ElementState, Event, KeyboardInput, MouseButton, MouseScrollDelta, VirtualKeyCode,
        WindowEvent,
    },
    event_loop::{ControlFlow, EventLoop},
    window::{Window, WindowBuilder},
};

mod render;

use render::Viewport;

/// Buffer size shown before any image is loaded
const EMPTY_CANVAS: u32 = 256;
/// Used when the monitor size is unknown
const MAX_VIEW_FALLBACK: UVec2 = UVec2::new(1024, 768);
const TITLE: &str = "Tile Selector";

fn main() -> Result<()> {
    use simplelog::*;
    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(
            LevelFilter::Debug,
            Config::default(),
            std::fs::File::create("log")?,
        ),
    ])?;

    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    let session = Session::new(load_config(&config_path))?;

    let event_loop = EventLoop::new();
    let app = TileWindow::new(session, &event_loop)?;
    app.play(event_loop);
}

pub struct TileWindow {
    window: Window,
    pixels: Pixels,
    session: Session,
    /// Scale the current sheet is drawn at
    scale: u32,
    view: Viewport,
    /// Image pixel under the cursor, if it is over the buffer
    cursor: Option<UVec2>,
}

impl TileWindow {
    pub fn new(session: Session, event_loop: &EventLoop<()>) -> Result<Self> {
        let buffer = UVec2::splat(EMPTY_CANVAS);
        let window = WindowBuilder::new()
            .with_title(TITLE)
            .with_inner_size(LogicalSize::new(buffer.x, buffer.y))
            .build(event_loop)?;
        let pixels = Self::new_pixels(buffer, &window)?;

        let mut app = Self {
            window,
            pixels,
            session,
            scale: 1,
            view: Viewport::new(buffer, buffer),
            cursor: None,
        };
        app.refresh();
        return Ok(app);
    }

    fn new_pixels(buffer: UVec2, window: &Window) -> Result<Pixels> {
        let size = window.inner_size();
        let surface_texture = SurfaceTexture::new(size.width, size.height, window);
        let pixels = pixels::PixelsBuilder::new(buffer.x, buffer.y, surface_texture)
            .blend_state(pixels::wgpu::BlendState::REPLACE)
            .build()?;
        return Ok(pixels);
    }

    /// Largest buffer that still fits on the window's monitor
    fn max_view(&self) -> UVec2 {
        let Some(monitor) = self.window.current_monitor() else {
            return MAX_VIEW_FALLBACK;
        };
        let size: LogicalSize<u32> = monitor.size().to_logical(monitor.scale_factor());
        // leave room for decorations and panels
        return (UVec2::new(size.width, size.height) * 9 / 10).max(UVec2::splat(EMPTY_CANVAS));
    }

    /// Scroll step in buffer pixels, one tile
    fn scroll_step(&self) -> IVec2 {
        let config = self.session.config();
        return IVec2::new(
            (config.tile_width * self.scale) as i32,
            (config.tile_height * self.scale) as i32,
        );
    }

    fn scroll(&mut self, delta: IVec2) {
        self.view.scroll_by(delta);
        self.window.request_redraw();
    }

    pub fn play(mut self, event_loop: EventLoop<()>) -> ! {
        event_loop.run(move |event, _, control_flow| {
            *control_flow = ControlFlow::Wait;
            match event {
                Event::WindowEvent { event, .. } => {
                    if self.handle_window_event(&event) {
                        *control_flow = ControlFlow::Exit;
                    }
                }
                Event::RedrawRequested(_window_id) => {
                    self.draw();
                    if let Err(err) = self.pixels.render() {
                        log::error!("pixels.render() failed: {err}");
                        *control_flow = ControlFlow::Exit;
                    }
                }
                _ => {}
            }
        });
    }

    /// Returns true when the window should close
    fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::CloseRequested => return true,
            WindowEvent::Resized(size) => {
                if let Err(err) = self.pixels.resize_surface(size.width, size.height) {
                    log::error!("pixels.resize_surface() failed: {err}");
                    return true;
                }
                self.window.request_redraw();
            }
            WindowEvent::CursorMoved { position, .. } => {
                let (view, scale) = (self.view, self.scale);
                self.cursor = self
                    .pixels
                    .window_pos_to_pixel((position.x as f32, position.y as f32))
                    .ok()
                    .map(|(x, y)| view.to_full(UVec2::new(x as u32, y as u32)) / scale);
                if let Some(pixel) = self.cursor {
                    if self.session.is_painting() && self.session.drag_at(pixel) {
                        self.refresh();
                    }
                }
            }
            WindowEvent::CursorLeft { .. } => self.cursor = None,
            WindowEvent::MouseWheel { delta, .. } => {
                let step = self.scroll_step();
                let delta = match delta {
                    MouseScrollDelta::LineDelta(x, y) => IVec2::new(
                        (-x * step.x as f32) as i32,
                        (-y * step.y as f32) as i32,
                    ),
                    MouseScrollDelta::PixelDelta(pos) => IVec2::new(-pos.x as i32, -pos.y as i32),
                };
                self.scroll(delta);
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    if let Some(pixel) = self.cursor {
                        self.session.press_at(pixel);
                        self.refresh();
                    }
                }
                ElementState::Released => self.session.release(),
            },
            WindowEvent::KeyboardInput {
                input:
                    KeyboardInput {
                        state: ElementState::Pressed,
                        virtual_keycode: Some(key),
                        ..
                    },
                ..
            } => match key {
                VirtualKeyCode::O => self.open(),
                VirtualKeyCode::C => {
                    self.session.clear_selection();
                    self.refresh();
                }
                VirtualKeyCode::S => self.save(),
                VirtualKeyCode::Left => self.scroll(self.scroll_step() * IVec2::new(-1, 0)),
                VirtualKeyCode::Right => self.scroll(self.scroll_step() * IVec2::new(1, 0)),
                VirtualKeyCode::Up => self.scroll(self.scroll_step() * IVec2::new(0, -1)),
                VirtualKeyCode::Down => self.scroll(self.scroll_step() * IVec2::new(0, 1)),
                VirtualKeyCode::Escape => return true,
                _ => {}
            },
            _ => {}
        }
        return false;
    }

    fn open(&mut self) {
        let Some(path) = FileDialog::new()
            .set_title("Load image")
            .add_filter("Image files", &["png", "jpg", "jpeg", "bmp"])
            .pick_file()
        else {
            return;
        };

        match self.session.load(&path) {
            Ok(()) => self.fit_to_sheet(),
            Err(err) => show_error(&err),
        }
        self.refresh();
    }

    /// Resizes the buffer and window to the loaded sheet, capped to the monitor.
    /// Sheets larger than that are scrolled.
    fn fit_to_sheet(&mut self) {
        let Some(sheet) = self.session.sheet() else {
            return;
        };
        let configured = self.session.config().pixel_scale.max(1);
        let (scale, full) = match render::frame_size(sheet, configured) {
            Some(full) => (configured, full),
            None => {
                log::warn!("pixel_scale {configured} is too large for this sheet, drawing at 1x");
                (1, UVec2::from(sheet.image.dimensions()))
            }
        };
        let view = Viewport::new(full, self.max_view());
        if let Err(err) = self.pixels.resize_buffer(view.size.x, view.size.y) {
            log::error!("pixels.resize_buffer() failed: {err}");
            return;
        }
        self.window
            .set_inner_size(LogicalSize::new(view.size.x, view.size.y));
        self.scale = scale;
        self.view = view;
    }

    fn save(&mut self) {
        if self.session.selection().is_empty() {
            show_error(&TileError::EmptySelection);
            return;
        }
        let Some(path) = FileDialog::new()
            .set_title("Export array")
            .set_file_name("tiles.txt")
            .add_filter("Text file", &["txt"])
            .add_filter("C# file", &["cs"])
            .save_file()
        else {
            return;
        };

        match self.session.export_to(with_default_extension(path)) {
            Ok(summary) => {
                MessageDialog::new()
                    .set_level(MessageLevel::Info)
                    .set_title("Saved")
                    .set_description(format!(
                        "Array saved to:\n{}\nMatrix size: {}x{}",
                        summary.path.display(),
                        summary.height,
                        summary.width
                    ))
                    .show();
            }
            Err(err) => show_error(&err),
        }
    }

    fn refresh(&mut self) {
        self.window
            .set_title(&format!("{TITLE} - {}", self.session.status()));
        self.window.request_redraw();
    }

    fn draw(&mut self) {
        let frame = self.pixels.get_frame_mut();
        match self.session.sheet() {
            Some(sheet) => {
                render::draw(frame, sheet, self.session.selection(), self.scale, &self.view)
            }
            None => render::clear(frame),
        }
    }
}

fn with_default_extension(path: PathBuf) -> PathBuf {
    if path.extension().is_some() {
        return path;
    }
    return path.with_extension("txt");
}

fn show_error(err: &TileError) {
    let (level, title) = match err {
        TileError::EmptySelection => (MessageLevel::Warning, "Warning"),
        _ => (MessageLevel::Error, "Error"),
    };
    log::warn!("{err}");
    MessageDialog::new()
        .set_level(level)
        .set_title(title)
        .set_description(err.to_string())
        .show();
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn export_path_defaults_to_txt() {
        assert_eq!(
            with_default_extension(PathBuf::from("out/level")),
            PathBuf::from("out/level.txt")
        );
        assert_eq!(
            with_default_extension(PathBuf::from("level.cs")),
            PathBuf::from("level.cs")
        );
    }
}
