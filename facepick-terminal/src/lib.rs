//! Terminal face picker: renders a mesh as ASCII and measures the face
//! under a mouse click.
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use facepick_core::{raycast, Camera, MeasureSession, Mesh, PickEvent, RotationState, Transform};
use nalgebra::{Matrix4, Point3};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use tracing::debug;

pub mod renderer;
pub mod report;

pub use renderer::AsciiRenderer;
pub use report::format_report;

/// Terminal cells are roughly twice as tall as they are wide.
const CELL_ASPECT: u32 = 2;
const HEADER_ROWS: u16 = 1;

/// Main application struct for terminal face picking
pub struct TerminalApp {
    session: MeasureSession,
    center: Point3<f32>,
    rotation: RotationState,
    camera: Camera,
    renderer: AsciiRenderer,
    auto_rotate: bool,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
    status: String,
}

impl TerminalApp {
    /// Viewer over the mesh already loaded into `session`.
    pub fn new(session: MeasureSession, width: u16, height: u16) -> Self {
        let viewport_height = height.saturating_sub(HEADER_ROWS).max(1);
        let mut camera = Camera::new(width as u32, viewport_height as u32 * CELL_ASPECT);
        let mut center = Point3::origin();
        if let Some(bounds) = session.mesh().and_then(Mesh::bounds) {
            camera.frame(&bounds);
            center = bounds.center();
        }

        Self {
            session,
            center,
            rotation: RotationState::new(0.5, -0.6, 0.0),
            camera,
            renderer: AsciiRenderer::new(width as usize, viewport_height as usize),
            auto_rotate: false,
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
            status: "Click a face to measure it".to_string(),
        }
    }

    pub fn session(&self) -> &MeasureSession {
        &self.session
    }

    fn model_matrix(&self) -> Matrix4<f32> {
        Transform::model_matrix(&self.rotation, &self.center, 1.0)
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, EnableMouseCapture, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), DisableMouseCapture, terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            while event::poll(Duration::from_millis(0))? {
                let event = event::read()?;
                self.handle_event(event);
            }

            if self.auto_rotate {
                self.rotation.rotate(0.01, 0.015, 0.0);
            }

            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    /// Apply one input event. Separate from the loop so it can be driven
    /// without a terminal.
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent { code, .. }) => self.handle_key(code),
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column,
                row,
                ..
            }) => self.pick_cell(column, row),
            Event::Resize(width, height) => self.resize(width, height),
            _ => {}
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('w') | KeyCode::Up => self.rotation.rotate(0.1, 0.0, 0.0),
            KeyCode::Char('s') | KeyCode::Down => self.rotation.rotate(-0.1, 0.0, 0.0),
            KeyCode::Char('a') | KeyCode::Left => self.rotation.rotate(0.0, -0.1, 0.0),
            KeyCode::Char('d') | KeyCode::Right => self.rotation.rotate(0.0, 0.1, 0.0),
            KeyCode::Char('e') => self.rotation.rotate(0.0, 0.0, 0.1),
            KeyCode::Char('r') => self.rotation.rotate(0.0, 0.0, -0.1),
            KeyCode::Char(' ') => self.auto_rotate = !self.auto_rotate,
            KeyCode::Char('c') => {
                self.session.clear();
                self.status = "Selection cleared".to_string();
            }
            _ => {}
        }
    }

    fn resize(&mut self, width: u16, height: u16) {
        let viewport_height = height.saturating_sub(HEADER_ROWS).max(1);
        self.renderer.resize(width as usize, viewport_height as usize);
        self.camera
            .set_aspect(width as u32, viewport_height as u32 * CELL_ASPECT);
    }

    /// Cast a ray through a terminal cell and select the face it hits.
    pub fn pick_cell(&mut self, column: u16, row: u16) {
        let Some(row) = row.checked_sub(HEADER_ROWS) else {
            return;
        };
        let (width, height) = (self.renderer.width() as u32, self.renderer.height() as u32);
        let model = self.model_matrix();
        let ray = self
            .camera
            .screen_ray(column as f32 + 0.5, row as f32 + 0.5, &model, width, height);

        let event = match (ray, self.session.mesh()) {
            (Some(ray), Some(mesh)) => match raycast(mesh, &ray) {
                Some(hit) => PickEvent::from_hit(&hit),
                None => PickEvent::miss(ray.origin),
            },
            _ => return,
        };
        debug!(column, row, triangle = ?event.triangle, "Pick");

        self.status = match self.session.pick(&event) {
            Some(result) => format!("Selected {} face", result.kind),
            None => "Nothing under cursor".to_string(),
        };
    }

    fn render(&mut self) -> io::Result<()> {
        let model = self.model_matrix();

        self.renderer.clear();
        if let Some(mesh) = self.session.mesh() {
            self.renderer
                .render_mesh(mesh, &model, &self.camera, self.session.selection());
        }

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, HEADER_ROWS))?;
        self.renderer.draw(&mut stdout)?;

        // Header line
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "Facepick | FPS: {:.1} | Click=Pick WASD/Arrows=Rotate E/R=Roll Space=Spin C=Clear Q=Quit | {}",
                self.fps, self.status
            )),
            ResetColor
        )?;

        // Measurement panel
        if let Some(selection) = self.session.selection() {
            for (i, line) in format_report(selection).iter().enumerate() {
                queue!(
                    stdout,
                    cursor::MoveTo(1, HEADER_ROWS + 1 + i as u16),
                    SetForegroundColor(Color::Green),
                    Print(line),
                    ResetColor
                )?;
            }
        }

        stdout.flush()?;
        Ok(())
    }
}
