/// Terminal host: split-screen ASCII views driven by the keyboard
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use solidview_core::{
    catalog, metrics::format_measure, Frame, OrthoView, RenderSurface, ViewId, ViewPreset,
    Visualizer, VisualizerConfig,
};
use std::cell::RefCell;
use std::io::{self, stdout, Write};
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::debug;

pub mod renderer;

pub use renderer::AsciiRenderer;

/// Rows reserved under the panes for the status and message lines
const STATUS_ROWS: u16 = 3;

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: u32 = 2;

const ORBIT_STEP_DEG: f32 = 5.0;
const TRANSITION_STEP: f32 = 10.0;
const SECTION_STEP: f32 = 0.05;

/// A rectangle of the terminal owned by one view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaneRect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

/// Main view on the left, the four orthographic views in a 2×2 grid on
/// the right.
pub fn layout(columns: u16, rows: u16) -> Vec<(ViewId, PaneRect)> {
    let body = rows.saturating_sub(STATUS_ROWS);
    let main_width = columns * 3 / 5;
    let side_width = (columns - main_width) / 2;
    let side_height = body / 2;

    let mut panes = vec![(
        ViewId::Main,
        PaneRect {
            x: 0,
            y: 0,
            width: main_width,
            height: body,
        },
    )];
    for (i, view) in OrthoView::ALL.into_iter().enumerate() {
        let (col, row) = (i as u16 % 2, i as u16 / 2);
        panes.push((
            ViewId::Ortho(view),
            PaneRect {
                x: main_width + col * side_width,
                y: row * side_height,
                width: side_width,
                height: side_height,
            },
        ));
    }
    panes
}

/// Render surface backed by a shared ASCII buffer
pub struct PaneSurface {
    renderer: Rc<RefCell<AsciiRenderer>>,
}

impl PaneSurface {
    pub fn new(renderer: Rc<RefCell<AsciiRenderer>>) -> Self {
        Self { renderer }
    }
}

impl RenderSurface for PaneSurface {
    fn size(&self) -> (u32, u32) {
        let renderer = self.renderer.borrow();
        (
            renderer.width() as u32,
            renderer.height() as u32 * CELL_ASPECT,
        )
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.renderer
            .borrow_mut()
            .resize(width as usize, (height / CELL_ASPECT) as usize);
    }

    fn present(&mut self, frame: &Frame<'_>) {
        self.renderer.borrow_mut().render_frame(frame);
    }
}

struct Pane {
    view: ViewId,
    rect: PaneRect,
    renderer: Rc<RefCell<AsciiRenderer>>,
}

enum Mode {
    Normal,
    Prompt(String),
}

/// Main application struct for the terminal visualizer
pub struct TerminalApp {
    visualizer: Visualizer,
    panes: Vec<Pane>,
    mode: Mode,
    message: String,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
    formula_index: usize,
}

impl TerminalApp {
    pub fn new(config: VisualizerConfig) -> io::Result<Self> {
        let (columns, rows) = terminal::size()?;
        let mut visualizer = Visualizer::new(config)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;

        let mut panes = Vec::new();
        for (view, rect) in layout(columns, rows) {
            let renderer = Rc::new(RefCell::new(AsciiRenderer::new(
                rect.width as usize,
                rect.height as usize,
            )));
            visualizer.register_surface(view, Box::new(PaneSurface::new(Rc::clone(&renderer))));
            panes.push(Pane {
                view,
                rect,
                renderer,
            });
        }

        Ok(Self {
            visualizer,
            panes,
            mode: Mode::Normal,
            message: help_text().to_string(),
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
            formula_index: 0,
        })
    }

    pub fn visualizer_mut(&mut self) -> &mut Visualizer {
        &mut self.visualizer
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            self.visualizer.tick();
            self.draw()?;

            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                ..
            }) => self.handle_key(code),
            Event::Resize(columns, rows) => self.relayout(columns, rows),
            _ => {}
        }
    }

    fn relayout(&mut self, columns: u16, rows: u16) {
        debug!(columns, rows, "terminal resized");
        for (pane, (_, rect)) in self.panes.iter_mut().zip(layout(columns, rows)) {
            pane.rect = rect;
            self.visualizer.resize(
                pane.view,
                rect.width as u32,
                rect.height as u32 * CELL_ASPECT,
            );
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        if let Mode::Prompt(text) = &mut self.mode {
            match code {
                KeyCode::Enter => {
                    let description = std::mem::take(text);
                    self.mode = Mode::Normal;
                    self.message = match self.visualizer.parse_and_generate(&description) {
                        Ok(summary) => format!("Created {}", summary.display_name),
                        Err(err) => err.to_string(),
                    };
                }
                KeyCode::Esc => {
                    self.mode = Mode::Normal;
                    self.message = help_text().to_string();
                }
                KeyCode::Backspace => {
                    text.pop();
                }
                KeyCode::Char(c) => text.push(c),
                _ => {}
            }
            return;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char(c @ '1'..='8') => {
                let index = c as usize - '1' as usize;
                if let Some(id) = catalog::IDS.get(index) {
                    self.formula_index = 0;
                    self.message = match self.visualizer.load_shape(id) {
                        Ok(summary) => format!("Loaded {}", summary.display_name),
                        Err(err) => err.to_string(),
                    };
                }
            }
            KeyCode::Char('/') => {
                self.mode = Mode::Prompt(String::new());
            }
            KeyCode::Char('t') => self.preset(ViewPreset::Top),
            KeyCode::Char('f') => self.preset(ViewPreset::Front),
            KeyCode::Char('s') => self.preset(ViewPreset::Side),
            KeyCode::Char('i') => self.preset(ViewPreset::Isometric),
            KeyCode::Char('r') => {
                self.visualizer.reset_camera();
            }
            KeyCode::Left => self.orbit(-ORBIT_STEP_DEG, 0.0),
            KeyCode::Right => self.orbit(ORBIT_STEP_DEG, 0.0),
            KeyCode::Up => self.orbit(0.0, ORBIT_STEP_DEG),
            KeyCode::Down => self.orbit(0.0, -ORBIT_STEP_DEG),
            KeyCode::Char('[') => self.nudge_transition(-TRANSITION_STEP),
            KeyCode::Char(']') => self.nudge_transition(TRANSITION_STEP),
            KeyCode::Char('x') => {
                let enabled = !self.visualizer.cross_section().enabled;
                self.visualizer.set_cross_section_enabled(enabled);
            }
            KeyCode::Char('p') => {
                let plane = self.visualizer.cross_section().plane.next();
                self.visualizer.set_section_plane(plane);
            }
            KeyCode::Char('m') => self.next_formula(),
            KeyCode::Char(',') => self.nudge_section(-SECTION_STEP),
            KeyCode::Char('.') => self.nudge_section(SECTION_STEP),
            _ => {}
        }
    }

    fn preset(&mut self, preset: ViewPreset) {
        self.visualizer.apply_view_preset(preset);
        self.message = format!("Camera: {preset}");
    }

    /// Arrow keys act as a short drag gesture
    fn orbit(&mut self, dh: f32, dv: f32) {
        self.visualizer.begin_drag();
        self.visualizer.drag_orbit(dh, dv);
        self.visualizer.end_drag();
    }

    /// Step through the formula breakdown of the current shape
    fn next_formula(&mut self) {
        let Some(metrics) = self.visualizer.metrics() else {
            return;
        };
        if metrics.formulas.is_empty() {
            return;
        }
        let index = self.formula_index % metrics.formulas.len();
        let line = &metrics.formulas[index];
        self.message = format!("{}: {}", line.label, line.render());
        self.formula_index = index + 1;
    }

    fn nudge_transition(&mut self, step: f32) {
        let percent = self.visualizer.transition().value() * 100.0 + step;
        self.visualizer.set_transition_percent(percent);
    }

    fn nudge_section(&mut self, step: f32) {
        let position = self.visualizer.cross_section().position + step;
        self.visualizer.set_section_position(position);
    }

    /// Status line describing the current shape
    pub fn status_line(&self) -> String {
        let Some(summary) = self.visualizer.summary() else {
            return "No shape loaded".to_string();
        };
        let dimensions: Vec<String> = summary
            .dimensions
            .iter()
            .map(|d| format!("{}={}", d.label, format_measure(d.value)))
            .collect();
        let section = self.visualizer.cross_section();
        let section = if section.enabled {
            format!("{} @ {:.0}%", section.plane, section.position * 100.0)
        } else {
            "off".to_string()
        };
        format!(
            "{} [{}] | V={} SA={} | 2D/3D {:.0}% | section {}",
            summary.display_name,
            dimensions.join(" "),
            format_measure(summary.metrics.volume),
            format_measure(summary.metrics.total_surface_area),
            self.visualizer.transition().value() * 100.0,
            section,
        )
    }

    fn draw(&mut self) -> io::Result<()> {
        let mut stdout = stdout();

        for pane in &self.panes {
            pane.renderer.borrow().draw(&mut stdout, (pane.rect.x, pane.rect.y))?;
            queue!(
                stdout,
                cursor::MoveTo(pane.rect.x, pane.rect.y),
                SetForegroundColor(Color::Yellow),
                Print(format!(" {} ", pane.view)),
                ResetColor
            )?;
        }

        let (columns, rows) = terminal::size()?;
        let status_row = rows.saturating_sub(STATUS_ROWS);
        let prompt = match &self.mode {
            Mode::Prompt(text) => format!("describe a shape> {text}_"),
            Mode::Normal => self.message.clone(),
        };
        let lines = [
            format!("{} | FPS: {:.1}", self.status_line(), self.fps),
            prompt,
        ];
        for (offset, line) in lines.iter().enumerate() {
            let line: String = line.chars().take(columns as usize).collect();
            queue!(
                stdout,
                cursor::MoveTo(0, status_row + offset as u16 + 1),
                terminal::Clear(ClearType::CurrentLine),
                Print(line)
            )?;
        }

        stdout.flush()?;
        Ok(())
    }
}

fn help_text() -> &'static str {
    "1-8 shapes | / describe | t f s i presets, r reset, arrows orbit | [ ] 2D/3D | m formulas | x section, p plane, , . move | q quit"
}
