use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, List, ListItem, ListState};
use std::io::{self, stdout};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

use crate::config::Config;
use crate::engine::RodioEngineFactory;
use crate::player::{PlaybackController, PlaybackState, PlayerEvent, Track};
use crate::render::BarRenderer;
use crate::surface::{PixelSurface, RenderSurface, Rgb};
use crate::viz::VisualizationLoop;

type Controller = PlaybackController<RodioEngineFactory, PixelSurface>;

pub async fn run(config: Config, tracks: Vec<String>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, config, tracks).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// The host page: track list, transport keys, and the measured surface the
/// controller draws into.
struct App {
    controller: Controller,
    tracks: Vec<Track>,
    selected: usize,
    playing_index: Option<usize>,
    advance: bool,
    status: Option<String>,
}

impl App {
    fn play_index(&mut self, index: usize) {
        let Some(track) = self.tracks.get(index) else {
            return;
        };
        let url = track.url().to_string();
        self.controller.assign_track(&url);
        self.controller.request_play();
        self.playing_index = Some(index);
        self.selected = index;
    }

    fn toggle(&mut self) {
        // First toggle with nothing assigned picks up the selected track.
        if self.controller.track().is_none() {
            self.play_index(self.selected);
        } else {
            self.controller.request_toggle();
        }
    }

    fn activate_selection(&mut self) {
        if self.playing_index == Some(self.selected) {
            self.controller.request_toggle();
        } else {
            self.play_index(self.selected);
        }
    }

    fn step(&mut self, forward: bool) {
        if self.tracks.is_empty() {
            return;
        }
        let len = self.tracks.len();
        let base = self.playing_index.unwrap_or(self.selected);
        let next = if forward { (base + 1) % len } else { (base + len - 1) % len };
        self.play_index(next);
    }

    fn on_track_finished(&mut self) {
        info!(track = ?self.playing_index, "track finished");
        if self.advance && !self.tracks.is_empty() {
            let next = (self.playing_index.unwrap_or(0) + 1) % self.tracks.len();
            self.play_index(next);
        }
    }
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: Config,
    tracks: Vec<String>,
) -> Result<()> {
    let (host_tx, mut host_rx) = mpsc::unbounded_channel();

    let factory = RodioEngineFactory::from_config(&config.audio);
    let viz = VisualizationLoop::new(BarRenderer::from_config(&config.visualizer));
    // The surface starts unmeasured; the first frame's layout sizes it.
    let controller = PlaybackController::new(factory, PixelSurface::new(0, 0), viz, host_tx);

    let mut app = App {
        controller,
        tracks: tracks.iter().map(Track::new).collect(),
        selected: 0,
        playing_index: None,
        advance: config.player.advance,
        status: None,
    };

    if config.player.autoplay && !app.tracks.is_empty() {
        app.play_index(0);
    }

    let target_fps = Duration::from_secs_f64(1.0 / 60.0);

    loop {
        // Engine callbacks and host notifications are applied here, on the
        // same thread that ticks the render loop.
        app.controller.pump_events();
        while let Ok(event) = host_rx.try_recv() {
            match event {
                PlayerEvent::TrackFinished => app.on_track_finished(),
                PlayerEvent::Error(message) => app.status = Some(message),
            }
        }

        // Measure the visualization area and hand the dimensions to the
        // controller before this frame's tick.
        let size = terminal.size()?;
        let area = Rect::new(0, 0, size.width, size.height);
        let (viz_area, list_area, status_area) = layout(area, app.tracks.len());
        let (want_w, want_h) = (u32::from(viz_area.width), u32::from(viz_area.height) * 2);
        let surface = app.controller.surface();
        if (surface.width() as u32, surface.height() as u32) != (want_w, want_h) {
            app.controller.surface_mut().resize(want_w, want_h);
        }

        app.controller.tick();

        terminal.draw(|frame| {
            let background = Block::default().style(Style::default().bg(Color::Reset));
            frame.render_widget(background, area);

            blit_surface(frame, viz_area, app.controller.surface());
            render_track_list(frame, list_area, &app);
            render_status(frame, status_area, &app);
        })?;

        // Handle input
        if event::poll(target_fps)? {
            if let Event::Key(key) = event::read()? {
                match key {
                    KeyEvent {
                        code: KeyCode::Char('q'),
                        ..
                    }
                    | KeyEvent {
                        code: KeyCode::Char('c'),
                        modifiers: KeyModifiers::CONTROL,
                        ..
                    } => {
                        break;
                    }
                    KeyEvent {
                        code: KeyCode::Char(' '),
                        ..
                    } => {
                        app.toggle();
                    }
                    KeyEvent {
                        code: KeyCode::Enter,
                        ..
                    } => {
                        app.activate_selection();
                    }
                    KeyEvent {
                        code: KeyCode::Up,
                        ..
                    } => {
                        app.selected = app.selected.saturating_sub(1);
                    }
                    KeyEvent {
                        code: KeyCode::Down,
                        ..
                    } => {
                        if app.selected + 1 < app.tracks.len() {
                            app.selected += 1;
                        }
                    }
                    KeyEvent {
                        code: KeyCode::Char('n'),
                        ..
                    } => {
                        app.step(true);
                    }
                    KeyEvent {
                        code: KeyCode::Char('p'),
                        ..
                    } => {
                        app.step(false);
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(())
}

fn layout(area: Rect, track_count: usize) -> (Rect, Rect, Rect) {
    // Single-track pages hide the list, like a release page for a single.
    let list_height = if track_count > 1 {
        (track_count as u16).min(8)
    } else {
        0
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(list_height),
            Constraint::Length(1),
        ])
        .split(area);
    (chunks[0], chunks[1], chunks[2])
}

/// Copy the pixel surface into the terminal two rows of pixels per cell,
/// using the upper-half block so each cell carries a top and a bottom pixel.
fn blit_surface(frame: &mut Frame, area: Rect, surface: &PixelSurface) {
    for cy in 0..area.height {
        for cx in 0..area.width {
            let x = u32::from(cx);
            let top = surface.pixel(x, u32::from(cy) * 2);
            let bottom = surface.pixel(x, u32::from(cy) * 2 + 1);
            if top.is_none() && bottom.is_none() {
                continue;
            }
            if let Some(cell) = frame.buffer_mut().cell_mut((area.x + cx, area.y + cy)) {
                cell.set_char('▀');
                cell.set_fg(top.map(to_color).unwrap_or(Color::Reset));
                cell.set_bg(bottom.map(to_color).unwrap_or(Color::Reset));
            }
        }
    }
}

fn to_color(color: Rgb) -> Color {
    Color::Rgb(color.red, color.green, color.blue)
}

fn render_track_list(frame: &mut Frame, area: Rect, app: &App) {
    if area.height == 0 {
        return;
    }
    let items: Vec<ListItem> = app
        .tracks
        .iter()
        .enumerate()
        .map(|(i, track)| {
            let marker = if app.playing_index == Some(i) {
                match app.controller.state() {
                    PlaybackState::Playing => "▶ ",
                    PlaybackState::Paused => "⏸ ",
                    _ => "  ",
                }
            } else {
                "  "
            };
            let style = if app.playing_index == Some(i) {
                Style::default().fg(Color::Rgb(200, 177, 111))
            } else {
                Style::default().fg(Color::Gray)
            };
            ListItem::new(format!("{}{:2}  {}", marker, i + 1, track.display_name())).style(style)
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.selected));
    let list = List::new(items)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let state = match app.controller.state() {
        PlaybackState::Idle => "idle",
        PlaybackState::Playing => "playing",
        PlaybackState::Paused => "paused",
        PlaybackState::Stopped => "stopped",
        PlaybackState::Ended => "ended",
    };
    let now_playing = app
        .controller
        .track()
        .map(|t| t.display_name().to_string())
        .unwrap_or_else(|| "-".to_string());
    let status = match &app.status {
        Some(error) => format!(" {} | {} | {} ", state, now_playing, error),
        None => format!(
            " {} | {} | [space] play/pause [n/p] track [q]uit ",
            state, now_playing
        ),
    };

    for (i, ch) in status.chars().enumerate() {
        if i < area.width as usize {
            let cell = frame.buffer_mut().cell_mut((area.x + i as u16, area.y));
            if let Some(cell) = cell {
                cell.set_char(ch);
                cell.set_fg(Color::DarkGray);
            }
        }
    }
}
