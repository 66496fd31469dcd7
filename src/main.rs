//! BLOKRS - a block-blasting puzzle for the terminal
//!
//! Drag pieces from the tray onto the grid, fill rows and columns to clear
//! them, chase the combo multiplier.

mod audio;
mod bag;
mod config;
mod effects;
mod grid;
mod layout;
mod menu;
mod score;
mod session;
mod settings;
mod shape;
mod theme;
mod tray;
mod ui;

use audio::AudioManager;
use config::SessionConfig;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use layout::PlayLayout;
use menu::{Menu, MenuAction, MenuItemType};
use ratatui::{backend::CrosstermBackend, Terminal};
use session::{Session, SessionState};
use settings::{sanitize_name, HighScoreEntry, Settings, MAX_NAME_LEN};
use std::{
    io::{self, stdout},
    time::{Duration, Instant},
};

/// Fixed simulation rate
const TICKS_PER_SECOND: u64 = 30;
const TICK_DURATION: Duration = Duration::from_micros(1_000_000 / TICKS_PER_SECOND);
const TICK_DT: f32 = 1.0 / TICKS_PER_SECOND as f32;

/// Application state
enum AppState {
    Menu(Menu),
    Playing {
        session: Session,
        /// Name entry buffer; Some once the session hits game over.
        name_entry: Option<String>,
    },
}

fn main() -> io::Result<()> {
    // Generate session ID for this instance
    let run_id: u32 = rand::random();

    let log_dir = std::env::temp_dir().join("blokrs");
    let _ = std::fs::create_dir_all(&log_dir);
    let log_file = format!("{:08x}.log", run_id);

    // Setup tracing to log file
    let file_appender = tracing_appender::rolling::never(&log_dir, &log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("blokrs=debug".parse().unwrap()),
        )
        .with_ansi(false)
        .init();

    tracing::info!(
        "BLOKRS starting up, run={:08x}, log={}",
        run_id,
        log_dir.join(&log_file).display()
    );

    let mut settings = Settings::load();

    // Audio is optional - the game works without a device
    let mut audio = AudioManager::new(settings.sound_on);

    // Setup terminal
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut settings, &mut audio);

    // Restore terminal
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen, DisableMouseCapture)?;

    // Save settings (including any new high scores)
    if let Err(e) = settings.save() {
        eprintln!("Warning: Could not save settings: {}", e);
    }

    println!("\nThanks for playing BLOKRS!");
    if settings.best_score() > 0 {
        println!("Best score: {}", settings.best_score());
    }

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    settings: &mut Settings,
    audio: &mut Option<AudioManager>,
) -> io::Result<()> {
    let mut state = AppState::Menu(Menu::new(settings));
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|frame| match &state {
            AppState::Menu(menu) => ui::render_menu(frame, menu, settings),
            AppState::Playing { session, name_entry } => {
                ui::render_game(frame, session);
                if let Some(name) = name_entry {
                    ui::render_game_over(frame, session, name, settings);
                }
            }
        })?;

        let timeout = TICK_DURATION.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match &mut state {
                    AppState::Menu(menu) => {
                        if let Some(next) = handle_menu_key(key.code, menu, settings, audio) {
                            match next {
                                MenuOutcome::Quit => return Ok(()),
                                MenuOutcome::Start(session) => {
                                    state = AppState::Playing { session, name_entry: None };
                                }
                            }
                        }
                    }
                    AppState::Playing { session, name_entry } => {
                        if let Some(name) = name_entry {
                            match key.code {
                                KeyCode::Char(c) if c.is_ascii_alphabetic() => {
                                    if name.len() < MAX_NAME_LEN {
                                        name.push(c.to_ascii_uppercase());
                                    }
                                }
                                KeyCode::Backspace => {
                                    name.pop();
                                }
                                KeyCode::Enter => {
                                    confirm_game_over(session, name, settings);
                                    state = AppState::Menu(Menu::new(settings));
                                }
                                KeyCode::Esc => {
                                    state = AppState::Menu(Menu::new(settings));
                                }
                                _ => {}
                            }
                        } else if key.code == KeyCode::Esc {
                            tracing::info!(score = session.stats.score, "session abandoned");
                            state = AppState::Menu(Menu::new(settings));
                        }
                    }
                },
                Event::Mouse(mouse) => match &mut state {
                    AppState::Menu(menu) => {
                        if let Some(next) = handle_menu_mouse(terminal, menu, mouse, settings, audio)? {
                            match next {
                                MenuOutcome::Quit => return Ok(()),
                                MenuOutcome::Start(session) => {
                                    state = AppState::Playing { session, name_entry: None };
                                }
                            }
                        }
                    }
                    AppState::Playing { session, name_entry } => {
                        if name_entry.is_none() {
                            handle_play_mouse(terminal, session, mouse)?;
                        }
                    }
                },
                // Backgrounding aborts any drag or return mid-flight.
                Event::FocusLost => {
                    if let AppState::Playing { session, .. } = &mut state {
                        session.cancel_transient();
                    }
                }
                _ => {}
            }
        }

        if last_tick.elapsed() >= TICK_DURATION {
            last_tick = Instant::now();
            if let AppState::Playing { session, name_entry } = &mut state {
                session.tick(TICK_DT);
                let sounds = session.take_sounds();
                if let Some(audio) = audio {
                    for sound in sounds {
                        audio.play(sound);
                    }
                }
                if session.state == SessionState::GameOver && name_entry.is_none() {
                    *name_entry = Some(settings.player_name.clone());
                }
            }
        }
    }
}

enum MenuOutcome {
    Start(Session),
    Quit,
}

fn handle_menu_key(
    code: KeyCode,
    menu: &mut Menu,
    settings: &mut Settings,
    audio: &mut Option<AudioManager>,
) -> Option<MenuOutcome> {
    match code {
        KeyCode::Up => menu.move_up(),
        KeyCode::Down => menu.move_down(),
        KeyCode::Left => {
            menu.adjust_left(settings);
            sync_audio(settings, audio);
        }
        KeyCode::Right => {
            menu.adjust_right(settings);
            sync_audio(settings, audio);
        }
        KeyCode::Enter => {
            if let Some(action) = menu.select() {
                return activate(action, settings);
            }
        }
        KeyCode::Char('q') | KeyCode::Esc => return Some(MenuOutcome::Quit),
        _ => {}
    }
    None
}

/// Click to activate or adjust, hover to select, scroll to move.
fn handle_menu_mouse(
    terminal: &Terminal<CrosstermBackend<io::Stdout>>,
    menu: &mut Menu,
    mouse: MouseEvent,
    settings: &mut Settings,
    audio: &mut Option<AudioManager>,
) -> io::Result<Option<MenuOutcome>> {
    let size = terminal.size()?;
    let area = ratatui::layout::Rect::new(0, 0, size.width, size.height);
    let hit = ui::menu_item_at(area, mouse.column, mouse.row, menu.items.len());

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(index) = hit {
                menu.selected = index;
                match &menu.items[index].item_type {
                    MenuItemType::Button(_) => {
                        if let Some(action) = menu.select() {
                            return Ok(activate(action, settings));
                        }
                    }
                    MenuItemType::Toggle { .. } | MenuItemType::Cycle { .. } => {
                        menu.adjust_right(settings);
                        sync_audio(settings, audio);
                    }
                }
            }
        }
        MouseEventKind::Moved => {
            if let Some(index) = hit {
                menu.selected = index;
            }
        }
        MouseEventKind::ScrollUp => menu.move_up(),
        MouseEventKind::ScrollDown => menu.move_down(),
        _ => {}
    }
    Ok(None)
}

fn activate(action: MenuAction, settings: &Settings) -> Option<MenuOutcome> {
    match action {
        MenuAction::StartGame(mode) => {
            let config = SessionConfig::new(settings.grid_size, settings.tray_count);
            match Session::new(config, mode, settings.best_score()) {
                Ok(session) => {
                    tracing::info!(
                        grid = settings.grid_size,
                        tray = settings.tray_count,
                        ?mode,
                        "session started"
                    );
                    Some(MenuOutcome::Start(session))
                }
                Err(e) => {
                    tracing::error!("refusing to start session: {}", e);
                    None
                }
            }
        }
        MenuAction::Quit => Some(MenuOutcome::Quit),
    }
}

/// Map raw mouse events onto the three session intents.
fn handle_play_mouse(
    terminal: &Terminal<CrosstermBackend<io::Stdout>>,
    session: &mut Session,
    mouse: MouseEvent,
) -> io::Result<()> {
    let size = terminal.size()?;
    let area = ratatui::layout::Rect::new(0, 0, size.width, size.height);
    let play = PlayLayout::new(&session.config, area);

    let (gx, gy) = play.to_grid(mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            session.update_pointer(gx, gy);
            if let Some((slot, lx, ly)) = play.slot_at(mouse.column, mouse.row) {
                if let Some(piece) = session.tray.slot(slot) {
                    if !piece.used && !session.anim.is_returning(slot) {
                        let grab = layout::grab_cell(piece.shape(), lx, ly);
                        session.begin_drag(slot, grab);
                    }
                }
            }
        }
        MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
            session.update_pointer(gx, gy);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            session.update_pointer(gx, gy);
            session.release_drag();
        }
        _ => {}
    }
    Ok(())
}

/// Insert the finished game into the table and remember the player's name.
fn confirm_game_over(session: &Session, name: &str, settings: &mut Settings) {
    let name = {
        let clean = sanitize_name(name);
        if clean.is_empty() {
            settings.player_name.clone()
        } else {
            clean
        }
    };
    settings.player_name = name.clone();
    settings.add_high_score(HighScoreEntry {
        name,
        score: session.stats.score,
        highest_combo: session.stats.highest_combo,
        grid_size: session.config.grid_size,
        tray_count: session.config.tray_count,
    });
    tracing::info!(
        score = session.stats.score,
        combo = session.stats.highest_combo,
        "high score recorded"
    );
    if let Err(e) = settings.save() {
        tracing::warn!("could not save settings: {}", e);
    }
}

fn sync_audio(settings: &Settings, audio: &mut Option<AudioManager>) {
    if let Some(audio) = audio {
        audio.set_enabled(settings.sound_on);
    }
}
