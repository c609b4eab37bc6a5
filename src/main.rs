use std::fs::OpenOptions;
use std::io::{self, Stdout, Write};
use std::path::Path;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{ExecutableCommand, QueueableCommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;
use unicode_width::UnicodeWidthStr;

use shadow_clone_escape::config::{self, Settings};
use shadow_clone_escape::storage::{self, Paths, Records};
use shadow_clone_escape::{
    CloneKind, Difficulty, Dir, GameEvent, Objective, Pos, PowerupKind, RunOutcome, RunState, Tile,
};

const CELL_W: usize = 2;
const INPUT_HOLD_MS: u64 = 160;
const TRAIL_LEN: usize = 30;
/// Ticks per radian of the clone brightness pulse.
const PULSE_TICKS: f64 = 12.0;

#[derive(Clone, Copy, PartialEq)]
enum Glyph {
    Player,
    Shadow,
    Wraith,
    Frozen,
    Wall,
    Empty,
    Trail,
    Goal,
    Pickup(PowerupKind),
}

#[derive(Clone, Copy, PartialEq)]
struct Cell {
    glyph: Glyph,
    color: Color,
}

struct Renderer {
    last: Vec<Cell>,
    last_hud: String,
    needs_full: bool,
    origin_x: u16,
    origin_y: u16,
}

impl Renderer {
    fn new(width: usize, height: usize) -> Self {
        Self {
            last: vec![
                Cell {
                    glyph: Glyph::Empty,
                    color: Color::Reset,
                };
                width * height
            ],
            last_hud: String::new(),
            needs_full: true,
            origin_x: 0,
            origin_y: 1,
        }
    }
}

struct Session {
    settings: Settings,
    records: Records,
    paths: Paths,
    rng: StdRng,
    game: RunState,
    started: Instant,
    status: String,
}

impl Session {
    fn new(settings: Settings, records: Records, paths: Paths) -> Result<Self> {
        let mut rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let game = RunState::new(settings.run_config(), &mut rng)
            .context("failed to generate the first maze")?;
        Ok(Self {
            settings,
            records,
            paths,
            rng,
            game,
            started: Instant::now(),
            status: "Survive as long as you can".to_string(),
        })
    }

    fn restart(&mut self) -> Result<()> {
        self.game = RunState::new(self.settings.run_config(), &mut self.rng)
            .context("failed to generate a maze")?;
        self.started = Instant::now();
        self.status = match self.settings.objective {
            Objective::Survival => "Survive as long as you can".to_string(),
            Objective::Escape => "Reach the exit".to_string(),
        };
        Ok(())
    }

    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.settings.difficulty = difficulty;
        self.status = format!("Difficulty {} from next run", difficulty.label());
        self.persist_settings();
    }

    fn toggle_objective(&mut self) {
        self.settings.objective = match self.settings.objective {
            Objective::Survival => Objective::Escape,
            Objective::Escape => Objective::Survival,
        };
        self.status = format!("Objective {:?} from next run", self.settings.objective);
        self.persist_settings();
    }

    fn persist_settings(&self) {
        if let Err(err) = config::save_settings(&self.paths.settings_path, &self.settings) {
            tracing::warn!(%err, "could not save settings");
        }
    }

    fn handle_events(&mut self) {
        for ev in self.game.drain_events() {
            tracing::debug!(?ev, "game event");
            if let GameEvent::RunEnded {
                outcome,
                score_secs,
            } = ev
            {
                self.finish_run(outcome, score_secs);
            }
        }
    }

    fn finish_run(&mut self, outcome: RunOutcome, secs: u64) {
        let prev_best = self.records.best_secs;
        let sub = self.records.submit(secs, self.settings.difficulty, outcome);
        let place = match sub.rank {
            Some(rank) => format!(" #{} on the board", rank + 1),
            None => String::new(),
        };
        if let Err(err) = storage::save_records(&self.paths.records_path, &self.records) {
            tracing::warn!(%err, "could not save records");
        }
        let verb = match outcome {
            RunOutcome::Caught => "You survived",
            RunOutcome::Escaped => "You escaped in",
        };
        self.status = if sub.new_record {
            tracing::info!(secs, "new record");
            format!("{verb} {secs}s - NEW RECORD!{place} (r restart, q quit)")
        } else {
            format!("{verb} {secs}s (Best: {prev_best}s){place} (r restart, q quit)")
        };
    }
}

fn main() -> Result<()> {
    let paths = storage::project_paths().context("could not prepare the data directory")?;
    init_tracing(&paths.log_path)?;
    let settings = config::load_settings(&paths.settings_path).with_env_overrides();
    let records = storage::load_records(&paths.records_path);
    tracing::info!(data_dir = %paths.data_dir.display(), ?settings, "starting");

    let mut session = Session::new(settings, records, paths)?;

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let result = run(&mut stdout, &mut session);

    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    result
}

fn init_tracing(log_path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("could not open log file {}", log_path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .compact()
        .init();
    Ok(())
}

fn run(stdout: &mut Stdout, session: &mut Session) -> Result<()> {
    let mut last_tick = Instant::now();
    let mut last_step = Instant::now();
    let mut last_seen: [Option<Instant>; 4] = [None, None, None, None];
    let mut last_pressed: Option<Dir> = None;
    let mut renderer = Renderer::new(session.game.maze().width(), session.game.maze().height());
    let tick_time = Duration::from_millis(session.settings.tick_ms);
    let frame_time = Duration::from_micros(1_000_000 / session.settings.render_fps.max(1));

    loop {
        let frame_start = Instant::now();
        while event::poll(Duration::from_millis(0))? {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                continue;
            }
            if let Some(dir) = dir_for_key(key.code) {
                last_seen[idx_for_dir(dir)] = Some(Instant::now());
                last_pressed = Some(dir);
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('r') => {
                    session.restart()?;
                    let maze = session.game.maze();
                    renderer = Renderer::new(maze.width(), maze.height());
                    last_tick = Instant::now();
                }
                KeyCode::Char('1') => session.set_difficulty(Difficulty::Easy),
                KeyCode::Char('2') => session.set_difficulty(Difficulty::Normal),
                KeyCode::Char('3') => session.set_difficulty(Difficulty::Hard),
                KeyCode::Char('g') => session.toggle_objective(),
                _ => {}
            }
        }

        if session.game.is_running() {
            let pace = Duration::from_millis(session.game.move_pace_ms(session.settings.move_pace_ms));
            if let Some(dir) = held_dir(&last_seen, last_pressed) {
                if last_step.elapsed() >= pace {
                    session.game.try_move(dir);
                    last_step = Instant::now();
                }
            }

            if last_tick.elapsed() >= tick_time {
                last_tick = Instant::now();
                let now_ms = session.now_ms();
                session.game.tick(now_ms, &mut session.rng);
                session.handle_events();
            }
        }

        render(stdout, session, &mut renderer)?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            thread::sleep(frame_time - elapsed);
        }
    }
}

fn dir_for_key(code: KeyCode) -> Option<Dir> {
    match code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('k') => Some(Dir::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('j') => Some(Dir::Down),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('h') => Some(Dir::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('l') => Some(Dir::Right),
        _ => None,
    }
}

fn render(stdout: &mut Stdout, session: &Session, renderer: &mut Renderer) -> io::Result<()> {
    let game = &session.game;
    let width = game.maze().width();
    let height = game.maze().height();
    let needed_h = (height + 2) as u16;
    let needed_w = (width * CELL_W) as u16;

    stdout.queue(MoveTo(0, 0))?;

    let (term_w, term_h) = terminal::size()?;
    if term_w < needed_w || term_h < needed_h {
        stdout.queue(Clear(ClearType::All))?;
        let msg = format!(
            "Terminal too small. Need at least {}x{} (cols x rows). Current: {}x{}.",
            needed_w, needed_h, term_w, term_h
        );
        stdout.queue(Print(msg))?;
        stdout.flush()?;
        renderer.needs_full = true;
        return Ok(());
    }

    let origin_x = (term_w - needed_w) / 2;
    let origin_y = (term_h - needed_h) / 2 + 1;
    if origin_x != renderer.origin_x || origin_y != renderer.origin_y {
        renderer.origin_x = origin_x;
        renderer.origin_y = origin_y;
        renderer.needs_full = true;
    }

    let hud = hud_line(session);
    if renderer.needs_full || hud != renderer.last_hud {
        stdout.queue(MoveTo(renderer.origin_x, renderer.origin_y - 1))?;
        stdout.queue(SetForegroundColor(Color::White))?;
        stdout.queue(Clear(ClearType::CurrentLine))?;
        stdout.queue(Print(&hud))?;
        stdout.queue(ResetColor)?;
        renderer.last_hud = hud;
    }

    let trail = game.history();
    let trail = &trail[trail.len().saturating_sub(TRAIL_LEN)..];
    for y in 0..height {
        for x in 0..width {
            let pos = Pos { x, y };
            let cell = cell_for(game, trail, pos);
            let idx = y * width + x;
            if renderer.needs_full || cell != renderer.last[idx] {
                renderer.last[idx] = cell;
                draw_cell(stdout, renderer, x, y, cell)?;
            }
        }
    }
    renderer.needs_full = false;

    stdout.queue(MoveTo(renderer.origin_x, renderer.origin_y + height as u16))?;
    stdout.queue(Clear(ClearType::CurrentLine))?;
    stdout.queue(Print(&session.status))?;

    stdout.flush()?;
    Ok(())
}

fn hud_line(session: &Session) -> String {
    let game = &session.game;
    let effect = match game.effect() {
        Some(e) => format!(
            "  {} {}s",
            e.kind.label(),
            e.remaining_ms(game.elapsed_ms()).div_ceil(1000)
        ),
        None => String::new(),
    };
    let best = match session.records.best_secs {
        0 => "-".to_string(),
        secs => format!("{secs}s"),
    };
    format!(
        "Time: {}s  Clones: {}  Best: {}  [{}]{}  (q quit)",
        game.score_secs(),
        game.clones().len(),
        best,
        game.config().difficulty.label(),
        effect
    )
}

fn cell_for(game: &RunState, trail: &[Pos], pos: Pos) -> Cell {
    if pos == game.player() {
        let color = if game.is_running() {
            Color::Green
        } else {
            Color::DarkYellow
        };
        return Cell {
            glyph: Glyph::Player,
            color,
        };
    }
    if let Some(clone) = game.clones().iter().rev().find(|c| c.position() == pos) {
        let bright = (clone.age(game.tick_count()) as f64 / PULSE_TICKS).sin() >= 0.0;
        return match (clone.is_frozen(), clone.kind()) {
            (true, _) => Cell {
                glyph: Glyph::Frozen,
                color: Color::Cyan,
            },
            (false, CloneKind::Basic) => Cell {
                glyph: Glyph::Shadow,
                color: if bright { Color::Red } else { Color::DarkRed },
            },
            (false, CloneKind::Wraith) => Cell {
                glyph: Glyph::Wraith,
                color: if bright {
                    Color::Magenta
                } else {
                    Color::DarkMagenta
                },
            },
        };
    }
    if let Some(p) = game.pickups().iter().find(|p| p.pos == pos) {
        let color = match p.kind {
            PowerupKind::Speed => Color::Blue,
            PowerupKind::Cloak => Color::Grey,
            PowerupKind::Freeze => Color::Cyan,
        };
        return Cell {
            glyph: Glyph::Pickup(p.kind),
            color,
        };
    }
    match game.maze().tile(pos) {
        Some(Tile::Wall) | None => Cell {
            glyph: Glyph::Wall,
            color: Color::DarkGrey,
        },
        Some(Tile::Goal) => Cell {
            glyph: Glyph::Goal,
            color: Color::Yellow,
        },
        Some(Tile::Open) if trail.contains(&pos) => Cell {
            glyph: Glyph::Trail,
            color: Color::DarkGreen,
        },
        Some(Tile::Open) => Cell {
            glyph: Glyph::Empty,
            color: Color::Reset,
        },
    }
}

fn draw_cell(stdout: &mut Stdout, renderer: &Renderer, x: usize, y: usize, cell: Cell) -> io::Result<()> {
    let text = match cell.glyph {
        Glyph::Player => "@@",
        Glyph::Shadow => "%%",
        Glyph::Wraith => "&&",
        Glyph::Frozen => "**",
        Glyph::Wall => "██",
        Glyph::Empty => "  ",
        Glyph::Trail => "· ",
        Glyph::Goal => "[]",
        Glyph::Pickup(PowerupKind::Speed) => "»",
        Glyph::Pickup(PowerupKind::Cloak) => "◌",
        Glyph::Pickup(PowerupKind::Freeze) => "❄",
    };
    let x_pos = renderer.origin_x + (x * CELL_W) as u16;
    let y_pos = renderer.origin_y + y as u16;
    stdout.queue(MoveTo(x_pos, y_pos))?;
    stdout.queue(SetForegroundColor(cell.color))?;
    stdout.queue(Print(text))?;
    let w = UnicodeWidthStr::width(text);
    if w < CELL_W {
        for _ in 0..(CELL_W - w) {
            stdout.queue(Print(' '))?;
        }
    }
    stdout.queue(ResetColor)?;
    Ok(())
}

/// The held direction: the last pressed key while it is still fresh,
/// otherwise whichever key was seen most recently within the hold window.
fn held_dir(last_seen: &[Option<Instant>; 4], last_pressed: Option<Dir>) -> Option<Dir> {
    let hold = Duration::from_millis(INPUT_HOLD_MS);
    let fresh = |dir: Dir| last_seen[idx_for_dir(dir)].filter(|t| t.elapsed() <= hold);
    if let Some(dir) = last_pressed.filter(|d| fresh(*d).is_some()) {
        return Some(dir);
    }
    Dir::ALL
        .into_iter()
        .filter_map(|dir| fresh(dir).map(|t| (dir, t)))
        .max_by_key(|(_, t)| *t)
        .map(|(dir, _)| dir)
}

fn idx_for_dir(dir: Dir) -> usize {
    Dir::ALL.iter().position(|d| *d == dir).unwrap_or(0)
}
