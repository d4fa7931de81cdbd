use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::{SeedableRng, rngs::StdRng};
use ratatui::{
    crossterm::{
        self,
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    fs::File,
    io::{self, Stdout},
    path::PathBuf,
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing_subscriber::{EnvFilter, fmt};
use wumpus_world_core::{
    Coordinate, Direction as Heading,
    agent::AgentState,
    controller::{Controller, RandomController},
    episode::{self, DEFAULT_MAX_TURNS},
    maze::{Maze, load_maze_from_string},
    world::{Action, Percepts, World},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ControllerKind {
    /// Seeded wandering agent.
    Random,
    /// Keyboard-driven agent.
    Manual,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Map file to load; a random 4x4 maze is generated when omitted
    #[arg(short, long, value_name = "MAP_FILE")]
    map: Option<PathBuf>,

    /// Seed for random mazes and the random controller
    #[arg(short, long)]
    seed: Option<u64>,

    /// Who decides the agent's actions
    #[arg(short, long, value_enum, default_value_t = ControllerKind::Random)]
    controller: ControllerKind,

    /// Milliseconds between automatic steps while playing
    #[arg(long, default_value_t = 500)]
    tick_ms: u64,

    /// Turn ceiling for headless episodes
    #[arg(long, default_value_t = DEFAULT_MAX_TURNS)]
    max_turns: usize,

    /// Play one episode without the terminal UI and print the result
    #[arg(long)]
    headless: bool,

    /// Write log output to this file (the UI owns the terminal)
    #[arg(long, value_name = "LOG_FILE")]
    log_file: Option<PathBuf>,
}

/// Where new mazes come from.
enum MazeSource {
    Fixed(Maze),
    Random(StdRng),
}

impl MazeSource {
    fn next_maze(&mut self) -> Maze {
        match self {
            MazeSource::Fixed(maze) => maze.clone(),
            MazeSource::Random(rng) => Maze::random_with(rng),
        }
    }
}

struct App {
    /// The core simulation world.
    world: World,
    source: MazeSource,
    /// `None` when the agent is driven from the keyboard.
    controller: Option<Box<dyn Controller>>,
    move_count: usize,
    last_action: Option<Action>,
    last_error: Option<String>,
    /// Controller notes for the most recent step.
    feedback: Vec<String>,
    /// Automatic stepping is running.
    playing: bool,
    /// Flag to control the main loop.
    should_quit: bool,
}

impl App {
    fn new(mut source: MazeSource, controller: Option<Box<dyn Controller>>) -> Self {
        let world = World::new(source.next_maze());
        let mut app = App {
            world,
            source,
            controller,
            move_count: 0,
            last_action: None,
            last_error: None,
            feedback: Vec::new(),
            playing: false,
            should_quit: false,
        };
        app.restart();
        app
    }

    fn restart(&mut self) {
        self.world.reset();
        if let Some(controller) = self.controller.as_mut() {
            controller.reset();
        }
        self.move_count = 0;
        self.last_action = None;
        self.last_error = None;
        self.feedback.clear();
        self.playing = false;
    }

    fn new_maze(&mut self) {
        self.world = World::new(self.source.next_maze());
        self.restart();
    }

    /// Handles one step of the simulation.
    fn tick(&mut self) {
        if self.playing {
            self.step();
        }
    }

    /// Asks the controller for an action and applies it.
    fn step(&mut self) {
        if self.world.is_finished() {
            self.playing = false;
            return;
        }
        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        self.feedback.clear();
        match episode::step(&mut self.world, controller.as_mut(), self.move_count + 1) {
            Ok(turn) => {
                self.feedback = turn.notes;
                self.record(turn.action);
            }
            Err(err) => {
                tracing::warn!(%err, "step failed");
                self.last_error = Some(err.to_string());
                self.playing = false;
            }
        }
    }

    /// Applies an action chosen from the keyboard.
    fn act(&mut self, action: Action) {
        match self.world.update(action) {
            Ok(_) => self.record(action),
            Err(err) => self.last_error = Some(err.to_string()),
        }
    }

    fn record(&mut self, action: Action) {
        self.move_count += 1;
        self.last_action = Some(action);
        self.last_error = None;
        if self.world.is_finished() {
            self.playing = false;
        }
    }

    fn is_manual(&self) -> bool {
        self.controller.is_none()
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit(),
            KeyCode::Char('n') => self.new_maze(),
            KeyCode::Char('r') => self.restart(),
            KeyCode::Char(' ') if !self.is_manual() => self.step(),
            KeyCode::Char('p') if !self.is_manual() => {
                self.playing = !self.playing && !self.world.is_finished();
            }
            KeyCode::Char(c) if self.is_manual() => {
                if let Some(action) = manual_action(c) {
                    self.act(action);
                }
            }
            _ => {}
        }
    }

    /// Sets the quit flag.
    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn manual_action(key: char) -> Option<Action> {
    match key {
        'w' => Some(Action::Forward),
        'a' => Some(Action::Left),
        'd' => Some(Action::Right),
        'f' => Some(Action::Fire),
        't' => Some(Action::Take),
        'c' => Some(Action::Climb),
        _ => None,
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();
    init_logging(&args)?;

    let seed = args.seed.unwrap_or_else(rand::random);
    let source = match &args.map {
        Some(path) => {
            let file_string = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read map file: {}", path.display()))?;
            let maze = load_maze_from_string(&file_string)
                .with_context(|| format!("Failed to load maze from {}", path.display()))?;
            MazeSource::Fixed(maze)
        }
        None => MazeSource::Random(StdRng::seed_from_u64(seed)),
    };
    let controller: Option<Box<dyn Controller>> = match args.controller {
        ControllerKind::Random => Some(Box::new(RandomController::new(seed))),
        ControllerKind::Manual => None,
    };
    tracing::info!(seed, controller = ?args.controller, "starting");

    if args.headless {
        let Some(controller) = controller else {
            anyhow::bail!("headless mode needs an automatic controller");
        };
        return run_headless(source, controller, args.max_turns);
    }

    // Set up the terminal
    let mut terminal = setup_terminal()?;

    // Create the application state
    let mut app = App::new(source, controller);

    // Run the main application loop
    let result = run_app(&mut terminal, &mut app, Duration::from_millis(args.tick_ms));

    // Restore the terminal state
    restore_terminal(&mut terminal)?;

    result
}

/// Installs the tracing subscriber; `RUST_LOG` overrides the default filter.
fn init_logging(args: &Args) -> Result<()> {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(d) = "wumpus_world_core=info".parse() {
        filter = filter.add_directive(d);
    }

    match &args.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None if args.headless => fmt().with_env_filter(filter).with_writer(io::stderr).init(),
        // Nowhere to write without clobbering the UI.
        None => {}
    }
    Ok(())
}

fn run_headless(
    mut source: MazeSource,
    mut controller: Box<dyn Controller>,
    max_turns: usize,
) -> Result<()> {
    let mut world = World::new(source.next_maze());
    println!("{}", world.maze());

    let report = episode::run_episode(&mut world, controller.as_mut(), max_turns)
        .with_context(|| format!("Episode failed in {}", world.maze()))?;
    for (i, turn) in report.turns.iter().enumerate() {
        println!("{:>3}: {:<20} -> {}", i + 1, format_percepts(&turn.percepts), turn.action);
        for note in &turn.notes {
            println!("       {note}");
        }
    }
    println!(
        "{} after {} moves{}",
        report.outcome,
        report.turns.len(),
        if world.have_gold() { " with the gold" } else { "" }
    );
    Ok(())
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?; // Put terminal in raw mode
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?; // Use alternate screen and enable mouse capture
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into) // Map io::Error to anyhow::Error
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop of the TUI application.
fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        // Draw the UI
        terminal.draw(|f| ui(f, app))?;

        // Calculate timeout for event polling
        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key.code);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(8),    // Map and status
            Constraint::Length(3), // Last error
            Constraint::Length(2), // Help
        ])
        .split(frame.area());
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(main_layout[0]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(6)])
        .split(top[0]);

    render_map(frame, left[0], &app.world);
    render_feedback(frame, left[1], app);
    render_status(frame, top[1], app);

    let error = Paragraph::new(app.last_error.as_deref().unwrap_or(""))
        .style(Style::default().fg(Color::Red))
        .block(Block::default().borders(Borders::ALL).title("Last error"));
    frame.render_widget(error, main_layout[1]);

    let help = if app.is_manual() {
        "w forward, a left, d right, f fire, t take, c climb | n new, r reset, q quit"
    } else {
        "space step, p play/pause | n new, r reset, q quit"
    };
    let help_text = Paragraph::new(help)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[2]);
}

/// Renders what the controller reported about its last choice.
fn render_feedback(frame: &mut Frame, area: Rect, app: &App) {
    let lines: Vec<Line> = app.feedback.iter().map(|note| Line::from(note.as_str())).collect();
    let feedback = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Controller"));
    frame.render_widget(feedback, area);
}

fn format_percepts(percepts: &Percepts) -> String {
    if percepts.is_empty() {
        return "-".to_string();
    }
    percepts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Renders the agent's status panel.
fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let world = &app.world;
    let mut lines = vec![
        Line::from(format!("Move: {}", app.move_count)),
        Line::from(format!(
            "Location: {}",
            world.agent_location().minus(world.home())
        )),
        Line::from(format!("Facing: {}", world.agent_direction())),
        Line::from(format!("Arrow: {}", world.agent().arrow())),
        Line::from(if world.have_gold() {
            "Have gold."
        } else {
            "Have no gold."
        }),
        Line::from(if world.is_wumpus_alive() {
            "Wumpus alive."
        } else {
            "Wumpus dead."
        }),
    ];
    if let Some(action) = app.last_action {
        lines.push(Line::from(format!("Last action: {action}")));
    }

    let percepts = world.percepts();
    if percepts.is_empty() {
        lines.push(Line::from("No percepts."));
    } else {
        lines.push(Line::from("Percepts:"));
        for percept in &percepts {
            lines.push(Line::from(Span::styled(
                format!("  {percept}"),
                Style::default().fg(Color::Yellow),
            )));
        }
    }

    let (state, color) = match world.state() {
        AgentState::Active => ("ACTIVE", Color::White),
        AgentState::Dead => ("DEAD", Color::Red),
        AgentState::Escaped => ("ESCAPED", Color::Green),
    };
    lines.push(Line::from(Span::styled(
        state,
        Style::default().fg(color).bold(),
    )));
    if app.playing {
        lines.push(Line::from("Playing..."));
    }

    let status =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(status, area);
}

fn agent_glyph(direction: Heading) -> &'static str {
    match direction {
        Heading::North => "^",
        Heading::East => ">",
        Heading::South => "v",
        Heading::West => "<",
    }
}

/// Renders the maze onto the frame.
fn render_map(frame: &mut Frame, area: Rect, world: &World) {
    let bounds = world.maze().bounds();
    let mut lines: Vec<Line> = Vec::with_capacity(bounds.height());

    for y in bounds.min.y..=bounds.max.y {
        let mut spans: Vec<Span> = Vec::with_capacity(bounds.width() * 2);
        for x in bounds.min.x..=bounds.max.x {
            let cell = Coordinate::new(x, y);
            let span = if world.is_agent_located(cell) {
                let color = match world.state() {
                    AgentState::Dead => Color::Red,
                    _ => Color::Cyan,
                };
                Span::styled(
                    agent_glyph(world.agent_direction()),
                    Style::default().fg(color).bold(),
                )
            } else if world.is_wall(cell) {
                Span::styled("#", Style::default().fg(Color::DarkGray))
            } else if world.is_pit(cell) {
                Span::styled("O", Style::default().fg(Color::Blue))
            } else if world.is_wumpus(cell) {
                if world.is_wumpus_alive() {
                    Span::styled("W", Style::default().fg(Color::Red))
                } else {
                    Span::styled("x", Style::default().fg(Color::DarkGray))
                }
            } else if world.is_gold(cell) {
                Span::styled("$", Style::default().fg(Color::Yellow))
            } else if world.is_home(cell) {
                Span::styled("H", Style::default().fg(Color::Green))
            } else {
                Span::raw(".")
            };
            spans.push(span);
            spans.push(Span::raw(" "));
        }
        lines.push(Line::from(spans));
    }

    let map_paragraph = Paragraph::new(lines)
        .block(Block::default().title("Wumpus World").borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(map_paragraph, area);
}
