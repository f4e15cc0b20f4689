mod chart;
mod config;
mod notation;
mod shell;
mod terminal;

use std::cmp::Ordering;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use mathsolver_client::HttpSolveService;
use mathsolver_core::{
    Difficulty, Direction, FormState, GraphRequest, HistoryStore, Operation, PracticeRequest,
    PracticeTopic, PreferenceStore, DEFAULT_VARIABLE, EMPTY_EXPRESSION,
};
use mathsolver_session::{ClientState, MathRenderer, Orchestrator, Outcome, RawRenderer};
use mathsolver_store::SqliteStore;

use crate::config::Config;
use crate::notation::TextMathRenderer;
use crate::shell::Shell;
use crate::terminal::TerminalSurfaces;

#[derive(Parser)]
#[command(
    name = "mathsolver",
    version,
    about = "Derivatives, integrals and limits with step-by-step solutions"
)]
struct Cli {
    /// Path to the SQLite database
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Base URL of the solving service
    #[arg(long, global = true)]
    url: Option<String>,

    /// Show math notation as received instead of rendering it
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Differentiate an expression
    Derivative {
        /// Expression to differentiate
        expression: String,

        /// Variable of differentiation
        #[arg(short, long, default_value = DEFAULT_VARIABLE)]
        variable: String,
    },

    /// Integrate an expression
    Integral {
        /// Expression to integrate
        expression: String,

        /// Variable of integration
        #[arg(short, long, default_value = DEFAULT_VARIABLE)]
        variable: String,

        /// Evaluate between --lower and --upper
        #[arg(short, long)]
        definite: bool,

        /// Lower bound (definite only, default 0)
        #[arg(long, allow_hyphen_values = true)]
        lower: Option<String>,

        /// Upper bound (definite only, default 1)
        #[arg(long, allow_hyphen_values = true)]
        upper: Option<String>,
    },

    /// Evaluate a limit
    Limit {
        /// Expression
        expression: String,

        /// Variable approaching the point
        #[arg(short, long, default_value = DEFAULT_VARIABLE)]
        variable: String,

        /// Point approached (default 0)
        #[arg(short, long, allow_hyphen_values = true)]
        point: Option<String>,

        /// Side of approach
        #[arg(long, default_value = "both")]
        direction: CliDirection,
    },

    /// Generate practice problems
    Practice {
        #[arg(short, long, default_value = "derivative")]
        topic: CliTopic,

        #[arg(short, long, default_value = "medium")]
        difficulty: CliDifficulty,

        /// Print the solutions too
        #[arg(long)]
        reveal: bool,
    },

    /// Plot an expression
    Plot {
        /// Expression to plot
        expression: String,

        #[arg(short, long, default_value = DEFAULT_VARIABLE)]
        variable: String,

        #[arg(long, default_value = "-10", allow_hyphen_values = true)]
        x_min: f64,

        #[arg(long, default_value = "10", allow_hyphen_values = true)]
        x_max: f64,
    },

    /// Past calculations
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },

    /// Show or toggle the display theme
    Theme {
        /// Switch between light and dark
        #[arg(long)]
        toggle: bool,
    },

    /// Show the effective configuration
    Config,

    /// Interactive session
    Shell,
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List recent calculations, newest first
    List {
        /// Maximum entries
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Search by type or expression (case-insensitive)
    Search { query: String },

    /// Delete all history
    Clear,

    /// Run a past calculation again
    Rerun {
        /// History entry id
        id: i64,
    },
}

#[derive(Clone, ValueEnum)]
enum CliDirection {
    Both,
    Plus,
    Minus,
}

impl From<CliDirection> for Direction {
    fn from(val: CliDirection) -> Self {
        match val {
            CliDirection::Both => Direction::PlusMinus,
            CliDirection::Plus => Direction::Plus,
            CliDirection::Minus => Direction::Minus,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum CliTopic {
    Derivative,
    Integral,
}

impl From<CliTopic> for PracticeTopic {
    fn from(val: CliTopic) -> Self {
        match val {
            CliTopic::Derivative => PracticeTopic::Derivative,
            CliTopic::Integral => PracticeTopic::Integral,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum CliDifficulty {
    Easy,
    Medium,
    Hard,
}

impl From<CliDifficulty> for Difficulty {
    fn from(val: CliDifficulty) -> Self {
        match val {
            CliDifficulty::Easy => Difficulty::Easy,
            CliDifficulty::Medium => Difficulty::Medium,
            CliDifficulty::Hard => Difficulty::Hard,
        }
    }
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("dev", "mathsolver", "mathsolver")
        .map(|dirs| dirs.data_dir().join("mathsolver.db"))
        .unwrap_or_else(|| PathBuf::from("mathsolver.db"))
}

fn open_store(db: Option<PathBuf>, cfg: &Config) -> Result<SqliteStore> {
    let path = db
        .or_else(|| cfg.store.path.as_ref().map(PathBuf::from))
        .unwrap_or_else(default_db_path);
    SqliteStore::new(&path).context("failed to open database")
}

/// Everything a command needs, wired from config and flags.
struct App {
    config: Config,
    store: SqliteStore,
    service: HttpSolveService,
    renderer: Box<dyn MathRenderer>,
    plain: bool,
}

impl App {
    fn orchestrator(&self) -> Orchestrator<'_> {
        Orchestrator::new(&self.service, &self.store, self.renderer.as_ref())
    }

    fn surfaces(&self) -> TerminalSurfaces<io::Stdout, io::Stderr> {
        let display = &self.config.display;
        TerminalSurfaces::stdio(display.chart_width, display.chart_height)
    }
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config()?;
    let store = open_store(cli.db, &cfg)?;
    let base_url = cli.url.unwrap_or_else(|| cfg.service.base_url.clone());
    let service = HttpSolveService::new(&base_url, Duration::from_secs(cfg.service.timeout_secs));
    tracing::debug!("solving service: {}", service.base_url());
    let plain = cli.plain || cfg.display.plain;
    let renderer: Box<dyn MathRenderer> = if plain {
        Box::new(RawRenderer)
    } else {
        Box::new(TextMathRenderer)
    };
    let app = App {
        config: cfg,
        store,
        service,
        renderer,
        plain,
    };

    match cli.command {
        Commands::Derivative {
            expression,
            variable,
        } => cmd_calculate(
            &app,
            Operation::Derivative,
            FormState {
                expression,
                variable,
                ..FormState::default()
            },
        ),
        Commands::Integral {
            expression,
            variable,
            definite,
            lower,
            upper,
        } => {
            if !definite && (lower.is_some() || upper.is_some()) {
                bail!("--lower/--upper need --definite");
            }
            cmd_calculate(
                &app,
                Operation::Integral,
                FormState {
                    expression,
                    variable,
                    definite,
                    lower: lower.unwrap_or_default(),
                    upper: upper.unwrap_or_default(),
                    ..FormState::default()
                },
            )
        }
        Commands::Limit {
            expression,
            variable,
            point,
            direction,
        } => cmd_calculate(
            &app,
            Operation::Limit,
            FormState {
                expression,
                variable,
                point: point.unwrap_or_default(),
                direction: direction.into(),
                ..FormState::default()
            },
        ),
        Commands::Practice {
            topic,
            difficulty,
            reveal,
        } => cmd_practice(
            &app,
            PracticeRequest {
                topic: topic.into(),
                difficulty: difficulty.into(),
            },
            reveal,
        ),
        Commands::Plot {
            expression,
            variable,
            x_min,
            x_max,
        } => cmd_plot(&app, expression, variable, x_min, x_max),
        Commands::History { command } => match command {
            HistoryCommands::List { limit } => cmd_history_list(&app, limit),
            HistoryCommands::Search { query } => cmd_history_search(&app, &query),
            HistoryCommands::Clear => cmd_history_clear(&app),
            HistoryCommands::Rerun { id } => cmd_history_rerun(&app, id),
        },
        Commands::Theme { toggle } => cmd_theme(&app, toggle),
        Commands::Shell => cmd_shell(&app),
        Commands::Config => cmd_config(&app),
    }
}

fn exit_code(outcome: &Outcome) -> ExitCode {
    if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn cmd_calculate(app: &App, tool: Operation, form: FormState) -> Result<ExitCode> {
    let orch = app.orchestrator();
    let mut state = ClientState::new();
    state.switch_tool(tool);
    let mut surfaces = app.surfaces();
    let outcome = orch.submit_form(&mut state, &mut surfaces, tool, &form);
    Ok(exit_code(&outcome))
}

fn cmd_practice(app: &App, request: PracticeRequest, reveal: bool) -> Result<ExitCode> {
    let orch = app.orchestrator();
    let mut state = ClientState::new();
    let mut surfaces = app.surfaces().reveal_solutions(reveal);
    Ok(match orch.practice(&mut state, &mut surfaces, &request) {
        Some(_) => ExitCode::SUCCESS,
        None => ExitCode::FAILURE,
    })
}

fn cmd_plot(
    app: &App,
    expression: String,
    variable: String,
    x_min: f64,
    x_max: f64,
) -> Result<ExitCode> {
    if expression.trim().is_empty() {
        bail!(EMPTY_EXPRESSION);
    }
    if x_min.partial_cmp(&x_max) != Some(Ordering::Less) {
        bail!("--x-min must be below --x-max");
    }
    let orch = app.orchestrator();
    let mut state = ClientState::new();
    let mut surfaces = app.surfaces();
    let request = GraphRequest {
        expression: expression.trim().to_string(),
        variable,
        x_min,
        x_max,
    };
    match orch.plot(&mut state, &mut surfaces, &request) {
        Some(series) if !series.is_empty() => {
            surfaces.flush_chart();
            Ok(ExitCode::SUCCESS)
        }
        Some(_) => {
            surfaces.line("Nothing to plot.");
            Ok(ExitCode::FAILURE)
        }
        None => Ok(ExitCode::FAILURE),
    }
}

fn cmd_history_list(app: &App, limit: usize) -> Result<ExitCode> {
    let entries = app.store.all()?;
    let shown: Vec<_> = entries.into_iter().take(limit).collect();
    app.surfaces().print_history(&shown);
    Ok(ExitCode::SUCCESS)
}

fn cmd_history_search(app: &App, query: &str) -> Result<ExitCode> {
    let entries = app.store.filter(query)?;
    app.surfaces().print_history(&entries);
    Ok(ExitCode::SUCCESS)
}

fn cmd_history_clear(app: &App) -> Result<ExitCode> {
    app.store.clear()?;
    println!("History cleared.");
    Ok(ExitCode::SUCCESS)
}

fn cmd_history_rerun(app: &App, id: i64) -> Result<ExitCode> {
    let orch = app.orchestrator();
    let mut state = ClientState::new();
    let mut surfaces = app.surfaces();
    let outcome = orch.rerun(&mut state, &mut surfaces, id);
    Ok(exit_code(&outcome))
}

fn cmd_theme(app: &App, toggle: bool) -> Result<ExitCode> {
    let mut theme = app.store.theme()?;
    if toggle {
        theme = theme.toggled();
        app.store.set_theme(theme)?;
    }
    println!("Theme: {theme}");
    Ok(ExitCode::SUCCESS)
}

fn cmd_shell(app: &App) -> Result<ExitCode> {
    let mut shell = Shell::new(app.orchestrator(), &app.store);
    let mut surfaces = app.surfaces();
    shell.run(io::stdin().lock(), &mut surfaces)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_config(app: &App) -> Result<ExitCode> {
    let cfg = &app.config;
    println!("Config: {}", config::show_config_path());
    println!();
    println!("[service]");
    println!("  base_url = {}", cfg.service.base_url);
    println!("  timeout_secs = {}", cfg.service.timeout_secs);
    println!();
    println!("[store]");
    println!(
        "  path = {}",
        cfg.store
            .path
            .as_deref()
            .unwrap_or("(default platform path)")
    );
    println!();
    println!("[display]");
    println!("  plain = {}", cfg.display.plain);
    println!("  chart_width = {}", cfg.display.chart_width);
    println!("  chart_height = {}", cfg.display.chart_height);
    println!();
    println!("Effective: {} (plain = {})", app.service.base_url(), app.plain);
    Ok(ExitCode::SUCCESS)
}
