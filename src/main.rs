// main.rs for trisk-map: terminal dashboard over the T-risk asset snapshot
use std::fs;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use trisk_map::{AppContext, DashboardConfig, Metric, Selection, SelectionField, render_selection};

mod app;
mod event;
mod ui;

use app::{App, export_artifacts};
use event::{Event, EventHandler};

const OUTPUT_DIR: &str = "output/";
const LOG_FILE: &str = "trisk-map.log";

#[derive(Parser, Debug)]
#[command(author, version, about = "Transition-risk choropleth dashboard", long_about = None)]
struct Cli {
    /// Dashboard configuration (JSON). Defaults to the built-in configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Asset snapshot (Feather / Arrow IPC file).
    #[arg(long)]
    assets: Option<PathBuf>,
    /// Country boundaries (GeoJSON FeatureCollection).
    #[arg(long)]
    boundaries: Option<PathBuf>,
    /// Directory for exported maps and the log file.
    #[arg(long, default_value = OUTPUT_DIR)]
    output_dir: PathBuf,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one selection to PNG, HTML and GeoJSON without the terminal UI.
    Render {
        #[arg(long, default_value = "production_plan_company_technology")]
        metric: Metric,
        #[arg(long)]
        baseline: Option<String>,
        #[arg(long)]
        target: Option<String>,
        #[arg(long)]
        technology: Option<String>,
        #[arg(long)]
        year: Option<i64>,
        #[arg(long)]
        shock_year: Option<i64>,
        /// Tooltip fields; defaults to the weighting metric.
        #[arg(long = "hover")]
        hover: Vec<Metric>,
        /// Output file name without extension.
        #[arg(long, default_value = "trisk-map")]
        name: String,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => DashboardConfig::from_file(path)?,
        None => DashboardConfig::builtin(),
    };
    if let Some(assets) = &cli.assets {
        config.assets_path = assets.clone();
    }
    if let Some(boundaries) = &cli.boundaries {
        config.boundaries_path = boundaries.clone();
    }
    let context = AppContext::new(config);

    match cli.command {
        Some(Command::Render {
            metric,
            baseline,
            target,
            technology,
            year,
            shock_year,
            hover,
            name,
        }) => {
            init_stderr_logging();
            let requested = Selection {
                baseline_scenario: baseline,
                target_scenario: target,
                technology,
                year,
                shock_year,
            };
            let hover = if hover.is_empty() { vec![metric] } else { hover };
            render_headless(context, requested, metric, &hover, &cli.output_dir, &name)
        }
        None => {
            fs::create_dir_all(&cli.output_dir)
                .wrap_err_with(|| format!("creating {}", cli.output_dir.display()))?;
            init_file_logging(&cli.output_dir)?;
            run_dashboard(context, cli.output_dir)
        }
    }
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .compact()
        .init();
}

/// Logs go to a file so they do not tear the terminal UI.
fn init_file_logging(dir: &std::path::Path) -> Result<()> {
    let path = dir.join(LOG_FILE);
    let file = fs::File::create(&path).wrap_err_with(|| format!("creating {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn render_headless(
    mut context: AppContext,
    requested: Selection,
    metric: Metric,
    hover: &[Metric],
    output_dir: &std::path::Path,
    name: &str,
) -> Result<()> {
    let (assets, boundaries) = context.load()?;
    let mut selection = requested.clone();
    selection.reconcile(&assets);
    for field in SelectionField::ORDER {
        let (asked, used) = (requested.get(field), selection.get(field));
        if let Some(asked) = asked.filter(|a| Some(a) != used.as_ref()) {
            let used = used.map(|v| v.to_string()).unwrap_or_default();
            warn!(
                field = field.label(),
                requested = %asked,
                used = %used,
                "requested value not available for this selection"
            );
        }
    }

    let outcome = render_selection(&assets, &boundaries, context.config(), &selection, metric, hover);
    export_artifacts(&outcome.artifact, output_dir, name)?;
    info!(
        filtered = outcome.filtered_rows,
        joined = outcome.joined_rows,
        dir = %output_dir.display(),
        "map exported"
    );
    println!(
        "{} rows matched, {} drawn. Wrote {name}.png/.html/.geojson to {}",
        outcome.filtered_rows,
        outcome.joined_rows,
        output_dir.display()
    );
    Ok(())
}

fn run_dashboard(context: AppContext, output_dir: PathBuf) -> Result<()> {
    // Load before touching the terminal so a bad input file is reported plainly.
    let mut app = App::new(context, output_dir)?;
    info!("dashboard ready");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = event_loop(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn event_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let events = EventHandler::new(Duration::from_millis(250));
    while !app.quit {
        terminal.draw(|frame| ui::render(frame, app))?;
        match events.next(Duration::from_millis(250)) {
            Ok(Some(Event::Input(key))) => app.handle_key(key)?,
            Ok(Some(Event::Tick | Event::Resize)) | Ok(None) => {}
            Err(_) => break,
        }
    }
    Ok(())
}
