use crate::config::{SolverKind, load_config};
use crate::feed::{FeedError, load_overrides, parse_feed};
use crate::graph::ZoneFilter;
use crate::ir::{Direction, QuestFeed};
use crate::layout::{estimator_for, solver_for};
use crate::layout_dump::{LayoutDump, write_layout_dump};
use crate::render::{render_svg, write_output_svg};
use crate::scheduler::{LayoutScheduler, RunOutcome};
use crate::session::Session;
use crate::store::{CompletionStore, JsonFilePersistence};
use crate::view::{ViewCommand, ViewState};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "questmap", version, about = "Quest dependency graph layout and renderer")]
pub struct Args {
    /// Quest feed (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. SVG and JSON default to stdout when omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Manual required-level overrides (JSON5)
    #[arg(long = "overrides")]
    pub overrides: Option<PathBuf>,

    /// Character completion store (JSON), created on first write
    #[arg(long = "characters")]
    pub characters: Option<PathBuf>,

    /// Layout direction: LR or TB
    #[arg(long = "direction", default_value = "LR", value_parser = parse_direction)]
    pub direction: Direction,

    /// Zone filter: all, unzoned or a zone id
    #[arg(long = "zone", default_value = "all", value_parser = parse_zone)]
    pub zone: ZoneFilter,

    /// Dim quests the active character has completed
    #[arg(long = "hide-completed")]
    pub hide_completed: bool,

    /// Focus the view on the first quest matching this id or title
    #[arg(long = "focus")]
    pub focus: Option<String>,

    /// Layout backend: ranked or dagre
    #[arg(long = "solver", value_parser = parse_solver)]
    pub solver: Option<SolverKind>,

    /// Width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

fn parse_direction(value: &str) -> Result<Direction, String> {
    Direction::from_token(value)
        .ok_or_else(|| format!("unknown direction `{value}`, expected LR or TB"))
}

fn parse_zone(value: &str) -> Result<ZoneFilter, String> {
    ZoneFilter::from_token(value)
        .ok_or_else(|| format!("unknown zone `{value}`, expected all, unzoned or a number"))
}

fn parse_solver(value: &str) -> Result<SolverKind, String> {
    SolverKind::from_token(value).ok_or_else(|| format!("unknown solver `{value}`"))
}

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "questmap=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init();
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    if let Some(solver) = args.solver {
        config.layout.solver = solver;
    }

    // The feed is the only input whose failure is fatal.
    let feed = read_feed(args.input.as_deref()).context("quest data could not be loaded")?;
    let overrides = load_overrides(args.overrides.as_deref())?;
    let store = match args.characters.as_deref() {
        Some(path) => CompletionStore::open(Box::new(JsonFilePersistence::new(path)))?,
        None => CompletionStore::in_memory(),
    };

    let solver = solver_for(&config.layout)?;
    let heights = estimator_for(&config.layout);
    let view = ViewState {
        direction: args.direction,
        zone: args.zone,
        hide_completed: args.hide_completed,
        screen: (config.render.width, config.render.height),
        ..ViewState::default()
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let layout = runtime.block_on(async {
        let scheduler = LayoutScheduler::new(
            tokio::runtime::Handle::current(),
            config.layout.clone(),
            Arc::from(solver),
            Arc::from(heights),
        );
        let mut session = Session::new(feed, overrides, store, view, scheduler);
        session.relayout();
        match session.settle().await {
            Some(RunOutcome::Failed { error, .. }) => {
                return Err(anyhow::anyhow!("layout failed: {error}"));
            }
            Some(outcome) => tracing::debug!(?outcome, "initial layout settled"),
            None => {}
        }
        if let Some(query) = args.focus.clone() {
            session.apply(ViewCommand::Focus(query));
            if let Some(id) = session.view().focused.as_deref() {
                tracing::info!(id, "focused quest");
            }
        }
        Ok(session.layout())
    })?;

    match args.output_format {
        OutputFormat::Svg => {
            let svg = render_svg(&layout, &config.theme, &config.render);
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_png(&layout, &config, &output)?;
        }
        OutputFormat::Json => match args.output.as_deref() {
            Some(path) => write_layout_dump(path, &layout)?,
            None => {
                let dump = LayoutDump::from_layout(&layout);
                println!("{}", serde_json::to_string_pretty(&dump)?);
            }
        },
    }
    Ok(())
}

#[cfg(feature = "png")]
fn write_png(
    layout: &crate::layout::QuestLayout,
    config: &crate::config::Config,
    output: &Path,
) -> Result<()> {
    let svg = render_svg(layout, &config.theme, &config.render);
    crate::render::write_output_png(&svg, output, &config.render)
}

#[cfg(not(feature = "png"))]
fn write_png(
    _layout: &crate::layout::QuestLayout,
    _config: &crate::config::Config,
    _output: &Path,
) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn read_feed(path: Option<&Path>) -> Result<QuestFeed, FeedError> {
    match path {
        Some(path) if path != Path::new("-") => crate::feed::load_feed(path),
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|source| FeedError::Io {
                    path: "<stdin>".to_string(),
                    source,
                })?;
            parse_feed(&buf)
        }
    }
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}
