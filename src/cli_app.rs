//! Top-level CLI definition and dispatch.

use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use ascii_timeline::bridge::input::KEY_BINDINGS;
use ascii_timeline::bridge::model::TimelineModel;
use ascii_timeline::bridge::update::paint_full;
use ascii_timeline::core::config::Config;
use ascii_timeline::core::errors::AtlError;
use ascii_timeline::timeline::event::EventCatalog;
use ascii_timeline::timeline::grid::CellSurface;
use ascii_timeline::timeline::layout::{Frame, layout_frame};
use ascii_timeline::timeline::render::Theme;
use ascii_timeline::timeline::sample::sample_catalog;
use ascii_timeline::timeline::scale::{Coord, ZoomTier};
use ascii_timeline::timeline::surface::{DrawOp, RecordingSurface, Rgb};
use ascii_timeline::timeline::viewport::{ViewportController, ViewportState};
use ascii_timeline::tui::run_viewer;

/// ASCII timeline: a zoomable event timeline for the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "atl",
    author,
    version,
    about = "ASCII Timeline - zoomable event timeline drawn in the terminal",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Browse a dataset interactively.
    View(DatasetArgs),
    /// Draw one frame to stdout.
    Render(RenderArgs),
    /// Print the position table of one frame.
    Positions(FrameArgs),
    /// Write a seeded sample dataset as JSON.
    Demo(DemoArgs),
    /// List the interactive key bindings.
    Keys,
    /// Inspect configuration.
    Config(ConfigArgs),
    /// Generate shell completion scripts.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args)]
struct DatasetArgs {
    /// JSON file of `{id, title, date}` records.
    #[arg(value_name = "DATASET", required_unless_present = "demo")]
    dataset: Option<PathBuf>,
    /// Use a generated sample dataset instead of a file.
    #[arg(long, conflicts_with = "dataset")]
    demo: bool,
    /// Seed for `--demo`.
    #[arg(long, default_value_t = 7)]
    seed: u64,
    /// Event count for `--demo`.
    #[arg(long, default_value_t = 40)]
    count: usize,
}

#[derive(Debug, Clone, Args)]
struct FrameArgs {
    #[command(flatten)]
    dataset: DatasetArgs,
    /// Zoom tier: month, year or decade.
    #[arg(long, default_value = "month")]
    zoom: ZoomTier,
    /// Horizontal scroll offset in pixels.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    offset: f64,
    /// Select the event with this id; the view recenters on it.
    #[arg(long, value_name = "ID")]
    select: Option<String>,
    /// Canvas width in terminal columns.
    #[arg(long, default_value_t = 100)]
    width: u16,
    /// Canvas height in terminal rows.
    #[arg(long, default_value_t = 20)]
    height: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RenderFormat {
    /// Character grid.
    Text,
    /// Serialized draw operations.
    Ops,
}

#[derive(Debug, Clone, Args)]
struct RenderArgs {
    #[command(flatten)]
    frame: FrameArgs,
    /// Output format.
    #[arg(long, value_enum, default_value_t = RenderFormat::Text)]
    format: RenderFormat,
}

#[derive(Debug, Clone, Args)]
struct DemoArgs {
    /// RNG seed.
    #[arg(long, default_value_t = 7)]
    seed: u64,
    /// Number of events.
    #[arg(long, default_value_t = 40)]
    count: usize,
    /// Write to a file instead of stdout.
    #[arg(long, short, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Args, Default)]
struct ConfigArgs {
    /// Config operation to run.
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print resolved config file path.
    Path,
    /// Print effective merged configuration.
    Show,
    /// Validate configuration and exit.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input: bad flags, config or dataset.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Json(_) => 3,
        }
    }
}

impl From<AtlError> for CliError {
    fn from(err: AtlError) -> Self {
        if err.is_input_error() {
            Self::User(err.to_string())
        } else {
            Self::Runtime(err.to_string())
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::View(args) => run_view(cli, args),
        Command::Render(args) => run_render(cli, args),
        Command::Positions(args) => run_positions(cli, args),
        Command::Demo(args) => run_demo(cli, args),
        Command::Keys => run_keys(cli),
        Command::Config(args) => run_config(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

// ──────────────────── dataset and frame setup ────────────────────

fn load_dataset(args: &DatasetArgs) -> Result<(EventCatalog, String), CliError> {
    if args.demo {
        let source = format!("demo(seed={}, count={})", args.seed, args.count);
        return Ok((sample_catalog(args.seed, args.count), source));
    }
    let path = args
        .dataset
        .as_deref()
        .ok_or_else(|| CliError::User("a DATASET path or --demo is required".to_string()))?;
    let catalog = EventCatalog::load_json(path)?;
    Ok((catalog, path.display().to_string()))
}

/// Largest `--offset` magnitude accepted, in pixels.
const MAX_OFFSET_PX: f64 = 1.0e12;

fn parse_offset(raw: f64) -> Result<Coord, CliError> {
    if !raw.is_finite() || raw.abs() > MAX_OFFSET_PX {
        return Err(CliError::User(format!(
            "--offset must be a finite number within ±{MAX_OFFSET_PX:e} px, got {raw}"
        )));
    }
    Ok(Coord::from_px_f64(raw))
}

/// Model positioned as `args` describe, ready for one layout pass.
fn frame_model(
    config: &Config,
    catalog: EventCatalog,
    args: &FrameArgs,
) -> Result<TimelineModel, CliError> {
    let width = Coord::from_px(i64::from(args.width) * i64::from(config.terminal.cell_width_px));
    let state = ViewportState::new(args.zoom, parse_offset(args.offset)?);
    let viewport = ViewportController::new(width)
        .with_state(state)
        .keep_center_on_zoom(config.input.keep_center_on_zoom);
    let mut model = TimelineModel::new(catalog, width)
        .with_layout(config.layout.to_settings())
        .with_bridge(config.input.to_bridge_settings())
        .with_viewport(viewport);

    if let Some(id) = &args.select {
        let index = model
            .catalog
            .index_of(id)
            .ok_or_else(|| CliError::User(format!("no event with id {id:?}")))?;
        let _ = model.viewport.select_by_index(index, &model.catalog);
    }
    Ok(model)
}

fn grid_for(config: &Config, args: &FrameArgs, tier: ZoomTier) -> CellSurface {
    let mut grid = CellSurface::new(
        usize::from(args.width),
        usize::from(args.height),
        f64::from(config.terminal.cell_width_px),
        f64::from(tier.font_size_px()),
    );
    grid.fit_tier(tier);
    grid
}

/// Paint one frame onto a character grid.
fn render_grid(config: &Config, model: &mut TimelineModel, args: &FrameArgs) -> CellSurface {
    let mut grid = grid_for(config, args, model.state().zoom);
    paint_full(model, Some(&mut grid), &config.theme);
    grid
}

/// Paint one frame onto a recording surface and return its display list.
fn render_ops(config: &Config, model: &mut TimelineModel, args: &FrameArgs) -> Vec<DrawOp> {
    let grid = grid_for(config, args, model.state().zoom);
    let (cell_w, cell_h) = grid.cell_size();
    let mut surface = RecordingSurface::new(
        f64::from(args.width) * cell_w,
        f64::from(args.height) * cell_h,
    );
    paint_full(model, Some(&mut surface), &config.theme);
    surface.take_ops()
}

/// Grid rows without trailing blank lines.
fn trimmed_lines(grid: &CellSurface) -> Vec<String> {
    let mut lines = grid.to_lines();
    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines
}

/// Grid row with each run of same-colored cells painted in that color.
fn colored_row(grid: &CellSurface, row: usize, theme: &Theme) -> String {
    let mut out = String::new();
    let mut run = String::new();
    let mut run_color: Option<Rgb> = None;
    let cells = grid.row_cells(row);
    let end = cells
        .iter()
        .rposition(|cell| cell.ch != ' ')
        .map_or(0, |last| last + 1);
    for cell in &cells[..end] {
        let color = cell.color.unwrap_or(theme.default_color);
        if run_color != Some(color) && !run.is_empty() {
            out.push_str(&paint(&run, run_color.unwrap_or(color)));
            run.clear();
        }
        run_color = Some(color);
        run.push(cell.ch);
    }
    if let Some(color) = run_color {
        out.push_str(&paint(&run, color));
    }
    out
}

fn paint(text: &str, color: Rgb) -> String {
    text.truecolor(color.0, color.1, color.2).to_string()
}

// ──────────────────── commands ────────────────────

fn run_view(cli: &Cli, args: &DatasetArgs) -> Result<(), CliError> {
    if !io::stdout().is_terminal() {
        return Err(CliError::User(
            "view needs an interactive terminal; use `atl render` for piped output".to_string(),
        ));
    }
    let config = Config::load(cli.config.as_deref())?;
    let (catalog, source) = load_dataset(args)?;
    run_viewer(catalog, &config, &source)?;
    Ok(())
}

fn run_render(cli: &Cli, args: &RenderArgs) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let (catalog, _) = load_dataset(&args.frame.dataset)?;
    let mut model = frame_model(&config, catalog, &args.frame)?;
    let state = model.state();

    match args.format {
        RenderFormat::Ops => {
            let ops = render_ops(&config, &mut model, &args.frame);
            match output_mode(cli) {
                OutputMode::Human => {
                    let mut stdout = io::stdout().lock();
                    serde_json::to_writer_pretty(&mut stdout, &ops)?;
                    writeln!(stdout)?;
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "render",
                        "format": "ops",
                        "viewport": state,
                        "ops": ops,
                    });
                    write_json_line(&payload)?;
                }
            }
        }
        RenderFormat::Text => {
            let grid = render_grid(&config, &mut model, &args.frame);
            match output_mode(cli) {
                OutputMode::Human => {
                    let rows = trimmed_lines(&grid).len();
                    let mut stdout = io::stdout().lock();
                    for row in 0..rows {
                        writeln!(stdout, "{}", colored_row(&grid, row, &config.theme))?;
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "render",
                        "format": "text",
                        "viewport": state,
                        "lines": trimmed_lines(&grid),
                    });
                    write_json_line(&payload)?;
                }
            }
        }
    }
    Ok(())
}

fn run_positions(cli: &Cli, args: &FrameArgs) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let (catalog, _) = load_dataset(&args.dataset)?;
    let model = frame_model(&config, catalog, args)?;
    let state = model.state();
    let frame = layout_frame(
        &model.catalog,
        state,
        model.viewport.canvas_width(),
        &model.layout,
    );

    match output_mode(cli) {
        OutputMode::Human => print_positions(&frame, state),
        OutputMode::Json => {
            let payload = json!({
                "command": "positions",
                "viewport": state,
                "canvas_width": frame.canvas_width,
                "positions": frame.positions,
                "labels": frame.labels,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn print_positions(frame: &Frame, state: ViewportState) {
    println!(
        "{} zoom={} offset={}px visible={}",
        "Position table".bold(),
        state.zoom,
        state.scroll_offset_x,
        frame.positions.len()
    );
    if frame.positions.is_empty() {
        println!("  (no events in view)");
        return;
    }
    println!(
        "  {:<12} {:>9} {:>7} {:>7} {:>6}  title",
        "id", "x", "y", "width", "height"
    );
    for node in frame.positions.iter() {
        let title = if state.selected_index == Some(node.source_index) {
            node.display_title.yellow().bold().to_string()
        } else {
            node.display_title.clone()
        };
        println!(
            "  {:<12} {:>9} {:>7} {:>7} {:>6}  {title}",
            node.event_id,
            node.screen_x.to_string(),
            node.screen_y.to_string(),
            node.width.to_string(),
            node.height.to_string(),
        );
    }
    let labels: Vec<&str> = frame.labels.iter().map(|label| label.text.as_str()).collect();
    println!("  labels: {}", labels.join(", ").dimmed());
}

fn run_demo(cli: &Cli, args: &DemoArgs) -> Result<(), CliError> {
    let records = sample_catalog(args.seed, args.count).to_records();
    let body = serde_json::to_string_pretty(&records)?;

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .map_err(|e| CliError::Runtime(format!("create {}: {e}", parent.display())))?;
            }
            fs::write(path, format!("{body}\n"))
                .map_err(|e| CliError::Runtime(format!("write {}: {e}", path.display())))?;
            match output_mode(cli) {
                OutputMode::Human => println!(
                    "{} {} events to {}",
                    "Wrote".green(),
                    records.len(),
                    path.display()
                ),
                OutputMode::Json => write_json_line(&json!({
                    "command": "demo",
                    "path": path.to_string_lossy(),
                    "events": records.len(),
                    "seed": args.seed,
                }))?,
            }
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{body}")?;
        }
    }
    Ok(())
}

fn run_keys(cli: &Cli) -> Result<(), CliError> {
    match output_mode(cli) {
        OutputMode::Human => {
            for binding in KEY_BINDINGS {
                println!("  {:<18} {}", binding.keys.cyan(), binding.description);
            }
        }
        OutputMode::Json => {
            let bindings: Vec<Value> = KEY_BINDINGS
                .iter()
                .map(|binding| json!({ "keys": binding.keys, "description": binding.description }))
                .collect();
            write_json_line(&json!({ "command": "keys", "bindings": bindings }))?;
        }
    }
    Ok(())
}

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = Config::load(cli.config.as_deref())?;

            match output_mode(cli) {
                OutputMode::Human => {
                    let toml_str = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::Runtime(format!("serialize config: {e}")))?;
                    println!("{toml_str}");
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config show",
                        "config": serde_json::to_value(&config)?,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                let hash = config.stable_hash()?;

                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("{}", "Configuration is valid.".green());
                        println!("  Source: {}", config.paths.config_file.display());
                        println!("  Hash: {hash}");
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": true,
                            "path": config.paths.config_file.to_string_lossy(),
                            "hash": hash,
                        });
                        write_json_line(&payload)?;
                    }
                }
                Ok(())
            }
            Err(e) => {
                match output_mode(cli) {
                    OutputMode::Human => {
                        eprintln!("{} {e}", "Configuration is INVALID:".red());
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": false,
                            "code": e.code(),
                            "error": e.to_string(),
                        });
                        write_json_line(&payload)?;
                    }
                }
                Err(CliError::User(format!("invalid config: {e}")))
            }
        },
    }
}

// ──────────────────── output ────────────────────

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("ATL_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}
