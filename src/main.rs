use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use ratatui::layout::Rect;
use tracing::Level;

use tile_layout::diagnostics::DiagnosticsHandle;
use tile_layout::layout::compute_regions;
use tile_layout::persist::{JsonFileAdapter, PersistenceAdapter};
use tile_layout::tracing_sub::{self, LogSink};
use tile_layout::{Layout, LayoutConfig, LayoutError, Result, SizeSpec, SplitDirection, TileId};

#[derive(Parser, Debug)]
#[command(
    name = "tile-layout",
    version = env!("CARGO_PKG_VERSION"),
    about = "Build, inspect and edit saved tile layouts"
)]
struct Cli {
    /// JSON settings file.
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log mutations at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Collect log output in memory and print it after the command.
    #[arg(long, global = true)]
    dump_log: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a sample workbench layout and print it.
    Demo {
        #[command(flatten)]
        area: AreaArgs,
        /// Print the serialized layout instead of the outline.
        #[arg(long)]
        json: bool,
    },
    /// Load a saved layout (falling back to the default one) and print it.
    Inspect {
        file: PathBuf,
        #[command(flatten)]
        area: AreaArgs,
    },
    /// Split a panel and move a tab into the new half.
    Split {
        file: PathBuf,
        #[arg(long)]
        tab: String,
        #[arg(long)]
        panel: String,
        #[arg(long, value_parser = parse_direction)]
        direction: SplitDirection,
    },
    /// Close a tab.
    Close {
        file: PathBuf,
        #[arg(long)]
        tab: String,
    },
    /// Collapse single-path sub-grids.
    Simplify { file: PathBuf },
}

#[derive(Args, Debug, Clone, Copy)]
struct AreaArgs {
    #[arg(long)]
    width: Option<u16>,
    #[arg(long)]
    height: Option<u16>,
}

impl AreaArgs {
    fn rect(&self, config: &LayoutConfig) -> Rect {
        let mut area = config.area.rect();
        if let Some(width) = self.width {
            area.width = width;
        }
        if let Some(height) = self.height {
            area.height = height;
        }
        area
    }
}

fn parse_direction(raw: &str) -> std::result::Result<SplitDirection, String> {
    raw.parse().map_err(|err: LayoutError| err.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => LayoutConfig::from_file(path)?,
        None => LayoutConfig::default(),
    };
    let log = cli
        .dump_log
        .then(|| DiagnosticsHandle::new(config.max_log_lines));
    let sink = match &log {
        Some(handle) => LogSink::Diagnostics(handle.clone()),
        None => LogSink::Stderr,
    };
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_sub::init(level, sink);

    let result = match cli.command {
        Command::Demo { area, json } => demo(&config, area.rect(&config), json),
        Command::Inspect { file, area } => inspect(&config, &file, area.rect(&config)),
        Command::Split {
            file,
            tab,
            panel,
            direction,
        } => edit(&file, |layout| {
            let panel = layout.split_panel(&TileId::new(tab), &TileId::new(panel), direction)?;
            println!("new panel {panel}");
            Ok(())
        }),
        Command::Close { file, tab } => edit(&file, |layout| layout.close_tab(&TileId::new(tab))),
        Command::Simplify { file } => edit(&file, |layout| {
            println!("collapsed {} grid(s)", layout.simplify());
            Ok(())
        }),
    };

    if let Some(log) = log {
        for line in log.lines() {
            println!("{line}");
        }
    }
    result
}

fn demo(config: &LayoutConfig, area: Rect, json: bool) -> Result<()> {
    let mut layout = Layout::new();
    if let Some(path) = &config.persist_path {
        layout.set_persistence(Box::new(JsonFileAdapter::new(path)));
    }

    let editor = layout
        .root_grid()
        .row(None)?
        .with_column(Some(SizeSpec::pixels(24.0)), |column| {
            column.content("explorer", serde_json::Map::new()).map(|_| ())
        })?
        .column(None)?
        .panel()?
        .tab("main.rs")?
        .id()
        .clone();
    let editor_panel = layout
        .get(&editor)
        .and_then(|t| t.parent.clone())
        .ok_or_else(|| LayoutError::NotFound(editor.clone()))?;
    layout.add_tab(&editor_panel, "lib.rs")?;
    let terminal = layout.add_tab(&editor_panel, "terminal")?;
    layout.split_panel(&terminal, &editor_panel, SplitDirection::Bottom)?;
    layout.select_tab(&editor)?;
    layout.flush_frame();

    if json {
        println!("{}", layout.to_json()?);
    } else {
        print_layout(&layout, area);
    }
    Ok(())
}

fn inspect(config: &LayoutConfig, file: &Path, area: Rect) -> Result<()> {
    let mut layout = Layout::with_default_tab(&config.default_tab_name);
    layout.set_persistence(Box::new(JsonFileAdapter::new(file)));
    if !layout.restore() {
        println!("(no usable layout in {}; showing the default)", file.display());
    }
    layout.take_persistence();
    print_layout(&layout, area);
    Ok(())
}

fn print_layout(layout: &Layout, area: Rect) {
    print!("{}", layout.describe());
    let regions = compute_regions(layout, area);
    println!();
    for panel in layout.panels() {
        if let Some(rect) = regions.get(panel) {
            println!(
                "panel {panel}: x={} y={} w={} h={}",
                rect.x, rect.y, rect.width, rect.height
            );
        }
    }
    for problem in layout.check_invariants() {
        println!("warning: {problem}");
    }
}

/// Load `file` strictly, apply `op` and write the result back.
fn edit(file: &Path, op: impl FnOnce(&mut Layout) -> Result<()>) -> Result<()> {
    let mut adapter = JsonFileAdapter::new(file);
    let snapshot = adapter.load()?.ok_or_else(|| {
        LayoutError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", file.display()),
        ))
    })?;
    let mut layout = Layout::from_snapshot(snapshot)?;
    op(&mut layout)?;
    adapter.save(&layout.to_snapshot())?;
    print!("{}", layout.describe());
    Ok(())
}
