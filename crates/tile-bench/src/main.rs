use std::io;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use clap::Parser;
use ratatui::layout::Rect;
use tile_layout::layout::compute_regions;
use tile_layout::{Layout, SplitDirection, TileId};

const DIRECTIONS: [SplitDirection; 4] = [
    SplitDirection::Left,
    SplitDirection::Right,
    SplitDirection::Top,
    SplitDirection::Bottom,
];

#[derive(Parser, Debug)]
#[command(
    name = "tile-bench",
    version = env!("CARGO_PKG_VERSION"),
    about = "Random add/split/move/close churn against a single layout"
)]
struct BenchCli {
    /// How long to run the benchmark.
    #[arg(
        short = 'd',
        long = "duration",
        value_name = "SECONDS",
        default_value_t = 5.0
    )]
    duration_seconds: f64,

    /// Upper bound on live tabs; closes are forced above it.
    #[arg(short = 't', long = "max-tabs", value_name = "COUNT", default_value_t = 64)]
    max_tabs: usize,

    /// Run the invariant checker every N operations (0 disables it).
    #[arg(short = 'c', long = "check-every", value_name = "OPS", default_value_t = 256)]
    check_every: u64,

    /// Fixed seed for a repeatable run.
    #[arg(short = 's', long = "seed")]
    seed: Option<u64>,
}

struct BenchConfig {
    duration: Duration,
    max_tabs: usize,
    check_every: u64,
    seed: u64,
    area: Rect,
}

impl TryFrom<&BenchCli> for BenchConfig {
    type Error = String;

    fn try_from(cli: &BenchCli) -> Result<Self, Self::Error> {
        if !(0.1..=600.0).contains(&cli.duration_seconds) {
            return Err("duration must be between 0.1 and 600 seconds".to_string());
        }
        if !(2..=4096).contains(&cli.max_tabs) {
            return Err("max-tabs must be between 2 and 4096".to_string());
        }
        Ok(Self {
            duration: Duration::from_secs_f64(cli.duration_seconds),
            max_tabs: cli.max_tabs,
            check_every: cli.check_every,
            seed: cli.seed.unwrap_or_else(seed_from_clock),
            area: Rect::new(0, 0, 240, 80),
        })
    }
}

fn main() -> io::Result<()> {
    let args = BenchCli::parse();
    let config = BenchConfig::try_from(&args)
        .map_err(|msg| io::Error::new(io::ErrorKind::InvalidInput, msg))?;

    let stats = run_benchmark(&config);
    println!("{}", stats.final_report(&config));
    if let ExitReason::InvariantBroken(_) = stats.exit_reason {
        return Err(io::Error::other("layout invariants broken"));
    }
    Ok(())
}

fn run_benchmark(config: &BenchConfig) -> BenchStats {
    let mut stats = BenchStats::new();
    let mut rng = Xorshift::new(config.seed);
    let mut layout = Layout::with_default_tab("bench-0");
    let mut next_name: u64 = 1;

    loop {
        let op = pick_op(&layout, &mut rng, config);
        let started = Instant::now();
        let outcome = apply(&mut layout, op, &mut rng, &mut next_name);
        let regions = compute_regions(&layout, config.area);
        stats.record(op, outcome, regions.len(), started.elapsed());

        if config.check_every > 0 && stats.op_count % config.check_every == 0 {
            let problems = layout.check_invariants();
            if let Some(first) = problems.into_iter().next() {
                stats.exit_reason = ExitReason::InvariantBroken(first);
                break;
            }
        }
        if stats.elapsed() >= config.duration {
            break;
        }
    }

    stats.final_tiles = layout.tiles().len();
    stats.mark_completed();
    stats
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Add,
    Split,
    Move,
    Close,
    Simplify,
}

impl Op {
    const ALL: [Op; 5] = [Op::Add, Op::Split, Op::Move, Op::Close, Op::Simplify];

    fn index(self) -> usize {
        self as usize
    }

    fn label(self) -> &'static str {
        match self {
            Op::Add => "add",
            Op::Split => "split",
            Op::Move => "move",
            Op::Close => "close",
            Op::Simplify => "simplify",
        }
    }
}

fn pick_op(layout: &Layout, rng: &mut Xorshift, config: &BenchConfig) -> Op {
    let tabs = live_tabs(layout).len();
    if tabs >= config.max_tabs {
        return Op::Close;
    }
    match rng.below(100) {
        0..=34 => Op::Add,
        35..=54 => Op::Split,
        55..=79 => Op::Move,
        80..=97 => Op::Close,
        _ => Op::Simplify,
    }
}

fn live_tabs(layout: &Layout) -> Vec<TileId> {
    layout
        .panels()
        .into_iter()
        .filter_map(|panel| layout.get(panel).and_then(|t| t.as_panel()))
        .flat_map(|panel| panel.tabs.iter().cloned())
        .collect()
}

fn choose<T: Clone>(items: &[T], rng: &mut Xorshift) -> Option<T> {
    if items.is_empty() {
        return None;
    }
    Some(items[rng.below(items.len() as u32) as usize].clone())
}

/// `Ok(true)` when the op changed the layout, `Ok(false)` when it was
/// skipped for lack of a target.
fn apply(
    layout: &mut Layout,
    op: Op,
    rng: &mut Xorshift,
    next_name: &mut u64,
) -> Result<bool, tile_layout::LayoutError> {
    let panels: Vec<TileId> = layout.panels().into_iter().cloned().collect();
    let tabs = live_tabs(layout);
    match op {
        Op::Add => {
            let parent = choose(&panels, rng).unwrap_or_else(|| layout.root_id().clone());
            let name = format!("bench-{next_name}");
            *next_name += 1;
            layout.add_tab(&parent, &name)?;
            Ok(true)
        }
        Op::Split => {
            let (Some(tab), Some(panel)) = (choose(&tabs, rng), choose(&panels, rng)) else {
                return Ok(false);
            };
            let direction = DIRECTIONS[rng.below(4) as usize];
            layout.split_panel(&tab, &panel, direction)?;
            Ok(true)
        }
        Op::Move => {
            let (Some(tab), Some(panel)) = (choose(&tabs, rng), choose(&panels, rng)) else {
                return Ok(false);
            };
            layout.move_tab(&tab, &panel, None)?;
            Ok(true)
        }
        Op::Close => {
            let Some(tab) = choose(&tabs, rng) else {
                return Ok(false);
            };
            layout.close_tab(&tab)?;
            Ok(true)
        }
        Op::Simplify => Ok(layout.simplify() > 0),
    }
}

#[derive(Default, Clone, Copy)]
struct OpCounter {
    applied: u64,
    skipped: u64,
    rejected: u64,
    time: Duration,
}

struct BenchStats {
    start: Instant,
    completed_at: Option<Instant>,
    op_count: u64,
    per_op: [OpCounter; 5],
    regions_computed: u64,
    fastest_op: Duration,
    slowest_op: Duration,
    final_tiles: usize,
    exit_reason: ExitReason,
}

impl BenchStats {
    fn new() -> Self {
        Self {
            start: Instant::now(),
            completed_at: None,
            op_count: 0,
            per_op: [OpCounter::default(); 5],
            regions_computed: 0,
            fastest_op: Duration::MAX,
            slowest_op: Duration::ZERO,
            final_tiles: 0,
            exit_reason: ExitReason::Completed,
        }
    }

    fn elapsed(&self) -> Duration {
        match self.completed_at {
            Some(done) => done.duration_since(self.start),
            None => self.start.elapsed(),
        }
    }

    fn mark_completed(&mut self) {
        self.completed_at = Some(Instant::now());
    }

    fn record(
        &mut self,
        op: Op,
        outcome: Result<bool, tile_layout::LayoutError>,
        regions: usize,
        took: Duration,
    ) {
        self.op_count = self.op_count.saturating_add(1);
        self.regions_computed = self.regions_computed.saturating_add(regions as u64);
        let counter = &mut self.per_op[op.index()];
        match outcome {
            Ok(true) => counter.applied += 1,
            Ok(false) => counter.skipped += 1,
            Err(_) => counter.rejected += 1,
        }
        counter.time += took;
        self.fastest_op = self.fastest_op.min(took);
        self.slowest_op = self.slowest_op.max(took);
    }

    fn ops_per_second(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.op_count as f64 / elapsed
        } else {
            0.0
        }
    }

    fn op_lines(&self) -> String {
        Op::ALL
            .iter()
            .map(|op| {
                let c = self.per_op[op.index()];
                let total = c.applied + c.skipped + c.rejected;
                let avg_us = if total > 0 {
                    c.time.as_secs_f64() * 1_000_000.0 / total as f64
                } else {
                    0.0
                };
                format!(
                    "  {:<9} applied {:>8} | skipped {:>6} | rejected {:>6} | avg {:>7.2} us",
                    op.label(),
                    c.applied,
                    c.skipped,
                    c.rejected,
                    avg_us
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn final_report(&self, config: &BenchConfig) -> String {
        let (best, worst) = if self.op_count == 0 {
            (0.0, 0.0)
        } else {
            (
                self.fastest_op.as_secs_f64() * 1_000_000.0,
                self.slowest_op.as_secs_f64() * 1_000_000.0,
            )
        };
        indoc::formatdoc!(
            r#"
            Tile bench {status}.
            Seed: {seed} | Duration: {elapsed:.2}s (target {target:.2}s)
            Ops: {ops} (~{ops_per_sec:.0}/s) | Best: {best:.2} us | Worst: {worst:.2} us
            Regions computed: {regions} | Tiles at end: {tiles}
            {per_op}
            "#,
            status = self.exit_reason.describe(),
            seed = config.seed,
            elapsed = self.elapsed().as_secs_f64(),
            target = config.duration.as_secs_f64(),
            ops = self.op_count,
            ops_per_sec = self.ops_per_second(),
            best = best,
            worst = worst,
            regions = self.regions_computed,
            tiles = self.final_tiles,
            per_op = self.op_lines(),
        )
    }
}

enum ExitReason {
    Completed,
    InvariantBroken(String),
}

impl ExitReason {
    fn describe(&self) -> String {
        match self {
            ExitReason::Completed => "completed full duration".to_string(),
            ExitReason::InvariantBroken(problem) => format!("stopped: {problem}"),
        }
    }
}

struct Xorshift {
    state: u64,
}

impl Xorshift {
    fn new(seed: u64) -> Self {
        // zero is a fixed point of xorshift
        Self {
            state: if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed },
        }
    }

    fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn below(&mut self, bound: u32) -> u32 {
        (self.next() % bound.max(1) as u64) as u32
    }
}

fn seed_from_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
        ^ 0xA5A5_A5A5_1234_5678
}
