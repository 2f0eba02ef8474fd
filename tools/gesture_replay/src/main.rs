use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use gesture_engine::{
    event::GestureKind,
    trace::{self, DEFAULT_TAIL_MS, EVENT_HEADER},
    GestureConfig,
};
use log::info;

#[derive(Debug, Parser)]
#[command(name = "gesture_replay")]
#[command(about = "Replay a CSV touch trace through the gesture engine")]
struct Cli {
    /// Trace with one `frame,<t_ms>,<kind>,<id>:<x>:<y>;...` row per line.
    trace: PathBuf,
    /// Expected event kinds, one per line.
    #[arg(long)]
    expect: Option<PathBuf>,
    /// TOML file with a `[gestures]` table.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Time advanced past the last frame so pending timers fire.
    #[arg(long = "tail-ms", default_value_t = DEFAULT_TAIL_MS)]
    tail_ms: u64,
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => GestureConfig::from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => GestureConfig::default(),
    };
    let frames = trace::read_trace(&cli.trace)
        .with_context(|| format!("parsing {}", cli.trace.display()))?;
    info!("replaying {} frames from {}", frames.len(), cli.trace.display());

    let events = trace::replay(config, &frames, cli.tail_ms)?;

    println!("{EVENT_HEADER}");
    for event in &events {
        println!("{}", trace::format_event_row(event));
    }

    if let Some(expect_path) = &cli.expect {
        let expected = trace::read_expected_kinds(expect_path)
            .with_context(|| format!("parsing {}", expect_path.display()))?;
        let actual: Vec<GestureKind> = events.iter().map(|event| event.kind()).collect();
        if actual != expected {
            eprintln!("expected kinds: {}", join(&expected));
            eprintln!("actual kinds:   {}", join(&actual));
            bail!("event sequence mismatch");
        }
    }

    Ok(())
}

fn join(kinds: &[GestureKind]) -> String {
    kinds
        .iter()
        .map(|kind| kind.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}
