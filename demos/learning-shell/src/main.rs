//! Headless learning page driven by a scripted sequence of interactions
//!
//! Every step goes through the attached listener exactly like a real click or
//! key press would, and the outcome, collaborator calls and toasts are printed.

mod collaborators;
mod page;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use learning_actions::LearningTable;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::Widget;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use ui_dispatch::notice::toast_area;
use ui_dispatch::{
    parse_key_string, share, DispatchConfig, EventOutcome, Interaction, Listener, Toast,
};

#[derive(Parser, Debug)]
#[command(name = "learning-shell")]
#[command(about = "Replay interactions through the learning app's dispatch table")]
struct Cli {
    /// Dispatch configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Record resolution decisions and print them at the end
    #[arg(long, default_value_t = false)]
    trace: bool,

    /// Simulate a startup failure instead of becoming ready
    #[arg(long, default_value_t = false)]
    fail_startup: bool,

    /// Make feedback submission fail asynchronously
    #[arg(long, default_value_t = false)]
    flaky_feedback: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Click(&'static str),
    Key(&'static str, &'static str),
    MarkReady,
    MarkFailed,
    Wait(u64),
}

const BEFORE_READY: &[Step] = &[
    Step::Click("joke-next"),
    Step::Wait(100),
    Step::Click("joke-next"),
    Step::Click("footer"),
];

const AFTER_READY: &[Step] = &[
    Step::Click("reload"),
    Step::Click("dismiss"),
    Step::Click("fractions-title"),
    Step::Click("algebra"),
    Step::Key("rate-4", "enter"),
    Step::Key("rate-4", "x"),
    Step::Click("rate-9"),
    Step::Click("theme"),
    Step::Key("help", "space"),
    Step::Click("wipe"),
    Step::Click("unknown"),
    Step::Click("locked-quiz"),
    Step::Click("feedback"),
    Step::Click("placement"),
];

const TOAST_WIDTH: u16 = 44;
const TOAST_HEIGHT: u16 = 3;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            DispatchConfig::from_json(&json)?
        }
        None => DispatchConfig::default(),
    };
    config.trace_enabled |= cli.trace;

    let (document, handles) = page::build()?;
    let document = share(document);

    let dispatcher = Arc::new(LearningTable::dispatcher(&config)?);
    collaborators::register(
        dispatcher.collaborators(),
        document.clone(),
        cli.flaky_feedback,
    );

    let cancel = CancellationToken::new();
    let mut listener = dispatcher.clone().attach(document.clone(), cancel.clone())?;

    let startup = if cli.fail_startup {
        Step::MarkFailed
    } else {
        Step::MarkReady
    };
    let script = BEFORE_READY
        .iter()
        .chain(std::iter::once(&startup))
        .chain(AFTER_READY);

    let mut shown = dispatcher.notifier().shown_count();
    for step in script {
        match *step {
            Step::Click(handle) => {
                let origin = handles
                    .node(handle)
                    .with_context(|| format!("no node {handle}"))?;
                println!("click {handle}");
                send(&mut listener, Interaction::Click { origin }).await?;
            }
            Step::Key(handle, key) => {
                let target = handles
                    .node(handle)
                    .with_context(|| format!("no node {handle}"))?;
                let key = parse_key_string(key).with_context(|| format!("bad key {key}"))?;
                println!("key {handle}");
                send(&mut listener, Interaction::Key { target, key }).await?;
            }
            Step::MarkReady => {
                println!("== startup finished");
                dispatcher.gate().mark_ready();
            }
            Step::MarkFailed => {
                println!("== startup failed");
                dispatcher.gate().mark_failed();
            }
            Step::Wait(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
        }

        if dispatcher.notifier().shown_count() != shown {
            shown = dispatcher.notifier().shown_count();
            if let Some(toast) = dispatcher.notifier().current_toast() {
                print_toast(&toast);
            }
        }
    }

    // Let the placement flow and async hooks finish
    tokio::time::sleep(Duration::from_millis(200)).await;
    if dispatcher.notifier().shown_count() != shown {
        if let Some(toast) = dispatcher.notifier().current_toast() {
            print_toast(&toast);
        }
    }

    println!(
        "collaborator failures: {}, notices shown: {}, suppressed: {}",
        dispatcher.invoker().failure_count(),
        dispatcher.notifier().shown_count(),
        dispatcher.notifier().suppressed_count()
    );

    if dispatcher.tracer().is_enabled() {
        println!("{}", dispatcher.tracer().to_json()?);
    }

    cancel.cancel();
    listener.task.await?;
    Ok(())
}

async fn send(listener: &mut Listener, interaction: Interaction) -> Result<()> {
    listener.sender.send(interaction)?;
    let (_, outcome) = listener
        .outcomes
        .recv()
        .await
        .context("listener stopped")?;
    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &EventOutcome) {
    let prevented = if outcome.default_prevented {
        " (default prevented)"
    } else {
        ""
    };
    println!("  {:?}{prevented}", outcome.status);
}

fn print_toast(toast: &Toast) {
    let area = Rect::new(0, 0, TOAST_WIDTH + 2, TOAST_HEIGHT);
    let mut buf = Buffer::empty(area);
    let rect = toast_area(TOAST_WIDTH, TOAST_HEIGHT, area);
    toast.render(rect, &mut buf);

    for y in area.top()..area.bottom() {
        let line: String = (area.left()..area.right())
            .map(|x| buf[(x, y)].symbol())
            .collect();
        println!("  {}", line.trim_end());
    }
}
