//! lessonpath CLI - inspect and drive a lesson's progression from the terminal.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lessonpath_core::{Node, NodeId, NodeKind, Position, PositionMap};
use lessonpath_navigation::{HeadlessViewport, InputEvent, Key, Verdict};
use lessonpath_progress::{LessonDefinition, ProgressionGraph};
use lessonpath_session::LessonSession;
use lessonpath_storage::{JsonFileStore, KeyValueStore, ProgressStore};
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Key the viewport position is kept under, next to the progress blob.
const POSITION_KEY: &str = "position";

type Session = LessonSession<JsonFileStore, HeadlessViewport>;

#[derive(Parser)]
#[command(name = "lessonpath")]
#[command(about = "Lesson progression engine", long_about = None)]
struct Cli {
    /// Lesson definition file
    #[arg(long, short, global = true, default_value = "lesson.json")]
    definition: PathBuf,

    /// State directory
    #[arg(long, global = true, default_value = ".lessonpath")]
    state: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a lesson definition and list its nodes
    Validate,
    /// Show progress
    Status {
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move the cursor into a node
    Enter {
        /// Node ID
        node: String,
    },
    /// Mark a node's exit condition as satisfied
    Complete {
        /// Node ID
        node: String,
    },
    /// Move the viewport to a position
    Navigate {
        /// Target position
        position: Position,
    },
    /// Press a key (ArrowRight, PageUp, Home, End, ...)
    Key {
        /// DOM key name
        name: String,
    },
    /// Turn the mouse wheel
    Wheel {
        /// Wheel delta; positive moves forward
        #[arg(allow_hyphen_values = true)]
        delta: f64,
    },
    /// Drag the surface
    Drag {
        /// Displacement in pixels; negative moves forward
        #[arg(allow_hyphen_values = true)]
        delta: f64,
    },
    /// Discard progress and start over
    Reset,
}

fn init_logging() {
    // stdout carries command output; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let definition = load_definition(&cli.definition).await?;
    let graph = definition
        .build()
        .with_context(|| format!("invalid lesson definition {}", cli.definition.display()))?;

    if let Commands::Validate = cli.command {
        print_definition(&graph);
        return Ok(());
    }

    let mut session = open_session(&cli.state, &definition, graph).await?;
    let mut rx = session.subscribe();
    let now = Instant::now();

    match cli.command {
        Commands::Validate => {}
        Commands::Status { json } => {
            let summary = session.summary();
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_status(&session);
            }
        }
        Commands::Enter { node } => {
            let entry = session.enter_node(&NodeId::from(node), now).await?;
            println!(
                "Entered {}{} at position {}",
                entry.node,
                if entry.first_visit { " (first visit)" } else { "" },
                session.position()
            );
        }
        Commands::Complete { node } => {
            let outcome = session.complete_node(&NodeId::from(node), now).await?;
            session.fast_forward().await?;
            println!("Completed {}: {:?}", outcome.node, outcome.effect);
            for id in &outcome.unlocked {
                println!("  unlocked {}", id);
            }
        }
        Commands::Navigate { position } => {
            let verdict = session
                .handle_input(&InputEvent::SetPosition(position), now)
                .await?;
            print_verdict(&verdict, session.position());
        }
        Commands::Key { name } => {
            let verdict = session
                .handle_input(&InputEvent::Key(Key::parse(&name)), now)
                .await?;
            print_verdict(&verdict, session.position());
        }
        Commands::Wheel { delta } => {
            let verdict = session.handle_input(&InputEvent::Wheel { delta }, now).await?;
            print_verdict(&verdict, session.position());
        }
        Commands::Drag { delta } => {
            let verdict = session.handle_input(&InputEvent::Drag { delta }, now).await?;
            print_verdict(&verdict, session.position());
        }
        Commands::Reset => {
            session.reset().await?;
            println!("Progress reset; back at {}", session.graph().root());
        }
    }

    print_notifications(&mut rx)?;
    save_position(&mut session).await?;
    Ok(())
}

async fn load_definition(path: &Path) -> Result<LessonDefinition> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    LessonDefinition::from_json(&json)
        .with_context(|| format!("failed to parse {}", path.display()))
}

async fn open_session(
    state_dir: &Path,
    definition: &LessonDefinition,
    graph: ProgressionGraph,
) -> Result<Session> {
    let backend = JsonFileStore::new(state_dir).await?;
    let position = backend
        .get(POSITION_KEY)
        .await?
        .and_then(|raw| raw.trim().parse::<Position>().ok())
        .unwrap_or(0);

    let viewport = HeadlessViewport::new(definition.slides.len()).with_position(position);
    let session = LessonSession::open(
        graph,
        &definition.config,
        ProgressStore::new(backend),
        viewport,
    )
    .await;
    info!("State directory: {}", state_dir.display());
    Ok(session)
}

async fn save_position(session: &mut Session) -> Result<()> {
    let position = session.position().to_string();
    session
        .store_mut()
        .backend_mut()
        .set(POSITION_KEY, &position)
        .await?;
    Ok(())
}

fn print_definition(graph: &ProgressionGraph) {
    println!("Lesson OK: {} nodes, root {}", graph.nodes().len(), graph.root());
    for node in graph.nodes() {
        println!(
            "  {:<12} {:<7} {:<9} {}",
            node.id.as_str(),
            node.kind.as_str(),
            format_positions(node),
            node.title.as_deref().unwrap_or("")
        );
    }
}

fn print_status(session: &Session) {
    let graph = session.graph();
    let summary = session.summary();
    println!("Lesson Status");
    println!(
        "  Progress: {}/{} ({:.0}%)",
        summary.completed, summary.total, summary.percentage
    );
    println!("  Current: {}", summary.current);
    println!(
        "  Position: {} (reach {})",
        session.position(),
        summary.max_reachable
    );
    for node in graph.nodes() {
        println!(
            "  {:<12} {:<7} {}",
            node.id.as_str(),
            node.kind.as_str(),
            format_state(graph, node)
        );
    }
}

fn print_verdict(verdict: &Verdict, position: Position) {
    match verdict {
        Verdict::PassThrough => println!("Not a navigation key"),
        Verdict::Ignored => println!("Ignored (below threshold or transition in flight)"),
        Verdict::Unchanged => println!("Unchanged at {}", position),
        Verdict::Accepted { position, node } => {
            println!("Moved to {}{}", position, format_owner(node.as_ref()));
        }
        Verdict::Redirected { from, to, node } => {
            println!("Redirected {} -> {}{}", from, to, format_owner(node.as_ref()));
        }
        Verdict::Blocked {
            attempted,
            held,
            reason,
            ..
        } => println!("Blocked at {} (tried {}): {}", held, attempted, reason),
    }
}

fn print_notifications(rx: &mut broadcast::Receiver<lessonpath_core::Notification>) -> Result<()> {
    while let Ok(note) = rx.try_recv() {
        println!("  event {}", serde_json::to_string(&note.kind)?);
    }
    Ok(())
}

fn format_positions(node: &Node) -> String {
    match (node.first_position(), node.last_position()) {
        (Some(first), Some(last)) if first == last => first.to_string(),
        (Some(first), Some(last)) => format!("{}..={}", first, last),
        _ => "-".to_string(),
    }
}

fn format_owner(node: Option<&NodeId>) -> String {
    node.map(|id| format!(" ({})", id)).unwrap_or_default()
}

fn format_state(graph: &ProgressionGraph, node: &Node) -> &'static str {
    if graph.is_completed(&node.id) {
        "DONE"
    } else if graph.state().current() == &node.id {
        "CURRENT"
    } else if graph.is_unlocked(&node.id) {
        match node.kind {
            NodeKind::Hub { .. } => "OPEN",
            _ => "UNLOCKED",
        }
    } else {
        "LOCKED"
    }
}
