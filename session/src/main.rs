use serde::Deserialize;
use sketch_core::config::{ConfigError, EngineConfig};
use sketch_core::geometry::Tessellation;
use sketch_core::picking::{Camera, Viewport};
use sketch_core::protocol::Command;
use sketch_core::session::{SketchEvent, SketchSession};
use sketch_core::sketch::pattern::{CircularPatternParams, LinearPatternParams};
use sketch_core::sketch::tools::{PointerEvent, ToolKind};
use sketch_core::sketch::types::{Sketch, SketchPlane};
use sketch_core::topo::{EntityId, SelectionFilter};
use std::error::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Optional path to an `EngineConfig` JSON file.
const CONFIG_ENV: &str = "SKETCH_CONFIG";
/// Optional UUID of the sketch feature being edited.
const FEATURE_ENV: &str = "SKETCH_FEATURE_ID";

/// One line of stdin. Sketch-local events carry `u`/`v`, screen events carry
/// pixel coordinates and go through picking first.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InputEvent {
    SetTool {
        tool: Option<ToolKind>,
    },
    Cancel,
    PointerDown {
        u: f64,
        v: f64,
        #[serde(default)]
        event: PointerEvent,
    },
    PointerMove {
        u: f64,
        v: f64,
        #[serde(default)]
        event: PointerEvent,
    },
    PointerUp {
        u: f64,
        v: f64,
        #[serde(default)]
        event: PointerEvent,
    },
    SetView {
        camera: Camera,
        viewport: Viewport,
    },
    /// Render buffers of the solid behind the sketch, for picking and projection.
    SetSolid {
        solid: Option<Tessellation>,
    },
    ScreenDown {
        screen: [f64; 2],
        #[serde(default)]
        event: PointerEvent,
    },
    ScreenMove {
        screen: [f64; 2],
        #[serde(default)]
        event: PointerEvent,
    },
    ScreenUp {
        screen: [f64; 2],
        #[serde(default)]
        event: PointerEvent,
    },
    Select {
        id: EntityId,
        #[serde(default)]
        additive: bool,
    },
    ClearSelection,
    SetFilter {
        filter: SelectionFilter,
    },
    Remove {
        id: EntityId,
    },
    ToggleSuppression {
        index: usize,
    },
    Mirror {
        axis: EntityId,
    },
    LinearPattern {
        params: LinearPatternParams,
    },
    CircularPattern {
        params: CircularPatternParams,
    },
    PreviewLinearPattern {
        params: LinearPatternParams,
    },
    PreviewCircularPattern {
        params: CircularPatternParams,
    },
    ClearPatternPreview,
    /// A raw `TAG:<json>` line from the solver process.
    Inbound {
        line: String,
    },
}

fn load_config() -> Result<EngineConfig, ConfigError> {
    match std::env::var(CONFIG_ENV) {
        Ok(path) => {
            info!("Loading config from {}", path);
            EngineConfig::from_path(path)
        }
        Err(_) => Ok(EngineConfig::default()),
    }
}

fn feature_id() -> EntityId {
    std::env::var(FEATURE_ENV)
        .ok()
        .and_then(|s| match uuid::Uuid::parse_str(s.trim()) {
            Ok(uuid) => Some(EntityId::from_uuid(uuid)),
            Err(e) => {
                warn!("Ignoring invalid {}: {}", FEATURE_ENV, e);
                None
            }
        })
        .unwrap_or_else(|| EntityId::new_deterministic("Sketch1"))
}

fn apply(session: &mut SketchSession, input: InputEvent) {
    match input {
        InputEvent::SetTool { tool } => session.set_tool(tool),
        InputEvent::Cancel => session.cancel_tool(),
        InputEvent::PointerDown { u, v, event } => session.pointer_down(u, v, &event),
        InputEvent::PointerMove { u, v, event } => session.pointer_move(u, v, &event),
        InputEvent::PointerUp { u, v, event } => session.pointer_up(u, v, &event),
        InputEvent::SetView { camera, viewport } => session.set_view(camera, viewport),
        InputEvent::SetSolid { solid } => session.set_solid(solid),
        InputEvent::ScreenDown { screen, event } => session.screen_down(screen, &event),
        InputEvent::ScreenMove { screen, event } => session.screen_move(screen, &event),
        InputEvent::ScreenUp { screen, event } => session.screen_up(screen, &event),
        InputEvent::Select { id, additive } => session.select(id, additive),
        InputEvent::ClearSelection => session.clear_selection(),
        InputEvent::SetFilter { filter } => session.set_filter(filter),
        InputEvent::Remove { id } => {
            if !session.remove_entity(id) {
                warn!("Entity {} not found for removal", id);
            }
        }
        InputEvent::ToggleSuppression { index } => match session.toggle_constraint_suppression(index) {
            Some(suppressed) => info!("Constraint {} suppressed: {}", index, suppressed),
            None => warn!("No constraint at index {}", index),
        },
        InputEvent::Mirror { axis } => {
            if !session.mirror(axis) {
                debug!("Mirror across {} produced nothing", axis);
            }
        }
        InputEvent::LinearPattern { params } => {
            if !session.linear_pattern(&params) {
                debug!("Linear pattern produced nothing");
            }
        }
        InputEvent::CircularPattern { params } => {
            if !session.circular_pattern(&params) {
                debug!("Circular pattern produced nothing");
            }
        }
        InputEvent::PreviewLinearPattern { params } => session.preview_linear_pattern(&params),
        InputEvent::PreviewCircularPattern { params } => session.preview_circular_pattern(&params),
        InputEvent::ClearPatternPreview => session.clear_pattern_preview(),
        InputEvent::Inbound { line } => {
            if let Err(e) = session.handle_inbound_line(&line) {
                warn!("Dropping inbound line: {}", e);
            }
        }
    }
}

async fn write_commands(stdout: &mut Stdout, commands: Vec<Command>) -> std::io::Result<()> {
    for command in commands {
        match command.to_json() {
            Ok(json) => {
                debug!("Sending {}", command.name());
                stdout.write_all(json.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
            }
            Err(e) => warn!("Failed to encode {}: {}", command.name(), e),
        }
    }
    stdout.flush().await
}

/// Owns the session for its whole lifetime; every mutation arrives here.
async fn run_session(mut session: SketchSession, mut inputs: mpsc::Receiver<InputEvent>) -> std::io::Result<()> {
    let mut stdout = tokio::io::stdout();
    while let Some(input) = inputs.recv().await {
        apply(&mut session, input);
        let commands = session.drain_outbox();
        if !commands.is_empty() {
            write_commands(&mut stdout, commands).await?;
        }
    }
    info!(
        entities = session.sketch().committed_entities().count(),
        constraints = session.sketch().constraints.len(),
        "Input closed"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // stdout carries commands; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "sketch_core=info,sketch_session=info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = load_config().inspect_err(|e| warn!("{}", e))?;
    let feature = feature_id();
    info!("Editing sketch feature {}", feature);

    let mut session = SketchSession::new(feature, Sketch::new(SketchPlane::default()), config);
    session.subscribe(Box::new(|event: &SketchEvent| debug!(?event, "session event")));

    let (tx, rx) = mpsc::channel(64);
    let owner = tokio::spawn(run_session(session, rx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<InputEvent>(&line) {
            Ok(input) => {
                if tx.send(input).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!("Ignoring malformed input: {}", e),
        }
    }
    drop(tx);

    owner.await??;
    Ok(())
}
