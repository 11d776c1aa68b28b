use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use gud_server::catalog::Catalog;
use gud_server::dispatch::StandardDispatch;
use gud_server::error::{CatalogError, GameError};
use gud_server::logging;
use gud_server::server_utils::{normalize_line, parse_seed};
use gud_server::session::{Reply, Session};
use gud_server::world::{SharedWorld, World, WorldConfig};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

static WORLD: SharedWorld = SharedWorld::new();
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

const DEFAULT_HTTP_PORT: u16 = 8080;
const DEFAULT_TCP_PORT: u16 = 4000;

#[derive(Parser, Debug)]
#[command(name = "gud-server", about = "Multiplayer text dungeon server")]
struct Cli {
    /// HTTP/WebSocket port. Falls back to $PORT, then 8080.
    #[arg(long)]
    port: Option<u16>,

    /// Raw line-oriented TCP port. Falls back to $TCP_PORT, then 4000.
    #[arg(long)]
    tcp_port: Option<u16>,

    /// Directory holding the catalog text files. Falls back to $GUD_DATA_DIR,
    /// then the built-in lists.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// World seed. Falls back to $GUD_SEED, then a random seed.
    #[arg(long)]
    seed: Option<u32>,
}

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("world generation failed: {0}")]
    World(#[from] GameError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

struct AppState {
    world: Arc<World>,
    started_at: String,
}

type SharedState = Arc<AppState>;

#[derive(Clone, Debug)]
enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[tokio::main]
async fn main() {
    logging::init();
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        error!(error = %err, "server stopped");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), StartupError> {
    let port = cli
        .port
        .or_else(|| env_parse::<u16>("PORT"))
        .unwrap_or(DEFAULT_HTTP_PORT);
    let tcp_port = cli
        .tcp_port
        .or_else(|| env_parse::<u16>("TCP_PORT"))
        .unwrap_or(DEFAULT_TCP_PORT);
    let data_dir = cli
        .data_dir
        .or_else(|| std::env::var("GUD_DATA_DIR").ok().map(PathBuf::from));
    let seed = cli
        .seed
        .or_else(|| parse_seed(std::env::var("GUD_SEED").ok().as_deref()))
        .unwrap_or_else(rand::random::<u32>);

    let catalog = match &data_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "loading catalog");
            Catalog::load_dir(dir)?
        }
        None => Catalog::default(),
    };
    let built = World::build(&WorldConfig::default(), &catalog, seed)?;
    let world = WORLD.get_or_build(|| built);
    info!(seed = world.seed, towns = ?world.town_names(), "world ready");

    let state: SharedState = Arc::new(AppState {
        world,
        started_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    });

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/towns", get(towns_handler))
        .route("/ws", get(ws_handler))
        .with_state(state.clone());

    let http_listener = TcpListener::bind(("0.0.0.0", port)).await?;
    let tcp_listener = TcpListener::bind(("0.0.0.0", tcp_port)).await?;
    info!(port, tcp_port, "listening");

    tokio::try_join!(
        async { axum::serve(http_listener, app).await },
        serve_tcp(tcp_listener, state),
    )?;
    Ok(())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
}

fn open_session(state: &SharedState) -> (u64, Session) {
    let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
    let dispatch = StandardDispatch::new(state.world.seed ^ (id as u32).wrapping_mul(0x9e37_79b9));
    (id, Session::new(state.world.clone(), Box::new(dispatch)))
}

fn respond(session_id: u64, session: &mut Session, line: &str) -> Reply {
    let joining = session.player().is_none();
    let reply = session.handle_line(line);
    match session.player() {
        Some(player) if joining => {
            info!(session = session_id, player = %player.name, "player joined");
        }
        Some(player) => {
            debug!(
                session = session_id,
                player = %player.name,
                town = player.town,
                position = %player.position,
                command = line,
                "command handled"
            );
        }
        None => {}
    }
    reply
}

async fn healthz(State(state): State<SharedState>) -> impl IntoResponse {
    Json(json!({
        "ok": true,
        "seed": state.world.seed,
        "towns": state.world.towns().len(),
        "startedAt": state.started_at,
    }))
}

async fn towns_handler(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.world.to_view())
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (session_id, mut session) = open_session(&state);
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(256);
    info!(session = session_id, "websocket client connected");

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => {
                    ws_sender.send(Message::Text(payload.into())).await
                }
                OutboundMessage::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    ws_sender.send(Message::Close(Some(frame))).await
                }
            };
            if result.is_err() || should_close {
                break;
            }
        }
    });

    let mut open = queue_reply(&tx, &Session::greeting()).await;
    while open {
        let Some(Ok(message)) = ws_receiver.next().await else {
            break;
        };
        let raw = match message {
            Message::Text(raw) => raw.to_string(),
            Message::Binary(raw) => match String::from_utf8(raw.to_vec()) {
                Ok(text) => text,
                Err(_) => {
                    warn!(session = session_id, "dropping non-utf8 frame");
                    continue;
                }
            },
            Message::Close(_) => break,
            _ => continue,
        };
        let reply = respond(session_id, &mut session, normalize_line(&raw));
        open = queue_reply(&tx, &reply).await;
        if reply.close {
            let _ = tx
                .send(OutboundMessage::Close {
                    code: 1000,
                    reason: "bye".to_string(),
                })
                .await;
            break;
        }
    }

    drop(tx);
    let _ = writer.await;
    info!(session = session_id, "websocket client disconnected");
}

/// Returns false once the writer task has gone away.
async fn queue_reply(tx: &mpsc::Sender<OutboundMessage>, reply: &Reply) -> bool {
    for line in reply.rendered() {
        if tx.send(OutboundMessage::Text(line)).await.is_err() {
            return false;
        }
    }
    true
}

async fn serve_tcp(listener: TcpListener, state: SharedState) -> io::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        info!(peer = %peer, "tcp client connected");
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_tcp_client(stream, state).await {
                warn!(peer = %peer, err = %err, "tcp client ended with error");
            }
            info!(peer = %peer, "tcp client disconnected");
        });
    }
}

async fn handle_tcp_client(stream: TcpStream, state: SharedState) -> io::Result<()> {
    let (session_id, mut session) = open_session(&state);
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    write_reply(&mut writer, &Session::greeting()).await?;
    while let Some(line) = lines.next_line().await? {
        let reply = respond(session_id, &mut session, normalize_line(&line));
        write_reply(&mut writer, &reply).await?;
        if reply.close {
            break;
        }
    }
    writer.shutdown().await
}

async fn write_reply(writer: &mut OwnedWriteHalf, reply: &Reply) -> io::Result<()> {
    for line in reply.rendered() {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }
    writer.flush().await
}
