use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use futures::{SinkExt, StreamExt};
use holdem_engine::TableConfig;
use tokio::sync::{mpsc, oneshot};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use holdem_server::actor::ActorCommand;
use holdem_server::config::ServerConfig;
use holdem_server::error::TransportError;
use holdem_server::protocol::{is_valid_name, validate_amount, validate_chat_message, ClientAction, Reply};
use holdem_server::registry::Registry;

#[derive(Clone)]
struct AppState {
    registry: Registry,
}

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    tracing_subscriber::fmt().with_env_filter(EnvFilter::new(config.log.clone())).init();

    let registry = Registry::new(TableConfig::default());
    tokio::spawn(registry.clone().run_reaper(std::time::Duration::from_secs(config.reap_interval_secs)));

    let cors = if config.client_origin == "*" {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        let origin: axum::http::HeaderValue =
            config.client_origin.parse().expect("POKER_CLIENT_ORIGIN must be a valid origin");
        CorsLayer::new().allow_origin(origin).allow_methods(Any).allow_headers(Any)
    };

    let state = AppState { registry };
    let mut app = Router::new().route("/ws", get(ws_handler)).layer(cors).with_state(state);

    if let Some(dir) = &config.static_dir {
        app = app.nest_service("/", ServeDir::new(dir));
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "starting holdem-server");
    let listener = tokio::net::TcpListener::bind(addr).await.expect("bind listener");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.expect("failed to install ctrl_c handler");
    info!("shutdown signal received");
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// One websocket connection may hold exactly one seat per table it has
/// joined; `player_ids` tracks those so `leave_table`/disconnect can clean
/// them up without the client having to remember its own id.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (client_tx, mut client_rx) = mpsc::unbounded_channel();

    let writer = tokio::spawn(async move {
        while let Some(event) = client_rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(err) => {
                    warn!(%err, "failed to serialize outbound event");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let mut player_ids: std::collections::HashMap<String, String> = std::collections::HashMap::new();

    while let Some(Ok(message)) = ws_rx.next().await {
        let Message::Text(text) = message else { continue };
        let action = match serde_json::from_str::<ClientAction>(&text) {
            Ok(action) => action,
            Err(err) => {
                let err = TransportError::MalformedMessage(err.to_string());
                let _ = client_tx.send(reply_event(Reply::err(err.to_string())));
                continue;
            }
        };

        let table_id = action.table_id().to_string();
        let tx = state.registry.get_or_create(&table_id).await;

        let reply = match dispatch(action, &tx, &client_tx, &mut player_ids).await {
            Ok(reply) => reply,
            Err(err) => Reply::err(err.to_string()),
        };
        let _ = client_tx.send(reply_event(reply));
    }

    for (table_id, player_id) in player_ids {
        let tx = state.registry.get_or_create(&table_id).await;
        let (reply_tx, _reply_rx) = oneshot::channel();
        let _ = tx.send(ActorCommand::Leave { player_id, reply: reply_tx });
    }

    let _ = writer.await;
}

fn reply_event(reply: Reply) -> holdem_server::protocol::ServerEvent {
    holdem_server::protocol::ServerEvent::Reply(reply)
}

async fn dispatch(
    action: ClientAction,
    tx: &mpsc::UnboundedSender<ActorCommand>,
    client_tx: &mpsc::UnboundedSender<holdem_server::protocol::ServerEvent>,
    player_ids: &mut std::collections::HashMap<String, String>,
) -> Result<Reply, TransportError> {
    match action {
        ClientAction::JoinTable { table_id, name, .. } => {
            if !is_valid_name(&name) {
                return Err(TransportError::InvalidName);
            }
            let (reply_tx, reply_rx) = oneshot::channel();
            let _ = tx.send(ActorCommand::Join { name, client_tx: client_tx.clone(), reply: reply_tx });
            match reply_rx.await {
                Ok(Ok(player_id)) => {
                    player_ids.insert(table_id, player_id.clone());
                    Ok(Reply::ok(Some(player_id)))
                }
                Ok(Err(err)) => Err(err.into()),
                Err(_) => Err(TransportError::ActorGone),
            }
        }
        ClientAction::LeaveTable { table_id } => {
            let Some(player_id) = player_ids.remove(&table_id) else {
                return Err(TransportError::NotSeated);
            };
            let (reply_tx, reply_rx) = oneshot::channel();
            let _ = tx.send(ActorCommand::Leave { player_id, reply: reply_tx });
            match reply_rx.await {
                Ok(Ok(())) => Ok(Reply::ok(None)),
                Ok(Err(err)) => Err(err.into()),
                Err(_) => Err(TransportError::ActorGone),
            }
        }
        ClientAction::ActionFold { table_id } => {
            let Some(player_id) = player_ids.get(&table_id).cloned() else {
                return Err(TransportError::NotSeated);
            };
            submit_action(tx, player_id, holdem_engine::Action::Fold).await
        }
        ClientAction::ActionCheck { table_id } => {
            let Some(player_id) = player_ids.get(&table_id).cloned() else {
                return Err(TransportError::NotSeated);
            };
            submit_action(tx, player_id, holdem_engine::Action::Check).await
        }
        ClientAction::ActionCall { table_id } => {
            let Some(player_id) = player_ids.get(&table_id).cloned() else {
                return Err(TransportError::NotSeated);
            };
            submit_action(tx, player_id, holdem_engine::Action::Call).await
        }
        ClientAction::ActionBet { table_id, amount } => {
            let Some(player_id) = player_ids.get(&table_id).cloned() else {
                return Err(TransportError::NotSeated);
            };
            let Some(amount) = validate_amount(amount) else {
                return Err(TransportError::AmountOutOfRange);
            };
            submit_action(tx, player_id, holdem_engine::Action::Bet(amount)).await
        }
        ClientAction::ActionRaise { table_id, amount } => {
            let Some(player_id) = player_ids.get(&table_id).cloned() else {
                return Err(TransportError::NotSeated);
            };
            let Some(amount) = validate_amount(amount) else {
                return Err(TransportError::AmountOutOfRange);
            };
            submit_action(tx, player_id, holdem_engine::Action::Raise(amount)).await
        }
        ClientAction::ChatSend { table_id, message } => {
            let Some(trimmed) = validate_chat_message(&message) else {
                return Err(TransportError::InvalidChatMessage);
            };
            let Some(player_id) = player_ids.get(&table_id).cloned() else {
                return Err(TransportError::NotSeated);
            };
            let _ = tx.send(ActorCommand::Chat { player_id, message: trimmed });
            Ok(Reply::ok(None))
        }
    }
}

async fn submit_action(
    tx: &mpsc::UnboundedSender<ActorCommand>,
    player_id: String,
    action: holdem_engine::Action,
) -> Result<Reply, TransportError> {
    let (reply_tx, reply_rx) = oneshot::channel();
    let _ = tx.send(ActorCommand::Action { player_id, action, reply: reply_tx });
    match reply_rx.await {
        Ok(Ok(())) => Ok(Reply::ok(None)),
        Ok(Err(err)) => Err(err.into()),
        Err(_) => Err(TransportError::ActorGone),
    }
}
