//! WebSocket upgrade handlers for `/ws/table/{id}`, `/ws/user/{id}`, and
//! `/ws/station/{id}`: split the socket into sender/receiver halves, spawn
//! a forwarder task that drains an mpsc channel onto the socket, and drive
//! the receiver on the calling task with `tokio::select!` so either side
//! closing tears down the connection.

use crate::api::state::AppState;
use crate::ids::{MenuStationId, TableSessionId, UserId};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

pub async fn table_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(table_session_id): Path<TableSessionId>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_table_socket(socket, state, table_session_id))
}

pub async fn user_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_user_socket(socket, state, user_id))
}

pub async fn station_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(station_id): Path<MenuStationId>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_station_socket(socket, state, station_id))
}

async fn handle_table_socket(socket: WebSocket, state: AppState, table_session_id: TableSessionId) {
    let (tx, rx) = mpsc::unbounded_channel();
    let conn_id = state.push_hub.add_table_connection(table_session_id, tx);
    tracing::info!(%table_session_id, "table websocket connected");
    drive(socket, rx).await;
    state.push_hub.remove_table_connection(table_session_id, conn_id);
    tracing::info!(%table_session_id, "table websocket disconnected");
}

async fn handle_user_socket(socket: WebSocket, state: AppState, user_id: UserId) {
    let (tx, rx) = mpsc::unbounded_channel();
    let conn_id = state.push_hub.add_user_connection(user_id, tx);
    tracing::info!(%user_id, "user websocket connected");
    drive(socket, rx).await;
    state.push_hub.remove_user_connection(user_id, conn_id);
    tracing::info!(%user_id, "user websocket disconnected");
}

async fn handle_station_socket(socket: WebSocket, state: AppState, station_id: MenuStationId) {
    let (tx, rx) = mpsc::unbounded_channel();
    let conn_id = state.push_hub.add_station_connection(station_id, tx);
    tracing::info!(%station_id, "station websocket connected");
    drive(socket, rx).await;
    state.push_hub.remove_station_connection(station_id, conn_id);
    tracing::info!(%station_id, "station websocket disconnected");
}

/// Forwards frames from `rx` onto the socket and discards any inbound
/// client messages (this channel is push-only); returns once
/// either side closes.
async fn drive(socket: WebSocket, mut rx: mpsc::UnboundedReceiver<crate::push::frame::PushFrame>) {
    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let Ok(text) = serde_json::to_string(&frame) else {
                continue;
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}
