//! WebSocket streaming.
//!
//! Each connection joins channel rooms explicitly. Join is gated on
//! membership, and a successful join refreshes the caller's presence.
//! Events arrive over the Redis Pub/Sub mirror and are filtered against
//! the rooms this session joined. Delivery is best-effort; a reconnecting
//! client reconciles through the paginated history query.

use std::collections::HashSet;

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use huddle_realtime::{ChatEvent, rooms};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::extractors::AuthUser;
use crate::middleware::AppState;

/// Messages sent by the client.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Join a channel room.
    Join { channel_id: String },
    /// Leave a channel room.
    Leave { channel_id: String },
    /// Application-level keepalive.
    Ping,
}

/// Messages sent to the client.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Join acknowledged.
    Joined { channel_id: String },
    /// Leave acknowledged.
    Left { channel_id: String },
    /// An event from a joined room.
    Event { event: ChatEvent },
    /// A request was rejected.
    Error { message: String },
    /// Keepalive reply.
    Pong,
}

/// WebSocket handler for streaming.
pub async fn streaming_handler(
    ws: WebSocketUpgrade,
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
) -> impl IntoResponse {
    info!(user_id, "New streaming connection");

    ws.on_upgrade(move |socket| handle_socket(socket, user_id, state))
}

/// Handle a WebSocket connection.
async fn handle_socket(socket: WebSocket, user_id: String, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let mut local_rx = state.pubsub.subscribe_local();

    // Every session listens on its personal room for out-of-channel signals
    let personal_room = rooms::user(&user_id);
    if let Err(e) = state.pubsub.subscribe_room(&personal_room).await {
        warn!(error = %e, "Failed to subscribe personal room");
    }

    if let Err(e) = state.presence.mark_active(None, &user_id).await {
        warn!(error = %e, "Failed to mark presence on connect");
    }

    // Rooms this session joined
    let mut joined: HashSet<String> = HashSet::new();

    loop {
        tokio::select! {
            // Handle incoming messages from client
            Some(msg) = receiver.next() => {
                match msg {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                let response = handle_client_message(
                                    client_msg,
                                    &user_id,
                                    &state,
                                    &mut joined,
                                ).await;
                                let json = serde_json::to_string(&response).unwrap_or_default();
                                if sender.send(Message::Text(json.into())).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                warn!("Failed to parse client message: {}", e);
                            }
                        }
                    }
                    Ok(Message::Close(_)) => {
                        info!("Client closed connection");
                        break;
                    }
                    Ok(Message::Ping(data)) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        debug!("WebSocket error: {}", e);
                        break;
                    }
                }
            }

            // Forward events from joined rooms
            Ok(room_msg) = local_rx.recv() => {
                if joined.contains(&room_msg.room) || room_msg.room == personal_room {
                    let msg = ServerMessage::Event { event: room_msg.event };
                    let json = serde_json::to_string(&msg).unwrap_or_default();
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    // No explicit presence teardown: the TTL and the sweeper settle it
    info!(user_id, "Streaming connection closed");
}

/// Handle a client message, returning the reply to send.
async fn handle_client_message(
    msg: ClientMessage,
    user_id: &str,
    state: &AppState,
    joined: &mut HashSet<String>,
) -> ServerMessage {
    match msg {
        ClientMessage::Join { channel_id } => {
            match state.permissions.is_member(&channel_id, user_id).await {
                Ok(true) => {}
                Ok(false) => {
                    return ServerMessage::Error {
                        message: "Not a member of this channel".to_string(),
                    };
                }
                Err(e) => {
                    warn!(error = %e, "Membership check failed");
                    return ServerMessage::Error {
                        message: "Join failed".to_string(),
                    };
                }
            }

            let room = rooms::channel(&channel_id);
            if let Err(e) = state.pubsub.subscribe_room(&room).await {
                warn!(error = %e, "Failed to subscribe room");
                return ServerMessage::Error {
                    message: "Join failed".to_string(),
                };
            }
            joined.insert(room);

            if let Err(e) = state.presence.mark_active(Some(&channel_id), user_id).await {
                warn!(error = %e, "Failed to mark presence on join");
            }

            debug!(user_id, channel_id, "Joined channel room");
            ServerMessage::Joined { channel_id }
        }
        ClientMessage::Leave { channel_id } => {
            // Only the local filter is dropped. The instance-level Redis
            // subscription stays, other sessions may still need it.
            joined.remove(&rooms::channel(&channel_id));
            debug!(user_id, channel_id, "Left channel room");
            ServerMessage::Left { channel_id }
        }
        ClientMessage::Ping => ServerMessage::Pong,
    }
}
