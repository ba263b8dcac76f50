use crate::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures::sink::SinkExt;
use futures::stream::{SplitSink, StreamExt};
use live_events::{ClientMessage, ErrorPayload, Event, JoinedPayload};
use live_rooms::SessionId;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub mod join;

pub fn router() -> Router<AppState> {
	Router::new().route("/ws", get(ws_upgrade))
}

/// Upgrade handler. A bearer token on the upgrade request authenticates
/// the whole session; browser clients may instead pass `token` in `join`.
async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade, headers: HeaderMap) -> Response {
	let header_user = crate::auth::bearer_token(&headers).and_then(|token| crate::auth::decode_user_id(token, state.config.token_secret()).ok());

	ws.on_upgrade(move |socket| handle_socket(state, socket, header_user))
}

async fn handle_socket(state: AppState, socket: WebSocket, header_user: Option<i64>) {
	let (ws_sender, mut ws_receiver) = socket.split();
	let (session_id, rx) = state.rooms.register(header_user);
	info!(session = %session_id, authenticated = header_user.is_some(), "WebSocket connection established");

	let forward_task = spawn_event_forwarder(ws_sender, rx, session_id.clone(), state.cancel_token.clone());

	let mut message_count = 0u64;
	while let Some(message) = ws_receiver.next().await {
		match message {
			Ok(Message::Text(text)) => {
				message_count += 1;
				handle_client_message(&state, &session_id, header_user, &text).await;
			}
			Ok(Message::Close(_)) => {
				debug!(session = %session_id, "client closed connection");
				break;
			}
			// axum answers pings automatically; pongs keep the socket warm
			Ok(Message::Ping(_) | Message::Pong(_) | Message::Binary(_)) => {}
			Err(e) => {
				debug!(session = %session_id, error = %e, "socket read failed");
				break;
			}
		}
	}

	state.rooms.disconnect(&session_id);
	forward_task.abort();
	info!(session = %session_id, messages_processed = message_count, "connection cleanup completed");
}

/// Pump events from the session's registry channel into the socket, with
/// periodic pings to surface dead connections. FIFO is preserved because
/// the registry writes frames into the channel in emit order.
fn spawn_event_forwarder(
	mut ws_sender: SplitSink<WebSocket, Message>,
	mut rx: UnboundedReceiver<String>,
	session_id: SessionId,
	cancel_token: CancellationToken,
) -> JoinHandle<()> {
	tokio::spawn(async move {
		let mut ping_interval = interval(Duration::from_secs(30));
		let mut total_forwarded = 0u64;

		loop {
			tokio::select! {
				() = cancel_token.cancelled() => {
					let _ = ws_sender.send(Message::Close(None)).await;
					break;
				}

				frame = rx.recv() => match frame {
					Some(frame) => {
						if let Err(e) = ws_sender.send(Message::Text(frame)).await {
							warn!(session = %session_id, error = %e, "failed to forward frame - client disconnected");
							break;
						}
						total_forwarded += 1;
					}
					None => break, // session removed from the registry
				},

				_ = ping_interval.tick() => {
					if let Err(e) = ws_sender.send(Message::Ping(Vec::new())).await {
						debug!(session = %session_id, error = %e, "ping failed - client disconnected");
						break;
					}
				}
			}
		}

		debug!(session = %session_id, total_forwarded, "forwarding ended");
	})
}

/// Dispatch one inbound frame. Join outcomes are answered on the same
/// session only; malformed frames are reported, never fatal.
async fn handle_client_message(state: &AppState, session_id: &SessionId, header_user: Option<i64>, text: &str) {
	let message: ClientMessage = match serde_json::from_str(text) {
		Ok(message) => message,
		Err(e) => {
			debug!(session = %session_id, error = %e, "unparseable client message");
			let _ = state.rooms.send_to(session_id, &Event::Error(ErrorPayload::new("unparseable message")));
			return;
		}
	};

	match message {
		ClientMessage::Join(request) => match join::resolve_join(state, session_id, header_user, request).await {
			Ok(rooms) => {
				let rooms = rooms.iter().map(ToString::to_string).collect();
				let _ = state.rooms.send_to(session_id, &Event::Joined(JoinedPayload { rooms }));
			}
			Err(e) => {
				debug!(session = %session_id, error = %e, "join rejected");
				let _ = state.rooms.send_to(session_id, &Event::Error(ErrorPayload::new(e.to_string())));
			}
		},
		ClientMessage::Pong => {}
		ClientMessage::Unknown => {
			let _ = state.rooms.send_to(session_id, &Event::Error(ErrorPayload::new("unsupported message type")));
		}
	}
}
