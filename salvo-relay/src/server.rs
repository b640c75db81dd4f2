// Copyright 2020 Zachary Stewart
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! HTTP and WebSocket front end.
use std::net::SocketAddr;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tracing::{debug, info, warn};

use salvo::{store::SESSION_ID_LEN, ClientMessage, SessionStore};

use crate::{
    hub::{spawn_hub, CreatedSession, HubHandle, HubSettings},
    RelayConfig, RelayError,
};

/// Shape of a session id. Anything else cannot name a live session.
static SESSION_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^[A-Z0-9]{{{}}}$", SESSION_ID_LEN)).unwrap());

/// Returns true if the string could be a session id.
pub fn is_session_id(id: &str) -> bool {
    SESSION_ID.is_match(id)
}

/// Build the router over a running hub.
pub fn router(hub: HubHandle) -> Router {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(lookup_session))
        .route("/ws", get(upgrade))
        .route("/health", get(health))
        .with_state(hub)
}

async fn health() -> &'static str {
    "ok"
}

async fn create_session(State(hub): State<HubHandle>) -> Result<Json<CreatedSession>, RelayError> {
    Ok(Json(hub.create_session().await?))
}

async fn lookup_session(
    State(hub): State<HubHandle>,
    Path(id): Path<String>,
) -> Result<Response, RelayError> {
    let summary = if is_session_id(&id) {
        hub.lookup(id.as_str()).await?
    } else {
        None
    };
    Ok(match summary {
        Some(summary) => Json(summary).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("session {} not found", id) })),
        )
            .into_response(),
    })
}

async fn upgrade(ws: WebSocketUpgrade, State(hub): State<HubHandle>) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, hub))
}

/// Pump one WebSocket: parsed frames go to the hub, the connection's outbox goes back
/// out as JSON text frames.
async fn serve_socket(socket: WebSocket, hub: HubHandle) {
    let (connection, mut events) = match hub.connect() {
        Ok(registered) => registered,
        Err(err) => {
            warn!(%err, "dropping socket");
            return;
        }
    };
    info!(%connection, "connection opened");
    let (mut sink, mut stream) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(err) => {
                    warn!(%connection, %err, "failed to encode event");
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(frame) = stream.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                debug!(%connection, %err, "socket read failed");
                break;
            }
        };
        let forwarded = match frame {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(message) => hub.send(connection, message),
                Err(err) => hub.reject(connection, err.to_string()),
            },
            Message::Binary(_) => hub.reject(connection, "binary frames are not supported"),
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => Ok(()),
        };
        if forwarded.is_err() {
            break;
        }
    }

    // Dropping the hub's outbox ends the writer.
    let _ = hub.disconnect(connection);
    let _ = writer.await;
}

/// A running relay.
pub struct RelayHandle {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    server: JoinHandle<Result<(), RelayError>>,
    hub: JoinHandle<()>,
}

impl RelayHandle {
    /// The address the relay is listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections, wait for the server to finish and stop the hub.
    pub async fn shutdown(self) -> Result<(), RelayError> {
        let _ = self.shutdown.send(());
        let served = self.server.await;
        self.hub.abort();
        info!("relay stopped");
        served?
    }
}

/// Bind the listen address and start the hub and the HTTP server. Binding port 0 picks
/// a free port; see [`RelayHandle::local_addr`].
pub async fn start(config: &RelayConfig) -> Result<RelayHandle, RelayError> {
    let store = SessionStore::new(config.session_config()?);
    let listener = TcpListener::bind(config.bind)
        .await
        .map_err(|source| RelayError::Bind {
            addr: config.bind,
            source,
        })?;
    let addr = listener.local_addr()?;

    let (hub, hub_task) = spawn_hub(store, HubSettings::from(config));
    let app = router(hub);
    let (shutdown, signal) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = signal.await;
            })
            .await
            .map_err(RelayError::from)
    });
    info!(%addr, "relay listening");

    Ok(RelayHandle {
        addr,
        shutdown,
        server,
        hub: hub_task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_shape() {
        assert!(is_session_id("AB12CD3"));
        assert!(!is_session_id("ab12cd3"));
        assert!(!is_session_id("AB12CD"));
        assert!(!is_session_id("AB12CD34"));
        assert!(!is_session_id("../etc1"));
    }

    #[tokio::test]
    async fn lookup_route_answers_404_for_bad_ids() {
        let (hub, _) = spawn_hub(SessionStore::default(), HubSettings::default());
        let response = lookup_session(State(hub.clone()), Path("nope".to_owned()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let created = create_session(State(hub.clone())).await.unwrap().0;
        let response = lookup_session(State(hub), Path(created.session_id.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
