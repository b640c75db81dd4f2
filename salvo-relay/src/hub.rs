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
//! The hub: a single task that owns every session, every connection's outbox and every
//! turn timer.
//!
//! Socket tasks never touch game state. They forward parsed messages to the hub as
//! [`HubCommand`]s and write whatever arrives on their outbox. Because the hub handles
//! one command or timer expiry at a time, each transition runs to completion before the
//! next starts, and a shot racing a turn expiry resolves to exactly one of the two.
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::time::{delay_queue, DelayQueue};
use tracing::{debug, info};

use salvo::{
    board::Coordinate,
    game::{Delivery, TimerCommand, TimerTicket},
    protocol::SessionSummary,
    ClientMessage, ConnectionId, ErrorCode, ServerEvent, Session, SessionError, SessionId,
    SessionStore, Transition,
};

use crate::{RelayConfig, RelayError};

/// Reply to a session creation request.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedSession {
    pub session_id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_url: Option<String>,
}

/// Hub settings that are not per-session.
#[derive(Debug, Clone)]
pub struct HubSettings {
    pub session_ttl: Duration,
    pub reap_interval: Duration,
    pub public_url: Option<String>,
}

impl From<&RelayConfig> for HubSettings {
    fn from(config: &RelayConfig) -> Self {
        Self {
            session_ttl: config.session_ttl(),
            reap_interval: config.reap_interval(),
            public_url: config.public_url.clone(),
        }
    }
}

impl HubSettings {
    /// Link a second player can open to join the given session.
    pub fn join_url(&self, id: &SessionId) -> Option<String> {
        self.public_url
            .as_ref()
            .map(|base| format!("{}?game={}", base, id))
    }
}

impl Default for HubSettings {
    fn default() -> Self {
        Self::from(&RelayConfig::default())
    }
}

/// Requests handled by the hub task.
#[derive(Debug)]
pub enum HubCommand {
    /// Register a connection and the outbox its events go to.
    Connect {
        connection: ConnectionId,
        outbox: mpsc::UnboundedSender<ServerEvent>,
    },
    /// A parsed client message.
    Message {
        connection: ConnectionId,
        message: ClientMessage,
    },
    /// A frame that could not be parsed.
    Malformed {
        connection: ConnectionId,
        reason: String,
    },
    /// The connection is gone.
    Disconnect { connection: ConnectionId },
    /// Allocate a session outside of any connection.
    CreateSession {
        reply: oneshot::Sender<CreatedSession>,
    },
    /// Pre-join lookup.
    Lookup {
        id: String,
        reply: oneshot::Sender<Option<SessionSummary>>,
    },
}

/// Cloneable handle used by socket and HTTP tasks to talk to the hub.
#[derive(Debug, Clone)]
pub struct HubHandle {
    commands: mpsc::UnboundedSender<HubCommand>,
    next_connection: Arc<AtomicU64>,
}

impl HubHandle {
    fn command(&self, command: HubCommand) -> Result<(), RelayError> {
        self.commands
            .send(command)
            .map_err(|_| RelayError::HubClosed)
    }

    /// Register a new connection. Returns its id and the receiver for its events.
    pub fn connect(
        &self,
    ) -> Result<(ConnectionId, mpsc::UnboundedReceiver<ServerEvent>), RelayError> {
        let connection = ConnectionId::new(self.next_connection.fetch_add(1, Ordering::Relaxed));
        let (outbox, events) = mpsc::unbounded_channel();
        self.command(HubCommand::Connect { connection, outbox })?;
        Ok((connection, events))
    }

    /// Forward a client message.
    pub fn send(&self, connection: ConnectionId, message: ClientMessage) -> Result<(), RelayError> {
        self.command(HubCommand::Message {
            connection,
            message,
        })
    }

    /// Report a frame that could not be parsed.
    pub fn reject(
        &self,
        connection: ConnectionId,
        reason: impl Into<String>,
    ) -> Result<(), RelayError> {
        self.command(HubCommand::Malformed {
            connection,
            reason: reason.into(),
        })
    }

    pub fn disconnect(&self, connection: ConnectionId) -> Result<(), RelayError> {
        self.command(HubCommand::Disconnect { connection })
    }

    pub async fn create_session(&self) -> Result<CreatedSession, RelayError> {
        let (reply, response) = oneshot::channel();
        self.command(HubCommand::CreateSession { reply })?;
        response.await.map_err(|_| RelayError::HubClosed)
    }

    pub async fn lookup(&self, id: impl Into<String>) -> Result<Option<SessionSummary>, RelayError> {
        let (reply, response) = oneshot::channel();
        self.command(HubCommand::Lookup {
            id: id.into(),
            reply,
        })?;
        response.await.map_err(|_| RelayError::HubClosed)
    }
}

/// Start the hub task. It runs until every [`HubHandle`] has been dropped.
pub fn spawn_hub(store: SessionStore, settings: HubSettings) -> (HubHandle, JoinHandle<()>) {
    let (commands, inbox) = mpsc::unbounded_channel();
    let handle = HubHandle {
        commands,
        next_connection: Arc::new(AtomicU64::new(1)),
    };
    let hub = Hub {
        store,
        connections: HashMap::new(),
        timers: DelayQueue::new(),
        timer_keys: HashMap::new(),
        settings,
    };
    (handle, tokio::spawn(hub.run(inbox)))
}

struct Connection {
    outbox: mpsc::UnboundedSender<ServerEvent>,
    session: Option<SessionId>,
}

struct Hub {
    store: SessionStore,
    connections: HashMap<ConnectionId, Connection>,
    timers: DelayQueue<(SessionId, TimerTicket)>,
    /// Pending expiry of each session with a running turn timer.
    timer_keys: HashMap<SessionId, delay_queue::Key>,
    settings: HubSettings,
}

impl Hub {
    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<HubCommand>) {
        let period = self.settings.reap_interval;
        let mut reap = time::interval_at(Instant::now() + period, period);
        reap.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = inbox.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                Some(expired) = self.timers.next(), if !self.timers.is_empty() => {
                    self.expire(expired.into_inner());
                }
                _ = reap.tick() => self.reap(),
            }
        }
        info!(sessions = self.store.len(), "hub stopped");
    }

    fn handle(&mut self, command: HubCommand) {
        match command {
            HubCommand::Connect { connection, outbox } => {
                debug!(%connection, "connection registered");
                self.connections.insert(
                    connection,
                    Connection {
                        outbox,
                        session: None,
                    },
                );
            }
            HubCommand::Message {
                connection,
                message,
            } => self.dispatch(connection, message),
            HubCommand::Malformed { connection, reason } => {
                debug!(%connection, %reason, "malformed frame");
                self.send_to(
                    connection,
                    ServerEvent::error(ErrorCode::MalformedMessage, reason),
                );
            }
            HubCommand::Disconnect { connection } => self.disconnect(connection),
            HubCommand::CreateSession { reply } => {
                let created = self.create_session();
                let _ = reply.send(created);
            }
            HubCommand::Lookup { id, reply } => {
                let _ = reply.send(self.store.summary(&id));
            }
        }
    }

    fn create_session(&mut self) -> CreatedSession {
        let session_id = self
            .store
            .create_with(&mut rand::thread_rng(), Instant::now().into_std());
        let join_url = self.settings.join_url(&session_id);
        CreatedSession {
            session_id,
            join_url,
        }
    }

    fn dispatch(&mut self, connection: ConnectionId, message: ClientMessage) {
        let result = match message {
            ClientMessage::CreateSession => {
                let CreatedSession {
                    session_id,
                    join_url,
                } = self.create_session();
                self.send_to(
                    connection,
                    ServerEvent::SessionCreated {
                        session_id,
                        join_url,
                    },
                );
                Ok(())
            }
            ClientMessage::JoinSession {
                session_id,
                display_name,
            } => self.join(connection, &session_id, display_name),
            ClientMessage::SubmitPlacement { ships } => {
                self.transition(connection, |session| session.submit_placement(connection, ships))
            }
            ClientMessage::SetReady => {
                self.transition(connection, |session| session.set_ready(connection))
            }
            ClientMessage::FireShot { row, col } => self.transition(connection, |session| {
                session.fire_shot(connection, Coordinate::new(row, col))
            }),
            ClientMessage::SkipTurn => {
                // Skips never produce errors.
                let _ = self.transition(connection, |session| Ok(session.skip_turn(connection)));
                Ok(())
            }
        };
        if let Err(err) = result {
            debug!(%connection, code = ?err.code(), %err, "request refused");
            self.send_to(connection, ServerEvent::from(&err));
        }
    }

    fn join(
        &mut self,
        connection: ConnectionId,
        id: &str,
        display_name: Option<String>,
    ) -> Result<(), SessionError> {
        if self.bound_session(connection).is_some() {
            return Err(SessionError::AlreadySeated);
        }
        let session = self.store.get_mut(id)?;
        let (_, transition) = session.join(connection, display_name)?;
        let id = session.id().clone();
        if let Some(entry) = self.connections.get_mut(&connection) {
            entry.session = Some(id.clone());
        }
        self.apply(&id, transition);
        Ok(())
    }

    /// Run a transition on the connection's session and deliver its results.
    fn transition<F>(&mut self, connection: ConnectionId, f: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut Session) -> Result<Transition, SessionError>,
    {
        let id = self
            .bound_session(connection)
            .ok_or(SessionError::InvalidSeat)?;
        let transition = f(self.store.get_mut(id.as_str())?)?;
        self.apply(&id, transition);
        Ok(())
    }

    fn bound_session(&self, connection: ConnectionId) -> Option<SessionId> {
        self.connections
            .get(&connection)
            .and_then(|entry| entry.session.clone())
    }

    fn apply(&mut self, id: &SessionId, transition: Transition) {
        let Transition { deliveries, timer } = transition;
        if let Ok(session) = self.store.get(id.as_str()) {
            for Delivery { seat, event } in deliveries {
                match session.connection_of(seat) {
                    Some(connection) => self.send_to(connection, event),
                    None => debug!(session = %id, %seat, "seat absent, event dropped"),
                }
            }
        }
        self.schedule(id, timer);
    }

    fn send_to(&self, connection: ConnectionId, event: ServerEvent) {
        match self.connections.get(&connection) {
            Some(entry) => {
                if entry.outbox.send(event).is_err() {
                    debug!(%connection, "outbox closed");
                }
            }
            None => debug!(%connection, "unknown connection"),
        }
    }

    fn schedule(&mut self, id: &SessionId, command: TimerCommand) {
        match command {
            TimerCommand::Keep => {}
            TimerCommand::Cancel => self.cancel_timer(id),
            TimerCommand::Start(ticket) => {
                self.cancel_timer(id);
                let key = self.timers.insert((id.clone(), ticket), ticket.duration());
                self.timer_keys.insert(id.clone(), key);
                debug!(session = %id, generation = ticket.generation(), "turn timer armed");
            }
        }
    }

    fn cancel_timer(&mut self, id: &SessionId) {
        if let Some(key) = self.timer_keys.remove(id) {
            self.timers.remove(&key);
        }
    }

    fn expire(&mut self, (id, ticket): (SessionId, TimerTicket)) {
        // The queue has already yielded this entry, so its key is dead.
        self.timer_keys.remove(&id);
        let transition = match self.store.get_mut(id.as_str()) {
            Ok(session) => session.expire_turn(ticket),
            Err(_) => return,
        };
        self.apply(&id, transition);
    }

    fn disconnect(&mut self, connection: ConnectionId) {
        let entry = match self.connections.remove(&connection) {
            Some(entry) => entry,
            None => return,
        };
        info!(%connection, "connection closed");
        if let Some(id) = entry.session {
            if let Ok(session) = self.store.get_mut(id.as_str()) {
                let transition = session.disconnect(connection);
                self.apply(&id, transition);
            }
        }
    }

    fn reap(&mut self) {
        let reaped = self
            .store
            .reap(Instant::now().into_std(), self.settings.session_ttl);
        for id in &reaped {
            self.cancel_timer(id);
        }
        if reaped.is_empty() {
            return;
        }
        for entry in self.connections.values_mut() {
            if entry.session.as_ref().map_or(false, |id| reaped.contains(id)) {
                entry.session = None;
            }
        }
        info!(count = reaped.len(), "released connections of reaped sessions");
    }
}

#[cfg(test)]
mod tests {
    use salvo::{
        board::{BoardDimensions, FleetSetup, PlacedShip},
        ships::{Orientation, ShipKind},
        SeatLabel, SessionConfig, SessionStatus,
    };

    use super::*;

    type Events = mpsc::UnboundedReceiver<ServerEvent>;

    fn fleet() -> Vec<PlacedShip> {
        let mut setup = FleetSetup::new(BoardDimensions::default());
        let layout = [
            (ShipKind::Carrier, 0, 0),
            (ShipKind::Cruiser, 0, 5),
            (ShipKind::Destroyer, 2, 0),
            (ShipKind::Frigate, 3, 0),
            (ShipKind::Submarine, 4, 0),
            (ShipKind::Corvette, 6, 0),
        ];
        for &(kind, row, col) in &layout {
            setup
                .place(kind, Coordinate::new(row, col), Orientation::Horizontal)
                .unwrap();
        }
        setup.ships().to_vec()
    }

    fn hub() -> HubHandle {
        spawn_hub(SessionStore::new(SessionConfig::default()), HubSettings::default()).0
    }

    async fn next(events: &mut Events) -> ServerEvent {
        time::timeout(Duration::from_millis(100), events.recv())
            .await
            .expect("no event arrived")
            .expect("outbox closed")
    }

    /// Wait until the hub has handled everything sent so far.
    async fn settle(hub: &HubHandle) {
        hub.lookup("SETTLE0").await.unwrap();
    }

    /// Two connections seated in a fresh session, fleets placed, both ready.
    async fn playing(hub: &HubHandle) -> (SessionId, (ConnectionId, Events), (ConnectionId, Events)) {
        let id = hub.create_session().await.unwrap().session_id;
        let (a, mut a_events) = hub.connect().unwrap();
        let (b, mut b_events) = hub.connect().unwrap();
        for &conn in &[a, b] {
            hub.send(
                conn,
                ClientMessage::JoinSession {
                    session_id: id.to_string(),
                    display_name: None,
                },
            )
            .unwrap();
            hub.send(conn, ClientMessage::SubmitPlacement { ships: fleet() })
                .unwrap();
            hub.send(conn, ClientMessage::SetReady).unwrap();
        }
        settle(hub).await;
        let start = ServerEvent::GameStart {
            current_turn: SeatLabel::A,
        };
        for events in [&mut a_events, &mut b_events] {
            let mut seen = Vec::new();
            while let Ok(event) = events.try_recv() {
                seen.push(event);
            }
            assert_eq!(seen.last(), Some(&start));
        }
        (id, (a, a_events), (b, b_events))
    }

    #[test]
    fn join_url_needs_a_public_base() {
        let id = SessionId::new("ABC1234");
        assert_eq!(HubSettings::default().join_url(&id), None);

        let settings = HubSettings {
            public_url: Some("http://localhost:3000".into()),
            ..HubSettings::default()
        };
        assert_eq!(
            settings.join_url(&id).as_deref(),
            Some("http://localhost:3000?game=ABC1234")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn create_and_lookup() {
        let hub = hub();
        let created = hub.create_session().await.unwrap();
        assert_eq!(created.join_url, None);
        let summary = hub.lookup(created.session_id.as_str()).await.unwrap().unwrap();
        assert_eq!(summary.seat_count, 0);
        assert_eq!(summary.status, SessionStatus::Waiting);
        assert_eq!(hub.lookup("MISSING").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn join_unknown_session_errors_to_sender_only() {
        let hub = hub();
        let (conn, mut events) = hub.connect().unwrap();
        hub.send(
            conn,
            ClientMessage::JoinSession {
                session_id: "NOPE000".into(),
                display_name: None,
            },
        )
        .unwrap();
        match next(&mut events).await {
            ServerEvent::Error { code, .. } => assert_eq!(code, ErrorCode::SessionNotFound),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unseated_actions_are_invalid_seat() {
        let hub = hub();
        let (conn, mut events) = hub.connect().unwrap();
        hub.send(conn, ClientMessage::FireShot { row: 0, col: 0 })
            .unwrap();
        match next(&mut events).await {
            ServerEvent::Error { code, .. } => assert_eq!(code, ErrorCode::InvalidSeat),
            other => panic!("unexpected event {:?}", other),
        }
        hub.send(conn, ClientMessage::SkipTurn).unwrap();
        settle(&hub).await;
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_frames_get_an_error() {
        let hub = hub();
        let (conn, mut events) = hub.connect().unwrap();
        hub.reject(conn, "expected value").unwrap();
        assert_eq!(
            next(&mut events).await,
            ServerEvent::error(ErrorCode::MalformedMessage, "expected value")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn idle_turn_is_skipped_by_the_timer() {
        let hub = hub();
        let (_, (_, mut a_events), (_, mut b_events)) = playing(&hub).await;

        time::sleep(Duration::from_secs(14)).await;
        assert!(a_events.try_recv().is_err());

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(
            next(&mut a_events).await,
            ServerEvent::TurnSkipped { your_turn: false }
        );
        assert_eq!(
            next(&mut b_events).await,
            ServerEvent::OpponentSkipped { your_turn: true }
        );

        // The countdown restarts for seat B.
        time::sleep(Duration::from_secs(15)).await;
        assert_eq!(
            next(&mut b_events).await,
            ServerEvent::TurnSkipped { your_turn: false }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn shot_resets_the_countdown() {
        let hub = hub();
        let (_, (a, mut a_events), (_, mut b_events)) = playing(&hub).await;

        time::sleep(Duration::from_secs(10)).await;
        hub.send(a, ClientMessage::FireShot { row: 9, col: 9 })
            .unwrap();
        assert!(matches!(
            next(&mut a_events).await,
            ServerEvent::ShotResult(report) if !report.hit && !report.your_turn
        ));
        assert!(matches!(
            next(&mut b_events).await,
            ServerEvent::OpponentShot(report) if report.your_turn
        ));

        // The game-start countdown would have fired at 15s.
        time::sleep(Duration::from_secs(10)).await;
        assert!(b_events.try_recv().is_err());

        time::sleep(Duration::from_secs(6)).await;
        assert_eq!(
            next(&mut b_events).await,
            ServerEvent::TurnSkipped { your_turn: false }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_turn_shot_is_refused() {
        let hub = hub();
        let (_, _, (b, mut b_events)) = playing(&hub).await;
        hub.send(b, ClientMessage::FireShot { row: 0, col: 0 })
            .unwrap();
        match next(&mut b_events).await {
            ServerEvent::Error { code, .. } => assert_eq!(code, ErrorCode::NotYourTurn),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_notifies_opponent() {
        let hub = hub();
        let (id, (a, _a_events), (_, mut b_events)) = playing(&hub).await;
        hub.disconnect(a).unwrap();
        assert_eq!(
            next(&mut b_events).await,
            ServerEvent::SeatDisconnected { seat: SeatLabel::A }
        );
        let summary = hub.lookup(id.as_str()).await.unwrap().unwrap();
        assert_eq!(summary.status, SessionStatus::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_sessions_are_reaped() {
        let settings = HubSettings {
            session_ttl: Duration::from_secs(30),
            reap_interval: Duration::from_secs(10),
            public_url: Some("http://localhost:3000".into()),
        };
        let (hub, _) = spawn_hub(SessionStore::new(SessionConfig::default()), settings);
        let created = hub.create_session().await.unwrap();
        assert_eq!(
            created.join_url.as_deref(),
            Some(format!("http://localhost:3000?game={}", created.session_id).as_str())
        );

        time::sleep(Duration::from_secs(20)).await;
        assert!(hub.lookup(created.session_id.as_str()).await.unwrap().is_some());

        time::sleep(Duration::from_secs(15)).await;
        assert_eq!(hub.lookup(created.session_id.as_str()).await.unwrap(), None);
    }
}
