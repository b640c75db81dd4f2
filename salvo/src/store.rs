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
//! In-memory registry of live sessions.
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use rand::Rng;
use tracing::{debug, info};

use crate::{
    config::SessionConfig,
    game::{Session, SessionError, SessionId, SessionStatus},
    protocol::SessionSummary,
};

/// Number of characters in a session id.
pub const SESSION_ID_LEN: usize = 7;

/// Characters session ids are drawn from.
const ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Owns every live session, keyed by id.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<SessionId, Session>,
    config: SessionConfig,
}

impl SessionStore {
    /// Create an empty store whose sessions use the given config.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Create a new waiting session with a fresh id.
    pub fn create(&mut self) -> SessionId {
        self.create_with(&mut rand::thread_rng(), Instant::now())
    }

    /// Create a new waiting session, drawing the id from `rng`. The id is redrawn until
    /// it does not collide with a live session.
    pub fn create_with<R: Rng + ?Sized>(&mut self, rng: &mut R, now: Instant) -> SessionId {
        let id = loop {
            let id = generate_id(rng);
            if !self.sessions.contains_key(&id) {
                break id;
            }
            debug!(session = %id, "session id collision");
        };
        self.sessions
            .insert(id.clone(), Session::new(id.clone(), self.config, now));
        info!(session = %id, "session created");
        id
    }

    /// Look up a session.
    pub fn get(&self, id: &str) -> Result<&Session, SessionError> {
        self.sessions
            .get(id)
            .ok_or_else(|| SessionError::SessionNotFound(id.to_owned()))
    }

    /// Look up a session for a transition.
    pub fn get_mut(&mut self, id: &str) -> Result<&mut Session, SessionError> {
        self.sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::SessionNotFound(id.to_owned()))
    }

    /// Pre-join summary of a session, if it exists.
    pub fn summary(&self, id: &str) -> Option<SessionSummary> {
        self.sessions.get(id).map(|session| SessionSummary {
            exists: true,
            seat_count: session.seat_count(),
            status: session.status(),
        })
    }

    /// Remove a session.
    pub fn remove(&mut self, id: &str) -> Option<Session> {
        self.sessions.remove(id)
    }

    /// Remove sessions at least `ttl` old that are finished, never filled, or have no
    /// connected seat left. Returns the ids removed.
    pub fn reap(&mut self, now: Instant, ttl: Duration) -> Vec<SessionId> {
        let expired: Vec<SessionId> = self
            .sessions
            .values()
            .filter(|session| now.saturating_duration_since(session.created_at()) >= ttl)
            .filter(|session| {
                session.status() == SessionStatus::Finished
                    || session.seat_count() < 2
                    || !session.has_connected_seat()
            })
            .map(|session| session.id().clone())
            .collect();
        for id in &expired {
            self.sessions.remove(id.as_str());
        }
        if !expired.is_empty() {
            info!(count = expired.len(), remaining = self.sessions.len(), "reaped sessions");
        }
        expired
    }
}

fn generate_id<R: Rng + ?Sized>(rng: &mut R) -> SessionId {
    let id: String = (0..SESSION_ID_LEN)
        .map(|_| ID_CHARSET[rng.gen_range(0..ID_CHARSET.len())] as char)
        .collect();
    SessionId::new(id)
}
