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
//! Command line and environment configuration of the relay.
use std::{net::SocketAddr, time::Duration};

use clap::Parser;
use salvo::{
    board::{BoardDimensions, DEFAULT_BOARD_SIZE},
    config::DEFAULT_TURN_DURATION,
    SessionConfig,
};

use crate::RelayError;

/// Default `tracing` filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "salvo=info,salvo_relay=info";

/// WebSocket relay for two-player salvo sessions.
#[derive(Debug, Clone, Parser)]
#[command(name = "relay", version, about)]
pub struct RelayConfig {
    /// Address to listen on.
    #[arg(long, env = "SALVO_BIND", default_value = "0.0.0.0:3001")]
    pub bind: SocketAddr,

    /// Seconds the seat to move has before its turn is skipped.
    #[arg(long, env = "SALVO_TURN_SECS", default_value_t = DEFAULT_TURN_DURATION.as_secs())]
    pub turn_secs: u64,

    /// Width and height of each board.
    #[arg(long, env = "SALVO_BOARD_SIZE", default_value_t = DEFAULT_BOARD_SIZE)]
    pub board_size: usize,

    /// Age after which finished, unfilled or abandoned sessions are removed.
    #[arg(long, env = "SALVO_SESSION_TTL_SECS", default_value_t = 3600)]
    pub session_ttl_secs: u64,

    /// How often to look for sessions to remove.
    #[arg(long, env = "SALVO_REAP_INTERVAL_SECS", default_value_t = 60)]
    pub reap_interval_secs: u64,

    /// Base URL of the game client. When set, created sessions include a join link.
    #[arg(long, env = "SALVO_PUBLIC_URL")]
    pub public_url: Option<String>,

    /// Reject fleets that overlap, leave the board or repeat a ship type.
    #[arg(long, env = "SALVO_VALIDATE_PLACEMENTS")]
    pub validate_placements: bool,
}

impl RelayConfig {
    /// Settings for sessions created by this relay.
    pub fn session_config(&self) -> Result<SessionConfig, RelayError> {
        let dimensions = BoardDimensions::try_new(self.board_size)
            .ok_or(RelayError::InvalidBoardSize(self.board_size))?;
        Ok(SessionConfig {
            dimensions,
            turn_duration: self.turn_duration(),
            validate_placements: self.validate_placements,
        })
    }

    pub fn turn_duration(&self) -> Duration {
        Duration::from_secs(self.turn_secs)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Reap interval, never shorter than one second.
    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.reap_interval_secs.max(1))
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3001)),
            turn_secs: DEFAULT_TURN_DURATION.as_secs(),
            board_size: DEFAULT_BOARD_SIZE,
            session_ttl_secs: 3600,
            reap_interval_secs: 60,
            public_url: None,
            validate_placements: false,
        }
    }
}
