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
//! Per-session settings shared by every session a store creates.
use std::time::Duration;

use crate::board::BoardDimensions;

/// Default length of a turn before it is skipped automatically.
pub const DEFAULT_TURN_DURATION: Duration = Duration::from_secs(15);

/// Settings applied to each new session.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SessionConfig {
    /// Size of each seat's board.
    pub dimensions: BoardDimensions,

    /// How long the seat whose turn it is may take before the turn is skipped.
    pub turn_duration: Duration,

    /// Check submitted fleets against the placement rules. When off, placements are
    /// stored exactly as the client sent them.
    pub validate_placements: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dimensions: BoardDimensions::default(),
            turn_duration: DEFAULT_TURN_DURATION,
            validate_placements: false,
        }
    }
}
