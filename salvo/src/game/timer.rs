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
//! The turn timer as a value owned by the session.
//!
//! The session never sleeps. Arming the timer hands out a [`TimerTicket`] that the
//! transport schedules; when the delay elapses the ticket is handed back to
//! [`Session::expire_turn`](crate::game::Session::expire_turn). Every re-arm or cancel
//! bumps the generation, so a ticket that was superseded before it was delivered is
//! recognised as stale and ignored.
use std::time::Duration;

/// A scheduled turn expiry.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TimerTicket {
    generation: u64,
    duration: Duration,
}

impl TimerTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// How long after arming the ticket should be delivered.
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

/// What the transport should do with the session's pending expiry after a transition.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TimerCommand {
    /// Leave any pending expiry as it is.
    Keep,
    /// Drop any pending expiry and schedule this one.
    Start(TimerTicket),
    /// Drop any pending expiry.
    Cancel,
}

impl Default for TimerCommand {
    fn default() -> Self {
        TimerCommand::Keep
    }
}

/// Per-session countdown state.
#[derive(Debug, Clone)]
pub struct TurnTimer {
    duration: Duration,
    generation: u64,
    armed: bool,
}

impl TurnTimer {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            generation: 0,
            armed: false,
        }
    }

    /// Length of a full turn.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Returns true while a ticket is outstanding.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Start a fresh countdown, superseding any outstanding ticket.
    pub fn arm(&mut self) -> TimerTicket {
        self.generation += 1;
        self.armed = true;
        TimerTicket {
            generation: self.generation,
            duration: self.duration,
        }
    }

    /// Invalidate any outstanding ticket.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.armed = false;
    }

    /// Returns true if the ticket is the outstanding one.
    pub fn is_current(&self, ticket: TimerTicket) -> bool {
        self.armed && ticket.generation == self.generation
    }

    /// Consume an elapsed ticket. Returns true if it was current, in which case the timer
    /// is disarmed.
    pub fn fire(&mut self, ticket: TimerTicket) -> bool {
        if self.is_current(ticket) {
            self.armed = false;
            true
        } else {
            false
        }
    }
}
