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
//! WebSocket relay that pairs two browser connections into a salvo session.
//!
//! [`server`] accepts HTTP and WebSocket traffic and forwards it to the [`hub`], a
//! single task that owns the session store, the connection registry and every turn
//! timer.

pub use crate::{
    config::RelayConfig,
    error::RelayError,
    server::{start, RelayHandle},
};

pub mod config;
pub mod error;
pub mod hub;
pub mod server;
