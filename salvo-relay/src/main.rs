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
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use salvo_relay::{config::DEFAULT_LOG_FILTER, RelayConfig, RelayError};

#[tokio::main]
async fn main() -> Result<(), RelayError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = RelayConfig::parse();
    let relay = salvo_relay::start(&config).await?;
    info!(
        addr = %relay.local_addr(),
        turn_secs = config.turn_secs,
        validate_placements = config.validate_placements,
        "press ctrl-c to stop"
    );

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    relay.shutdown().await
}
