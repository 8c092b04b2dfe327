// Copyright 2015-2020 Capital One Services, LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//
// S3 Object Relay AWS Lambda Custom Runtime
//

use anyhow::{anyhow, Context};
use log::{error, info};
use provider::{initerr_reporter, InitializationErrorReporter, Poller, RuntimeClient};
use relay::{Config, ObjectRelay, S3ObjectStore};

use std::env;

const RUNTIME_API: &str = "AWS_LAMBDA_RUNTIME_API";

// Entry point.
fn main() -> anyhow::Result<()> {
    if env_logger::try_init().is_err() {
        info!("Logger already intialized");
    }

    info!("s3-relay-runtime starting");

    let endpoint = match env::var(RUNTIME_API) {
        Ok(ep) => format!("http://{}", ep),
        Err(_) => return Err(anyhow!("Missing configuration value: {}", RUNTIME_API)),
    };

    let relay = match load_relay() {
        Ok(relay) => relay,
        Err(e) => {
            error!("Initialization failed: {:#}", e);
            let reporter = initerr_reporter(&endpoint)?;
            if let Err(report_err) = reporter.send_initialization_error(&e) {
                error!("Unable to send initialization error: {}", report_err);
            }
            return Err(e);
        }
    };

    let client = RuntimeClient::new(&endpoint)?;
    Poller::new(client, relay).run();

    Ok(())
}

// Loads the settings and builds the relay with its storage client.
fn load_relay() -> anyhow::Result<ObjectRelay<S3ObjectStore>> {
    let config = Config::from_env().context("Unable to load function settings")?;
    info!(
        "Relaying objects to s3://{}/{}",
        config.destination_bucket, config.key_prefix
    );

    let store = S3ObjectStore::from_config(&config).context("Unable to create S3 client")?;

    Ok(ObjectRelay::new(store, &config))
}
