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
// S3 Object Relay AWS Lambda Event Poller
//

use std::env;

use crate::lambda::{Client, InvocationError, InvocationEvent, InvocationResponse};

/// Handles a Lambda invocation event, returning the invocation response body.
pub trait Handler {
    fn handle(&self, event: &InvocationEvent) -> anyhow::Result<Vec<u8>>;
}

/// Polls the Lambda event machinery using the specified client.
pub struct Poller<C, H> {
    client: C,
    handler: H,
}

impl<C: Client, H: Handler> Poller<C, H> {
    /// Creates a new `Poller`.
    pub fn new(client: C, handler: H) -> Self {
        Self { client, handler }
    }

    /// Runs the poller forever.
    pub fn run(&self) {
        info!("Poller started");

        loop {
            self.poll();
        }
    }

    /// Gets and handles the next event.
    pub(crate) fn poll(&self) {
        debug!("Poller get next event");
        let event = match self.client.next_invocation_event() {
            Err(e) => {
                error!("{}", e);
                return;
            }
            Ok(None) => {
                warn!("No event");
                return;
            }
            Ok(Some(event)) => event,
        };
        let request_id = match event.request_id() {
            None => {
                warn!("No request ID");
                return;
            }
            Some(request_id) => request_id,
        };

        // Set for the X-Ray SDK.
        if let Some(trace_id) = event.trace_id() {
            env::set_var("_X_AMZN_TRACE_ID", trace_id);
        }

        match self.handler.handle(&event) {
            Ok(body) => self.send_invocation_response(body, request_id),
            Err(e) => {
                error!("Handler failed: {:#}", e);
                self.send_invocation_error(e, request_id)
            }
        }
    }

    /// Sends an invocation error.
    fn send_invocation_error(&self, e: anyhow::Error, request_id: &str) {
        let err = InvocationError::new(e, request_id);
        debug!("Poller send error");
        if let Err(e) = self.client.send_invocation_error(err) {
            error!("Unable to send invocation error: {}", e);
        }
    }

    /// Sends an invocation response.
    fn send_invocation_response(&self, body: Vec<u8>, request_id: &str) {
        let resp = InvocationResponse::new(body, request_id);
        debug!("Poller send response");
        if let Err(e) = self.client.send_invocation_response(resp) {
            error!("Unable to send invocation response: {}", e);
        }
    }

    /// Returns the client.
    pub fn client(&self) -> &C {
        &self.client
    }
}
