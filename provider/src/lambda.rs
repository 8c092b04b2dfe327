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
// S3 Object Relay AWS Lambda Runtime Client
//

use reqwest::blocking::Response;

use std::time::Duration;

/// Represents an invocation event.
#[derive(Debug)]
pub struct InvocationEvent {
    body: Vec<u8>,
    request_id: Option<String>,
    trace_id: Option<String>,
}

/// Represents an invocation response.
pub struct InvocationResponse {
    body: Vec<u8>,
    request_id: String,
}

/// Represents an invocation error.
pub struct InvocationError {
    error: anyhow::Error,
    request_id: String,
}

/// Represents an AWS Lambda runtime client.
pub trait Client {
    /// Returns the next AWS Lambda invocation event.
    fn next_invocation_event(&self) -> anyhow::Result<Option<InvocationEvent>>;

    /// Sends an invocation error to the AWS Lambda runtime.
    fn send_invocation_error(&self, error: InvocationError) -> anyhow::Result<()>;

    /// Sends an invocation response to the AWS Lambda runtime.
    fn send_invocation_response(&self, response: InvocationResponse) -> anyhow::Result<()>;
}

/// Reports errors raised while the function initializes.
pub trait InitializationErrorReporter {
    /// Sends an initialization error to the AWS Lambda runtime.
    fn send_initialization_error(&self, error: &anyhow::Error) -> anyhow::Result<()>;
}

/// Represents an AWS Lambda runtime HTTP client.
pub struct RuntimeClient {
    endpoint: String,
    http_client: reqwest::blocking::Client,
}

impl RuntimeClient {
    /// Creates a new `RuntimeClient` with the specified AWS Lambda runtime API endpoint.
    /// The endpoint includes the scheme, e.g. `http://127.0.0.1:9001`.
    pub fn new(endpoint: &str) -> anyhow::Result<Self> {
        // `next` is a long poll, so requests must not time out.
        let http_client = reqwest::blocking::Client::builder()
            .timeout(None::<Duration>)
            .build()?;

        Ok(RuntimeClient {
            endpoint: endpoint.trim_end_matches('/').into(),
            http_client,
        })
    }

    /// Returns the URL for the specified runtime API path.
    fn url(&self, path: &str) -> String {
        format!("{}/2018-06-01/runtime/{}", self.endpoint, path)
    }
}

impl Client for RuntimeClient {
    fn next_invocation_event(&self) -> anyhow::Result<Option<InvocationEvent>> {
        // https://docs.aws.amazon.com/lambda/latest/dg/runtimes-api.html#runtimes-api-next
        let url = self.url("invocation/next");
        let resp = self.http_client.get(&url).send()?;
        log_status("GET", &url, &resp);
        if !resp.status().is_success() {
            return Ok(None);
        }

        // The event is already dequeued, so a bad header must not lose it.
        let request_id = header_value(&resp, "Lambda-Runtime-Aws-Request-Id");
        let trace_id = header_value(&resp, "Lambda-Runtime-Trace-Id");

        let mut event = InvocationEvent::new(resp.bytes()?.to_vec());
        event.request_id = request_id;
        event.trace_id = trace_id;

        Ok(Some(event))
    }

    fn send_invocation_error(&self, error: InvocationError) -> anyhow::Result<()> {
        // https://docs.aws.amazon.com/lambda/latest/dg/runtimes-api.html#runtimes-api-invokeerror
        let url = self.url(&format!("invocation/{}/error", error.request_id));
        self.post_error(&url, &error.error)
    }

    fn send_invocation_response(&self, response: InvocationResponse) -> anyhow::Result<()> {
        // https://docs.aws.amazon.com/lambda/latest/dg/runtimes-api.html#runtimes-api-response
        let url = self.url(&format!("invocation/{}/response", response.request_id));
        let resp = self.http_client.post(&url).body(response.body).send()?;
        log_status("POST", &url, &resp);
        check_status(&url, &resp)
    }
}

impl InitializationErrorReporter for RuntimeClient {
    fn send_initialization_error(&self, error: &anyhow::Error) -> anyhow::Result<()> {
        // https://docs.aws.amazon.com/lambda/latest/dg/runtimes-api.html#runtimes-api-initerror
        let url = self.url("init/error");
        self.post_error(&url, error)
    }
}

impl RuntimeClient {
    /// Posts an error document to the specified URL.
    fn post_error(&self, url: &str, error: &anyhow::Error) -> anyhow::Result<()> {
        let resp = self
            .http_client
            .post(url)
            .header("Lambda-Runtime-Function-Error-Type", "Unhandled")
            .json(&serde_json::json!({
                "errorMessage": format!("{:#}", error),
                "errorType": "Unhandled",
            }))
            .send()?;
        log_status("POST", url, &resp);
        check_status(url, &resp)
    }
}

/// Returns an initialization error reporter for the specified AWS Lambda runtime API endpoint.
pub fn initerr_reporter(endpoint: &str) -> anyhow::Result<impl InitializationErrorReporter> {
    RuntimeClient::new(endpoint)
}

/// Logs the status of a runtime API call.
fn log_status(method: &str, url: &str, resp: &Response) {
    let status = resp.status();
    info!(
        "{} {} {} {}",
        method,
        url,
        status.as_str(),
        status.canonical_reason().unwrap_or_default()
    );
}

/// Returns an error if the runtime API rejected a call.
fn check_status(url: &str, resp: &Response) -> anyhow::Result<()> {
    let status = resp.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(anyhow!("Runtime API rejected {}: {}", url, status))
    }
}

/// Returns the value of the specified header, if present and readable.
fn header_value(resp: &Response, name: &str) -> Option<String> {
    let value = resp.headers().get(name)?;
    match value.to_str() {
        Ok(s) => Some(s.into()),
        Err(e) => {
            warn!("Ignoring invalid {} header: {}", name, e);
            None
        }
    }
}

impl InvocationEvent {
    /// Creates a new `InvocationEvent` with the specified body.
    pub fn new(body: Vec<u8>) -> Self {
        InvocationEvent {
            body,
            request_id: None,
            trace_id: None,
        }
    }

    /// Sets the request ID.
    pub fn with_request_id(mut self, request_id: &str) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Sets the trace ID.
    pub fn with_trace_id(mut self, trace_id: &str) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Returns the event body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns any request ID.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Returns any trace ID.
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }
}

impl InvocationResponse {
    /// Creates a new `InvocationResponse` with the specified body and request ID.
    pub fn new(body: Vec<u8>, request_id: &str) -> Self {
        InvocationResponse {
            body,
            request_id: request_id.into(),
        }
    }

    /// Returns the response body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the request ID.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

impl InvocationError {
    /// Creates a new `InvocationError` with the specified error and request ID.
    pub fn new(error: anyhow::Error, request_id: &str) -> Self {
        InvocationError {
            error,
            request_id: request_id.into(),
        }
    }

    /// Returns the error.
    pub fn error(&self) -> &anyhow::Error {
        &self.error
    }

    /// Returns the request ID.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}
