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
// S3 Object Relay Codec
//

use serde_json::Value;

/// The message returned when an object has been relayed.
pub const SUCCESS_MESSAGE: &str = "Successfully scaled image";

/// The message returned when an object could not be relayed, whatever the cause.
pub const FAILURE_MESSAGE: &str = "Error scaling image";

pub const STATUS_OK: u16 = 200;
pub const STATUS_INTERNAL_SERVER_ERROR: u16 = 500;

/// Describes the result of a relay invocation, as returned to AWS Lambda.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// The HTTP-style status code.
    pub status_code: u16,
    /// The JSON encoding of the human-readable message.
    pub body: String,
}

impl Response {
    /// Returns a response with the specified status code and message.
    /// The message is JSON encoded into the body.
    pub fn new(status_code: u16, message: &str) -> Response {
        Response {
            status_code,
            body: Value::String(message.into()).to_string(),
        }
    }

    /// Returns the success response.
    pub fn success() -> Response {
        Self::new(STATUS_OK, SUCCESS_MESSAGE)
    }

    /// Returns the generic failure response.
    pub fn failure() -> Response {
        Self::new(STATUS_INTERNAL_SERVER_ERROR, FAILURE_MESSAGE)
    }

    /// Returns the decoded message, if the body holds a JSON string.
    pub fn message(&self) -> Option<String> {
        serde_json::from_str(&self.body).ok()
    }

    /// Returns the JSON serialization of this response.
    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
