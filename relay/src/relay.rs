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
// S3 Object Relay
//

use codec::relay::Response;
use provider::{Handler, InvocationEvent};

use crate::config::Config;
use crate::error::RelayError;
use crate::event::SourceObject;
use crate::store::ObjectStore;

/// Describes an object that has been relayed.
#[derive(Clone, Debug, PartialEq)]
pub struct CopiedObject {
    pub source: SourceObject,
    pub destination_bucket: String,
    pub destination_key: String,
    /// The content length, in bytes.
    pub size: usize,
}

/// Copies newly created objects to the destination bucket under a key prefix.
pub struct ObjectRelay<S> {
    store: S,
    destination_bucket: String,
    key_prefix: String,
}

impl<S: ObjectStore> ObjectRelay<S> {
    /// Creates a new `ObjectRelay` that uses the specified store.
    pub fn new(store: S, config: &Config) -> Self {
        ObjectRelay {
            store,
            destination_bucket: config.destination_bucket.clone(),
            key_prefix: config.key_prefix.clone(),
        }
    }

    /// Relays the object named by a notification event body and returns the result
    /// to be sent back to AWS Lambda. Every failure is reported as the same generic result.
    pub fn handle(&self, body: &[u8]) -> Response {
        match self.relay(body) {
            Ok(copied) => {
                info!(
                    "Copied s3://{}/{} to s3://{}/{} ({} bytes)",
                    copied.source.bucket,
                    copied.source.key,
                    copied.destination_bucket,
                    copied.destination_key,
                    copied.size
                );
                Response::success()
            }
            Err(e) => {
                error!("Error {}", e);
                Response::failure()
            }
        }
    }

    /// Relays the object named by a notification event body.
    pub fn relay(&self, body: &[u8]) -> Result<CopiedObject, RelayError> {
        self.copy(SourceObject::from_slice(body)?)
    }

    /// Returns the key an object is copied to.
    pub fn destination_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    /// Returns the store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn copy(&self, source: SourceObject) -> Result<CopiedObject, RelayError> {
        let content = self
            .store
            .get(&source.bucket, &source.key)
            .map_err(|e| RelayError::Read {
                bucket: source.bucket.clone(),
                key: source.key.clone(),
                source: e,
            })?;

        let destination_key = self.destination_key(&source.key);
        self.store
            .put(&self.destination_bucket, &destination_key, &content)
            .map_err(|e| RelayError::Write {
                bucket: self.destination_bucket.clone(),
                key: destination_key.clone(),
                source: e,
            })?;

        Ok(CopiedObject {
            source,
            destination_bucket: self.destination_bucket.clone(),
            destination_key,
            size: content.len(),
        })
    }
}

impl<S: ObjectStore> Handler for ObjectRelay<S> {
    /// Relays the object and returns the JSON serialization of the result.
    fn handle(&self, event: &InvocationEvent) -> anyhow::Result<Vec<u8>> {
        let resp = ObjectRelay::handle(self, event.body());

        Ok(resp.to_vec()?)
    }
}
