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
// S3 Object Relay Storage
//

use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};
use thiserror::Error;

use crate::config::Config;

/// The reasons a storage call can fail.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found")]
    NotFound,

    /// A status outside 2xx. A 404 on read is `NotFound` instead.
    #[error("unexpected status {0}")]
    Status(u16),

    #[error(transparent)]
    S3(#[from] S3Error),
}

/// Represents the object storage service.
pub trait ObjectStore: Send + Sync {
    /// Returns the full content of an object.
    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Writes an object, replacing any existing object with the same key.
    fn put(&self, bucket: &str, key: &str, content: &[u8]) -> Result<(), StoreError>;
}

/// Represents Amazon S3, or an S3-compatible service.
pub struct S3ObjectStore {
    region: Region,
    credentials: Credentials,
    path_style: bool,
}

impl S3ObjectStore {
    /// Creates a new `S3ObjectStore` with virtual-hosted-style addressing.
    pub fn new(region: Region, credentials: Credentials) -> Self {
        S3ObjectStore {
            region,
            credentials,
            path_style: false,
        }
    }

    /// Creates a new `S3ObjectStore` from the relay settings, using the default credential chain.
    /// Custom endpoints are addressed path-style.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let credentials = Credentials::default()
            .map_err(|e| anyhow!("Unable to load AWS credentials: {}", e))?;
        let store = Self::new(config.s3_region()?, credentials);

        Ok(if config.endpoint.is_some() {
            store.with_path_style()
        } else {
            store
        })
    }

    /// Switches to path-style addressing.
    pub fn with_path_style(mut self) -> Self {
        self.path_style = true;
        self
    }

    /// Returns a handle to the specified bucket.
    fn bucket(&self, name: &str) -> Result<Bucket, StoreError> {
        let bucket = Bucket::new(name, self.region.clone(), self.credentials.clone())?;

        Ok(if self.path_style {
            bucket.with_path_style()
        } else {
            bucket
        })
    }
}

impl ObjectStore for S3ObjectStore {
    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        debug!("GET s3://{}/{}", bucket, key);
        let resp = match self.bucket(bucket)?.get_object(key) {
            Ok(resp) => resp,
            Err(S3Error::HttpFailWithBody(404, _)) => return Err(StoreError::NotFound),
            Err(e) => return Err(e.into()),
        };

        match resp.status_code() {
            200..=299 => Ok(resp.bytes().to_vec()),
            404 => Err(StoreError::NotFound),
            status => Err(StoreError::Status(status)),
        }
    }

    fn put(&self, bucket: &str, key: &str, content: &[u8]) -> Result<(), StoreError> {
        debug!("PUT s3://{}/{} ({} bytes)", bucket, key, content.len());
        let resp = self.bucket(bucket)?.put_object(key, content)?;

        match resp.status_code() {
            200..=299 => Ok(()),
            status => Err(StoreError::Status(status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_common::*;

    fn mock_store(server: &mockito::ServerGuard) -> S3ObjectStore {
        let region = Region::Custom {
            region: "us-east-1".into(),
            endpoint: server.url(),
        };
        let credentials =
            Credentials::new(Some("AKIDEXAMPLE"), Some("SECRET"), None, None, None).unwrap();

        S3ObjectStore::new(region, credentials).with_path_style()
    }

    #[test]
    fn get_object() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/incoming/photo1.jpg")
            .with_status(200)
            .with_body(OBJECT_CONTENT)
            .create();

        let content = mock_store(&server).get(SOURCE_BUCKET, OBJECT_KEY).unwrap();

        mock.assert();
        assert_eq!(content, OBJECT_CONTENT);
    }

    #[test]
    fn get_missing_object() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/incoming/photo1.jpg")
            .with_status(404)
            .with_body("<Error><Code>NoSuchKey</Code></Error>")
            .create();

        let result = mock_store(&server).get(SOURCE_BUCKET, OBJECT_KEY);

        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[test]
    fn get_denied() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/incoming/photo1.jpg")
            .with_status(403)
            .with_body("<Error><Code>AccessDenied</Code></Error>")
            .create();

        let result = mock_store(&server).get(SOURCE_BUCKET, OBJECT_KEY);

        assert!(result.is_err());
        assert!(!matches!(result, Err(StoreError::NotFound)));
    }

    #[test]
    fn put_object() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("PUT", "/outgoing/resized/photo1.jpg")
            .match_body("ABC")
            .with_status(200)
            .with_header("ETag", "\"902fbdd2b1df0c4f70b4a5d23525e932\"")
            .create();

        let result = mock_store(&server).put(DESTINATION_BUCKET, "resized/photo1.jpg", OBJECT_CONTENT);

        mock.assert();
        assert!(result.is_ok());
    }

    #[test]
    fn put_denied() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("PUT", "/outgoing/resized/photo1.jpg")
            .with_status(403)
            .with_body("<Error><Code>AccessDenied</Code></Error>")
            .create();

        let result = mock_store(&server).put(DESTINATION_BUCKET, "resized/photo1.jpg", OBJECT_CONTENT);

        assert!(result.is_err());
    }
}
