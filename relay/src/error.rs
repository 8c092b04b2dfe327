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

use thiserror::Error;

use crate::store::StoreError;

/// The reasons an object could not be relayed.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("malformed notification event: {0}")]
    MalformedEvent(#[from] serde_json::Error),

    #[error("notification event holds no records")]
    NoRecords,

    #[error("notification record is missing or empty {0}")]
    MissingField(&'static str),

    #[error("object key {key:?} is not valid percent-encoded UTF-8")]
    InvalidKey { key: String },

    #[error("unable to read s3://{bucket}/{key}: {source}")]
    Read {
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("unable to write s3://{bucket}/{key}: {source}")]
    Write {
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },
}
