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

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

pub use crate::config::{Config, DEFAULT_PREFIX, DEFAULT_REGION};
pub use crate::error::RelayError;
pub use crate::event::{decode_key, SourceObject};
pub use crate::relay::{CopiedObject, ObjectRelay};
pub use crate::store::{ObjectStore, S3ObjectStore, StoreError};

mod config;
mod error;
mod event;
mod relay;
mod store;
