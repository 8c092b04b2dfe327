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

use percent_encoding::percent_decode_str;

use crate::error::RelayError;

/// The parts of an S3 event notification the relay reads.
#[derive(Debug, Default, Deserialize)]
struct NotificationEvent {
    #[serde(rename = "Records", default)]
    records: Vec<NotificationRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct NotificationRecord {
    #[serde(default)]
    s3: S3Entity,
}

#[derive(Debug, Default, Deserialize)]
struct S3Entity {
    #[serde(default)]
    bucket: S3Bucket,
    #[serde(default)]
    object: S3Object,
}

#[derive(Debug, Default, Deserialize)]
struct S3Bucket {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct S3Object {
    #[serde(default)]
    key: Option<String>,
}

/// Identifies the object an S3 event notification refers to.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceObject {
    pub bucket: String,
    /// The decoded object key.
    pub key: String,
}

impl SourceObject {
    /// Parses a notification event body and returns the object named by its first record.
    /// Any other records are ignored.
    pub fn from_slice(body: &[u8]) -> Result<Self, RelayError> {
        let event: NotificationEvent = serde_json::from_slice(body)?;
        let record = event.records.first().ok_or(RelayError::NoRecords)?;
        if event.records.len() > 1 {
            warn!(
                "Event holds {} records, only the first is relayed",
                event.records.len()
            );
        }

        let bucket = non_empty(record.s3.bucket.name.as_deref())
            .ok_or(RelayError::MissingField("s3.bucket.name"))?;
        let key = non_empty(record.s3.object.key.as_deref())
            .ok_or(RelayError::MissingField("s3.object.key"))?;

        Ok(SourceObject {
            bucket: bucket.into(),
            key: decode_key(key)?,
        })
    }
}

/// Decodes an object key as it appears in S3 event notifications,
/// where spaces are sent as `+` and other characters are percent-encoded.
pub fn decode_key(key: &str) -> Result<String, RelayError> {
    let key_with_spaces = key.replace('+', " ");
    percent_decode_str(&key_with_spaces)
        .decode_utf8()
        .map(|k| k.into_owned())
        .map_err(|_| RelayError::InvalidKey { key: key.into() })
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_common::*;

    #[test]
    fn first_record_is_used() {
        let body = s3_event_body(vec![
            s3_record(SOURCE_BUCKET, OBJECT_KEY),
            s3_record("other", "photo2.jpg"),
        ]);
        let source = SourceObject::from_slice(&body).unwrap();

        assert_eq!(
            source,
            SourceObject {
                bucket: SOURCE_BUCKET.into(),
                key: OBJECT_KEY.into(),
            }
        );
    }

    #[test]
    fn minimal_record() {
        let body = br#"{"Records":[{"s3":{"bucket":{"name":"incoming"},"object":{"key":"photo1.jpg"}}}]}"#;
        let source = SourceObject::from_slice(body).unwrap();

        assert_eq!(source.bucket, SOURCE_BUCKET);
        assert_eq!(source.key, OBJECT_KEY);
    }

    #[test]
    fn missing_bucket() {
        let body = br#"{"Records":[{"s3":{"object":{"key":"photo1.jpg"}}}]}"#;
        let result = SourceObject::from_slice(body);

        assert!(matches!(
            result,
            Err(RelayError::MissingField("s3.bucket.name"))
        ));
    }

    #[test]
    fn wrong_field_type() {
        let body = br#"{"Records":[{"s3":{"bucket":{"name":42},"object":{"key":"photo1.jpg"}}}]}"#;
        let result = SourceObject::from_slice(body);

        assert!(matches!(result, Err(RelayError::MalformedEvent(_))));
    }

    #[test]
    fn no_records() {
        let body = s3_event_body(vec![]);
        let result = SourceObject::from_slice(&body);

        assert!(matches!(result, Err(RelayError::NoRecords)));
    }

    #[test]
    fn empty_key() {
        let body = s3_event_body(vec![s3_record(SOURCE_BUCKET, "")]);
        let result = SourceObject::from_slice(&body);

        let err = result.unwrap_err();
        assert!(matches!(err, RelayError::MissingField("s3.object.key")));
        assert_eq!(
            err.to_string(),
            "notification record is missing or empty s3.object.key"
        );
    }

    #[test]
    fn not_json() {
        let result = SourceObject::from_slice(b"not json");

        assert!(matches!(result, Err(RelayError::MalformedEvent(_))));
    }

    #[test]
    fn key_is_decoded() {
        assert_eq!(
            decode_key("holiday+photos/caf%C3%A9+1.jpg").unwrap(),
            "holiday photos/café 1.jpg"
        );
        assert_eq!(decode_key("a%2Bb.jpg").unwrap(), "a+b.jpg");
    }

    #[test]
    fn invalid_key() {
        let result = decode_key("bad%FF.jpg");

        assert!(matches!(result, Err(RelayError::InvalidKey { .. })));
    }
}
