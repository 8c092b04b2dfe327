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

use s3::Region;

use std::env;

/// The key prefix used when `DESTINATION_PREFIX` is not set.
pub const DEFAULT_PREFIX: &str = "resized/";

/// The region used when `AWS_REGION` is not set.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Represents the relay's settings, fixed at process start.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The bucket objects are copied to.
    pub destination_bucket: String,
    /// The prefix prepended to each copied object's key.
    pub key_prefix: String,
    /// The storage region.
    pub region: String,
    /// Any custom S3-compatible endpoint URL.
    pub endpoint: Option<String>,
}

impl Config {
    /// Loads and validates the settings from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads and validates the settings using the specified variable lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let config = Config {
            destination_bucket: value("DESTINATION_BUCKET")
                .ok_or_else(|| anyhow!("Missing configuration value: DESTINATION_BUCKET"))?,
            key_prefix: lookup("DESTINATION_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.into()),
            region: value("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.into()),
            endpoint: value("S3_ENDPOINT"),
        };
        config.validate()?;

        Ok(config)
    }

    /// Validates the settings.
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_bucket_name(&self.destination_bucket)?;
        if self.key_prefix.is_empty() {
            // An empty prefix would copy an object onto itself when the buckets coincide.
            return Err(anyhow!("Invalid configuration value: DESTINATION_PREFIX is empty"));
        }
        if let Some(endpoint) = &self.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(anyhow!(
                    "Invalid configuration value: S3_ENDPOINT {} is not an HTTP(S) URL",
                    endpoint
                ));
            }
        }

        Ok(())
    }

    /// Returns the storage region, or the custom endpoint if one is configured.
    pub fn s3_region(&self) -> anyhow::Result<Region> {
        match &self.endpoint {
            Some(endpoint) => Ok(Region::Custom {
                region: self.region.clone(),
                endpoint: endpoint.clone(),
            }),
            None => self
                .region
                .parse()
                .map_err(|e| anyhow!("Invalid region {}: {}", self.region, e)),
        }
    }
}

/// Checks a bucket name against the S3 naming rules:
/// 3 to 63 lowercase letters, digits, dots and hyphens, beginning and ending with a letter or digit.
fn validate_bucket_name(name: &str) -> anyhow::Result<()> {
    let valid_char = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-';
    let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();

    let valid = (3..=63).contains(&name.len())
        && name.chars().all(valid_char)
        && name.chars().next().map_or(false, alnum)
        && name.chars().last().map_or(false, alnum);
    if !valid {
        return Err(anyhow!(
            "Invalid configuration value: DESTINATION_BUCKET {:?} is not a valid bucket name",
            name
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(lookup(&[("DESTINATION_BUCKET", "outgoing")])).unwrap();

        assert_eq!(config.destination_bucket, "outgoing");
        assert_eq!(config.key_prefix, DEFAULT_PREFIX);
        assert_eq!(config.region, DEFAULT_REGION);
        assert_eq!(config.endpoint, None);
    }

    #[test]
    fn overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DESTINATION_BUCKET", "outgoing"),
            ("DESTINATION_PREFIX", "copies/"),
            ("AWS_REGION", "eu-west-1"),
            ("S3_ENDPOINT", "http://localhost:4566"),
        ]))
        .unwrap();

        assert_eq!(config.key_prefix, "copies/");
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:4566"));
        match config.s3_region().unwrap() {
            Region::Custom { region, endpoint } => {
                assert_eq!(region, "eu-west-1");
                assert_eq!(endpoint, "http://localhost:4566");
            }
            r => panic!("unexpected region {:?}", r),
        }
    }

    #[test]
    fn missing_destination_bucket() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
        assert!(Config::from_lookup(lookup(&[("DESTINATION_BUCKET", "")])).is_err());
    }

    #[test]
    fn invalid_destination_bucket() {
        for name in &["ab", "Outgoing", "-outgoing", "outgoing.", "out_going"] {
            let result = Config::from_lookup(lookup(&[("DESTINATION_BUCKET", *name)]));
            assert!(result.is_err(), "{} was accepted", name);
        }
    }

    #[test]
    fn empty_prefix() {
        let result = Config::from_lookup(lookup(&[
            ("DESTINATION_BUCKET", "outgoing"),
            ("DESTINATION_PREFIX", ""),
        ]));

        assert!(result.is_err());
    }

    #[test]
    fn invalid_endpoint() {
        let result = Config::from_lookup(lookup(&[
            ("DESTINATION_BUCKET", "outgoing"),
            ("S3_ENDPOINT", "localhost:4566"),
        ]));

        assert!(result.is_err());
    }
}
