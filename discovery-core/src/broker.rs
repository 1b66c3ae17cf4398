//! Broker registrations and the parser that validates them.
//!
//! A broker registers itself as a child of the registry path. The child's
//! name is the broker id; its payload is a JSON object such as
//!
//! ```json
//! { "host":"kafka1.internal", "jmx_port":9093, "port":9092, "timestamp":"1424095336398", "version":1 }
//! ```
//!
//! The payload and the path are independent sources merged into one
//! [`BrokerDescriptor`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{DiscoveryError, DiscoveryResult};

/// A validated broker registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerDescriptor {
    /// broker id, taken from the registry path
    pub id: i32,
    /// advertised host
    pub host: String,
    /// advertised port
    pub port: i32,
    /// JMX port, `-1` when JMX is disabled
    pub jmx_port: i32,
    /// registration time
    pub timestamp: DateTime<Utc>,
    /// registration format version
    pub version: i32,
}

impl BrokerDescriptor {
    /// Replace the id with one derived from the registry path.
    pub fn with_id(mut self, id: i32) -> Self {
        self.id = id;
        self
    }

    /// `host:port` for this broker.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Converts a raw registry payload into a [`BrokerDescriptor`].
///
/// The returned descriptor's `id` is `0`; callers attach the id from the
/// registry path.
pub trait EntryParser: Send + Sync + fmt::Debug {
    /// Parse one payload. `None` means the node had no payload at all.
    fn parse(&self, raw: Option<&[u8]>) -> DiscoveryResult<BrokerDescriptor>;
}

/// Strict JSON parser for broker registrations.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct JsonEntryParser;

/// Wire shape of a registration. Every key is required and no others are
/// accepted; duplicates are rejected by the derive.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Registration {
    host: String,
    port: i32,
    jmx_port: i32,
    timestamp: String,
    version: i32,
}

impl EntryParser for JsonEntryParser {
    fn parse(&self, raw: Option<&[u8]>) -> DiscoveryResult<BrokerDescriptor> {
        let raw = raw.ok_or_else(|| {
            DiscoveryError::InvalidArgument("broker registration payload is absent".into())
        })?;
        let reg: Registration = serde_json::from_slice(raw)
            .map_err(|err| DiscoveryError::Parse(format!("invalid broker registration: {err}")))?;

        let millis = reg.timestamp.parse::<i64>().map_err(|err| {
            DiscoveryError::Parse(format!(
                "timestamp '{}' is not epoch millis: {err}",
                reg.timestamp
            ))
        })?;
        let timestamp = DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
            DiscoveryError::Parse(format!("timestamp {millis} is out of range"))
        })?;

        Ok(BrokerDescriptor {
            id: 0,
            host: reg.host,
            port: reg.port,
            jmx_port: reg.jmx_port,
            timestamp,
            version: reg.version,
        })
    }
}

/// Broker id from the last segment of a registry path, e.g. `/brokers/ids/3`.
pub fn broker_id_from_path(path: &str) -> DiscoveryResult<i32> {
    let segment = path.rsplit('/').next().unwrap_or(path);
    segment.parse::<i32>().map_err(|err| {
        DiscoveryError::Parse(format!(
            "registry path '{path}' does not end in a broker id: {err}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{ "host":"beetlejuice.runtime-collective.com", "jmx_port":9093, "port":9092, "timestamp":"1424095336398", "version":1 }"#;

    fn parse(raw: &str) -> DiscoveryResult<BrokerDescriptor> {
        JsonEntryParser.parse(Some(raw.as_bytes()))
    }

    fn assert_parse_error(raw: &str) {
        match parse(raw) {
            Err(DiscoveryError::Parse(_)) => {}
            other => panic!("expected parse error for {raw:?}, got {other:?}"),
        }
    }

    fn assert_valid(broker: &BrokerDescriptor) {
        assert_eq!(broker.host, "beetlejuice.runtime-collective.com");
        assert_eq!(broker.jmx_port, 9093);
        assert_eq!(broker.port, 9092);
        assert_eq!(broker.version, 1);
        assert_eq!(broker.timestamp.timestamp_millis(), 1_424_095_336_398);
    }

    #[test]
    fn parses_valid_registration() {
        let broker = parse(VALID).expect("valid registration");
        assert_valid(&broker);
        assert_eq!(broker.id, 0);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let plain = parse(VALID).expect("plain");
        let leading = parse(&format!("    {VALID}")).expect("leading whitespace");
        let trailing = parse(&format!("{VALID}     ")).expect("trailing whitespace");
        let both = parse(&format!("\n\t {VALID} \r\n")).expect("both");
        assert_valid(&leading);
        assert_eq!(plain, leading);
        assert_eq!(plain, trailing);
        assert_eq!(plain, both);
    }

    #[test]
    fn absent_payload_is_invalid_argument() {
        assert!(matches!(
            JsonEntryParser.parse(None),
            Err(DiscoveryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_broken_structure() {
        assert_parse_error(r#" "a":"b" }"#);
        assert_parse_error(r#"{ "a":"b" "#);
        assert_parse_error("");
        assert_parse_error("   ");
    }

    #[test]
    fn rejects_each_missing_required_key() {
        assert_parse_error(
            r#"{ "jmx_port":9093, "port":9092, "timestamp":"1424095336398", "version":1 }"#,
        );
        assert_parse_error(
            r#"{ "host":"beetlejuice.runtime-collective.com", "jmx_port":9093, "timestamp":"1424095336398", "version":1 }"#,
        );
        assert_parse_error(
            r#"{ "host":"beetlejuice.runtime-collective.com", "port":9092, "timestamp":"1424095336398", "version":1 }"#,
        );
        assert_parse_error(
            r#"{ "host":"beetlejuice.runtime-collective.com", "jmx_port":9093, "port":9092, "version":1 }"#,
        );
        assert_parse_error(
            r#"{ "host":"beetlejuice.runtime-collective.com", "jmx_port":9093, "port":9092, "timestamp":"1424095336398" }"#,
        );
    }

    #[test]
    fn rejects_missing_key_or_value() {
        // missing key
        assert_parse_error(
            r#"{ : "beetlejuice.runtime-collective.com", "jmx_port":9093, "port":9092, "timestamp":"1424095336398", "version":1 }"#,
        );
        // missing value
        assert_parse_error(
            r#"{ "host": , "jmx_port":9093, "port":9092, "timestamp":"1424095336398", "version":1 }"#,
        );
        // empty pair
        assert_parse_error(
            r#"{ "host":"beetlejuice.runtime-collective.com" , , "port":9092, "timestamp":"1424095336398", "version":1 }"#,
        );
        // dangling comma
        assert_parse_error(
            r#"{ "host":"h", "jmx_port":9093, "port":9092, "timestamp":"1424095336398", "version":1, }"#,
        );
    }

    #[test]
    fn rejects_duplicate_and_unknown_keys() {
        assert_parse_error(
            r#"{ "host":"h", "host":"h2", "jmx_port":9093, "port":9092, "timestamp":"1424095336398", "version":1 }"#,
        );
        assert_parse_error(
            r#"{ "host":"h", "rack":"r1", "jmx_port":9093, "port":9092, "timestamp":"1424095336398", "version":1 }"#,
        );
    }

    #[test]
    fn rejects_non_numeric_values() {
        assert_parse_error(
            r#"{ "host":"h", "jmx_port":9093, "port":"9092", "timestamp":"1424095336398", "version":1 }"#,
        );
        assert_parse_error(
            r#"{ "host":"h", "jmx_port":9093, "port":9092, "timestamp":"yesterday", "version":1 }"#,
        );
        assert_parse_error(
            r#"{ "host":"h", "jmx_port":9093, "port":9092, "timestamp":" 1424095336398 ", "version":1 }"#,
        );
        assert_parse_error(
            r#"{ "host":"h", "jmx_port":9093, "port":9092, "timestamp":"1424095336398", "version":1.5 }"#,
        );
    }

    #[test]
    fn accepts_disabled_jmx_port() {
        let broker = parse(
            r#"{ "host":"h", "jmx_port":-1, "port":9092, "timestamp":"1424095336398", "version":1 }"#,
        )
        .expect("jmx disabled");
        assert_eq!(broker.jmx_port, -1);
    }

    #[test]
    fn rejects_non_utf8_payload() {
        assert!(matches!(
            JsonEntryParser.parse(Some(&[0xff, 0xfe, 0x7b])),
            Err(DiscoveryError::Parse(_))
        ));
    }

    #[test]
    fn broker_id_comes_from_last_path_segment() {
        assert_eq!(broker_id_from_path("/brokers/ids/42").unwrap(), 42);
        assert_eq!(broker_id_from_path("7").unwrap(), 7);
        assert!(matches!(
            broker_id_from_path("/brokers/ids/"),
            Err(DiscoveryError::Parse(_))
        ));
        assert!(matches!(
            broker_id_from_path("/brokers/ids/kafka-1"),
            Err(DiscoveryError::Parse(_))
        ));
    }

    #[test]
    fn address_joins_host_and_port() {
        let broker = parse(VALID).unwrap().with_id(3);
        assert_eq!(broker.id, 3);
        assert_eq!(broker.address(), "beetlejuice.runtime-collective.com:9092");
    }
}
