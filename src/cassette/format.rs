//! Cassette data structures for recording and replaying interactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single recorded round trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Sequence number (assigned automatically by the recorder).
    pub seq: u64,
    /// Port name (`"backend"` for dispatcher traffic).
    pub port: String,
    /// Operation name, e.g. `"list_column"`.
    pub method: String,
    /// The request as sent.
    pub input: serde_json::Value,
    /// `{"Ok": response}` or `{"Err": message}`.
    pub output: serde_json::Value,
}

/// A cassette containing a sequence of recorded interactions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cassette {
    /// Human-readable name for this cassette.
    pub name: String,
    /// When this cassette was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Transport the interactions were captured from.
    pub transport: String,
    /// Ordered list of interactions.
    pub interactions: Vec<Interaction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn yaml_round_trip_keeps_awkward_text() {
        let cassette = Cassette {
            name: "board-session".into(),
            recorded_at: Utc::now(),
            transport: "daemon".into(),
            interactions: vec![Interaction {
                seq: 0,
                port: "backend".into(),
                method: "add_comment".into(),
                input: json!({"op": "add_comment", "id": "bd-1", "text": "a: b\n- c\u{0}'\""}),
                output: json!({"Ok": {"type": "ack"}}),
            }],
        };
        let yaml = serde_yaml::to_string(&cassette).expect("serialize");
        let deserialized: Cassette = serde_yaml::from_str(&yaml).expect("deserialize");
        assert_eq!(cassette, deserialized);
    }
}
