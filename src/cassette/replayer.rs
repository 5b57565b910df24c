//! Replays recorded interactions from a cassette.

use std::collections::HashMap;

use super::format::{Cassette, Interaction};

/// Key for indexing interactions by port and method.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
struct PortMethodKey {
    port: String,
    method: String,
}

/// Serves a cassette's interactions sequentially per port/method pair.
pub struct CassetteReplayer {
    queues: HashMap<PortMethodKey, Vec<Interaction>>,
    cursors: HashMap<PortMethodKey, usize>,
}

impl CassetteReplayer {
    /// Create a new replayer from a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<PortMethodKey, Vec<Interaction>> = HashMap::new();
        for interaction in &cassette.interactions {
            let key = PortMethodKey {
                port: interaction.port.clone(),
                method: interaction.method.clone(),
            };
            queues.entry(key).or_default().push(interaction.clone());
        }
        Self { queues, cursors: HashMap::new() }
    }

    /// Return the next interaction for the given port and method, or `None`
    /// once the cassette has nothing (more) for that pair.
    pub fn next_interaction(&mut self, port: &str, method: &str) -> Option<&Interaction> {
        let key = PortMethodKey { port: port.to_string(), method: method.to_string() };
        let queue = self.queues.get(&key)?;
        let cursor = self.cursors.entry(key).or_insert(0);
        let interaction = queue.get(*cursor)?;
        *cursor += 1;
        Some(interaction)
    }

    /// Interactions not yet served, across all pairs.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queues
            .iter()
            .map(|(key, queue)| queue.len() - self.cursors.get(key).copied().unwrap_or(0))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn interaction(seq: u64, method: &str, output: serde_json::Value) -> Interaction {
        Interaction { seq, port: "backend".into(), method: method.into(), input: json!({}), output }
    }

    fn make_cassette(interactions: Vec<Interaction>) -> Cassette {
        Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            transport: "memory".into(),
            interactions,
        }
    }

    #[test]
    fn serves_each_method_in_recorded_order() {
        let cassette = make_cassette(vec![
            interaction(0, "column_count", json!(1)),
            interaction(1, "list_column", json!(2)),
            interaction(2, "column_count", json!(3)),
        ]);
        let mut replayer = CassetteReplayer::new(&cassette);
        assert_eq!(replayer.remaining(), 3);

        assert_eq!(replayer.next_interaction("backend", "column_count").unwrap().seq, 0);
        assert_eq!(replayer.next_interaction("backend", "list_column").unwrap().seq, 1);
        assert_eq!(replayer.next_interaction("backend", "column_count").unwrap().seq, 2);
        assert_eq!(replayer.remaining(), 0);
    }

    #[test]
    fn exhausted_or_unknown_pairs_yield_none() {
        let cassette = make_cassette(vec![interaction(0, "ping", json!({}))]);
        let mut replayer = CassetteReplayer::new(&cassette);
        assert!(replayer.next_interaction("backend", "ping").is_some());
        assert!(replayer.next_interaction("backend", "ping").is_none());
        assert!(replayer.next_interaction("backend", "get_issue").is_none());
    }
}
