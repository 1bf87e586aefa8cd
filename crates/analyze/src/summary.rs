//! Structural summary of an exported machine graph.
//!
//! Enumerates the state space (synthetic chain states included), derives
//! the states reachable from the initial state via BFS over the transition
//! relation, and reports the states that are not.

use crate::export::is_synthetic;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, VecDeque};
use swarm_interchange::{MachineGraph, MachineLabel};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    pub initial_state: String,
    pub states: BTreeSet<String>,
    pub synthetic_states: BTreeSet<String>,
    pub reachable_states: BTreeSet<String>,
    pub unreachable_states: BTreeSet<String>,
    pub command_edges: usize,
    pub input_edges: usize,
    pub subscriptions: Vec<String>,
}

impl GraphSummary {
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn has_dead_states(&self) -> bool {
        !self.unreachable_states.is_empty()
    }
}

pub fn summarize(graph: &MachineGraph) -> GraphSummary {
    let machine = graph.to_machine_type();
    let declared = machine.states();
    let states: BTreeSet<String> = declared.iter().map(|s| s.to_string()).collect();
    let synthetic_states = declared
        .iter()
        .filter(|s| is_synthetic(s))
        .map(|s| s.to_string())
        .collect();

    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut command_edges = 0;
    let mut input_edges = 0;
    for t in &graph.transitions {
        match t.label {
            MachineLabel::Execute { .. } => command_edges += 1,
            MachineLabel::Input { .. } => input_edges += 1,
        }
        adjacency
            .entry(t.source.as_str())
            .or_default()
            .push(t.target.as_str());
    }

    let mut reachable = BTreeSet::new();
    let mut queue = VecDeque::new();
    reachable.insert(graph.initial.to_string());
    queue.push_back(graph.initial.as_str());

    while let Some(state) = queue.pop_front() {
        if let Some(neighbors) = adjacency.get(state) {
            for &next in neighbors {
                if reachable.insert(next.to_string()) {
                    queue.push_back(next);
                }
            }
        }
    }

    let unreachable_states = states.difference(&reachable).cloned().collect();

    GraphSummary {
        initial_state: graph.initial.to_string(),
        states,
        synthetic_states,
        reachable_states: reachable,
        unreachable_states,
        command_edges,
        input_edges,
        subscriptions: graph.subscriptions.iter().map(|s| s.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summary_counts_and_reachability() {
        let graph: MachineGraph = serde_json::from_value(json!({
            "initial": "S0",
            "subscriptions": ["a", "b"],
            "transitions": [
                {"source": "S0", "target": "S0",
                 "label": {"tag": "Execute", "cmd": "go", "logType": ["a"]}},
                {"source": "S0", "target": "§S0§a",
                 "label": {"tag": "Input", "eventType": "a"}},
                {"source": "§S0§a", "target": "S1",
                 "label": {"tag": "Input", "eventType": "b"}},
                {"source": "Orphan", "target": "S1",
                 "label": {"tag": "Input", "eventType": "b"}}
            ]
        }))
        .unwrap();

        let summary = summarize(&graph);
        assert_eq!(summary.state_count(), 4);
        assert_eq!(summary.command_edges, 1);
        assert_eq!(summary.input_edges, 3);
        assert!(summary.synthetic_states.contains("§S0§a"));
        assert!(summary.reachable_states.contains("S1"));
        assert!(summary.has_dead_states());
        assert_eq!(
            summary.unreachable_states.iter().collect::<Vec<_>>(),
            vec!["Orphan"]
        );
    }
}
