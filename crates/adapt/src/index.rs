//! Per-state view of a projection.
//!
//! Groups the projection's transitions by source state, keeping the order
//! in which states and edges first appear, and resolves each projection
//! state to the machine state it was derived from.

use serde::Serialize;
use swarm_interchange::{CommandName, EventType, MachineLabel, ProjectionInfo, StateName};

/// One projection state and its outgoing edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectionState {
    pub name: StateName,
    /// The original machine state this one corresponds to, if any.
    pub original: Option<StateName>,
    /// `Execute` labels, in transition order.
    pub commands: Vec<(CommandName, Vec<EventType>)>,
    /// `Input` labels with their targets, in transition order.
    pub reactions: Vec<(EventType, StateName)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectionIndex {
    initial: StateName,
    states: Vec<ProjectionState>,
}

impl ProjectionIndex {
    /// Index the states named by the projection's transitions.
    ///
    /// A projection without transitions consists of its initial state
    /// alone. Otherwise the initial state is only indexed when some
    /// transition mentions it.
    pub fn new(info: &ProjectionInfo) -> Self {
        let mut index = ProjectionIndex {
            initial: info.projection.initial.clone(),
            states: Vec::new(),
        };
        if info.projection.transitions.is_empty() {
            index.slot(info, &info.projection.initial);
        }
        for t in &info.projection.transitions {
            let source = index.slot(info, &t.source);
            match &t.label {
                MachineLabel::Execute { cmd, log_type } => {
                    index.states[source]
                        .commands
                        .push((cmd.clone(), log_type.clone()));
                }
                MachineLabel::Input { event_type } => {
                    index.states[source]
                        .reactions
                        .push((event_type.clone(), t.target.clone()));
                }
            }
            index.slot(info, &t.target);
        }
        index
    }

    pub fn initial(&self) -> &StateName {
        &self.initial
    }

    pub fn states(&self) -> &[ProjectionState] {
        &self.states
    }

    pub fn get(&self, name: &StateName) -> Option<&ProjectionState> {
        self.states.iter().find(|s| &s.name == name)
    }

    /// Names of the commands offered in `name`.
    pub fn commands_of(&self, name: &StateName) -> Vec<CommandName> {
        self.get(name)
            .map(|s| s.commands.iter().map(|(c, _)| c.clone()).collect())
            .unwrap_or_default()
    }

    fn slot(&mut self, info: &ProjectionInfo, name: &StateName) -> usize {
        if let Some(pos) = self.states.iter().position(|s| &s.name == name) {
            return pos;
        }
        self.states.push(ProjectionState {
            name: name.clone(),
            original: info.original_state(name).cloned(),
            commands: Vec::new(),
            reactions: Vec::new(),
        });
        self.states.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use swarm_interchange::projection_info_from_json;

    fn info() -> ProjectionInfo {
        projection_info_from_json(&json!({
            "projection": {
                "initial": "a",
                "transitions": [
                    {"source": "a", "target": "a",
                     "label": {"tag": "Execute", "cmd": "go", "logType": ["x"]}},
                    {"source": "a", "target": "b",
                     "label": {"tag": "Input", "eventType": "x"}},
                    {"source": "b", "target": "a",
                     "label": {"tag": "Input", "eventType": "y"}}
                ]
            },
            "projToMachineStates": {"a": ["s0", "s9"], "b": []}
        }))
        .unwrap()
    }

    #[test]
    fn test_states_in_first_seen_order() {
        let index = ProjectionIndex::new(&info());
        let names: Vec<&str> = index.states().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(index.commands_of(&"a".into()), vec![CommandName::from("go")]);
    }

    #[test]
    fn test_original_state_is_first_entry() {
        let index = ProjectionIndex::new(&info());
        assert_eq!(index.get(&"a".into()).unwrap().original, Some(StateName::from("s0")));
        assert_eq!(index.get(&"b".into()).unwrap().original, None);
    }

    #[test]
    fn test_edges_grouped_by_source() {
        let index = ProjectionIndex::new(&info());
        let a = index.get(&"a".into()).unwrap();
        assert_eq!(a.reactions, vec![(EventType::from("x"), StateName::from("b"))]);
        let b = index.get(&"b".into()).unwrap();
        assert!(b.commands.is_empty());
        assert_eq!(b.reactions, vec![(EventType::from("y"), StateName::from("a"))]);
    }

    #[test]
    fn test_isolated_initial_is_indexed() {
        let info = projection_info_from_json(&json!({
            "projection": {"initial": "only", "transitions": []}
        }))
        .unwrap();
        let index = ProjectionIndex::new(&info);
        assert_eq!(index.states().len(), 1);
        assert_eq!(index.initial(), "only");
    }
}
