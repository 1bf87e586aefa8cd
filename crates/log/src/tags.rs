use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use swarm_interchange::EventType;

/// A set of tags attached to published events and used to select them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(BTreeSet<String>);

impl Tags {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Tags(tags.into_iter().map(Into::into).collect())
    }

    pub fn with(mut self, tag: impl Into<String>) -> Self {
        self.0.insert(tag.into());
        self
    }

    /// Add an instance-scoped `tag:id` for every tag, keeping the plain tags.
    pub fn with_id(&self, id: &str) -> Self {
        let mut tags = self.0.clone();
        for tag in &self.0 {
            tags.insert(format!("{}:{}", tag, id));
        }
        Tags(tags)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    /// Whether every tag of `self` is present in `other`.
    pub fn is_subset_of<'a>(&self, other: impl IntoIterator<Item = &'a String>) -> bool {
        let other: BTreeSet<&String> = other.into_iter().collect();
        self.0.iter().all(|t| other.contains(t))
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.to_vec().join(", "))
    }
}

/// Which events a subscription or history query selects: those carrying
/// all of `tags` and, when `event_types` is set, of one of those types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionFilter {
    pub tags: Tags,
    pub event_types: Option<BTreeSet<EventType>>,
}

impl SubscriptionFilter {
    /// Select every event.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn tagged(tags: Tags) -> Self {
        Self {
            tags,
            event_types: None,
        }
    }

    pub fn with_event_types<I, E>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<EventType>,
    {
        self.event_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn matches(&self, tags: &[String], event_type: &EventType) -> bool {
        if !self.tags.is_subset_of(tags) {
            return false;
        }
        match &self.event_types {
            Some(types) => types.contains(event_type),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_id_keeps_plain_tags() {
        let tags = Tags::new(["warehouse"]).with_id("w1");
        assert!(tags.contains("warehouse"));
        assert!(tags.contains("warehouse:w1"));
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn test_filter_requires_all_tags() {
        let filter = SubscriptionFilter::tagged(Tags::new(["a", "b"]));
        let event_type = EventType::from("x");
        assert!(filter.matches(&["a".into(), "b".into(), "c".into()], &event_type));
        assert!(!filter.matches(&["a".into()], &event_type));
        assert!(SubscriptionFilter::all().matches(&[], &event_type));
    }

    #[test]
    fn test_filter_by_event_type() {
        let filter = SubscriptionFilter::all().with_event_types(["partReq"]);
        assert!(filter.matches(&[], &"partReq".into()));
        assert!(!filter.matches(&[], &"car".into()));
    }
}
