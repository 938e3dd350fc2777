//! Predicate decoding and the resolution queue.
//!
//! Predicates arrive as plain `(key, value)` equality pairs. A key that starts
//! with the relationship marker names a relationship instead of a column. The
//! marker is checked exactly once, in [`PredicateQueue::decode`]; everything
//! downstream works on [`RoutedPredicate`].

use std::collections::VecDeque;

/// An equality constraint as received from the evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Predicate {
    pub key: String,
    pub value: String,
}

impl Predicate {
    /// Create a new predicate.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A predicate after routing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoutedPredicate {
    /// Equality on a literal column.
    Column { name: String, value: String },
    /// Membership in a named relationship pointing at `value`.
    Relationship { relationship: String, value: String },
}

impl RoutedPredicate {
    /// Route a raw predicate using `marker` as the relationship prefix.
    pub fn route(predicate: Predicate, marker: &str) -> Self {
        match predicate.key.strip_prefix(marker) {
            Some(relationship) if !marker.is_empty() => RoutedPredicate::Relationship {
                relationship: relationship.to_string(),
                value: predicate.value,
            },
            _ => RoutedPredicate::Column {
                name: predicate.key,
                value: predicate.value,
            },
        }
    }

    /// Check if this predicate goes to the relationship index.
    pub fn is_relationship(&self) -> bool {
        matches!(self, RoutedPredicate::Relationship { .. })
    }
}

/// FIFO of routed predicates, consumed from the front by the planner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredicateQueue {
    items: VecDeque<RoutedPredicate>,
}

impl PredicateQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode raw predicates, preserving their order.
    pub fn decode<I>(predicates: I, marker: &str) -> Self
    where
        I: IntoIterator<Item = Predicate>,
    {
        Self {
            items: predicates
                .into_iter()
                .map(|p| RoutedPredicate::route(p, marker))
                .collect(),
        }
    }

    /// Append an already routed predicate.
    pub fn push(&mut self, predicate: RoutedPredicate) {
        self.items.push_back(predicate);
    }

    /// Number of predicates left.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the queue is exhausted.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Peek at the head of the queue.
    pub fn front(&self) -> Option<&RoutedPredicate> {
        self.items.front()
    }

    /// Remove and return the head of the queue.
    pub fn pop_front(&mut self) -> Option<RoutedPredicate> {
        self.items.pop_front()
    }

    /// Length of the leading run of column predicates.
    pub fn column_run_len(&self) -> usize {
        self.items
            .iter()
            .take_while(|p| !p.is_relationship())
            .count()
    }

    /// Copy the leading run of column predicates as parallel name/value lists.
    pub fn column_run(&self) -> (Vec<String>, Vec<String>) {
        self.items
            .iter()
            .map_while(|predicate| match predicate {
                RoutedPredicate::Column { name, value } => Some((name.clone(), value.clone())),
                RoutedPredicate::Relationship { .. } => None,
            })
            .unzip()
    }

    /// Drop up to `count` predicates from the front.
    pub fn discard_front(&mut self, count: usize) {
        let count = count.min(self.items.len());
        self.items.drain(..count);
    }

    /// Iterate over the remaining predicates.
    pub fn iter(&self) -> impl Iterator<Item = &RoutedPredicate> {
        self.items.iter()
    }
}
