//! Registration-ordered store of service definitions

use std::collections::HashMap;

use crate::domain::ServiceDefinition;

/// Definitions keyed by identifier, iterated in registration order.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    definitions: Vec<ServiceDefinition>,
    positions: HashMap<String, usize>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a definition; an existing one with the same identifier is
    /// replaced in place and returned.
    pub fn insert(&mut self, definition: ServiceDefinition) -> Option<ServiceDefinition> {
        match self.positions.get(&definition.id) {
            Some(&pos) => Some(std::mem::replace(&mut self.definitions[pos], definition)),
            None => {
                self.positions
                    .insert(definition.id.clone(), self.definitions.len());
                self.definitions.push(definition);
                None
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&ServiceDefinition> {
        self.positions.get(id).map(|&pos| &self.definitions[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceDefinition> {
        self.definitions.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|def| def.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Known identifiers close to a missing one.
    pub fn alternatives(&self, missing: &str) -> Vec<String> {
        alternatives(missing, self.ids())
    }
}

/// Identifiers within edit distance `len / 3` of `missing`, or containing it.
pub(crate) fn alternatives<'a>(missing: &str, known: impl Iterator<Item = &'a str>) -> Vec<String> {
    let needle = missing.to_lowercase();
    let threshold = missing.chars().count() / 3;
    let mut found: Vec<String> = known
        .filter(|candidate| {
            let lower = candidate.to_lowercase();
            lower.contains(&needle) || levenshtein(&needle, &lower) <= threshold
        })
        .map(str::to_string)
        .collect();
    found.sort();
    found
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut current = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            current[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(current[j] + 1);
        }
        prev = current;
    }
    prev[b.len()]
}
