use std::collections::{BTreeMap, HashSet};

use anyhow::Result;

use super::classify::classify;
use super::key::{OrderKind, OrderingKey};
use crate::model::Urn;

/// Urns grouped by ordering key. Empty buckets are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buckets {
    map: BTreeMap<OrderingKey, Vec<Urn>>,
}

impl Buckets {
    pub fn get(&self, kind: OrderKind) -> Option<&[Urn]> {
        self.map.get(&kind.key()).map(Vec::as_slice)
    }

    pub fn len_of(&self, kind: OrderKind) -> usize {
        self.get(kind).map_or(0, <[Urn]>::len)
    }

    pub fn contains(&self, kind: OrderKind) -> bool {
        self.map.contains_key(&kind.key())
    }

    pub fn take(&mut self, kind: OrderKind) -> Vec<Urn> {
        self.map.remove(&kind.key()).unwrap_or_default()
    }

    /// Replaces the bucket; an empty list removes it.
    pub fn insert(&mut self, kind: OrderKind, urns: Vec<Urn>) {
        if urns.is_empty() {
            self.map.remove(&kind.key());
        } else {
            self.map.insert(kind.key(), urns);
        }
    }

    pub fn append(&mut self, kind: OrderKind, urns: impl IntoIterator<Item = Urn>) {
        let bucket = self.map.entry(kind.key()).or_default();
        bucket.extend(urns);
        if bucket.is_empty() {
            self.map.remove(&kind.key());
        }
    }

    pub fn push(&mut self, kind: OrderKind, urn: Urn) {
        self.map.entry(kind.key()).or_default().push(urn);
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Concatenates buckets by ascending key, moving each clustered index
    /// right after its table (or to the very end when the table is absent).
    pub fn flatten(self) -> Vec<Urn> {
        let mut ordered: Vec<Urn> = Vec::new();
        let mut clustered: Vec<Urn> = Vec::new();
        for (key, urns) in self.map {
            if key.kind() == OrderKind::ClusteredIndex {
                clustered = urns;
            } else {
                ordered.extend(urns);
            }
        }
        let mut orphans = Vec::new();
        for index in clustered {
            let position = index
                .parent()
                .and_then(|table| ordered.iter().position(|urn| *urn == table));
            match position {
                Some(pos) => ordered.insert(pos + 1, index),
                None => orphans.push(index),
            }
        }
        ordered.extend(orphans);
        ordered
    }
}

/// Outcome of registering the input set.
#[derive(Debug, Default)]
pub struct Registration {
    pub buckets: Buckets,
    pub count: usize,
    /// The last registered Urn; the lone member when `count == 1`.
    pub last: Option<(OrderKind, Urn)>,
}

/// Sorts input Urns into buckets in one pass. Repeats are dropped (first
/// occurrence wins); with `tables_only` every non-table Urn is ignored.
pub fn register(urns: &[Urn], tables_only: bool) -> Result<Registration> {
    let mut seen: HashSet<&Urn> = HashSet::with_capacity(urns.len());
    let mut registration = Registration::default();
    for urn in urns {
        if !seen.insert(urn) {
            continue;
        }
        let kind = classify(urn)?;
        if tables_only && kind != OrderKind::Table {
            continue;
        }
        registration.buckets.push(kind, urn.clone());
        registration.count += 1;
        registration.last = Some((kind, urn.clone()));
    }
    Ok(registration)
}
