//! Counted multisets.
//!
//! Elements are stored once with an occurrence count, so two equal
//! instances are tracked as two, and equality never depends on insertion
//! order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// An unordered collection permitting repeated equal elements
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize + Ord",
    deserialize = "T: Deserialize<'de> + Ord"
))]
pub struct Multiset<T: Ord> {
    #[serde(with = "counted")]
    counts: BTreeMap<T, usize>,
}

impl<T: Ord> Default for Multiset<T> {
    fn default() -> Self {
        Multiset {
            counts: BTreeMap::new(),
        }
    }
}

impl<T: Ord> Multiset<T> {
    /// The empty multiset
    pub fn new() -> Self {
        Self::default()
    }

    /// A multiset holding one occurrence of `item`
    pub fn singleton(item: T) -> Self {
        let mut ms = Self::new();
        ms.insert(item);
        ms
    }

    /// Add one occurrence
    pub fn insert(&mut self, item: T) {
        self.insert_n(item, 1);
    }

    /// Add `n` occurrences
    pub fn insert_n(&mut self, item: T, n: usize) {
        if n > 0 {
            *self.counts.entry(item).or_insert(0) += n;
        }
    }

    /// Remove one occurrence; false if the item was absent
    pub fn remove_one(&mut self, item: &T) -> bool {
        match self.counts.get_mut(item) {
            Some(n) if *n > 1 => {
                *n -= 1;
                true
            }
            Some(_) => {
                self.counts.remove(item);
                true
            }
            None => false,
        }
    }

    /// Occurrences of `item`
    pub fn count(&self, item: &T) -> usize {
        self.counts.get(item).copied().unwrap_or(0)
    }

    /// Total number of occurrences
    pub fn len(&self) -> usize {
        self.counts.values().sum()
    }

    /// True if there are no occurrences
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of distinct elements
    pub fn distinct_len(&self) -> usize {
        self.counts.len()
    }

    /// Distinct elements with their counts, in element order
    pub fn iter_counts(&self) -> impl Iterator<Item = (&T, usize)> {
        self.counts.iter().map(|(k, n)| (k, *n))
    }

    /// Every occurrence, repeated elements adjacent, in element order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.counts
            .iter()
            .flat_map(|(k, n)| std::iter::repeat(k).take(*n))
    }

    /// Sum of counts of both multisets
    pub fn union(mut self, other: Multiset<T>) -> Multiset<T> {
        for (item, n) in other.counts {
            self.insert_n(item, n);
        }
        self
    }

    /// Apply `f` to every occurrence
    pub fn map<U: Ord>(&self, mut f: impl FnMut(&T) -> U) -> Multiset<U> {
        let mut out = Multiset::new();
        for (item, n) in &self.counts {
            out.insert_n(f(item), *n);
        }
        out
    }
}

impl<T: Ord + Clone> Multiset<T> {
    /// Every occurrence as a flat vector
    pub fn to_flat_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

impl<T: Ord> FromIterator<T> for Multiset<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut ms = Multiset::new();
        for item in iter {
            ms.insert(item);
        }
        ms
    }
}

impl<T: Ord> Extend<T> for Multiset<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}

impl<T: Ord + fmt::Debug> fmt::Debug for Multiset<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Ord + fmt::Display> fmt::Display for Multiset<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, item) in self.iter().enumerate() {
            if i > 0 {
                write!(f, " * ")?;
            }
            write!(f, "{}", item)?;
        }
        write!(f, "}}")
    }
}

/// Serialises the counted map as a list of `[item, count]` pairs, so
/// non-string keys survive JSON.
mod counted {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<T, S>(map: &BTreeMap<T, usize>, s: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        s.collect_seq(map.iter())
    }

    pub fn deserialize<'de, T, D>(d: D) -> Result<BTreeMap<T, usize>, D::Error>
    where
        T: Deserialize<'de> + Ord,
        D: Deserializer<'de>,
    {
        let pairs: Vec<(T, usize)> = Vec::deserialize(d)?;
        let mut map = BTreeMap::new();
        for (item, n) in pairs {
            if n > 0 {
                *map.entry(item).or_insert(0) += n;
            }
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_are_exact() {
        let mut ms: Multiset<&str> = vec!["a", "b", "a"].into_iter().collect();
        assert_eq!(ms.len(), 3);
        assert_eq!(ms.count(&"a"), 2);
        assert!(ms.remove_one(&"a"));
        assert_eq!(ms.count(&"a"), 1);
        assert!(ms.remove_one(&"a"));
        assert!(!ms.remove_one(&"a"));
        assert_eq!(ms.distinct_len(), 1);
    }

    #[test]
    fn test_order_insensitive_equality() {
        let x: Multiset<i32> = vec![3, 1, 3].into_iter().collect();
        let y: Multiset<i32> = vec![1, 3, 3].into_iter().collect();
        let z: Multiset<i32> = vec![1, 3].into_iter().collect();
        assert_eq!(x, y);
        assert_ne!(x, z);
    }

    #[test]
    fn test_union_preserves_counts() {
        let x: Multiset<i32> = vec![1, 2].into_iter().collect();
        let y: Multiset<i32> = vec![2, 2].into_iter().collect();
        let u = x.union(y);
        assert_eq!(u.count(&2), 3);
        assert_eq!(u.to_flat_vec(), vec![1, 2, 2, 2]);
    }

    #[test]
    fn test_serde_roundtrip_keeps_counts() {
        let x: Multiset<(i32, i32)> = vec![(1, 2), (1, 2), (0, 0)].into_iter().collect();
        let json = serde_json::to_string(&x).unwrap();
        let back: Multiset<(i32, i32)> = serde_json::from_str(&json).unwrap();
        assert_eq!(x, back);
    }
}
