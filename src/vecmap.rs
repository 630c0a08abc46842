//! A wrapper around a vector of pairs that Kat uses for maps and entity fields.
//!
//! Kat keeps members in the order they were written, so unlike a hash map a
//! [`VecMap`] remembers insertion order. Lookups and single inserts are linear;
//! collecting from an iterator deduplicates through a hash index in one pass.
//!
//! # Example
//!
//! ```
//! use kat::prelude::*;
//! use std::collections::BTreeMap;
//!
//! // from a vector of pairs, keeping the last value for repeated keys
//! let vmap = VecMap::from(vec![("b", 1), ("a", 2), ("b", 3)]);
//! assert_eq!(vmap.keys().collect::<Vec<_>>(), vec![&"b", &"a"]);
//! assert_eq!(vmap.get(&"b"), Some(&3));
//!
//! // from a `BTreeMap`, in key order
//! let mut btmap = BTreeMap::new();
//! btmap.insert("y", 0);
//! btmap.insert("x", 0);
//! let bt_vm = VecMap::from(btmap);
//! assert_eq!(bt_vm.keys().next(), Some(&"x"));
//! ```

use hashbrown::HashMap as Index;
use std::{
    borrow::Borrow,
    collections::{BTreeMap, HashMap},
    hash::*,
    iter::FromIterator,
    slice::Iter,
    vec::IntoIter,
};

#[derive(Eq, PartialEq, Clone, Hash, Debug)]
/// A map implemented as an insertion-ordered [`Vec`] of pairs with unique keys.
///
/// See also: [module level documentation](`crate::vecmap`).
pub struct VecMap<K, V>(Vec<(K, V)>);

impl<K, V> Default for VecMap<K, V> {
    fn default() -> Self { VecMap(Vec::new()) }
}

impl<K, V> VecMap<K, V> {
    /// Creates an empty [`VecMap`].
    pub fn new() -> Self { VecMap(Vec::new()) }

    /// Creates an empty [`VecMap`] with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self { VecMap(Vec::with_capacity(capacity)) }

    /// Returns length.
    ///
    /// # Example
    ///
    /// ```
    /// use kat::prelude::*;
    ///
    /// let vmap = VecMap::from(vec![("foo", "bar")]);
    ///
    /// // should have one element
    /// assert_eq!(vmap.len(), 1);
    /// ```
    pub fn len(&self) -> usize { self.0.len() }

    /// Indicates whether the [`VecMap`] is empty.
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Returns an [`Iter`] of the key value pairs, in insertion order.
    pub fn iter(&self) -> Iter<(K, V)> { self.0.iter() }

    /// Returns an iterator over the keys, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> { self.0.iter().map(|(k, _)| k) }

    /// Returns an iterator over the values, in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> { self.0.iter().map(|(_, v)| v) }
}

impl<K: PartialEq, V> VecMap<K, V> {
    fn position<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.0.iter().position(|(k, _)| k.borrow() == key)
    }

    /// Returns a reference to the value stored under `key`.
    ///
    /// # Example
    ///
    /// ```
    /// use kat::prelude::*;
    ///
    /// let vmap: VecMap<String, i32> = vec![("id".to_string(), 1)].into_iter().collect();
    ///
    /// assert_eq!(vmap.get("id"), Some(&1));
    /// assert_eq!(vmap.get("name"), None);
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.position(key).map(|i| &self.0[i].1)
    }

    /// Returns a mutable reference to the value stored under `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        match self.position(key) {
            Some(i) => Some(&mut self.0[i].1),
            None => None,
        }
    }

    /// Indicates whether `key` is present.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.position(key).is_some()
    }

    /// Inserts `value` under `key`.
    ///
    /// A key that is already present keeps its position and has its value replaced;
    /// the old value is returned.
    ///
    /// # Arguments
    ///
    /// * `key: K` - The key.
    /// * `value: V` - The value to store.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.position(&key) {
            Some(i) => Some(std::mem::replace(&mut self.0[i].1, value)),
            None => {
                self.0.push((key, value));
                None
            }
        }
    }

    /// Removes `key`, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.position(key).map(|i| self.0.remove(i).1)
    }
}

impl<K: PartialEq + Eq + Hash, V> VecMap<K, V> {
    /// Consumes a [`VecMap`], producing a [`HashMap`] from the entries.
    ///
    /// # Example
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use kat::prelude::*;
    ///
    /// let vmap = VecMap::from(vec![(1, "foo"), (2, "bar"), (3, "baz")]);
    ///
    /// let hmap: HashMap<u8, &str> = vmap.into_hashmap();
    /// assert_eq!(hmap[&2], "bar");
    /// ```
    pub fn into_hashmap<S: BuildHasher + Default>(self) -> HashMap<K, V, S> {
        self.into_iter().collect()
    }
}

impl<K: Eq + Hash, V> From<Vec<(K, V)>> for VecMap<K, V> {
    fn from(v: Vec<(K, V)>) -> Self { v.into_iter().collect() }
}

impl<K: PartialEq, V, S: BuildHasher> From<HashMap<K, V, S>> for VecMap<K, V> {
    fn from(hm: HashMap<K, V, S>) -> Self { VecMap(hm.into_iter().collect()) }
}

impl<K, V> IntoIterator for VecMap<K, V> {
    type IntoIter = IntoIter<(K, V)>;
    type Item = (K, V);

    fn into_iter(self) -> IntoIter<(K, V)> { self.0.into_iter() }
}

impl<'a, K, V> IntoIterator for &'a VecMap<K, V> {
    type IntoIter = Iter<'a, (K, V)>;
    type Item = &'a (K, V);

    fn into_iter(self) -> Iter<'a, (K, V)> { self.0.iter() }
}

/// Repeated keys keep the position of their first occurrence and the value of their
/// last, as if every pair had been [`insert`](VecMap::insert)ed in turn.
impl<K: Eq + Hash, V> FromIterator<(K, V)> for VecMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> VecMap<K, V> {
        let pairs: Vec<(K, V)> = iter.into_iter().collect();

        // index of the first occurrence of each pair's key
        let first: Vec<usize> = {
            let mut index = Index::with_capacity(pairs.len());
            pairs
                .iter()
                .enumerate()
                .map(|(i, (k, _))| *index.entry(k).or_insert(i))
                .collect()
        };
        if first.iter().enumerate().all(|(i, &f)| i == f) {
            return VecMap(pairs);
        }

        let mut slots: Vec<Option<(K, V)>> = pairs.into_iter().map(Some).collect();
        for (i, &f) in first.iter().enumerate() {
            if i != f {
                if let Some((_, v)) = slots[i].take() {
                    if let Some(slot) = slots[f].as_mut() {
                        slot.1 = v;
                    }
                }
            }
        }
        VecMap(slots.into_iter().flatten().collect())
    }
}

impl<K: Ord, V> From<BTreeMap<K, V>> for VecMap<K, V> {
    fn from(bt: BTreeMap<K, V>) -> Self { VecMap(bt.into_iter().collect()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_is_kept() {
        let mut map = VecMap::new();
        map.insert("z", 1);
        map.insert("a", 2);
        map.insert("m", 3);
        assert_eq!(map.keys().cloned().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut map = VecMap::new();
        map.insert("a", 1);
        map.insert("b", 2);
        assert_eq!(map.insert("a", 3), Some(1));
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![&("a", 3), &("b", 2)]);
    }

    #[test]
    fn collect_keeps_first_position_and_last_value() {
        let map: VecMap<&str, i32> =
            vec![("b", 1), ("a", 2), ("b", 3), ("c", 4), ("a", 5)].into_iter().collect();
        assert_eq!(
            map.iter().cloned().collect::<Vec<_>>(),
            vec![("b", 3), ("a", 5), ("c", 4)]
        );
    }

    #[test]
    fn collect_many_keys() {
        let n = 100_000;
        let map: VecMap<String, usize> = (0..n)
            .map(|i| (format!("k{}", i), i))
            .chain((0..n).map(|i| (format!("k{}", i), i + 1)))
            .collect();
        assert_eq!(map.len(), n);
        assert_eq!(map.keys().next().map(String::as_str), Some("k0"));
        assert_eq!(map.values().last(), Some(&n));
    }

    #[test]
    fn remove_and_lookup() {
        let mut map: VecMap<String, u8> = VecMap::new();
        map.insert("a".to_string(), 1);
        *map.get_mut("a").unwrap() += 1;
        assert!(map.contains_key("a"));
        assert_eq!(map.remove("a"), Some(2));
        assert!(map.is_empty());
        assert_eq!(map.remove("a"), None);
    }
}
