//! Open-addressed Robin-Hood hashmap keyed by `Value`
//!
//! Backs both the string pool and the VM's globals table. Capacity is a
//! power of two; an empty slot is marked by a `Nil` key, which is why
//! `Nil` can never be used as a key. On collision the insert displaces
//! whichever entry sits closer to its ideal slot, keeping probe-length
//! variance low; deletion backward-shifts the following cluster.
//!
//! Hashing is FNV-1a over the key's bytes: the 8 little-endian bytes of
//! the i64 for integers and bools, the IEEE-754 bit pattern for
//! decimals, and the hash cached in the string header for interned
//! strings.

use crate::intern::FiString;
use crate::value::Value;

/// Grow once an insert would push the map past this load.
pub const MAX_LOAD: f64 = 0.57;

const MIN_CAPACITY: usize = 8;

/// FNV-1a over a byte slice (32-bit).
pub fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 2166136261;
    for &byte in bytes {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(16777619);
    }
    hash
}

fn hash_key(key: &Value) -> u32 {
    match key {
        Value::Integer(_) | Value::Bool(_) => fnv1a(&key.as_integer().to_le_bytes()),
        Value::Decimal(d) => fnv1a(&d.to_bits().to_le_bytes()),
        Value::Str(s) => s.hash(),
        // Nil marks empty slots; it never reaches the hash function
        // through the public interface.
        Value::Nil => 0,
    }
}

/// Key equality: same tag, with strings compared by pool identity and
/// decimals by bit pattern.
fn key_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Decimal(x), Value::Decimal(y)) => x.to_bits() == y.to_bits(),
        (Value::Str(x), Value::Str(y)) => x == y,
        _ => false,
    }
}

#[derive(Debug, Clone)]
struct Entry {
    key: Value,
    value: Value,
}

impl Entry {
    fn empty() -> Self {
        Entry {
            key: Value::Nil,
            value: Value::Nil,
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self.key, Value::Nil)
    }
}

pub struct Hashmap {
    entries: Vec<Entry>,
    count: usize,
}

impl Hashmap {
    pub fn new() -> Self {
        Hashmap {
            entries: Vec::new(),
            count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    fn mask(&self) -> usize {
        self.entries.len() - 1
    }

    fn probe_distance(&self, index: usize, key: &Value) -> usize {
        let desired = hash_key(key) as usize & self.mask();
        (index + self.entries.len() - desired) & self.mask()
    }

    fn grow(&mut self) {
        let new_capacity = (self.entries.len() * 2).max(MIN_CAPACITY);
        let old = std::mem::replace(&mut self.entries, vec![Entry::empty(); new_capacity]);
        self.count = 0;
        for entry in old {
            if !entry.is_empty() {
                self.insert(entry.key, entry.value);
            }
        }
    }

    /// Insert or overwrite. Returns true when an existing entry for the
    /// key was replaced.
    pub fn insert(&mut self, key: Value, value: Value) -> bool {
        if (self.count + 1) as f64 > self.entries.len() as f64 * MAX_LOAD {
            self.grow();
        }

        let mask = self.mask();
        let mut index = hash_key(&key) as usize & mask;
        let mut dist = 0;
        let mut key = key;
        let mut value = value;

        loop {
            if self.entries[index].is_empty() {
                self.entries[index] = Entry { key, value };
                self.count += 1;
                return false;
            }
            if key_eq(&self.entries[index].key, &key) {
                self.entries[index].value = value;
                return true;
            }

            // Robin Hood: displace the richer occupant and keep probing
            // with the evicted pair.
            let cur_dist = self.probe_distance(index, &self.entries[index].key);
            if cur_dist < dist {
                std::mem::swap(&mut self.entries[index].key, &mut key);
                std::mem::swap(&mut self.entries[index].value, &mut value);
                dist = cur_dist;
            }
            dist += 1;
            index = (index + 1) & mask;
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        let index = self.find_index(key)?;
        Some(&self.entries[index].value)
    }

    pub fn get_mut(&mut self, key: &Value) -> Option<&mut Value> {
        let index = self.find_index(key)?;
        Some(&mut self.entries[index].value)
    }

    fn find_index(&self, key: &Value) -> Option<usize> {
        if self.count == 0 {
            return None;
        }
        let mask = self.mask();
        let mut index = hash_key(key) as usize & mask;
        loop {
            if self.entries[index].is_empty() {
                return None;
            }
            if key_eq(&self.entries[index].key, key) {
                return Some(index);
            }
            index = (index + 1) & mask;
        }
    }

    /// Membership test with the Robin-Hood early exit: once our probe
    /// distance exceeds the occupant's, the key cannot be further along.
    pub fn contains(&self, key: &Value) -> bool {
        if self.count == 0 {
            return false;
        }
        let mask = self.mask();
        let mut index = hash_key(key) as usize & mask;
        let mut dist = 0;
        loop {
            if self.entries[index].is_empty() {
                return false;
            }
            if key_eq(&self.entries[index].key, key) {
                return true;
            }
            if self.probe_distance(index, &self.entries[index].key) < dist {
                return false;
            }
            dist += 1;
            index = (index + 1) & mask;
        }
    }

    /// Remove a key, backward-shifting the cluster behind it. Returns
    /// true when the key was present.
    pub fn erase(&mut self, key: &Value) -> bool {
        let Some(index) = self.find_index(key) else {
            return false;
        };
        self.remove_at(index);
        self.count -= 1;
        true
    }

    fn remove_at(&mut self, mut index: usize) {
        let mask = self.mask();
        loop {
            self.entries[index] = Entry::empty();
            let next = (index + 1) & mask;
            if self.entries[next].is_empty() {
                return;
            }
            let desired = hash_key(&self.entries[next].key) as usize & mask;
            if next == desired {
                return;
            }
            self.entries.swap(index, next);
            index = next;
        }
    }

    /// Content lookup for the string pool: matches length, cached hash,
    /// and bytes, returning the canonical interned key.
    pub fn find_string(&self, chars: &str, hash: u32) -> Option<FiString> {
        if self.count == 0 {
            return None;
        }
        let mask = self.mask();
        let mut index = hash as usize & mask;
        loop {
            match &self.entries[index].key {
                Value::Nil => return None,
                Value::Str(s)
                    if s.len() == chars.len() && s.hash() == hash && s.as_str() == chars =>
                {
                    return Some(s.clone());
                }
                _ => {}
            }
            index = (index + 1) & mask;
        }
    }
}

impl Default for Hashmap {
    fn default() -> Self {
        Hashmap::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn int(i: i64) -> Value {
        Value::Integer(i)
    }

    /// Probe distances around the table must never grow by more than one
    /// from the previous slot, and must restart at zero after a gap.
    fn assert_robin_hood_invariant(map: &Hashmap) {
        let capacity = map.capacity();
        for index in 0..capacity {
            if map.entries[index].is_empty() {
                continue;
            }
            let dist = map.probe_distance(index, &map.entries[index].key);
            let prev = (index + capacity - 1) & (capacity - 1);
            if map.entries[prev].is_empty() {
                assert_eq!(dist, 0, "entry after a gap must sit at its ideal slot");
            } else {
                let prev_dist = map.probe_distance(prev, &map.entries[prev].key);
                assert!(
                    dist <= prev_dist + 1,
                    "probe distance jumped from {} to {} at slot {}",
                    prev_dist,
                    dist,
                    index
                );
            }
        }
    }

    #[test]
    fn test_insert_get_overwrite() {
        let mut map = Hashmap::new();
        assert!(!map.insert(int(1), int(10)));
        assert!(!map.insert(int(2), int(20)));
        assert_eq!(map.get(&int(1)), Some(&int(10)));
        assert_eq!(map.get(&int(2)), Some(&int(20)));
        assert_eq!(map.get(&int(3)), None);

        // overwriting reports replacement and keeps the count
        assert!(map.insert(int(1), int(11)));
        assert_eq!(map.get(&int(1)), Some(&int(11)));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_growth_keeps_entries() {
        let mut map = Hashmap::new();
        for i in 0..100 {
            map.insert(int(i), int(i * 2));
        }
        assert_eq!(map.len(), 100);
        assert!(map.capacity().is_power_of_two());
        assert!((map.len() as f64) <= map.capacity() as f64 * MAX_LOAD);
        for i in 0..100 {
            assert_eq!(map.get(&int(i)), Some(&int(i * 2)));
        }
        assert_robin_hood_invariant(&map);
    }

    #[test]
    fn test_erase_backward_shift() {
        let mut map = Hashmap::new();
        for i in 0..32 {
            map.insert(int(i), int(i));
        }
        for i in (0..32).step_by(2) {
            assert!(map.erase(&int(i)));
        }
        assert!(!map.erase(&int(0)));
        assert_eq!(map.len(), 16);
        for i in 0..32 {
            assert_eq!(map.contains(&int(i)), i % 2 == 1);
        }
        assert_robin_hood_invariant(&map);
    }

    #[test]
    fn test_mixed_key_tags() {
        let mut map = Hashmap::new();
        map.insert(int(1), int(100));
        map.insert(Value::Bool(true), int(200));
        map.insert(Value::Decimal(1.0), int(300));

        // keys are tag-distinct even when numerically equal
        assert_eq!(map.get(&int(1)), Some(&int(100)));
        assert_eq!(map.get(&Value::Bool(true)), Some(&int(200)));
        assert_eq!(map.get(&Value::Decimal(1.0)), Some(&int(300)));
    }

    #[test]
    fn test_matches_reference_map() {
        // deterministic op sequence against std's HashMap
        let mut map = Hashmap::new();
        let mut reference: HashMap<i64, i64> = HashMap::new();
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;

        for step in 0..2000 {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let key = (state >> 33) as i64 % 64;
            match state % 3 {
                0 => {
                    let replaced = map.insert(int(key), int(step));
                    let old = reference.insert(key, step);
                    assert_eq!(replaced, old.is_some());
                }
                1 => {
                    assert_eq!(map.erase(&int(key)), reference.remove(&key).is_some());
                }
                _ => {
                    assert_eq!(map.contains(&int(key)), reference.contains_key(&key));
                }
            }
            assert_eq!(map.len(), reference.len());
            if map.capacity() > 0 {
                assert!((map.len() + 1) as f64 <= map.capacity() as f64 * MAX_LOAD + 1.0);
            }
        }

        for (k, v) in &reference {
            assert_eq!(map.get(&int(*k)), Some(&int(*v)));
        }
        assert_robin_hood_invariant(&map);
    }

    #[test]
    fn test_fnv1a_known_values() {
        assert_eq!(fnv1a(b""), 2166136261);
        assert_eq!(fnv1a(b"a"), 0xe40c292c);
        assert_eq!(fnv1a(b"foobar"), 0xbf9cf968);
    }
}
