// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Candidate counter table for the Misra-Gries estimator.
//!
//! This linear-probing hash map stores `(value, count)` pairs and supports a decrement-all
//! operation that removes entries whose count drops to zero by scanning clusters from the back to
//! the front.

const LOAD_FACTOR_NUMERATOR: usize = 3;
const LOAD_FACTOR_DENOMINATOR: usize = 4;
const LG_MIN_LENGTH: u8 = 3;
const DRIFT_LIMIT: usize = 1024;

/// Linear-probing hash map for (value, count) pairs.
///
/// A slot is active when its state is non-zero; the state stores the probe distance (drift) from
/// the slot the value hashes to, plus one.
#[derive(Debug, Clone)]
pub(super) struct CandidateMap {
    load_threshold: usize,
    keys: Vec<u64>,
    values: Vec<u64>,
    states: Vec<u16>,
    num_active: usize,
}

impl CandidateMap {
    /// Creates an empty map with the minimum table length.
    pub fn new() -> Self {
        Self::with_length(1 << LG_MIN_LENGTH)
    }

    fn with_length(length: usize) -> Self {
        debug_assert!(length.is_power_of_two(), "length must be power of 2");
        Self {
            load_threshold: length * LOAD_FACTOR_NUMERATOR / LOAD_FACTOR_DENOMINATOR,
            keys: vec![0; length],
            values: vec![0; length],
            states: vec![0; length],
            num_active: 0,
        }
    }

    /// Returns the count for `key`, or zero if the key is not present.
    pub fn get(&self, key: u64) -> u64 {
        match self.find(key) {
            Some(probe) => self.values[probe],
            None => 0,
        }
    }

    /// Increments the count of `key` if present and reports whether it was.
    pub fn increment(&mut self, key: u64) -> bool {
        match self.find(key) {
            Some(probe) => {
                self.values[probe] += 1;
                true
            }
            None => false,
        }
    }

    /// Inserts an absent `key` with the given count, growing the table if needed.
    pub fn insert(&mut self, key: u64, count: u64) {
        debug_assert!(self.find(key).is_none(), "key already present");
        if self.num_active + 1 > self.load_threshold {
            self.resize(self.keys.len() * 2);
        }
        self.put_absent(key, count);
    }

    /// Subtracts one from every count and removes the entries that reach zero.
    ///
    /// Returns the number of removed entries.
    pub fn decrement_all(&mut self) -> usize {
        let before = self.num_active;
        for probe in 0..self.keys.len() {
            if self.states[probe] > 0 {
                self.values[probe] -= 1;
            }
        }
        self.keep_only_positive_counts();
        before - self.num_active
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Returns the log2 of the underlying array length.
    #[cfg(test)]
    pub fn lg_length(&self) -> u8 {
        self.keys.len().trailing_zeros() as u8
    }

    /// Returns the number of active keys in the map.
    pub fn num_active(&self) -> usize {
        self.num_active
    }

    /// Returns an iterator over active keys and counts.
    pub fn iter(&self) -> CandidateIter<'_> {
        CandidateIter::new(self)
    }

    fn put_absent(&mut self, key: u64, count: u64) {
        let mask = self.keys.len() - 1;
        let mut probe = (hash_value(key) as usize) & mask;
        let mut drift: usize = 1;
        while self.states[probe] != 0 {
            probe = (probe + 1) & mask;
            drift += 1;
            debug_assert!(drift < DRIFT_LIMIT, "drift limit exceeded");
        }
        self.keys[probe] = key;
        self.values[probe] = count;
        self.states[probe] = drift as u16;
        self.num_active += 1;
    }

    fn find(&self, key: u64) -> Option<usize> {
        let mask = self.keys.len() - 1;
        let mut probe = (hash_value(key) as usize) & mask;
        while self.states[probe] > 0 {
            if self.keys[probe] == key {
                return Some(probe);
            }
            probe = (probe + 1) & mask;
        }
        None
    }

    /// Removes all keys with zero counts.
    ///
    /// The scan starts just below an empty slot so that every cluster is visited back to front,
    /// which keeps backward shifts from moving an unvisited entry past the cursor.
    fn keep_only_positive_counts(&mut self) {
        let len = self.keys.len();
        let mut first_probe = len - 1;
        while self.states[first_probe] > 0 {
            first_probe -= 1;
        }
        for probe in (0..first_probe).rev() {
            if self.states[probe] > 0 && self.values[probe] == 0 {
                self.hash_delete(probe);
                self.num_active -= 1;
            }
        }
        for probe in (first_probe..len).rev() {
            if self.states[probe] > 0 && self.values[probe] == 0 {
                self.hash_delete(probe);
                self.num_active -= 1;
            }
        }
    }

    fn resize(&mut self, new_length: usize) {
        let old = std::mem::replace(self, Self::with_length(new_length));
        for i in 0..old.keys.len() {
            if old.states[i] > 0 {
                self.put_absent(old.keys[i], old.values[i]);
            }
        }
    }

    fn hash_delete(&mut self, mut delete_probe: usize) {
        self.states[delete_probe] = 0;
        let mut drift: usize = 1;
        let mask = self.keys.len() - 1;
        let mut probe = (delete_probe + drift) & mask;
        while self.states[probe] != 0 {
            if self.states[probe] as usize > drift {
                self.keys[delete_probe] = self.keys[probe];
                self.values[delete_probe] = self.values[probe];
                self.states[delete_probe] = self.states[probe] - drift as u16;
                self.states[probe] = 0;
                drift = 0;
                delete_probe = probe;
            }
            probe = (probe + 1) & mask;
            drift += 1;
            debug_assert!(drift < DRIFT_LIMIT, "drift limit exceeded");
        }
    }
}

/// Iterator over active entries using a golden-ratio stride.
pub(super) struct CandidateIter<'a> {
    map: &'a CandidateMap,
    index: usize,
    count: usize,
    stride: usize,
    mask: usize,
}

impl<'a> CandidateIter<'a> {
    fn new(map: &'a CandidateMap) -> Self {
        let size = map.keys.len();
        let stride = ((size as f64 * 0.6180339887498949) as usize) | 1;
        Self {
            map,
            index: 0usize.wrapping_sub(stride),
            count: 0,
            stride,
            mask: size - 1,
        }
    }
}

impl Iterator for CandidateIter<'_> {
    type Item = (u64, u64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.count >= self.map.num_active {
            return None;
        }
        loop {
            self.index = self.index.wrapping_add(self.stride) & self.mask;
            if self.map.states[self.index] > 0 {
                self.count += 1;
                return Some((self.map.keys[self.index], self.map.values[self.index]));
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.map.num_active - self.count;
        (remaining, Some(remaining))
    }
}

/// MurmurHash3 64-bit finalizer.
#[inline]
fn hash_value(mut value: u64) -> u64 {
    value ^= value >> 33;
    value = value.wrapping_mul(0xff51_afd7_ed55_8ccd);
    value ^= value >> 33;
    value = value.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    value ^= value >> 33;
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut map = CandidateMap::new();
        map.insert(42, 1);
        assert!(map.increment(42));
        assert!(!map.increment(7));
        assert_eq!(map.get(42), 2);
        assert_eq!(map.get(7), 0);
        assert_eq!(map.num_active(), 1);
    }

    #[test]
    fn test_grows_past_load_threshold() {
        let mut map = CandidateMap::new();
        assert_eq!(map.lg_length(), 3);
        for key in 1..=100 {
            map.insert(key, key);
        }
        assert_eq!(map.num_active(), 100);
        assert_eq!(map.lg_length(), 8);
        for key in 1..=100 {
            assert_eq!(map.get(key), key);
        }
    }

    #[test]
    fn test_decrement_all_removes_exhausted_entries() {
        let mut map = CandidateMap::new();
        for key in 1..=200u64 {
            map.insert(key, key % 3 + 1);
        }
        let removed = map.decrement_all();
        assert_eq!(removed, (1..=200u64).filter(|k| k % 3 == 0).count());
        for key in 1..=200u64 {
            assert_eq!(map.get(key), key % 3);
        }
        let removed = map.decrement_all();
        assert_eq!(removed, (1..=200u64).filter(|k| k % 3 == 1).count());
        assert_eq!(map.num_active(), (1..=200u64).filter(|k| k % 3 == 2).count());
        for key in (1..=200u64).filter(|k| k % 3 == 2) {
            assert_eq!(map.get(key), 1);
        }
    }

    #[test]
    fn test_iter_visits_every_active_entry_once() {
        let mut map = CandidateMap::new();
        for key in 10..60u64 {
            map.insert(key, 1);
        }
        let mut keys: Vec<u64> = map.iter().map(|(key, _)| key).collect();
        keys.sort_unstable();
        assert_eq!(keys, (10..60u64).collect::<Vec<_>>());
        assert_eq!(map.iter().size_hint(), (50, Some(50)));
    }
}
