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

//! Misra-Gries estimator implementation.

use crate::error::Error;
use crate::frequencies::candidate_map::CandidateMap;

/// Result row for heavy hitter queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row {
    value: u64,
    count: u64,
}

impl Row {
    /// Returns the value.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Returns the stored counter of the value.
    ///
    /// This is a lower bound of the true frequency.
    pub fn count(&self) -> u64 {
        self.count
    }
}

/// Misra-Gries heavy hitters estimator over `u64` values.
///
/// See [`crate::frequencies`] for the update rule and its guarantees.
#[derive(Debug, Clone)]
pub struct MisraGries {
    divisor: u64,
    capacity: u64,
    stream_length: u64,
    decrements: u64,
    candidates: CandidateMap,
}

impl MisraGries {
    /// Creates an estimator for the threshold `n / divisor`.
    ///
    /// The estimator keeps at most `max(divisor - 1, 1)` counters.
    pub fn new(divisor: u64) -> Self {
        Self {
            divisor,
            capacity: divisor.saturating_sub(1).max(1),
            stream_length: 0,
            decrements: 0,
            candidates: CandidateMap::new(),
        }
    }

    /// Creates an estimator that has already processed `stream_length` values.
    #[cfg(test)]
    pub(crate) fn with_stream_length(divisor: u64, stream_length: u64) -> Self {
        Self {
            stream_length,
            ..Self::new(divisor)
        }
    }

    /// Returns the threshold divisor `k`.
    pub fn divisor(&self) -> u64 {
        self.divisor
    }

    /// Returns the maximum number of candidates, `max(k - 1, 1)`.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Returns true if no candidate is tracked.
    pub fn is_empty(&self) -> bool {
        self.candidates.num_active() == 0
    }

    /// Returns the number of candidates currently tracked.
    pub fn num_candidates(&self) -> usize {
        self.candidates.num_active()
    }

    /// Returns the number of values processed so far, `n`.
    pub fn stream_length(&self) -> u64 {
        self.stream_length
    }

    /// Returns the stored counter of a value, or zero if it is not a candidate.
    pub fn estimate(&self, value: u64) -> u64 {
        self.candidates.get(value)
    }

    /// Returns the guaranteed lower bound of the true frequency of a value.
    pub fn lower_bound(&self, value: u64) -> u64 {
        self.candidates.get(value)
    }

    /// Returns the guaranteed upper bound of the true frequency of a value.
    ///
    /// Every decrement round may have discarded one occurrence of any value, so the bound is the
    /// stored counter plus [`MisraGries::maximum_error`].
    pub fn upper_bound(&self, value: u64) -> u64 {
        self.candidates.get(value) + self.decrements
    }

    /// Returns the number of decrement rounds, an upper bound of the error of any counter.
    pub fn maximum_error(&self) -> u64 {
        self.decrements
    }

    /// Returns an iterator over the current candidates in unspecified order.
    pub fn candidates(&self) -> impl Iterator<Item = Row> + '_ {
        self.candidates
            .iter()
            .map(|(value, count)| Row { value, count })
    }

    /// Processes one value.
    ///
    /// 1. A tracked value has its counter incremented.
    /// 2. An untracked value is inserted with a count of one while there is room.
    /// 3. Otherwise every counter is decremented, exhausted counters are dropped, and the value
    ///    itself is discarded even if the decrement freed a slot.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ErrorKind::CounterOverflow`] if the processed count cannot be
    /// incremented; the estimator is left unchanged in that case.
    pub fn update(&mut self, value: u64) -> Result<(), Error> {
        self.stream_length = self
            .stream_length
            .checked_add(1)
            .ok_or_else(|| Error::counter_overflow(self.stream_length))?;
        if self.candidates.increment(value) {
            return Ok(());
        }
        if (self.candidates.num_active() as u64) < self.capacity {
            self.candidates.insert(value, 1);
        } else {
            self.candidates.decrement_all();
            self.decrements += 1;
        }
        Ok(())
    }

    /// Returns the values whose counter strictly exceeds `n / k`.
    ///
    /// The comparison is exact: `count > n / k` is evaluated as `count * k > n`. The rows are
    /// sorted by value in ascending order. An empty stream yields no rows.
    pub fn heavy_hitters(&self) -> Vec<Row> {
        let n = self.stream_length as u128;
        let k = self.divisor as u128;
        let mut rows: Vec<Row> = self
            .candidates()
            .filter(|row| row.count as u128 * k > n)
            .collect();
        rows.sort_by_key(|row| row.value);
        rows
    }

    /// Resets the estimator to an empty state, keeping its divisor.
    pub fn reset(&mut self) {
        self.stream_length = 0;
        self.decrements = 0;
        self.candidates.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_capacity_is_divisor_minus_one() {
        assert_eq!(MisraGries::new(2).capacity(), 1);
        assert_eq!(MisraGries::new(10).capacity(), 9);
        assert_eq!(MisraGries::new(1).capacity(), 1);
        assert_eq!(MisraGries::new(0).capacity(), 1);
    }

    #[test]
    fn test_miss_on_full_set_discards_value() {
        let mut sketch = MisraGries::new(3);
        for value in [1, 2, 3] {
            sketch.update(value).unwrap();
        }
        // 3 arrives at a full set holding {1:1, 2:1}; both counters drop to zero and 3 is not
        // inserted into the freed slots.
        assert!(sketch.is_empty());
        assert_eq!(sketch.estimate(3), 0);
        assert_eq!(sketch.maximum_error(), 1);
        assert_eq!(sketch.stream_length(), 3);
    }

    #[test]
    fn test_counter_overflow_leaves_state_unchanged() {
        let mut sketch = MisraGries::new(4);
        sketch.update(9).unwrap();
        sketch.stream_length = u64::MAX;
        let err = sketch.update(9).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CounterOverflow);
        assert_eq!(sketch.estimate(9), 1);
        assert_eq!(sketch.stream_length(), u64::MAX);
    }

    #[test]
    fn test_bounds_bracket_true_frequency() {
        let mut sketch = MisraGries::new(3);
        let stream = [1, 1, 2, 3, 1, 4, 1, 2, 5, 1];
        for value in stream {
            sketch.update(value).unwrap();
        }
        for value in 1..=5u64 {
            let truth = stream.iter().filter(|v| **v == value).count() as u64;
            assert!(sketch.lower_bound(value) <= truth);
            assert!(sketch.upper_bound(value) >= truth);
        }
    }

    #[test]
    fn test_reset() {
        let mut sketch = MisraGries::new(5);
        for value in 1..=20 {
            sketch.update(value).unwrap();
        }
        sketch.reset();
        assert!(sketch.is_empty());
        assert_eq!(sketch.stream_length(), 0);
        assert_eq!(sketch.maximum_error(), 0);
        assert_eq!(sketch.divisor(), 5);
    }
}
