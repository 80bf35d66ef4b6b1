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

use std::ops::RangeInclusive;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Generator of the values one producer appends.
pub trait ValueSource: Send {
    /// Returns the number of values of the producer's batch. Called once per producer.
    fn batch_size(&mut self) -> usize;

    /// Returns the next value. Well-behaved sources never return zero.
    fn next_value(&mut self) -> u64;
}

impl<S: ValueSource + ?Sized> ValueSource for Box<S> {
    fn batch_size(&mut self) -> usize {
        (**self).batch_size()
    }

    fn next_value(&mut self) -> u64 {
        (**self).next_value()
    }
}

/// Uniformly random values in `[1, 2^64 - 1]` with a random batch size.
///
/// Every source owns its generator; nothing is shared between producers.
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: StdRng,
    batch_size: RangeInclusive<usize>,
}

impl RandomSource {
    /// Creates a source drawing from `rng`.
    pub fn new(rng: StdRng, batch_size: RangeInclusive<usize>) -> Self {
        Self { rng, batch_size }
    }

    /// Creates a source whose generator is seeded once from the shared entropy source.
    pub fn from_entropy(entropy: &mut StdRng, batch_size: RangeInclusive<usize>) -> Self {
        Self::new(StdRng::from_rng(entropy), batch_size)
    }
}

impl ValueSource for RandomSource {
    fn batch_size(&mut self) -> usize {
        self.rng.random_range(self.batch_size.clone())
    }

    fn next_value(&mut self) -> u64 {
        self.rng.random_range(1..=u64::MAX)
    }
}

/// Replays a fixed list of values as a single batch.
#[derive(Debug, Clone)]
pub struct FixedSource {
    values: Vec<u64>,
    position: usize,
}

impl FixedSource {
    /// Creates a source emitting `values` in order.
    pub fn new(values: impl Into<Vec<u64>>) -> Self {
        Self {
            values: values.into(),
            position: 0,
        }
    }
}

impl ValueSource for FixedSource {
    fn batch_size(&mut self) -> usize {
        self.values.len()
    }

    fn next_value(&mut self) -> u64 {
        let value = self.values[self.position % self.values.len()];
        self.position += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_source_respects_ranges() {
        let mut entropy = StdRng::seed_from_u64(17);
        let mut source = RandomSource::from_entropy(&mut entropy, 3..=5);
        for _ in 0..100 {
            assert!((3..=5).contains(&source.batch_size()));
            assert_ne!(source.next_value(), 0);
        }
    }

    #[test]
    fn test_random_sources_are_independent_and_reproducible() {
        let mut entropy = StdRng::seed_from_u64(5);
        let mut first = RandomSource::from_entropy(&mut entropy, 1..=10);
        let mut second = RandomSource::from_entropy(&mut entropy, 1..=10);
        let a: Vec<u64> = (0..8).map(|_| first.next_value()).collect();
        let b: Vec<u64> = (0..8).map(|_| second.next_value()).collect();
        assert_ne!(a, b);

        let mut entropy = StdRng::seed_from_u64(5);
        let mut replay = RandomSource::from_entropy(&mut entropy, 1..=10);
        let c: Vec<u64> = (0..8).map(|_| replay.next_value()).collect();
        assert_eq!(a, c);
    }

    #[test]
    fn test_fixed_source_replays_values() {
        let mut source = FixedSource::new([5, 5, 3]);
        assert_eq!(source.batch_size(), 3);
        let values: Vec<u64> = (0..3).map(|_| source.next_value()).collect();
        assert_eq!(values, vec![5, 5, 3]);
    }
}
