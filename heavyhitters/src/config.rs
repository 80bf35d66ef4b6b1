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

//! Pipeline configuration.

use std::ops::RangeInclusive;

use crate::error::Error;

/// Smallest number of producers a pipeline accepts.
pub const MIN_PRODUCERS: usize = 1;
/// Largest number of producers a pipeline accepts.
pub const MAX_PRODUCERS: usize = 50;
/// Default lower bound of a producer batch size.
pub const DEFAULT_MIN_BATCH_SIZE: usize = 1;
/// Default upper bound of a producer batch size.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 999_999;

/// Configuration of a single pipeline run.
///
/// The producer count and the threshold divisor are required; the batch size range and the seed
/// have defaults.
///
/// ```
/// # use heavyhitters::config::PipelineConfig;
/// let config = PipelineConfig::new(4, 10).with_batch_size(1..=1000).with_seed(7);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.misra_gries_capacity(), 9);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    producer_count: usize,
    threshold_divisor: u64,
    batch_size: RangeInclusive<usize>,
    seed: Option<u64>,
}

impl PipelineConfig {
    /// Creates a configuration with the default batch size range and an OS-seeded generator.
    pub fn new(producer_count: usize, threshold_divisor: u64) -> Self {
        Self {
            producer_count,
            threshold_divisor,
            batch_size: DEFAULT_MIN_BATCH_SIZE..=DEFAULT_MAX_BATCH_SIZE,
            seed: None,
        }
    }

    /// Sets the range each producer draws its batch size from.
    pub fn with_batch_size(mut self, batch_size: RangeInclusive<usize>) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Seeds the shared entropy source, making the generated stream reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Returns the number of producers.
    pub fn producer_count(&self) -> usize {
        self.producer_count
    }

    /// Returns the threshold divisor `k`.
    pub fn threshold_divisor(&self) -> u64 {
        self.threshold_divisor
    }

    /// Returns the batch size range.
    pub fn batch_size(&self) -> RangeInclusive<usize> {
        self.batch_size.clone()
    }

    /// Returns the seed of the shared entropy source, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Returns the number of counters of the estimator, `max(k - 1, 1)`.
    pub fn misra_gries_capacity(&self) -> u64 {
        self.threshold_divisor.saturating_sub(1).max(1)
    }

    /// Checks that every value is in its accepted range.
    pub fn validate(&self) -> Result<(), Error> {
        if !(MIN_PRODUCERS..=MAX_PRODUCERS).contains(&self.producer_count) {
            return Err(Error::config(format!(
                "producer count must be in [{MIN_PRODUCERS}, {MAX_PRODUCERS}]"
            ))
            .with_context("producer_count", self.producer_count));
        }
        if self.threshold_divisor <= 1 {
            return Err(Error::config("threshold divisor must be greater than 1")
                .with_context("threshold_divisor", self.threshold_divisor));
        }
        if self.batch_size.is_empty() || *self.batch_size.start() == 0 {
            return Err(Error::config("batch size range must be non-empty and start at 1 or more")
                .with_context(
                    "batch_size",
                    format!("{}..={}", self.batch_size.start(), self.batch_size.end()),
                ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::new(3, 5);
        assert_eq!(config.batch_size(), 1..=999_999);
        assert_eq!(config.seed(), None);
        assert_eq!(config.misra_gries_capacity(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_producer_count_bounds() {
        assert!(PipelineConfig::new(1, 2).validate().is_ok());
        assert!(PipelineConfig::new(50, 2).validate().is_ok());
        for count in [0, 51] {
            let err = PipelineConfig::new(count, 2).validate().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
            assert_eq!(err.context("producer_count"), Some(count.to_string().as_str()));
        }
    }

    #[test]
    fn test_divisor_must_exceed_one() {
        for divisor in [0, 1] {
            let err = PipelineConfig::new(1, divisor).validate().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        }
    }

    #[test]
    fn test_batch_size_range() {
        #[allow(clippy::reversed_empty_ranges)]
        let empty = PipelineConfig::new(1, 2).with_batch_size(10..=5);
        assert!(empty.validate().is_err());
        let zero = PipelineConfig::new(1, 2).with_batch_size(0..=5);
        assert!(zero.validate().is_err());
        let single = PipelineConfig::new(1, 2).with_batch_size(7..=7);
        assert!(single.validate().is_ok());
    }
}
