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

//! Final result of a pipeline run.

use std::fmt;

use crate::frequencies::Row;

/// The values whose estimated frequency exceeds `n / k`, with the figures they were derived from.
///
/// Displays as `{v1, v2, ...}` in ascending order, or `{}` when there is none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeavyHitters {
    rows: Vec<Row>,
    stream_length: u64,
    divisor: u64,
    dropped_tokens: u64,
}

impl HeavyHitters {
    /// `rows` must be sorted by value, as [`crate::frequencies::MisraGries::heavy_hitters`]
    /// returns them.
    pub(crate) fn new(
        rows: Vec<Row>,
        stream_length: u64,
        divisor: u64,
        dropped_tokens: u64,
    ) -> Self {
        debug_assert!(rows.is_sorted_by_key(|row| row.value()), "rows must be sorted");
        Self {
            rows,
            stream_length,
            divisor,
            dropped_tokens,
        }
    }

    /// Returns the heavy hitters in ascending order.
    pub fn values(&self) -> Vec<u64> {
        self.rows.iter().map(|row| row.value()).collect()
    }

    /// Returns the rows in ascending order of value.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Returns true if no value qualified.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of values processed, `n`.
    pub fn stream_length(&self) -> u64 {
        self.stream_length
    }

    /// Returns the threshold divisor, `k`.
    pub fn divisor(&self) -> u64 {
        self.divisor
    }

    /// Returns the threshold `n / k`.
    pub fn threshold(&self) -> f64 {
        self.stream_length as f64 / self.divisor as f64
    }

    /// Returns the number of invalid tokens that were skipped.
    pub fn dropped_tokens(&self) -> u64 {
        self.dropped_tokens
    }
}

impl fmt::Display for HeavyHitters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", row.value())?;
        }
        write!(f, "}}")
    }
}
