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

//! Misra-Gries estimator for finding heavy hitters in data streams.
//!
//! # Overview
//!
//! A heavy hitter of a stream of `n` values is a value that occurs more than `n / k` times. At
//! most `k - 1` values can be heavy hitters, and the estimator tracks at most `k - 1` candidates
//! with approximate counters, using memory independent of the number of distinct values.
//!
//! # Update rule
//!
//! For each incoming value:
//! * If the value is a candidate, its counter is incremented.
//! * Else, if fewer than `k - 1` candidates are tracked, the value becomes a candidate with a
//!   counter of one.
//! * Else, every counter is decremented by one and candidates whose counter reaches zero are
//!   removed. The incoming value is dropped, even when the decrement frees a slot.
//!
//! # Accuracy
//!
//! After any `n` updates every value whose true frequency strictly exceeds `n / k` is a
//! candidate. Stored counters never exceed the true frequency, and they undercount by at most
//! the number of decrement rounds, which is itself at most `n / k`.
//!
//! The guarantee holds for the final state only. A value that was a heavy hitter of a prefix of
//! the stream may be evicted and never come back.
//!
//! Candidates whose counter is at or below the threshold are false positives;
//! [`MisraGries::heavy_hitters`] filters them with a final `count > n / k` test.
//!
//! # Background
//!
//! * "Finding repeated elements", Misra, Gries, 1982
//! * "Frequency estimation of Internet packet streams with limited space" Demaine, Lopez-Ortiz,
//!   Munro, 2002
//! * "A simple algorithm for finding frequent elements in streams and bags" Karp, Shenker,
//!   Papadimitriou, 2003
//!
//! # Examples
//!
//! ```
//! # use heavyhitters::frequencies::MisraGries;
//! let mut sketch = MisraGries::new(3);
//! for value in [7, 7, 7, 7, 2] {
//!     sketch.update(value).unwrap();
//! }
//! let rows = sketch.heavy_hitters();
//! assert_eq!(rows.len(), 1);
//! assert_eq!(rows[0].value(), 7);
//! assert_eq!(rows[0].count(), 4);
//! ```

mod candidate_map;
mod sketch;

pub use self::sketch::MisraGries;
pub use self::sketch::Row;
