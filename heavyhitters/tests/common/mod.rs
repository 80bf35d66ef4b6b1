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

use heavyhitters::pipeline::FixedSource;
use heavyhitters::pipeline::ValueSource;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Builds one boxed fixed source per list of values.
pub fn fixed_sources(batches: &[&[u64]]) -> Vec<Box<dyn ValueSource>> {
    batches
        .iter()
        .map(|values| Box::new(FixedSource::new(values.to_vec())) as Box<dyn ValueSource>)
        .collect()
}

/// Returns a shuffled stream of `len` values where `planted` occurs `occurrences` times and the
/// remaining values are drawn from `noise_domain` distinct values.
pub fn planted_stream(
    seed: u64,
    len: usize,
    planted: u64,
    occurrences: usize,
    noise_domain: u64,
) -> Vec<u64> {
    assert!(occurrences <= len);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut stream: Vec<u64> = (0..len - occurrences)
        .map(|_| planted + 1 + rng.random_range(0..noise_domain))
        .collect();
    stream.extend(std::iter::repeat_n(planted, occurrences));
    // Fisher-Yates
    for i in (1..stream.len()).rev() {
        let j = rng.random_range(0..=i);
        stream.swap(i, j);
    }
    stream
}
