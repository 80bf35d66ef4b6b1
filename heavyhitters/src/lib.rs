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

//! # Heavy hitters over a concurrently produced stream
//!
//! Several producer threads append decimal `u64` tokens to one shared, append-only channel. A
//! single consumer drains the channel and feeds every value to a Misra-Gries estimator, which
//! finds every value occurring more than `n / k` times using at most `k - 1` counters.
//!
//! * [`channel`]: the shared byte channel and the token codec.
//! * [`frequencies`]: the Misra-Gries estimator.
//! * [`pipeline`]: producers, the consumer, and the coordinator.
//! * [`report`]: the final result set.
//!
//! ```
//! # use heavyhitters::config::PipelineConfig;
//! # use heavyhitters::pipeline::Pipeline;
//! let config = PipelineConfig::new(4, 1000).with_batch_size(500..=1000).with_seed(42);
//! let summary = Pipeline::new(config).unwrap().run().unwrap();
//! // Uniformly random 64-bit values essentially never repeat.
//! assert!(summary.heavy_hitters().is_empty());
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod channel;
pub mod config;
pub mod error;
pub mod frequencies;
pub mod pipeline;
pub mod report;
