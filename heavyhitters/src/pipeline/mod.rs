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

//! Producers, the consumer, and the coordinator that joins them.
//!
//! # Concurrency contract
//!
//! * Every producer appends its tokens one at a time to the [`SharedChannel`] and signals after
//!   each append while still holding the channel lock.
//! * The single [`Consumer`] drains the channel under the lock, tokenizes and counts the chunk,
//!   and only releases the lock to wait for the next signal. After every wake-up it re-evaluates
//!   "new bytes or every producer finished" under the lock.
//! * Each producer records its completion exactly once in the [`CompletionTracker`] and signals
//!   the channel. After joining every producer the coordinator signals once more, so the consumer
//!   can never wait forever.
//! * Cancellation is cooperative. The [`AbortSignal`] is checked by producers before each append
//!   and by the consumer before each drain or wait; nothing is interrupted mid-operation.
//!
//! [`SharedChannel`]: crate::channel::SharedChannel
//!
//! # Example
//!
//! ```
//! # use heavyhitters::config::PipelineConfig;
//! # use heavyhitters::pipeline::{FixedSource, Pipeline, ValueSource};
//! let pipeline = Pipeline::new(PipelineConfig::new(1, 3)).unwrap();
//! let sources: Vec<Box<dyn ValueSource>> = vec![Box::new(FixedSource::new([7, 7, 7, 7, 2]))];
//! let summary = pipeline.run_with_sources(sources).unwrap();
//! assert_eq!(summary.heavy_hitters().to_string(), "{7}");
//! ```

mod abort;
pub use self::abort::AbortSignal;

mod completion;
pub use self::completion::CompletionTracker;

mod consumer;
pub use self::consumer::Consumer;

mod coordinator;
pub use self::coordinator::Pipeline;
pub use self::coordinator::RunSummary;

mod producer;
pub use self::producer::Producer;

mod source;
pub use self::source::FixedSource;
pub use self::source::RandomSource;
pub use self::source::ValueSource;
