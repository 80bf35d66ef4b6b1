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

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

/// One-way cooperative cancellation flag shared by every component of a pipeline.
///
/// Raising the signal does not interrupt anything. Producers observe it before each append and
/// the consumer before each drain or wait, so cancellation takes effect within one iteration.
/// Whoever raises the signal must also wake the channel's waiters.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    raised: Arc<AtomicBool>,
}

impl AbortSignal {
    /// Creates a signal that has not been raised.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the signal. Returns true if this call raised it.
    pub fn abort(&self) -> bool {
        !self.raised.swap(true, Ordering::AcqRel)
    }

    /// Returns true once the signal has been raised.
    pub fn is_aborted(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }
}
