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

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread;

use crate::channel::SharedChannel;
use crate::pipeline::AbortSignal;

/// Shared count of producers that have finished, successfully or not.
#[derive(Debug)]
pub struct CompletionTracker {
    finished: AtomicUsize,
    expected: usize,
}

impl CompletionTracker {
    /// Creates a tracker expecting `expected` producers.
    pub fn new(expected: usize) -> Self {
        Self {
            finished: AtomicUsize::new(0),
            expected,
        }
    }

    /// Records one finished producer and returns the new count.
    ///
    /// The count saturates at the expected number of producers.
    pub fn finish(&self) -> usize {
        let expected = self.expected;
        let previous = self
            .finished
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                (count < expected).then_some(count + 1)
            })
            .unwrap_or(expected);
        (previous + 1).min(expected)
    }

    /// Returns the number of finished producers.
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::Acquire)
    }

    /// Returns the number of expected producers.
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Returns true once every expected producer has finished.
    pub fn all_finished(&self) -> bool {
        self.finished() >= self.expected
    }
}

/// Records a producer's completion when dropped, including on unwind.
///
/// A producer that panics also raises the abort signal.
pub(crate) struct CompletionGuard<'a> {
    tracker: &'a CompletionTracker,
    channel: &'a SharedChannel,
    abort: &'a AbortSignal,
}

impl<'a> CompletionGuard<'a> {
    pub(crate) fn new(
        tracker: &'a CompletionTracker,
        channel: &'a SharedChannel,
        abort: &'a AbortSignal,
    ) -> Self {
        Self {
            tracker,
            channel,
            abort,
        }
    }
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.abort.abort();
        }
        self.tracker.finish();
        self.channel.notify();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_saturates() {
        let tracker = CompletionTracker::new(2);
        assert!(!tracker.all_finished());
        assert_eq!(tracker.finish(), 1);
        assert_eq!(tracker.finish(), 2);
        assert!(tracker.all_finished());
        assert_eq!(tracker.finish(), 2);
        assert_eq!(tracker.finished(), 2);
        assert_eq!(tracker.expected(), 2);
    }

    #[test]
    fn test_guard_records_completion() {
        let tracker = CompletionTracker::new(1);
        let channel = SharedChannel::new();
        let abort = AbortSignal::new();
        drop(CompletionGuard::new(&tracker, &channel, &abort));
        assert!(tracker.all_finished());
        assert!(!abort.is_aborted());
    }

    #[test]
    fn test_guard_raises_abort_on_panic() {
        let tracker = CompletionTracker::new(1);
        let channel = SharedChannel::new();
        let abort = AbortSignal::new();
        let result = thread::scope(|scope| {
            scope
                .spawn(|| {
                    let _guard = CompletionGuard::new(&tracker, &channel, &abort);
                    panic!("producer failure");
                })
                .join()
        });
        assert!(result.is_err());
        assert!(tracker.all_finished());
        assert!(abort.is_aborted());
    }
}
