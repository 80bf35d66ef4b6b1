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

use tracing::debug;
use tracing::error;
use tracing::info;

use crate::channel::MAX_TOKEN_LENGTH;
use crate::channel::SharedChannel;
use crate::channel::encode_token;
use crate::error::Error;
use crate::pipeline::AbortSignal;
use crate::pipeline::CompletionTracker;
use crate::pipeline::ValueSource;
use crate::pipeline::completion::CompletionGuard;

/// Appends one batch of values to the shared channel.
pub struct Producer<'a, S> {
    id: usize,
    channel: &'a SharedChannel,
    tracker: &'a CompletionTracker,
    abort: AbortSignal,
    source: S,
}

impl<'a, S: ValueSource> Producer<'a, S> {
    /// Creates a producer with a 1-based `id` used in diagnostics.
    pub fn new(
        id: usize,
        channel: &'a SharedChannel,
        tracker: &'a CompletionTracker,
        abort: AbortSignal,
        source: S,
    ) -> Self {
        Self {
            id,
            channel,
            tracker,
            abort,
            source,
        }
    }

    /// Appends the batch one token at a time and returns the number of values appended.
    ///
    /// Completion is recorded exactly once when this returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ErrorKind::Aborted`] if the abort signal is observed, or the
    /// channel error that made an append fail. In the latter case the abort signal is raised.
    pub fn run(mut self) -> Result<u64, Error> {
        let _completion = CompletionGuard::new(self.tracker, self.channel, &self.abort);
        if self.abort.is_aborted() {
            debug!(producer = self.id, "abort raised before start, skipping batch");
            return Err(Error::aborted("producer").with_context("producer", self.id));
        }

        let batch_size = self.source.batch_size();
        debug!(producer = self.id, batch_size, "producer started");
        let mut text = Vec::with_capacity(MAX_TOKEN_LENGTH + 1);
        let mut appended = 0u64;
        for _ in 0..batch_size {
            if self.abort.is_aborted() {
                info!(producer = self.id, appended, "abort observed, stopping");
                return Err(Error::aborted("producer").with_context("producer", self.id));
            }
            text.clear();
            encode_token(self.source.next_value(), &mut text);
            if let Err(err) = self.channel.append(&text) {
                error!(producer = self.id, error = %err, "append failed");
                self.abort.abort();
                return Err(err.with_context("producer", self.id));
            }
            appended += 1;
        }
        debug!(producer = self.id, appended, "producer finished");
        Ok(appended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pipeline::FixedSource;

    fn drain(channel: &SharedChannel) -> Vec<u8> {
        let mut out = vec![];
        channel
            .lock()
            .unwrap()
            .read_available(|bytes| {
                out.extend_from_slice(bytes);
                Ok(())
            })
            .unwrap();
        out
    }

    #[test]
    fn test_appends_every_value_then_completes() {
        let channel = SharedChannel::new();
        let tracker = CompletionTracker::new(1);
        let source = FixedSource::new([5, 5, 5, 3, 3]);
        let producer = Producer::new(1, &channel, &tracker, AbortSignal::new(), source);
        assert_eq!(producer.run().unwrap(), 5);
        assert!(tracker.all_finished());
        assert_eq!(drain(&channel), b"5,5,5,3,3,");
        assert_eq!(channel.total_appends(), 5);
    }

    #[test]
    fn test_skips_batch_when_already_aborted() {
        let channel = SharedChannel::new();
        let tracker = CompletionTracker::new(1);
        let abort = AbortSignal::new();
        abort.abort();
        let producer = Producer::new(1, &channel, &tracker, abort, FixedSource::new([1, 2]));
        let err = producer.run().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Aborted);
        assert!(tracker.all_finished());
        assert_eq!(channel.total_bytes(), 0);
    }
}
