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
use tracing::warn;

use crate::channel::ChannelGuard;
use crate::channel::SharedChannel;
use crate::channel::TokenAccumulator;
use crate::error::Error;
use crate::error::ErrorKind;
use crate::frequencies::MisraGries;
use crate::pipeline::AbortSignal;
use crate::pipeline::CompletionTracker;
use crate::report::HeavyHitters;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConsumerState {
    Draining,
    Waiting,
    Done,
}

/// The single reader of the shared channel.
///
/// The channel lock is held while a drained chunk is tokenized and fed to the estimator, so
/// producers are blocked for the duration of one pass. The lock is only released while waiting.
pub struct Consumer<'a> {
    channel: &'a SharedChannel,
    tracker: &'a CompletionTracker,
    abort: AbortSignal,
    tokenizer: TokenAccumulator,
    sketch: MisraGries,
    dropped_tokens: u64,
}

impl<'a> Consumer<'a> {
    /// Creates a consumer reporting values above `n / divisor`.
    pub fn new(
        channel: &'a SharedChannel,
        tracker: &'a CompletionTracker,
        abort: AbortSignal,
        divisor: u64,
    ) -> Self {
        Self {
            channel,
            tracker,
            abort,
            tokenizer: TokenAccumulator::new(),
            sketch: MisraGries::new(divisor),
            dropped_tokens: 0,
        }
    }

    /// Reads until every producer has finished and the channel is exhausted, then computes the
    /// heavy hitters.
    ///
    /// # Errors
    ///
    /// * [`ErrorKind::Aborted`] if the abort signal is observed.
    /// * [`ErrorKind::ChannelIo`] or [`ErrorKind::CounterOverflow`] on a fatal read; the abort
    ///   signal is raised.
    /// * [`ErrorKind::InvalidThreshold`] if the divisor is not smaller than a non-zero `n`.
    pub fn run(mut self) -> Result<HeavyHitters, Error> {
        if let Err(err) = self.drain_until_exhausted() {
            if err.kind() != ErrorKind::Aborted && self.abort.abort() {
                self.channel.notify();
            }
            error!(error = %err, processed = self.sketch.stream_length(), "consumer failed");
            return Err(err);
        }
        self.finish()
    }

    fn drain_until_exhausted(&mut self) -> Result<(), Error> {
        let channel = self.channel;
        let mut guard = channel.lock()?;
        let mut state = ConsumerState::Draining;
        while state != ConsumerState::Done {
            if self.abort.is_aborted() {
                return Err(Error::aborted("consumer"));
            }
            let next = match state {
                ConsumerState::Draining => self.drain(&mut guard)?,
                ConsumerState::Waiting => {
                    let tracker = self.tracker;
                    let abort = &self.abort;
                    guard = guard.wait_until(|| tracker.all_finished() || abort.is_aborted())?;
                    ConsumerState::Draining
                }
                ConsumerState::Done => ConsumerState::Done,
            };
            if next != state {
                debug!(from = ?state, to = ?next, "consumer transition");
            }
            state = next;
        }
        // An unterminated last token is still a token.
        match self.tokenizer.finish() {
            Some(token) => accept(&mut self.sketch, &mut self.dropped_tokens, token),
            None => Ok(()),
        }
    }

    /// Drains one chunk and decides the next state.
    ///
    /// Done is only reached when the read came back empty and every producer had finished, both
    /// observed while holding the channel lock.
    fn drain(&mut self, guard: &mut ChannelGuard<'_>) -> Result<ConsumerState, Error> {
        let read = guard.read_available(|bytes| self.consume(bytes))?;
        if read > 0 {
            Ok(ConsumerState::Draining)
        } else if self.tracker.all_finished() {
            Ok(ConsumerState::Done)
        } else {
            Ok(ConsumerState::Waiting)
        }
    }

    fn consume(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let sketch = &mut self.sketch;
        let dropped_tokens = &mut self.dropped_tokens;
        self.tokenizer
            .feed(bytes, |token| accept(sketch, dropped_tokens, token))
    }

    fn finish(self) -> Result<HeavyHitters, Error> {
        let processed = self.sketch.stream_length();
        let divisor = self.sketch.divisor();
        info!(
            processed,
            dropped = self.dropped_tokens,
            candidates = self.sketch.num_candidates(),
            "consumer finished reading"
        );
        if processed > 0 && divisor >= processed {
            let err = Error::invalid_threshold(divisor, processed);
            error!(error = %err, "no result for this stream");
            return Err(err);
        }
        let result = HeavyHitters::new(
            self.sketch.heavy_hitters(),
            processed,
            divisor,
            self.dropped_tokens,
        );
        if processed > 0 {
            info!(processed, threshold = result.threshold(), "heavy hitters computed");
        }
        Ok(result)
    }
}

/// Feeds a valid token to the estimator, or logs and counts an invalid one.
fn accept(
    sketch: &mut MisraGries,
    dropped_tokens: &mut u64,
    token: Result<u64, Error>,
) -> Result<(), Error> {
    match token {
        Ok(value) => sketch.update(value),
        Err(err) if err.kind().is_recoverable() => {
            warn!(error = %err, "dropped token");
            *dropped_tokens += 1;
            Ok(())
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consume_all(text: &[u8], divisor: u64) -> Result<HeavyHitters, Error> {
        let channel = SharedChannel::new();
        let tracker = CompletionTracker::new(1);
        channel.append(text).unwrap();
        tracker.finish();
        Consumer::new(&channel, &tracker, AbortSignal::new(), divisor).run()
    }

    #[test]
    fn test_counts_only_valid_tokens() {
        let result = consume_all(b"4,4,abc,4,99999999999999999999999,4,1,", 2).unwrap();
        assert_eq!(result.stream_length(), 5);
        assert_eq!(result.dropped_tokens(), 2);
        assert_eq!(result.values(), vec![4]);
    }

    #[test]
    fn test_trailing_token_without_separator() {
        let result = consume_all(b"8,8,8,8,2", 2).unwrap();
        assert_eq!(result.stream_length(), 5);
        assert_eq!(result.values(), vec![8]);
    }

    #[test]
    fn test_empty_stream_is_done() {
        let result = consume_all(b"", 5).unwrap();
        assert_eq!(result.stream_length(), 0);
        assert!(result.is_empty());
    }

    #[test]
    fn test_divisor_not_below_processed_count_fails() {
        let err = consume_all(b"1,2,", 5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidThreshold);
        let err = consume_all(b"1,2,", 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidThreshold);
    }

    #[test]
    fn test_trailing_token_overflow_raises_abort() {
        let channel = SharedChannel::new();
        let tracker = CompletionTracker::new(1);
        let abort = AbortSignal::new();
        channel.append(b"5,6").unwrap();
        tracker.finish();
        let mut consumer = Consumer::new(&channel, &tracker, abort.clone(), 2);
        consumer.sketch = MisraGries::with_stream_length(2, u64::MAX - 1);
        let err = consumer.run().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CounterOverflow);
        assert!(abort.is_aborted());
    }

    #[test]
    fn test_abort_before_start_fails() {
        let channel = SharedChannel::new();
        let tracker = CompletionTracker::new(1);
        let abort = AbortSignal::new();
        abort.abort();
        channel.append(b"1,2,3,").unwrap();
        tracker.finish();
        let err = Consumer::new(&channel, &tracker, abort, 2).run().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Aborted);
    }
}
