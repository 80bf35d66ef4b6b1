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

//! In-process append-only byte channel with a single read cursor.

use std::sync::Condvar;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use crate::error::Error;

#[derive(Debug, Default)]
struct ChannelState {
    bytes: Vec<u8>,
    cursor: usize,
    total_bytes: u64,
    total_appends: u64,
}

impl ChannelState {
    fn has_unread(&self) -> bool {
        self.cursor < self.bytes.len()
    }
}

/// Append-only byte sequence shared by many writers and one reader.
///
/// Every append and every drain holds the same mutex. Writers signal the condition variable
/// while still holding the lock, so a woken reader observes at least the bytes appended before
/// the signal.
#[derive(Debug, Default)]
pub struct SharedChannel {
    state: Mutex<ChannelState>,
    data_available: Condvar,
}

impl SharedChannel {
    /// Creates an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `text` atomically with respect to other appends, then wakes the reader.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ErrorKind::ChannelIo`] if the lock is poisoned or the buffer
    /// cannot grow. Waiters are woken in both cases.
    pub fn append(&self, text: &[u8]) -> Result<(), Error> {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => {
                drop(poisoned);
                self.data_available.notify_all();
                return Err(Error::channel_io("channel lock poisoned during append"));
            }
        };
        if let Err(err) = state.bytes.try_reserve(text.len()) {
            self.data_available.notify_all();
            return Err(Error::channel_io("failed to grow channel buffer")
                .with_context("requested", text.len())
                .set_source(err));
        }
        state.bytes.extend_from_slice(text);
        state.total_bytes += text.len() as u64;
        state.total_appends += 1;
        self.data_available.notify_all();
        Ok(())
    }

    /// Wakes every waiter without appending.
    ///
    /// The lock is taken so that a reader evaluating its wait predicate cannot miss the signal.
    /// This never fails, even on a poisoned lock.
    pub fn notify(&self) {
        let _state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.data_available.notify_all();
    }

    /// Acquires the channel lock for reading.
    pub fn lock(&self) -> Result<ChannelGuard<'_>, Error> {
        let state = self
            .state
            .lock()
            .map_err(|_| Error::channel_io("channel lock poisoned during read"))?;
        Ok(ChannelGuard {
            channel: self,
            state,
        })
    }

    /// Returns the total number of bytes appended so far.
    pub fn total_bytes(&self) -> u64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .total_bytes
    }

    /// Returns the total number of appends so far.
    pub fn total_appends(&self) -> u64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .total_appends
    }
}

/// Exclusive read access to a [`SharedChannel`].
///
/// Producers cannot append while the guard is alive.
pub struct ChannelGuard<'a> {
    channel: &'a SharedChannel,
    state: MutexGuard<'a, ChannelState>,
}

impl<'a> ChannelGuard<'a> {
    /// Passes every byte appended since the previous read to `process`, then advances the cursor.
    ///
    /// Returns the number of bytes read; zero means nothing new was available. The cursor only
    /// advances if `process` succeeds. Once everything is consumed the buffer is cleared, keeping
    /// its allocation.
    pub fn read_available<F>(&mut self, process: F) -> Result<usize, Error>
    where
        F: FnOnce(&[u8]) -> Result<(), Error>,
    {
        let state = &mut *self.state;
        let available = &state.bytes[state.cursor..];
        let read = available.len();
        if read == 0 {
            return Ok(0);
        }
        process(available)?;
        state.cursor += read;
        if !state.has_unread() {
            state.bytes.clear();
            state.cursor = 0;
        }
        Ok(read)
    }

    /// Returns true if bytes were appended since the previous read.
    pub fn has_unread(&self) -> bool {
        self.state.has_unread()
    }

    /// Releases the lock until the channel is signalled and `should_stop` returns true or new
    /// bytes are available.
    ///
    /// The predicate is evaluated under the lock after every wake-up, so spurious wake-ups are
    /// never mistaken for progress.
    pub fn wait_until<P>(self, mut should_stop: P) -> Result<Self, Error>
    where
        P: FnMut() -> bool,
    {
        let ChannelGuard { channel, state } = self;
        let state = channel
            .data_available
            .wait_while(state, |state| !state.has_unread() && !should_stop())
            .map_err(|_| Error::channel_io("channel lock poisoned while waiting"))?;
        Ok(ChannelGuard { channel, state })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;
    use std::sync::atomic::Ordering;
    use std::thread;

    use super::*;
    use crate::error::ErrorKind;

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
    fn test_read_advances_cursor() {
        let channel = SharedChannel::new();
        channel.append(b"1,2,").unwrap();
        assert_eq!(drain(&channel), b"1,2,");
        assert_eq!(drain(&channel), b"");
        channel.append(b"3,").unwrap();
        assert_eq!(drain(&channel), b"3,");
        assert_eq!(channel.total_bytes(), 6);
        assert_eq!(channel.total_appends(), 2);
    }

    #[test]
    fn test_failed_processing_keeps_bytes_unread() {
        let channel = SharedChannel::new();
        channel.append(b"1,").unwrap();
        let mut guard = channel.lock().unwrap();
        let err = guard
            .read_available(|_| Err(Error::counter_overflow(0)))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CounterOverflow);
        assert!(guard.has_unread());
    }

    #[test]
    fn test_wait_returns_on_append() {
        let channel = Arc::new(SharedChannel::new());
        let writer = {
            let channel = channel.clone();
            thread::spawn(move || channel.append(b"9,").unwrap())
        };
        let guard = channel.lock().unwrap();
        let mut guard = guard.wait_until(|| false).unwrap();
        assert!(guard.has_unread());
        let read = guard.read_available(|_| Ok(())).unwrap();
        assert_eq!(read, 2);
        drop(guard);
        writer.join().unwrap();
    }

    #[test]
    fn test_wait_returns_on_stop_condition() {
        let channel = Arc::new(SharedChannel::new());
        let done = Arc::new(AtomicBool::new(false));
        let notifier = {
            let channel = channel.clone();
            let done = done.clone();
            thread::spawn(move || {
                done.store(true, Ordering::SeqCst);
                channel.notify();
            })
        };
        let guard = channel.lock().unwrap();
        let guard = guard.wait_until(|| done.load(Ordering::SeqCst)).unwrap();
        assert!(!guard.has_unread());
        drop(guard);
        notifier.join().unwrap();
    }

    #[test]
    fn test_poisoned_lock_is_channel_io() {
        let channel = Arc::new(SharedChannel::new());
        let poisoner = {
            let channel = channel.clone();
            thread::spawn(move || {
                let _guard = channel.lock().unwrap();
                panic!("poison the channel");
            })
        };
        assert!(poisoner.join().is_err());
        assert_eq!(
            channel.append(b"1,").unwrap_err().kind(),
            ErrorKind::ChannelIo
        );
        assert_eq!(channel.lock().err().map(|e| e.kind()), Some(ErrorKind::ChannelIo));
        channel.notify();
    }
}
