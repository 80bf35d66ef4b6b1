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

//! Decimal token codec and the incremental tokenizer.

use crate::error::Error;

/// Longest decimal rendering of a `u64`.
pub const MAX_TOKEN_LENGTH: usize = 20;
/// Byte written after every token.
pub const SEPARATOR: u8 = b',';

/// Renders a value as a token followed by the separator.
pub fn encode_token(value: u64, out: &mut Vec<u8>) {
    out.extend_from_slice(value.to_string().as_bytes());
    out.push(SEPARATOR);
}

/// Decodes a token without its separator.
///
/// A valid token is 1 to 20 ASCII digits encoding a value in `[1, 2^64 - 1]`.
pub fn decode_token(token: &[u8]) -> Result<u64, Error> {
    if token.is_empty() {
        return Err(Error::invalid_token("empty token", token));
    }
    if token.len() > MAX_TOKEN_LENGTH {
        return Err(Error::invalid_token(
            format!("token longer than {MAX_TOKEN_LENGTH} characters"),
            token,
        ));
    }
    let mut value: u64 = 0;
    for &byte in token {
        if !byte.is_ascii_digit() {
            return Err(Error::invalid_token("token is not a number", token));
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add((byte - b'0') as u64))
            .ok_or_else(|| Error::invalid_token("token does not fit in u64", token))?;
    }
    if value == 0 {
        return Err(Error::invalid_token("zero is not a stream value", token));
    }
    Ok(value)
}

/// Accumulates a token across successive channel drains.
///
/// Only the first `MAX_TOKEN_LENGTH + 1` bytes of a token are kept; the total length is still
/// tracked so that an overlong token is reported as such.
#[derive(Debug, Default)]
pub struct TokenAccumulator {
    scratch: Vec<u8>,
    length: usize,
}

impl TokenAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self {
            scratch: Vec::with_capacity(MAX_TOKEN_LENGTH + 1),
            length: 0,
        }
    }

    /// Returns true if a partial token is pending.
    pub fn has_pending(&self) -> bool {
        self.length > 0
    }

    /// Feeds a chunk of bytes, calling `on_token` for every token closed by a separator.
    ///
    /// Empty tokens are skipped. The bytes after the last separator remain pending.
    pub fn feed<F>(&mut self, bytes: &[u8], mut on_token: F) -> Result<(), Error>
    where
        F: FnMut(Result<u64, Error>) -> Result<(), Error>,
    {
        for &byte in bytes {
            if byte == SEPARATOR {
                if self.has_pending() {
                    on_token(self.take())?;
                }
            } else {
                self.push(byte);
            }
        }
        Ok(())
    }

    /// Closes the pending token, if any.
    pub fn finish(&mut self) -> Option<Result<u64, Error>> {
        self.has_pending().then(|| self.take())
    }

    fn push(&mut self, byte: u8) {
        if self.scratch.len() <= MAX_TOKEN_LENGTH {
            self.scratch.push(byte);
        }
        self.length += 1;
    }

    fn take(&mut self) -> Result<u64, Error> {
        let result = if self.length > MAX_TOKEN_LENGTH {
            Err(Error::invalid_token(
                format!("token longer than {MAX_TOKEN_LENGTH} characters"),
                &self.scratch,
            )
            .with_context("length", self.length))
        } else {
            decode_token(&self.scratch)
        };
        self.scratch.clear();
        self.length = 0;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn collect(acc: &mut TokenAccumulator, bytes: &[u8]) -> Vec<Result<u64, ErrorKind>> {
        let mut out = vec![];
        acc.feed(bytes, |token| {
            out.push(token.map_err(|e| e.kind()));
            Ok(())
        })
        .unwrap();
        out
    }

    #[test]
    fn test_decode_limits() {
        assert_eq!(decode_token(b"1").unwrap(), 1);
        assert_eq!(decode_token(b"18446744073709551615").unwrap(), u64::MAX);
        assert!(decode_token(b"18446744073709551616").is_err());
        assert!(decode_token(b"99999999999999999999").is_err());
        assert!(decode_token(b"123456789012345678901").is_err());
        assert!(decode_token(b"0").is_err());
        assert!(decode_token(b"00").is_err());
        assert!(decode_token(b"").is_err());
        assert!(decode_token(b"12a").is_err());
        assert!(decode_token(b"-1").is_err());
    }

    #[test]
    fn test_leading_zeros_are_accepted() {
        assert_eq!(decode_token(b"007").unwrap(), 7);
    }

    #[test]
    fn test_encode_appends_separator() {
        let mut out = vec![];
        encode_token(42, &mut out);
        encode_token(u64::MAX, &mut out);
        assert_eq!(out, b"42,18446744073709551615,");
    }

    #[test]
    fn test_token_split_across_chunks() {
        let mut acc = TokenAccumulator::new();
        assert_eq!(collect(&mut acc, b"12"), vec![]);
        assert!(acc.has_pending());
        assert_eq!(collect(&mut acc, b"34,5"), vec![Ok(1234)]);
        assert_eq!(collect(&mut acc, b",,6,"), vec![Ok(5), Ok(6)]);
        assert!(!acc.has_pending());
        assert!(acc.finish().is_none());
    }

    #[test]
    fn test_invalid_tokens_do_not_stop_the_stream() {
        let mut acc = TokenAccumulator::new();
        let tokens = collect(&mut acc, b"7,x9,3 ,8,");
        assert_eq!(
            tokens,
            vec![
                Ok(7),
                Err(ErrorKind::InvalidToken),
                Err(ErrorKind::InvalidToken),
                Ok(8)
            ]
        );
    }

    #[test]
    fn test_overlong_token_is_bounded() {
        let mut acc = TokenAccumulator::new();
        let long = vec![b'1'; 1000];
        assert_eq!(collect(&mut acc, &long), vec![]);
        assert!(acc.scratch.len() <= MAX_TOKEN_LENGTH + 1);
        let tokens = collect(&mut acc, b",5,");
        assert_eq!(tokens, vec![Err(ErrorKind::InvalidToken), Ok(5)]);
    }

    #[test]
    fn test_finish_flushes_trailing_token() {
        let mut acc = TokenAccumulator::new();
        assert_eq!(collect(&mut acc, b"1,2"), vec![Ok(1)]);
        assert_eq!(acc.finish().map(|r| r.unwrap()), Some(2));
        assert!(!acc.has_pending());
    }

    #[test]
    fn test_callback_error_stops_feeding() {
        let mut acc = TokenAccumulator::new();
        let mut seen = 0;
        let result = acc.feed(b"1,2,3,", |_| {
            seen += 1;
            if seen == 2 {
                Err(Error::counter_overflow(1))
            } else {
                Ok(())
            }
        });
        assert_eq!(result.unwrap_err().kind(), ErrorKind::CounterOverflow);
        assert_eq!(seen, 2);
    }
}
