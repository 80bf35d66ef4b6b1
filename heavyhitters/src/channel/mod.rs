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

//! Shared channel between the producers and the consumer.
//!
//! # Wire format
//!
//! The channel carries ASCII decimal tokens, each followed by a single `,`. A valid token is at
//! most 20 digits and encodes a value in `[1, 2^64 - 1]`. Any other byte sequence between two
//! separators is an invalid token; the consumer drops it with a diagnostic and carries on.
//!
//! # Usage
//!
//! ```rust
//! # use heavyhitters::channel::{SharedChannel, TokenAccumulator, encode_token};
//! let channel = SharedChannel::new();
//! let mut text = vec![];
//! encode_token(7, &mut text);
//! channel.append(&text).unwrap();
//!
//! let mut tokenizer = TokenAccumulator::new();
//! let mut values = vec![];
//! let mut guard = channel.lock().unwrap();
//! guard
//!     .read_available(|bytes| {
//!         tokenizer.feed(bytes, |token| {
//!             values.push(token?);
//!             Ok(())
//!         })
//!     })
//!     .unwrap();
//! assert_eq!(values, vec![7]);
//! ```

mod shared;
pub use self::shared::ChannelGuard;
pub use self::shared::SharedChannel;

mod token;
pub use self::token::MAX_TOKEN_LENGTH;
pub use self::token::SEPARATOR;
pub use self::token::TokenAccumulator;
pub use self::token::decode_token;
pub use self::token::encode_token;
