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

//! Error types for the heavy hitters pipeline.

use std::fmt;

/// ErrorKind is all kinds of Error of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The supplied configuration is out of range.
    ConfigInvalid,
    /// The shared channel could not be written or read.
    ChannelIo,
    /// A token between separators is not a valid value.
    InvalidToken,
    /// The processed count cannot be incremented any further.
    CounterOverflow,
    /// The threshold divisor is not smaller than the processed count.
    InvalidThreshold,
    /// The component stopped because the abort signal was raised.
    Aborted,
    /// A worker thread could not be created.
    ThreadSpawn,
}

impl ErrorKind {
    /// Convert this error kind instance into static str.
    pub const fn into_static(self) -> &'static str {
        match self {
            ErrorKind::ConfigInvalid => "ConfigInvalid",
            ErrorKind::ChannelIo => "ChannelIo",
            ErrorKind::InvalidToken => "InvalidToken",
            ErrorKind::CounterOverflow => "CounterOverflow",
            ErrorKind::InvalidThreshold => "InvalidThreshold",
            ErrorKind::Aborted => "Aborted",
            ErrorKind::ThreadSpawn => "ThreadSpawn",
        }
    }

    /// Returns true if the pipeline can continue after an error of this kind.
    pub const fn is_recoverable(self) -> bool {
        matches!(self, ErrorKind::InvalidToken)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.into_static())
    }
}

/// Error is the error struct returned by all heavy hitters functions.
pub struct Error {
    kind: ErrorKind,
    message: String,
    context: Vec<(&'static str, String)>,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl Error {
    /// Create a new Error with error kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: vec![],
            source: None,
        }
    }

    /// Add more context in error.
    pub fn with_context(mut self, key: &'static str, value: impl ToString) -> Self {
        self.context.push((key, value.to_string()));
        self
    }

    /// Set source for error.
    ///
    /// # Panics
    ///
    /// Panics if the source has been set.
    pub fn set_source(
        mut self,
        src: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        assert!(self.source.is_none(), "the source error has been set");
        self.source = Some(src.into());
        self
    }

    /// Return error's kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Return error's message.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Return the value recorded under `key`, if any.
    pub fn context(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

// Crate internal constructors
impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    pub(crate) fn channel_io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ChannelIo, message)
    }

    pub(crate) fn invalid_token(message: impl Into<String>, token: &[u8]) -> Self {
        Self::new(ErrorKind::InvalidToken, message).with_context("token", preview(token))
    }

    pub(crate) fn counter_overflow(processed: u64) -> Self {
        Self::new(ErrorKind::CounterOverflow, "processed count overflow")
            .with_context("processed", processed)
    }

    pub(crate) fn invalid_threshold(divisor: u64, processed: u64) -> Self {
        Self::new(
            ErrorKind::InvalidThreshold,
            format!("divisor must be smaller than the processed count: k={divisor} >= n={processed}"),
        )
    }

    pub(crate) fn aborted(component: &'static str) -> Self {
        Self::new(ErrorKind::Aborted, "abort signal observed").with_context("component", component)
    }

    pub(crate) fn thread_spawn(name: impl Into<String>, source: std::io::Error) -> Self {
        Self::new(ErrorKind::ThreadSpawn, "failed to spawn thread")
            .with_context("thread", name.into())
            .set_source(source)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // If alternate has been specified, we will print like Debug.
        if f.alternate() {
            let mut de = f.debug_struct("Error");
            de.field("kind", &self.kind);
            de.field("message", &self.message);
            de.field("context", &self.context);
            de.field("source", &self.source);
            return de.finish();
        }

        write!(f, "{}", self.kind)?;
        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }
        writeln!(f)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "Context:")?;
            for (k, v) in self.context.iter() {
                writeln!(f, "   {k}: {v}")?;
            }
        }

        if let Some(source) = &self.source {
            writeln!(f)?;
            writeln!(f, "Source:")?;
            writeln!(f, "   {source:#}")?;
        }

        Ok(())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if !self.context.is_empty() {
            write!(f, ", context: {{ ")?;
            write!(
                f,
                "{}",
                self.context
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            )?;
            write!(f, " }}")?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        if let Some(source) = &self.source {
            write!(f, ", source: {source}")?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|v| v.as_ref() as _)
    }
}

/// Renders at most the first few bytes of a token for diagnostics.
fn preview(token: &[u8]) -> String {
    const PREVIEW_LEN: usize = 24;
    if token.len() <= PREVIEW_LEN {
        String::from_utf8_lossy(token).into_owned()
    } else {
        format!(
            "{}... ({} bytes)",
            String::from_utf8_lossy(&token[..PREVIEW_LEN]),
            token.len()
        )
    }
}
