// SPDX-License-Identifier: Apache-2.0

//! Error types for the reader and writer.
//!
//! Both engines latch on their first error: `error()` returns it, and
//! every subsequent call fails immediately without attempting to make
//! progress. There is no retry; recovery means dropping the engine and
//! starting a new one.

use std::fmt;

/// What went wrong while feeding bytes to a [`crate::Reader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadErrorKind {
    /// An object entry's key was not followed by `:`.
    MissingColon,
    /// Two container elements were not separated by `,`, and the
    /// container was not closed either.
    MissingComma,
    /// A container closed more levels than were ever opened.
    AboveRoot,
    /// A quoted run or type body ended with an unpaired `\`.
    TrailingBackslash,
    /// A value was expected but the next byte cannot start one (it is
    /// neither `{`, `[`, `"`, nor a word byte).
    InvalidValue,
    /// An event callback returned `false`, rejecting the document.
    CallbackRejected,
}

impl ReadErrorKind {
    fn message(self) -> &'static str {
        match self {
            Self::MissingColon => "missing : between key and value",
            Self::MissingComma => "missing , between elements",
            Self::AboveRoot => "above root depth, exited too many levels",
            Self::TrailingBackslash => "unterminated escape at end of quoted run",
            Self::InvalidValue => "expected a value",
            Self::CallbackRejected => "event callback rejected the document",
        }
    }
}

/// A reader error together with the byte offset it occurred at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadError {
    pub kind: ReadErrorKind,
    pub position: usize,
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [offset {}]", self.kind.message(), self.position)
    }
}

impl std::error::Error for ReadError {}

/// What went wrong while driving a [`crate::Writer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    /// The call was not legal in the writer's current state. Carries a
    /// description of the states in which the call would have been
    /// legal.
    InvalidState(&'static str),
    /// A container was closed more times than opened.
    EmptyStack,
    /// No sink has been attached yet.
    SinkNotConfigured,
    /// `render()` was called while not in buffer-sink mode.
    NotBuffered,
    /// The attached sink (callback or file) failed.
    Sink(String),
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidState(expected) => {
                write!(f, "invalid state; state must be {expected}")
            }
            Self::EmptyStack => f.write_str("empty stack"),
            Self::SinkNotConfigured => f.write_str("write sink not configured"),
            Self::NotBuffered => f.write_str("render() is only legal in buffer sink mode"),
            Self::Sink(message) => write!(f, "write sink failed: {message}"),
        }
    }
}

impl std::error::Error for WriteError {}
