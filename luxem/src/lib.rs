// SPDX-License-Identifier: Apache-2.0

//! A streaming reader and writer for the luxem structured data format.
//!
//! luxem looks like JSON with two extensions: every value may carry an
//! explicit type annotation `(T)value`, and scalars may be written as
//! bare, unquoted "words" instead of quoted strings. The root of a
//! document is an implicit, unbracketed array of value phrases.
//!
//! This crate does not build a value tree. [`reader::Reader`] drives a
//! caller-supplied [`reader::ReaderSink`] with SAX-style events as bytes
//! arrive, and [`writer::Writer`] accepts the same events in order and
//! emits well-formed luxem bytes. Both engines are incremental: the
//! reader tolerates arbitrary chunk boundaries and the writer enforces
//! the grammar on every call.

mod ascii16;
mod classify;
mod error;
mod escape;
pub mod reader;
pub mod writer;

pub use ascii16::{from_ascii16, to_ascii16, Ascii16Error};
pub use classify::is_word;
pub use error::{ReadError, ReadErrorKind, WriteError};
pub use reader::{Reader, ReaderSink};
pub use writer::Writer;
