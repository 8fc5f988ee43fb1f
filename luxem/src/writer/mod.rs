// SPDX-License-Identifier: Apache-2.0

//! The grammar-enforcing, stack-based luxem writer.
//!
//! A [`Writer`] tracks a stack of grammar positions (`{object, array,
//! value_phrase, value}`, with the implicit root always at the bottom as
//! an `array`). Each event call checks the current top of stack, fails
//! deterministically if the call is not legal there, and otherwise
//! writes bytes to whichever sink was attached with `set_*_sink`.
//!
//! The first error latches the writer: `error()` returns it and every
//! later call fails without writing anything.

mod buffer;

use crate::classify::is_word;
use crate::error::WriteError;
use buffer::OutputBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Object,
    Array,
    ValuePhrase,
    Value,
}

#[derive(Debug, Clone, Copy)]
struct PrettyOptions {
    indent_byte: u8,
    multiple: usize,
}

enum Sink {
    None,
    Callback(Box<dyn FnMut(&[u8]) -> bool>),
    File(std::fs::File),
    Buffer(OutputBuffer),
}

/// Grammar-enforcing, stack-based encoder for luxem documents.
///
/// Construct with [`Writer::new`], attach exactly one sink, then drive
/// it with `object_begin`/`object_end`/`array_begin`/`array_end`/`key`/
/// `type_`/`primitive` in document order.
pub struct Writer {
    stack: Vec<State>,
    indentation: usize,
    pretty: Option<PrettyOptions>,
    sink: Sink,
    error: Option<WriteError>,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    /// A fresh writer with no sink attached and the implicit root array
    /// on the stack.
    pub fn new() -> Self {
        Self {
            stack: vec![State::Array],
            indentation: 0,
            pretty: None,
            sink: Sink::None,
            error: None,
        }
    }

    /// Enables pretty printing: `indent_byte` repeated `multiple` times
    /// per open container precedes each element, and `,` is followed by
    /// a newline instead of nothing.
    pub fn set_pretty(&mut self, indent_byte: u8, multiple: usize) {
        self.pretty = Some(PrettyOptions {
            indent_byte,
            multiple,
        });
    }

    /// Attaches a callback sink. The closure returns `true` on success;
    /// returning `false` fails the write and latches the writer.
    pub fn set_callback_sink(&mut self, f: impl FnMut(&[u8]) -> bool + 'static) {
        self.sink = Sink::Callback(Box::new(f));
    }

    /// Attaches a file sink; bytes are written with `write_all`.
    pub fn set_file_sink(&mut self, file: std::fs::File) {
        self.sink = Sink::File(file);
    }

    /// Attaches the internal chunked buffer sink. Only in this mode can
    /// [`Writer::render`] be called.
    pub fn set_buffer_sink(&mut self) {
        self.sink = Sink::Buffer(OutputBuffer::new());
    }

    /// The latched error, if any.
    pub fn error(&self) -> Option<&WriteError> {
        self.error.as_ref()
    }

    /// Returns a contiguous copy of everything written so far. Only
    /// legal when the buffer sink is attached.
    pub fn render(&self) -> Result<Vec<u8>, WriteError> {
        match &self.sink {
            Sink::Buffer(buf) => Ok(buf.render()),
            _ => Err(WriteError::NotBuffered),
        }
    }

    fn fail(&mut self, e: WriteError) -> bool {
        log::warn!("luxem writer error: {e}");
        self.error = Some(e);
        false
    }

    fn write_raw(&mut self, bytes: &[u8]) -> bool {
        if self.error.is_some() {
            return false;
        }
        match &mut self.sink {
            Sink::None => {
                let e = WriteError::SinkNotConfigured;
                self.fail(e)
            }
            Sink::Callback(f) => {
                if f(bytes) {
                    true
                } else {
                    self.fail(WriteError::Sink("write callback returned false".into()))
                }
            }
            Sink::File(file) => {
                use std::io::Write;
                match file.write_all(bytes) {
                    Ok(()) => true,
                    Err(e) => {
                        let message = e.to_string();
                        self.fail(WriteError::Sink(message))
                    }
                }
            }
            Sink::Buffer(buf) => {
                buf.write(bytes);
                true
            }
        }
    }

    fn indent(&mut self) -> bool {
        let Some(pretty) = self.pretty else {
            return true;
        };
        let count = pretty.multiple * self.indentation;
        if count == 0 {
            return true;
        }
        let bytes = vec![pretty.indent_byte; count];
        self.write_raw(&bytes)
    }

    fn check_state(&mut self, allowed: &[State], context: &'static str) -> bool {
        if self.error.is_some() {
            return false;
        }
        match self.stack.last() {
            Some(s) if allowed.contains(s) => true,
            _ => self.fail(WriteError::InvalidState(context)),
        }
    }

    /// Pops the top of stack, adjusting the indentation counter when an
    /// object or array frame closes. Fails if the stack would become
    /// empty (closing past root).
    fn pop(&mut self) -> bool {
        match self.stack.pop() {
            Some(State::Object) | Some(State::Array) => {
                debug_assert!(self.indentation >= 1);
                if self.indentation >= 1 {
                    self.indentation -= 1;
                }
            }
            _ => {}
        }
        if self.stack.is_empty() {
            return self.fail(WriteError::EmptyStack);
        }
        true
    }

    fn push(&mut self, state: State) {
        self.stack.push(state);
        if matches!(state, State::Object | State::Array) {
            self.indentation += 1;
        }
    }

    /// Pops `value`/`value_phrase` if on top (the preceding `type`/`key`
    /// call already claimed this element), otherwise indents for a
    /// fresh element directly inside the enclosing array/root.
    fn open_element(&mut self) -> bool {
        match self.stack.last() {
            Some(State::Value) | Some(State::ValuePhrase) => self.pop(),
            _ => self.indent(),
        }
    }

    /// Begins an object. Legal directly inside an array/root, after a
    /// `key`, or after a `type`.
    pub fn object_begin(&mut self) -> bool {
        if !self.check_state(
            &[State::Array, State::Value, State::ValuePhrase],
            "array, value or value_phrase",
        ) {
            return false;
        }
        if !self.open_element() {
            return false;
        }
        if !self.write_raw(b"{") {
            return false;
        }
        if self.pretty.is_some() && !self.write_raw(b"\n") {
            return false;
        }
        self.push(State::Object);
        true
    }

    pub fn object_end(&mut self) -> bool {
        if !self.check_state(&[State::Object], "object") {
            return false;
        }
        if !self.pop() {
            return false;
        }
        if !self.indent() {
            return false;
        }
        if !self.write_raw(b"},") {
            return false;
        }
        if self.pretty.is_some() && !self.write_raw(b"\n") {
            return false;
        }
        true
    }

    pub fn array_begin(&mut self) -> bool {
        if !self.check_state(
            &[State::Array, State::Value, State::ValuePhrase],
            "array, value or value_phrase",
        ) {
            return false;
        }
        if !self.open_element() {
            return false;
        }
        if !self.write_raw(b"[") {
            return false;
        }
        if self.pretty.is_some() && !self.write_raw(b"\n") {
            return false;
        }
        self.push(State::Array);
        true
    }

    pub fn array_end(&mut self) -> bool {
        if !self.check_state(&[State::Array], "array") {
            return false;
        }
        if !self.pop() {
            return false;
        }
        if !self.indent() {
            return false;
        }
        if !self.write_raw(b"],") {
            return false;
        }
        if self.pretty.is_some() && !self.write_raw(b"\n") {
            return false;
        }
        true
    }

    fn write_word_or_quoted(&mut self, s: &[u8]) -> bool {
        if is_word(s) {
            self.write_raw(s)
        } else {
            self.write_raw(b"\"")
                && self.write_escaped(s, b'"')
                && self.write_raw(b"\"")
        }
    }

    fn write_escaped(&mut self, s: &[u8], delimiter: u8) -> bool {
        match crate::escape::escape(s, delimiter) {
            Some(escaped) => self.write_raw(&escaped),
            None => self.write_raw(s),
        }
    }

    /// Writes an object key. Only legal directly inside an object.
    pub fn key(&mut self, s: &[u8]) -> bool {
        if !self.check_state(&[State::Object], "object") {
            return false;
        }
        if !self.indent() {
            return false;
        }
        if !self.write_word_or_quoted(s) {
            return false;
        }
        if !self.write_raw(b":") {
            return false;
        }
        if self.pretty.is_some() && !self.write_raw(b" ") {
            return false;
        }
        self.push(State::ValuePhrase);
        true
    }

    /// Writes a type annotation. Legal after a `value_phrase` position
    /// (directly inside an object's entry, or a root/array element) or
    /// directly inside an array.
    pub fn type_(&mut self, s: &[u8]) -> bool {
        if !self.check_state(&[State::ValuePhrase, State::Array], "value_phrase or array") {
            return false;
        }
        let has_value_phrase = matches!(self.stack.last(), Some(State::ValuePhrase));
        if has_value_phrase {
            if !self.pop() {
                return false;
            }
        } else if !self.indent() {
            return false;
        }
        if !self.write_raw(b"(") {
            return false;
        }
        if !self.write_escaped(s, b')') {
            return false;
        }
        if !self.write_raw(b")") {
            return false;
        }
        if self.pretty.is_some() && !self.write_raw(b" ") {
            return false;
        }
        self.push(State::Value);
        true
    }

    /// Writes a primitive scalar. Legal after a `value_phrase` or
    /// `type` position, or directly inside an array.
    pub fn primitive(&mut self, s: &[u8]) -> bool {
        if !self.check_state(
            &[State::ValuePhrase, State::Value, State::Array],
            "value_phrase, value or array",
        ) {
            return false;
        }
        if !self.open_element() {
            return false;
        }
        if !self.write_word_or_quoted(s) {
            return false;
        }
        if !self.write_raw(b",") {
            return false;
        }
        if self.pretty.is_some() && !self.write_raw(b"\n") {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn buffered() -> Writer {
        let mut w = Writer::new();
        w.set_buffer_sink();
        w
    }

    #[test]
    fn simple_object() {
        let mut w = buffered();
        assert!(w.object_begin());
        assert!(w.key(b"a"));
        assert!(w.primitive(b"1"));
        assert!(w.object_end());
        assert_eq!(w.render().unwrap(), b"{a:1,},");
    }

    #[test]
    fn array_of_primitives_matches_scenario_five() {
        let mut w = buffered();
        assert!(w.array_begin());
        assert!(w.primitive(b"hi"));
        assert!(w.primitive(b"a b"));
        assert!(w.array_end());
        assert_eq!(w.render().unwrap(), b"[hi,\"a b\",],");
    }

    #[test]
    fn type_annotation_on_array_and_element() {
        let mut w = buffered();
        assert!(w.type_(b"T"));
        assert!(w.array_begin());
        assert!(w.primitive(b"x"));
        assert!(w.type_(b"U"));
        assert!(w.primitive(b"y"));
        assert!(w.array_end());
        assert_eq!(w.render().unwrap(), b"(T)[x,(U)y,],");
    }

    #[test]
    fn empty_object_and_array() {
        let mut w = buffered();
        assert!(w.object_begin());
        assert!(w.object_end());
        assert!(w.array_begin());
        assert!(w.array_end());
        assert_eq!(w.render().unwrap(), b"{},[],");
    }

    #[test]
    fn key_requires_object_state() {
        let mut w = buffered();
        assert!(!w.key(b"a"));
        assert!(w.error().is_some());
    }

    #[test]
    fn error_latches_subsequent_calls() {
        let mut w = buffered();
        assert!(!w.object_end());
        assert!(w.error().is_some());
        assert!(!w.primitive(b"x"));
        assert!(!w.array_begin());
    }

    #[test]
    fn render_illegal_outside_buffer_mode() {
        let w = Writer::new();
        assert_eq!(w.render(), Err(WriteError::NotBuffered));
    }

    #[test]
    fn no_sink_configured_fails_first_write() {
        let mut w = Writer::new();
        assert!(!w.primitive(b"x"));
        assert_eq!(w.error(), Some(&WriteError::SinkNotConfigured));
    }

    #[test]
    fn pretty_printing_indents_nested_containers() {
        let mut w = buffered();
        w.set_pretty(b' ', 2);
        assert!(w.object_begin());
        assert!(w.key(b"a"));
        assert!(w.array_begin());
        assert!(w.primitive(b"1"));
        assert!(w.array_end());
        assert!(w.object_end());
        let rendered = w.render().unwrap();
        let text = std::str::from_utf8(&rendered).unwrap();
        assert_eq!(
            text,
            "{\n  a: [\n    1,\n  ],\n},\n"
        );
    }

    #[test]
    fn callback_sink_receives_every_write() {
        let mut w = Writer::new();
        let collected = std::rc::Rc::new(std::cell::RefCell::new(Vec::<u8>::new()));
        let sink = collected.clone();
        w.set_callback_sink(move |bytes| {
            sink.borrow_mut().extend_from_slice(bytes);
            true
        });
        assert!(w.primitive(b"ok"));
        assert_eq!(&*collected.borrow(), b"ok,");
    }

    #[test]
    fn callback_returning_false_fails_the_write() {
        let mut w = Writer::new();
        w.set_callback_sink(|_| false);
        assert!(!w.primitive(b"ok"));
        assert!(matches!(w.error(), Some(WriteError::Sink(_))));
    }
}
