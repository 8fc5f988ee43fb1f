// SPDX-License-Identifier: Apache-2.0

//! The incremental, chunk-tolerant luxem reader.
//!
//! [`Reader`] is a push-down automaton: a growable stack of
//! [`Continuation`]s replaces the original source's stack of function
//! pointers. `feed` repeatedly runs the top of the stack against
//! whatever input is left in the current call; a continuation that
//! can't finish with the bytes on hand returns hungry and the stack is
//! left exactly as it was, ready to retry once more bytes arrive.

mod continuation;
pub mod owned;

use crate::classify::{is_whitespace, is_word_byte};
use crate::error::{ReadError, ReadErrorKind};
use continuation::{Container, Continuation};

pub use owned::{OwnedEvent, RecordingSink};

/// Receives structural events from a [`Reader`] in document order.
///
/// Every method defaults to accepting the event (returning `true`); a
/// sink only needs to override the events it cares about. Returning
/// `false` from any method aborts the current `feed` call with
/// [`crate::ReadErrorKind::CallbackRejected`].
///
/// Byte slices passed to `key`/`type_`/`primitive` borrow from the
/// buffer passed to the current `feed` call (or, when the content
/// contained a backslash escape, from a temporary unescaped copy) and
/// are only valid for the duration of the call. Implementations that
/// need to keep the bytes must copy them; see [`owned::RecordingSink`]
/// for a ready-made owned-copy adapter.
pub trait ReaderSink {
    fn object_begin(&mut self) -> bool {
        true
    }
    fn object_end(&mut self) -> bool {
        true
    }
    fn array_begin(&mut self) -> bool {
        true
    }
    fn array_end(&mut self) -> bool {
        true
    }
    fn key(&mut self, bytes: &[u8]) -> bool {
        let _ = bytes;
        true
    }
    fn type_(&mut self, bytes: &[u8]) -> bool {
        let _ = bytes;
        true
    }
    fn primitive(&mut self, bytes: &[u8]) -> bool {
        let _ = bytes;
        true
    }
}

#[derive(Debug, Clone, Copy)]
enum EventKind {
    Key,
    Type,
    Primitive,
}

enum StepResult {
    Hungry,
    Continue,
    Error(ReadErrorKind),
}

/// Result of scanning for a delimiter-terminated quoted run.
enum ReadDelimited<'a> {
    Hungry,
    Got(&'a [u8]),
}

/// Incremental push-down parser over a luxem byte stream.
///
/// Construct with [`Reader::new`], then repeatedly call [`Reader::feed`]
/// with however many bytes are on hand; resubmit whatever `feed` did not
/// report as consumed, together with any newly arrived bytes, on the
/// next call.
pub struct Reader<S> {
    stack: Vec<Continuation>,
    sink: S,
    position: usize,
    depth: usize,
    error: Option<ReadError>,
}

impl<S: ReaderSink> Reader<S> {
    /// Builds a reader with `sink` already attached and the implicit
    /// root sequence on the stack.
    pub fn new(sink: S) -> Self {
        let mut stack = Vec::new();
        stack.push(Continuation::Next(Container::Root));
        stack.push(Continuation::Whitespace);
        stack.push(Continuation::ValuePhrase);
        stack.push(Continuation::Whitespace);
        Self {
            stack,
            sink,
            position: 0,
            depth: 0,
            error: None,
        }
    }

    /// Total bytes consumed across every `feed` call so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// How many objects/arrays are currently open. Zero means parsing
    /// is sitting at the root: a hungry `feed` return at this depth is
    /// just "no more complete root elements yet", not a truncated
    /// document sitting mid-container.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The latched error, if any.
    pub fn error(&self) -> Option<&ReadError> {
        self.error.as_ref()
    }

    /// Releases the reader, handing the sink back to the caller.
    pub fn destroy(self) -> S {
        self.sink
    }

    /// Feeds `data` to the parser. Returns the number of leading bytes
    /// consumed; any remaining tail must be included at the front of
    /// the next call's `data`, together with whatever new bytes have
    /// arrived since.
    ///
    /// An `Err` latches the reader: every later call returns the same
    /// error immediately without examining `data`.
    pub fn feed(&mut self, data: &[u8]) -> Result<usize, ReadError> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        let mut eaten = 0usize;
        let mut committed = 0usize;
        loop {
            if self.stack.is_empty() {
                self.position += eaten;
                let e = ReadError {
                    kind: ReadErrorKind::AboveRoot,
                    position: self.position,
                };
                self.error = Some(e.clone());
                return Err(e);
            }
            match self.step(data, &mut eaten) {
                StepResult::Hungry => break,
                StepResult::Continue => {
                    committed = eaten;
                }
                StepResult::Error(kind) => {
                    self.position += eaten;
                    let e = ReadError {
                        kind,
                        position: self.position,
                    };
                    self.error = Some(e.clone());
                    return Err(e);
                }
            }
        }
        self.position += committed;
        log::trace!("luxem reader consumed {committed} bytes, position now {}", self.position);
        Ok(committed)
    }

    fn step(&mut self, data: &[u8], eaten: &mut usize) -> StepResult {
        let top = *self.stack.last().expect("checked non-empty by caller");
        match top {
            Continuation::Whitespace => {
                while *eaten < data.len() && is_whitespace(data[*eaten]) {
                    *eaten += 1;
                }
                if *eaten >= data.len() {
                    // Every available byte was whitespace; more might
                    // follow in the next chunk, so don't commit to
                    // being done yet.
                    return StepResult::Hungry;
                }
                self.stack.pop();
                StepResult::Continue
            }
            Continuation::Type => match Self::read_delimited(data, *eaten, b')') {
                ReadDelimited::Hungry => StepResult::Hungry,
                ReadDelimited::Got(bytes) => {
                    *eaten += bytes.len() + 1;
                    self.stack.pop();
                    self.finish_delimited(bytes, EventKind::Type)
                }
            },
            Continuation::Primitive { is_key } => {
                if *eaten >= data.len() {
                    return StepResult::Hungry;
                }
                if data[*eaten] == b'"' {
                    match Self::read_delimited(data, *eaten + 1, b'"') {
                        ReadDelimited::Hungry => StepResult::Hungry,
                        ReadDelimited::Got(bytes) => {
                            *eaten += bytes.len() + 2;
                            self.stack.pop();
                            let kind = if is_key { EventKind::Key } else { EventKind::Primitive };
                            self.finish_delimited(bytes, kind)
                        }
                    }
                } else {
                    match Self::read_word(data, *eaten) {
                        None => StepResult::Hungry,
                        Some(word) if word.is_empty() => StepResult::Error(ReadErrorKind::InvalidValue),
                        Some(word) => {
                            *eaten += word.len();
                            self.stack.pop();
                            let ok = if is_key {
                                self.sink.key(word)
                            } else {
                                self.sink.primitive(word)
                            };
                            if ok {
                                StepResult::Continue
                            } else {
                                StepResult::Error(ReadErrorKind::CallbackRejected)
                            }
                        }
                    }
                }
            }
            Continuation::KeySeparator => {
                if *eaten >= data.len() {
                    return StepResult::Hungry;
                }
                if data[*eaten] != b':' {
                    return StepResult::Error(ReadErrorKind::MissingColon);
                }
                *eaten += 1;
                self.stack.pop();
                StepResult::Continue
            }
            Continuation::ValuePhrase => {
                if *eaten >= data.len() {
                    return StepResult::Hungry;
                }
                self.stack.pop();
                self.stack.push(Continuation::Value);
                if data[*eaten] == b'(' {
                    *eaten += 1;
                    self.stack.push(Continuation::Whitespace);
                    self.stack.push(Continuation::Type);
                }
                StepResult::Continue
            }
            Continuation::Value => self.step_value(data, eaten),
            Continuation::Next(container) => self.step_next(data, eaten, container),
            Continuation::CloseOrFrame(container) => self.step_close_or_frame(data, eaten, container),
        }
    }

    /// `{`/`[` dispatch. Doesn't touch the stack until it knows whether
    /// more input is needed, so a hungry return leaves everything
    /// exactly as the caller will see it resubmitted next time.
    fn step_value(&mut self, data: &[u8], eaten: &mut usize) -> StepResult {
        if *eaten >= data.len() {
            return StepResult::Hungry;
        }
        let opener = data[*eaten];
        if opener != b'{' && opener != b'[' {
            self.stack.pop();
            self.stack.push(Continuation::Primitive { is_key: false });
            return StepResult::Continue;
        }
        let mut probe = *eaten + 1;
        while probe < data.len() && is_whitespace(data[probe]) {
            probe += 1;
        }
        if probe >= data.len() {
            return StepResult::Hungry;
        }
        let container = if opener == b'{' { Container::Object } else { Container::Array };
        let closer = if opener == b'{' { b'}' } else { b']' };
        *eaten = probe;
        self.stack.pop();
        if data[probe] == closer {
            self.stack.push(Continuation::Next(container));
        } else if opener == b'{' {
            Continuation::push_object_frame(&mut self.stack);
        } else {
            Continuation::push_array_frame(&mut self.stack, container);
        }
        self.depth += 1;
        let ok = if opener == b'{' { self.sink.object_begin() } else { self.sink.array_begin() };
        if ok {
            StepResult::Continue
        } else {
            StepResult::Error(ReadErrorKind::CallbackRejected)
        }
    }

    /// Tastes for `,` or the container's closing byte. A `,` is
    /// consumed and committed right here, handing off to
    /// `CloseOrFrame` to decide what follows it — so a chunk boundary
    /// landing just after the comma doesn't force it to be re-scanned.
    fn step_next(&mut self, data: &[u8], eaten: &mut usize, container: Container) -> StepResult {
        if *eaten >= data.len() {
            return StepResult::Hungry;
        }
        let closer = match container {
            Container::Object => Some(b'}'),
            Container::Array => Some(b']'),
            Container::Root => None,
        };
        if data[*eaten] == b',' {
            *eaten += 1;
            self.stack.pop();
            self.stack.push(Continuation::CloseOrFrame(container));
            self.stack.push(Continuation::Whitespace);
            return StepResult::Continue;
        }
        if Some(data[*eaten]) == closer {
            *eaten += 1;
            self.stack.pop();
            self.depth -= 1;
            let ok = match container {
                Container::Object => self.sink.object_end(),
                Container::Array => self.sink.array_end(),
                Container::Root => unreachable!("root has no closing byte"),
            };
            return if ok {
                StepResult::Continue
            } else {
                StepResult::Error(ReadErrorKind::CallbackRejected)
            };
        }
        StepResult::Error(ReadErrorKind::MissingComma)
    }

    /// Runs once a `,` and any trailing whitespace have already been
    /// committed: closes the container if its closing byte is next,
    /// otherwise starts another element.
    fn step_close_or_frame(&mut self, data: &[u8], eaten: &mut usize, container: Container) -> StepResult {
        if *eaten >= data.len() {
            return StepResult::Hungry;
        }
        let closer = match container {
            Container::Object => Some(b'}'),
            Container::Array => Some(b']'),
            Container::Root => None,
        };
        if Some(data[*eaten]) == closer {
            *eaten += 1;
            self.stack.pop();
            self.depth -= 1;
            let ok = match container {
                Container::Object => self.sink.object_end(),
                Container::Array => self.sink.array_end(),
                Container::Root => unreachable!("root has no closing byte"),
            };
            return if ok {
                StepResult::Continue
            } else {
                StepResult::Error(ReadErrorKind::CallbackRejected)
            };
        }
        self.stack.pop();
        match container {
            Container::Object => Continuation::push_object_frame(&mut self.stack),
            Container::Array => Continuation::push_array_frame(&mut self.stack, Container::Array),
            Container::Root => Continuation::push_array_frame(&mut self.stack, Container::Root),
        }
        StepResult::Continue
    }

    fn finish_delimited(&mut self, bytes: &[u8], kind: EventKind) -> StepResult {
        let unescaped;
        let to_emit: &[u8] = if bytes.contains(&b'\\') {
            match crate::escape::unescape(bytes) {
                Ok(owned) => {
                    unescaped = owned;
                    &unescaped
                }
                Err(_) => return StepResult::Error(ReadErrorKind::TrailingBackslash),
            }
        } else {
            bytes
        };
        let ok = match kind {
            EventKind::Key => self.sink.key(to_emit),
            EventKind::Type => self.sink.type_(to_emit),
            EventKind::Primitive => self.sink.primitive(to_emit),
        };
        if ok {
            StepResult::Continue
        } else {
            StepResult::Error(ReadErrorKind::CallbackRejected)
        }
    }

    /// Scans from `start` in `data` for an unescaped `delimiter`,
    /// returning the content before it (not including the delimiter
    /// itself) on success. Never mutates a cursor shared across calls;
    /// the caller advances `eaten` only once the whole token is known.
    fn read_delimited(data: &[u8], start: usize, delimiter: u8) -> ReadDelimited<'_> {
        let mut i = start;
        let mut escaped = false;
        while i < data.len() {
            let b = data[i];
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == delimiter {
                return ReadDelimited::Got(&data[start..i]);
            }
            i += 1;
        }
        ReadDelimited::Hungry
    }

    /// Scans a maximal run of word bytes starting at `start`. The
    /// terminating byte (if any) is not consumed. Returns `None` when
    /// the run reaches the end of available input, since more word
    /// bytes might follow in the next chunk.
    fn read_word(data: &[u8], start: usize) -> Option<&[u8]> {
        let mut i = start;
        while i < data.len() {
            if !is_word_byte(data[i]) {
                return Some(&data[start..i]);
            }
            i += 1;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn events(input: &[u8]) -> Vec<OwnedEvent> {
        let mut reader = Reader::new(RecordingSink::new());
        let consumed = reader.feed(input).expect("parse should succeed");
        assert_eq!(consumed, input.len(), "whole input should be consumed");
        reader.destroy().into_events()
    }

    #[test]
    fn scenario_1_simple_object_with_trailing_comma() {
        use OwnedEvent::*;
        assert_eq!(
            events(b"{a:1,}"),
            vec![ObjectBegin, Key(b"a".to_vec()), Primitive(b"1".to_vec()), ObjectEnd]
        );
    }

    #[test]
    fn scenario_2_quoted_key_and_primitive_with_comma_inside() {
        use OwnedEvent::*;
        assert_eq!(
            events(b"{\"k v\":\"a,b\"}"),
            vec![ObjectBegin, Key(b"k v".to_vec()), Primitive(b"a,b".to_vec()), ObjectEnd]
        );
    }

    #[test]
    fn scenario_3_type_annotations_on_array_elements() {
        use OwnedEvent::*;
        assert_eq!(
            events(b"(T)[x,(U)y]"),
            vec![
                Type(b"T".to_vec()),
                ArrayBegin,
                Primitive(b"x".to_vec()),
                Type(b"U".to_vec()),
                Primitive(b"y".to_vec()),
                ArrayEnd,
            ]
        );
    }

    #[test]
    fn scenario_4_unescaped_colon_in_unquoted_key_is_a_grammar_error() {
        let mut reader = Reader::new(RecordingSink::new());
        let err = reader.feed(b"{a\\:b:1}").unwrap_err();
        // `\` is not a word byte, so `a` ends the word and the reader
        // expects `:` immediately; it instead sees `\`.
        assert_eq!(err.kind, ReadErrorKind::MissingColon);
    }

    #[test]
    fn scenario_5_is_covered_by_the_writer_tests() {
        // See writer::tests::array_of_primitives_matches_scenario_five.
    }

    #[test]
    fn scenario_6_chunk_boundary_inside_an_array() {
        let mut reader = Reader::new(RecordingSink::new());
        let first = reader.feed(b"[1,").unwrap();
        let second = reader.feed(b"2,3]").unwrap();
        assert_eq!(first + second, 7);
        let events = reader.destroy().into_events();
        use OwnedEvent::*;
        assert_eq!(
            events,
            vec![
                ArrayBegin,
                Primitive(b"1".to_vec()),
                Primitive(b"2".to_vec()),
                Primitive(b"3".to_vec()),
                ArrayEnd,
            ]
        );
    }

    #[test]
    fn chunking_is_transparent_across_every_byte_boundary() {
        let whole = b"{a:1,b:[2,(T)3,{}],}";
        let baseline = events(whole);
        for split in 0..=whole.len() {
            let mut reader = Reader::new(RecordingSink::new());
            let mut total = 0usize;
            let first = reader.feed(&whole[..split]).unwrap();
            total += first;
            let mut pending = whole[first..split].to_vec();
            pending.extend_from_slice(&whole[split..]);
            total += reader.feed(&pending).unwrap();
            assert_eq!(total, whole.len(), "split at {split}");
            assert_eq!(reader.destroy().into_events(), baseline, "split at {split}");
        }
    }

    #[test]
    fn escaped_quote_and_backslash_round_trip_through_a_primitive() {
        assert_eq!(
            events(br#"["a\"b\\c"]"#),
            vec![
                OwnedEvent::ArrayBegin,
                OwnedEvent::Primitive(b"a\"b\\c".to_vec()),
                OwnedEvent::ArrayEnd,
            ]
        );
    }

    #[test]
    fn empty_object_and_array_bypass_key_value_parsing() {
        assert_eq!(
            events(b"[{},[]]"),
            vec![
                OwnedEvent::ArrayBegin,
                OwnedEvent::ObjectBegin,
                OwnedEvent::ObjectEnd,
                OwnedEvent::ArrayBegin,
                OwnedEvent::ArrayEnd,
                OwnedEvent::ArrayEnd,
            ]
        );
    }

    #[test]
    fn missing_comma_between_array_elements_is_an_error() {
        let mut reader = Reader::new(RecordingSink::new());
        let err = reader.feed(b"[1 2]").unwrap_err();
        assert_eq!(err.kind, ReadErrorKind::MissingComma);
    }

    #[test]
    fn stray_closing_brace_at_root_is_an_invalid_value() {
        let mut reader = Reader::new(RecordingSink::new());
        let err = reader.feed(b"}").unwrap_err();
        assert_eq!(err.kind, ReadErrorKind::InvalidValue);
    }

    #[test]
    fn callback_returning_false_aborts_with_callback_rejected() {
        struct Refuse;
        impl ReaderSink for Refuse {
            fn primitive(&mut self, _bytes: &[u8]) -> bool {
                false
            }
        }
        let mut reader = Reader::new(Refuse);
        // The trailing `,` terminates the word so `read_word` can
        // complete and hand "hello" to the (refusing) callback; a bare
        // `b"hello"` would just stay hungry forever, since more word
        // bytes could always be the next chunk.
        let err = reader.feed(b"hello,").unwrap_err();
        assert_eq!(err.kind, ReadErrorKind::CallbackRejected);
    }

    #[test]
    fn root_with_no_closing_bracket_stays_hungry_at_eof() {
        // The trailing `,` is consumed and committed as soon as it's
        // seen; only deciding what comes *after* it (another element,
        // since the root never closes) needs more bytes than are on
        // hand, so that decision - not the comma - is what's left
        // hungry at end of input.
        let mut reader = Reader::new(RecordingSink::new());
        let consumed = reader.feed(b"1,2,3,").unwrap();
        assert_eq!(consumed, 6);
        assert!(reader.error().is_none());
        assert_eq!(
            reader.destroy().into_events(),
            vec![
                OwnedEvent::Primitive(b"1".to_vec()),
                OwnedEvent::Primitive(b"2".to_vec()),
                OwnedEvent::Primitive(b"3".to_vec()),
            ]
        );
    }

    #[test]
    fn error_latches_the_reader() {
        let mut reader = Reader::new(RecordingSink::new());
        let first = reader.feed(b"}").unwrap_err();
        assert_eq!(first.kind, ReadErrorKind::InvalidValue);
        // The latch returns the same error again without even looking
        // at the new input.
        let second = reader.feed(b"1,2,3").unwrap_err();
        assert_eq!(second, first);
    }

    #[test]
    fn depth_tracks_open_containers_and_returns_to_zero() {
        let mut reader = Reader::new(RecordingSink::new());
        reader.feed(b"[1,{a:[2,3],").unwrap();
        assert_eq!(reader.depth(), 2, "inside the outer array and the inner object");
        reader.feed(b"b:4},5]").unwrap();
        assert_eq!(reader.depth(), 0);
        assert!(reader.error().is_none());
    }

    macro_rules! error_kind_test {
        ($name:ident, $input:expr, $kind:expr) => {
            paste::paste! {
                #[test_log::test]
                fn [<error_kind_ $name>]() {
                    let mut reader = Reader::new(RecordingSink::new());
                    let err = reader.feed($input).unwrap_err();
                    assert_eq!(err.kind, $kind);
                }
            }
        };
    }

    error_kind_test!(missing_colon_after_unquoted_key, b"{a 1}", ReadErrorKind::MissingColon);
    error_kind_test!(missing_comma_between_object_entries, b"{a:1 b:2}", ReadErrorKind::MissingComma);
    error_kind_test!(invalid_value_from_stray_closer, b")", ReadErrorKind::InvalidValue);
}
