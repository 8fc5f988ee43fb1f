// SPDX-License-Identifier: Apache-2.0

//! The reader's parse continuations: a tagged-variant stand-in for the
//! original source's stack of function pointers.
//!
//! Each [`Continuation`] is scheduled by popping it off the top of the
//! reader's stack and running it against the current input window; it
//! either reports `hungry` (left untouched, tried again on the next
//! `feed`), completes (popped, with zero or more new continuations
//! pushed in its place), or errors.

/// Which kind of container a `Next` continuation is watching for a `,`
/// or closing bracket in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Container {
    /// The implicit, unbracketed top-level sequence. Has no closing
    /// byte; running out of input here is just `hungry`, forever.
    Root,
    Object,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Continuation {
    /// Consume a maximal run of whitespace.
    Whitespace,
    /// Read a type body up to an unescaped `)`.
    Type,
    /// Read a primitive (quoted or word form). `is_key` selects whether
    /// the result is delivered via `key` or `primitive`.
    Primitive { is_key: bool },
    /// Require and consume `:`.
    KeySeparator,
    /// Decide whether a type annotation precedes the value, then hand
    /// off to `Value`.
    ValuePhrase,
    /// Dispatch on the next byte: `{`, `[`, or a primitive.
    Value,
    /// Require `,` or the container's closing byte (if any). On `,`,
    /// consume it and hand off to `CloseOrFrame` (the comma is
    /// committed immediately; what follows it is decided separately so
    /// a chunk boundary right after the comma doesn't lose progress).
    Next(Container),
    /// Runs after a `,` plus any whitespace has been consumed: if the
    /// container's closing byte is next, close the container; otherwise
    /// start another element.
    CloseOrFrame(Container),
}

impl Continuation {
    /// Pushes the continuations that parse one array element, in
    /// execution order (the last one pushed runs first).
    pub(crate) fn push_array_frame(stack: &mut Vec<Continuation>, container: Container) {
        stack.push(Continuation::Next(container));
        stack.push(Continuation::Whitespace);
        stack.push(Continuation::ValuePhrase);
        stack.push(Continuation::Whitespace);
    }

    /// Pushes the continuations that parse one object entry (`key :
    /// value_phrase`), in execution order.
    pub(crate) fn push_object_frame(stack: &mut Vec<Continuation>) {
        stack.push(Continuation::Next(Container::Object));
        stack.push(Continuation::Whitespace);
        stack.push(Continuation::ValuePhrase);
        stack.push(Continuation::Whitespace);
        stack.push(Continuation::KeySeparator);
        stack.push(Continuation::Whitespace);
        stack.push(Continuation::Primitive { is_key: true });
    }
}
