// SPDX-License-Identifier: Apache-2.0

//! An owned-copy convenience sink for hosts that would rather collect a
//! `Vec` of events than drive their own state machine from borrowed
//! byte slices.

use super::ReaderSink;

/// One structural event, with any associated bytes copied into an
/// owned buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnedEvent {
    ObjectBegin,
    ObjectEnd,
    ArrayBegin,
    ArrayEnd,
    Key(Vec<u8>),
    Type(Vec<u8>),
    Primitive(Vec<u8>),
}

/// A [`ReaderSink`] that records every event it receives, copying
/// borrowed byte slices into owned buffers so they outlive the
/// `feed` call that produced them.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Vec<OwnedEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Consumes the sink, returning everything recorded so far.
    pub fn into_events(self) -> Vec<OwnedEvent> {
        self.events
    }
}

impl ReaderSink for RecordingSink {
    fn object_begin(&mut self) -> bool {
        self.events.push(OwnedEvent::ObjectBegin);
        true
    }

    fn object_end(&mut self) -> bool {
        self.events.push(OwnedEvent::ObjectEnd);
        true
    }

    fn array_begin(&mut self) -> bool {
        self.events.push(OwnedEvent::ArrayBegin);
        true
    }

    fn array_end(&mut self) -> bool {
        self.events.push(OwnedEvent::ArrayEnd);
        true
    }

    fn key(&mut self, bytes: &[u8]) -> bool {
        self.events.push(OwnedEvent::Key(bytes.to_vec()));
        true
    }

    fn type_(&mut self, bytes: &[u8]) -> bool {
        self.events.push(OwnedEvent::Type(bytes.to_vec()));
        true
    }

    fn primitive(&mut self, bytes: &[u8]) -> bool {
        self.events.push(OwnedEvent::Primitive(bytes.to_vec()));
        true
    }
}
