// SPDX-License-Identifier: Apache-2.0

//! The writer's internal chunked buffer, used by the buffer sink.
//!
//! An ordered sequence of fixed-size chunks plus a running length. Bytes
//! are appended chunk by chunk, allocating a new chunk once the current
//! one fills; `render` copies everything into one exact-length
//! contiguous allocation.

const CHUNK_SIZE: usize = 256;

pub(crate) struct OutputBuffer {
    chunks: Vec<[u8; CHUNK_SIZE]>,
    used_in_last: usize,
    length: usize,
}

impl OutputBuffer {
    pub(crate) fn new() -> Self {
        Self {
            chunks: vec![[0u8; CHUNK_SIZE]],
            used_in_last: 0,
            length: 0,
        }
    }

    pub(crate) fn write(&mut self, bytes: &[u8]) {
        let mut remaining = bytes;
        while !remaining.is_empty() {
            if self.used_in_last == CHUNK_SIZE {
                self.chunks.push([0u8; CHUNK_SIZE]);
                self.used_in_last = 0;
            }
            let space = CHUNK_SIZE - self.used_in_last;
            let take = space.min(remaining.len());
            let last = self.chunks.last_mut().expect("at least one chunk");
            last[self.used_in_last..self.used_in_last + take].copy_from_slice(&remaining[..take]);
            self.used_in_last += take;
            remaining = &remaining[take..];
        }
        self.length += bytes.len();
    }

    pub(crate) fn len(&self) -> usize {
        self.length
    }

    pub(crate) fn render(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.length);
        let last_index = self.chunks.len() - 1;
        for (index, chunk) in self.chunks.iter().enumerate() {
            let used = if index == last_index {
                self.used_in_last
            } else {
                CHUNK_SIZE
            };
            out.extend_from_slice(&chunk[..used]);
        }
        out
    }
}
