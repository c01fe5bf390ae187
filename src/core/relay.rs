//! Server-sent-event plumbing between the inference server and the browser.
//!
//! Upstream `data: ` lines are forwarded byte for byte. Independently, each JSON payload is parsed to
//! rebuild the assistant reply; payloads that don't parse are still forwarded, only their content is
//! left out of the rebuilt reply.

use bytes::{Bytes, BytesMut};
use serde::Deserialize;

pub const DATA_PREFIX: &str = "data: ";
pub const DONE_SENTINEL: &str = "[DONE]";

/// Parsed `data: ` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkDelta {
    /// Content fragment of the first choice, possibly empty.
    Parsed(String),
    /// End-of-stream sentinel.
    Done,
    /// Anything we couldn't make sense of.
    Unparsed,
}

#[derive(Deserialize)]
struct CompletionChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChoiceDelta,
}

#[derive(Deserialize, Default)]
struct ChoiceDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Payload of a data frame line, `None` for every other kind of line.
pub fn data_payload(line: &str) -> Option<&str> {
    line.strip_prefix(DATA_PREFIX)
}

pub fn parse_delta(payload: &str) -> ChunkDelta {
    let payload = payload.trim();
    if payload == DONE_SENTINEL {
        return ChunkDelta::Done;
    }

    match serde_json::from_str::<CompletionChunk>(payload) {
        Ok(chunk) => match chunk.choices.into_iter().next() {
            Some(choice) => ChunkDelta::Parsed(choice.delta.content.unwrap_or_default()),
            None => ChunkDelta::Unparsed,
        },
        Err(_) => ChunkDelta::Unparsed,
    }
}

/// Line as it is sent to the browser: the upstream line followed by an empty line.
pub fn frame(line: &str) -> Bytes {
    Bytes::from(format!("{line}\n\n"))
}

/// Rebuilds the assistant reply from parsed deltas.
#[derive(Debug, Default)]
pub struct ReplyAccumulator {
    text: String,
}

impl ReplyAccumulator {
    pub fn accept(&mut self, delta: ChunkDelta) {
        match delta {
            ChunkDelta::Parsed(fragment) => self.text.push_str(&fragment),
            ChunkDelta::Done | ChunkDelta::Unparsed => {}
        }
    }

    /// The complete reply, or `None` if nothing was received.
    pub fn finish(self) -> Option<String> {
        if self.text.is_empty() {
            None
        } else {
            Some(self.text)
        }
    }
}

/// Splits a byte stream into lines. Lines end at `\n`; a trailing `\r` is dropped.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: BytesMut,
    // Bytes of `pending` already known to hold no newline.
    scanned: usize,
}

impl LineSplitter {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(offset) = self.pending[self.scanned..]
            .iter()
            .position(|&byte| byte == b'\n')
        {
            let newline = self.scanned + offset;
            let raw = self.pending.split_to(newline + 1);
            lines.push(decode_line(&raw[..newline]));
            self.scanned = 0;
        }
        self.scanned = self.pending.len();
        lines
    }

    /// Whatever is left after the stream ended without a final newline.
    pub fn finish(self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            Some(decode_line(&self.pending))
        }
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}
