//! Synthetic demo-file builders for hldemo tests.
//!
//! [`DemoBuilder`] assembles a complete in-memory demo file — header,
//! per-entry frame streams, and trailing directory with computed offsets —
//! and [`FrameStream`] assembles one entry's frame bytes. Override hooks
//! (`signature`, `directory_count`, `raw`) exist so tests can produce
//! deliberately malformed files for the failure paths.
//!
//! This is test tooling only: the library itself exposes no encoder.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use hldemo::model::{
    CONSOLE_COMMAND_SIZE, DIR_DESCRIPTION_SIZE, FRAME_CLIENT_DATA, FRAME_CONSOLE_COMMAND,
    FRAME_DEMO_BUFFER, FRAME_DEMO_START, FRAME_EVENT, FRAME_NEXT_SECTION, FRAME_SOUND,
    FRAME_WEAPON_ANIM, GAME_DIR_SIZE, HEADER_SIZE, MAP_NAME_SIZE,
};
use hldemo::SIGNATURE;

/// Size of the zeroed telemetry block a game-data frame carries.
const DEMO_INFO_SIZE: usize = 436;

fn push_i32(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn push_f32(buf: &mut Vec<u8>, v: f32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Write `text` into a fixed-size NUL-padded field.
///
/// Panics if `text` does not fit; fixtures should never silently truncate.
fn push_padded(buf: &mut Vec<u8>, text: &str, size: usize) {
    assert!(
        text.len() <= size,
        "fixture string {text:?} exceeds its {size}-byte field"
    );
    buf.extend_from_slice(text.as_bytes());
    buf.resize(buf.len() + (size - text.len()), 0);
}

/// Builds the frame bytes for one directory entry.
#[derive(Clone, Debug, Default)]
pub struct FrameStream {
    buf: Vec<u8>,
}

impl FrameStream {
    pub fn new() -> Self {
        Self::default()
    }

    fn head(&mut self, tag: u8, time: f32, index: u32) -> &mut Self {
        self.buf.push(tag);
        push_f32(&mut self.buf, time);
        push_u32(&mut self.buf, index);
        self
    }

    pub fn demo_start(&mut self, time: f32, index: u32) -> &mut Self {
        self.head(FRAME_DEMO_START, time, index)
    }

    pub fn next_section(&mut self, time: f32, index: u32) -> &mut Self {
        self.head(FRAME_NEXT_SECTION, time, index)
    }

    pub fn console_command(&mut self, time: f32, index: u32, command: &str) -> &mut Self {
        self.head(FRAME_CONSOLE_COMMAND, time, index);
        push_padded(&mut self.buf, command, CONSOLE_COMMAND_SIZE);
        self
    }

    pub fn client_data(
        &mut self,
        time: f32,
        index: u32,
        origin: [f32; 3],
        view_angles: [f32; 3],
        weapon_bits: i32,
        fov: f32,
    ) -> &mut Self {
        self.head(FRAME_CLIENT_DATA, time, index);
        for v in origin.into_iter().chain(view_angles) {
            push_f32(&mut self.buf, v);
        }
        push_i32(&mut self.buf, weapon_bits);
        push_f32(&mut self.buf, fov);
        self
    }

    /// Event frame with zeroed argument block except the event index.
    pub fn event(&mut self, time: f32, index: u32, event_index: i32) -> &mut Self {
        self.head(FRAME_EVENT, time, index);
        push_i32(&mut self.buf, 0); // flags
        push_i32(&mut self.buf, event_index);
        push_f32(&mut self.buf, 0.0); // delay
        self.buf.resize(self.buf.len() + 72, 0); // zeroed args block
        self
    }

    pub fn weapon_anim(&mut self, time: f32, index: u32, anim: i32, body: i32) -> &mut Self {
        self.head(FRAME_WEAPON_ANIM, time, index);
        push_i32(&mut self.buf, anim);
        push_i32(&mut self.buf, body);
        self
    }

    /// Sound frame; the sample bytes are written verbatim behind their
    /// declared length, embedded NULs included.
    pub fn sound(&mut self, time: f32, index: u32, channel: i32, sample: &[u8]) -> &mut Self {
        self.head(FRAME_SOUND, time, index);
        push_i32(&mut self.buf, channel);
        push_u32(&mut self.buf, sample.len() as u32);
        self.buf.extend_from_slice(sample);
        push_f32(&mut self.buf, 0.8); // attenuation
        push_f32(&mut self.buf, 1.0); // volume
        push_i32(&mut self.buf, 0); // flags
        push_i32(&mut self.buf, 100); // pitch
        self
    }

    pub fn demo_buffer(&mut self, time: f32, index: u32, data: &[u8]) -> &mut Self {
        self.head(FRAME_DEMO_BUFFER, time, index);
        push_u32(&mut self.buf, data.len() as u32);
        self.buf.extend_from_slice(data);
        self
    }

    /// Game-data frame under the given raw tag, with a zeroed telemetry
    /// block and sequence counters and the given network-message payload.
    pub fn game_data(&mut self, time: f32, index: u32, tag: u8, payload: &[u8]) -> &mut Self {
        self.head(tag, time, index);
        self.buf.resize(self.buf.len() + DEMO_INFO_SIZE, 0);
        for _ in 0..7 {
            push_i32(&mut self.buf, 0); // sequence counters
        }
        push_u32(&mut self.buf, payload.len() as u32);
        self.buf.extend_from_slice(payload);
        self
    }

    /// Append arbitrary bytes, for deliberately corrupt streams.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

struct EntrySpec {
    kind: u32,
    description: String,
    track_time: f32,
    offset_override: Option<i32>,
    frames: Vec<u8>,
}

/// Builds a complete demo file in memory.
///
/// Layout: header, then each entry's frame stream in order, then the
/// directory; the header's directory offset and each entry's stream offset
/// and length are computed during [`build`](Self::build).
pub struct DemoBuilder {
    signature: [u8; 8],
    demo_protocol: i32,
    net_protocol: i32,
    map_name: String,
    game_dir: String,
    crc: i32,
    entries: Vec<EntrySpec>,
    count_override: Option<u32>,
}

impl DemoBuilder {
    pub fn new() -> Self {
        let mut signature = [0u8; 8];
        signature[..SIGNATURE.len()].copy_from_slice(&SIGNATURE);
        Self {
            signature,
            demo_protocol: 5,
            net_protocol: 48,
            map_name: "crossfire".into(),
            game_dir: "valve".into(),
            crc: 0,
            entries: Vec::new(),
            count_override: None,
        }
    }

    pub fn signature(mut self, signature: [u8; 8]) -> Self {
        self.signature = signature;
        self
    }

    pub fn protocols(mut self, demo_protocol: i32, net_protocol: i32) -> Self {
        self.demo_protocol = demo_protocol;
        self.net_protocol = net_protocol;
        self
    }

    pub fn game_dir(mut self, game_dir: &str) -> Self {
        self.game_dir = game_dir.into();
        self
    }

    pub fn crc(mut self, crc: i32) -> Self {
        self.crc = crc;
        self
    }

    /// Add a directory entry whose frame stream is `frames`.
    /// Kind 0 is loading, 1 is playback.
    pub fn entry(mut self, kind: u32, description: &str, track_time: f32, frames: FrameStream) -> Self {
        self.entries.push(EntrySpec {
            kind,
            description: description.into(),
            track_time,
            offset_override: None,
            frames: frames.into_bytes(),
        });
        self
    }

    /// Add a directory entry pointing at an arbitrary byte offset, with no
    /// stream bytes of its own.
    pub fn entry_at_offset(
        mut self,
        kind: u32,
        description: &str,
        track_time: f32,
        offset: i32,
    ) -> Self {
        self.entries.push(EntrySpec {
            kind,
            description: description.into(),
            track_time,
            offset_override: Some(offset),
            frames: Vec::new(),
        });
        self
    }

    /// Write a directory count different from the real entry count, for
    /// the invalid-count failure paths.
    pub fn directory_count(mut self, count: u32) -> Self {
        self.count_override = Some(count);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.signature);
        push_i32(&mut out, self.demo_protocol);
        push_i32(&mut out, self.net_protocol);
        push_padded(&mut out, &self.map_name, MAP_NAME_SIZE);
        push_padded(&mut out, &self.game_dir, GAME_DIR_SIZE);
        push_i32(&mut out, self.crc);
        let dir_offset_slot = out.len();
        push_i32(&mut out, 0); // patched once the streams are placed
        assert_eq!(out.len() as u64, HEADER_SIZE, "header layout drifted");

        let mut offsets = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            match entry.offset_override {
                Some(offset) => offsets.push(offset),
                None => {
                    offsets.push(out.len() as i32);
                    out.extend_from_slice(&entry.frames);
                }
            }
        }

        let dir_offset = out.len() as i32;
        out[dir_offset_slot..dir_offset_slot + 4].copy_from_slice(&dir_offset.to_le_bytes());

        let count = self
            .count_override
            .unwrap_or(self.entries.len() as u32);
        push_u32(&mut out, count);
        for (entry, offset) in self.entries.iter().zip(offsets) {
            push_u32(&mut out, entry.kind);
            push_padded(&mut out, &entry.description, DIR_DESCRIPTION_SIZE);
            push_i32(&mut out, 0); // flags
            push_i32(&mut out, -1); // CD track
            push_f32(&mut out, entry.track_time);
            push_i32(&mut out, 0); // frame count hint
            push_i32(&mut out, offset);
            push_i32(&mut out, entry.frames.len() as i32);
        }
        out
    }
}

impl Default for DemoBuilder {
    fn default() -> Self {
        Self::new()
    }
}
