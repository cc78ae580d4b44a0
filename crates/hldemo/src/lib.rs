//! Decoder for GoldSrc `HLDEMO` demo recordings.
//!
//! A demo file is a binary capture of a client session: a fixed 544-byte
//! header, a directory of segment descriptors, and one heterogeneous,
//! tag-dispatched frame stream per segment. This crate decodes such a file
//! into a fully typed [`Demo`] model, rejecting malformed input with a
//! structured [`DemoError`]. It is strictly a decoder: no re-encoding, and
//! the network-message blobs embedded in game-data frames are exposed as
//! raw bytes, never interpreted.
//!
//! # Architecture
//!
//! - [`BitCursor`] — bit-addressable read head over an owned byte blob
//! - [`FileSource`] — lazy acquire/release of the blob backing a cursor
//! - [`model`] — header, directory, and frame variant definitions
//! - [`DemoDecoder`] / [`decode_file`] — the three-phase decode
//!
//! # Format
//!
//! ```text
//! [signature "HLDEMO\0\0"] [header: protocols, map, game dir, crc, dir offset]
//! [frame streams ...]
//! [directory: count u32, then 92-byte entries]
//! ```
//!
//! Each directory entry points at its frame stream: a run of
//! `[tag:u8][time:f32][index:u32]` records, each followed by a tag-specific
//! payload, terminated by a `next_section` record. All integers are
//! little-endian.
//!
//! # Examples
//!
//! ```no_run
//! let demo = hldemo::decode_file("session.dem")?;
//! println!(
//!     "{}: {} entries, {:.1}s",
//!     demo.header.game_dir,
//!     demo.entries.len(),
//!     demo.duration,
//! );
//! # Ok::<(), hldemo::DemoError>(())
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cursor;
pub mod decoder;
pub mod error;
pub mod model;
pub mod source;

pub use cursor::{BitCursor, SeekOrigin};
pub use decoder::{decode_file, DemoDecoder};
pub use error::DemoError;
pub use model::{Demo, DemoHeader, DirectoryEntry, EntryKind, Frame, FrameBody};
pub use source::FileSource;

/// The six signature bytes every demo file must start with.
///
/// The header stores the signature in an 8-byte field
/// ([`model::SIGNATURE_FIELD_SIZE`]); only these six are checked.
pub const SIGNATURE: [u8; 6] = *b"HLDEMO";
