//! End-to-end decode tests over synthetic demo files on disk.

use hldemo::model::{DIR_ENTRY_SIZE, HEADER_SIZE};
use hldemo::{decode_file, DemoError, EntryKind, FrameBody};
use hldemo_test_utils::{DemoBuilder, FrameStream};

/// Write the bytes to a real temp file and hand back its guard.
fn write_demo(bytes: &[u8]) -> tempfile::NamedTempFile {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), bytes).unwrap();
    file
}

fn minimal_stream() -> FrameStream {
    let mut stream = FrameStream::new();
    stream.demo_start(0.0, 0).next_section(0.0, 1);
    stream
}

#[test]
fn minimal_demo_decodes() {
    let mut stream = FrameStream::new();
    stream.demo_start(0.1, 0).next_section(0.2, 1);
    let bytes = DemoBuilder::new()
        .protocols(5, 48)
        .game_dir("valve")
        .crc(0x1234_5678)
        .entry(0, "LOADING", 0.0, stream)
        .build();
    let expected_len = bytes.len();
    let file = write_demo(&bytes);

    let demo = decode_file(file.path()).unwrap();
    assert_eq!(demo.header.demo_protocol, 5);
    assert_eq!(demo.header.net_protocol, 48);
    assert_eq!(demo.header.game_dir, "valve");
    assert_eq!(demo.header.crc, 0x1234_5678);
    assert_eq!(demo.duration, 0.0);

    assert_eq!(demo.entries.len(), 1);
    let entry = &demo.entries[0];
    assert_eq!(entry.kind, EntryKind::Loading);
    assert_eq!(entry.description, "LOADING");
    assert_eq!(entry.offset as u64, HEADER_SIZE);
    assert_eq!(entry.length as usize, 2 * 9); // two payload-free frames
    assert_eq!(
        entry.offset as usize + entry.length as usize + 4 + DIR_ENTRY_SIZE as usize,
        expected_len,
        "the stream and directory account for every byte written"
    );

    assert_eq!(entry.frames.len(), 2);
    assert_eq!(entry.frames[0].body, FrameBody::DemoStart);
    assert_eq!(entry.frames[0].time, 0.1);
    assert_eq!(entry.frames[1].body, FrameBody::NextSection);
    assert_eq!(entry.frames[1].index, 1);
}

#[test]
fn file_below_structural_minimum_is_too_small() {
    // One byte short of header + one directory entry.
    let bytes = vec![0u8; (HEADER_SIZE + DIR_ENTRY_SIZE) as usize - 1];
    let file = write_demo(&bytes);
    assert!(matches!(
        decode_file(file.path()),
        Err(DemoError::TooSmall { size, required })
            if size == HEADER_SIZE + DIR_ENTRY_SIZE - 1 && required == HEADER_SIZE + DIR_ENTRY_SIZE
    ));
}

#[test]
fn wrong_signature_is_rejected() {
    let bytes = DemoBuilder::new()
        .signature(*b"HLDEMQ\0\0")
        .entry(0, "seg", 0.0, minimal_stream())
        .build();
    let file = write_demo(&bytes);
    assert!(matches!(
        decode_file(file.path()),
        Err(DemoError::BadSignature { found }) if &found == b"HLDEMQ"
    ));
}

#[test]
fn directory_count_out_of_range_is_rejected() {
    for count in [0u32, 1025] {
        let bytes = DemoBuilder::new()
            .entry(0, "seg", 0.0, minimal_stream())
            .directory_count(count)
            .build();
        let file = write_demo(&bytes);
        assert!(matches!(
            decode_file(file.path()),
            Err(DemoError::InvalidDirectoryCount { count: found }) if found == count
        ));
    }
}

#[test]
fn directory_count_bounds_succeed() {
    // Lower bound: exactly one entry.
    let bytes = DemoBuilder::new()
        .entry(0, "only", 0.0, minimal_stream())
        .build();
    let file = write_demo(&bytes);
    assert_eq!(decode_file(file.path()).unwrap().entries.len(), 1);

    // Upper bound: 1024 entries, each with its own two-frame stream.
    let mut builder = DemoBuilder::new();
    for i in 0..1024 {
        builder = builder.entry(0, &format!("seg{i}"), 0.0, minimal_stream());
    }
    let file = write_demo(&builder.build());
    let demo = decode_file(file.path()).unwrap();
    assert_eq!(demo.entries.len(), 1024);
    assert_eq!(demo.entries[1023].description, "seg1023");
    assert_eq!(demo.entries[1023].frames.len(), 2);
}

#[test]
fn last_playback_entry_wins_duration() {
    let bytes = DemoBuilder::new()
        .entry(1, "first playback", 12.5, minimal_stream())
        .entry(1, "second playback", 99.0, minimal_stream())
        .entry(0, "trailing loading", 7.0, minimal_stream())
        .build();
    let file = write_demo(&bytes);
    let demo = decode_file(file.path()).unwrap();
    assert_eq!(demo.duration, 99.0);
    assert_eq!(demo.entries[1].kind, EntryKind::Playback);
    assert_eq!(demo.entries[2].kind, EntryKind::Loading);
}

#[test]
fn demo_without_playback_entry_has_zero_duration() {
    let bytes = DemoBuilder::new()
        .entry(0, "loading only", 33.0, minimal_stream())
        .build();
    let file = write_demo(&bytes);
    assert_eq!(decode_file(file.path()).unwrap().duration, 0.0);
}

#[test]
fn unknown_entry_kind_maps_to_unknown() {
    let bytes = DemoBuilder::new()
        .entry(7, "weird", 0.0, minimal_stream())
        .build();
    let file = write_demo(&bytes);
    let demo = decode_file(file.path()).unwrap();
    assert_eq!(demo.entries[0].kind, EntryKind::Unknown);
}

#[test]
fn every_frame_kind_round_trips() {
    let mut stream = FrameStream::new();
    stream
        .demo_start(0.0, 0)
        .console_command(0.1, 1, "impulse 101")
        .client_data(0.2, 2, [1.0, 2.0, 3.0], [4.0, 5.0, 6.0], 0xFF, 110.0)
        .event(0.3, 3, 12)
        .weapon_anim(0.4, 4, 2, 1)
        .sound(0.5, 5, 1, b"weapons/ak47-1.wav")
        .demo_buffer(0.6, 6, &[1, 2, 3])
        .game_data(0.7, 7, 1, &[0xAA, 0xBB])
        .next_section(0.8, 8);
    let bytes = DemoBuilder::new().entry(1, "playback", 42.0, stream).build();
    let file = write_demo(&bytes);

    let demo = decode_file(file.path()).unwrap();
    assert_eq!(demo.duration, 42.0);
    let frames = &demo.entries[0].frames;
    assert_eq!(frames.len(), 9);

    assert_eq!(frames[0].body, FrameBody::DemoStart);
    assert_eq!(
        frames[1].body,
        FrameBody::ConsoleCommand {
            command: "impulse 101".into()
        }
    );
    let FrameBody::ClientData(ref cd) = frames[2].body else {
        panic!("expected client data");
    };
    assert_eq!(cd.origin, [1.0, 2.0, 3.0]);
    assert_eq!(cd.fov, 110.0);
    let FrameBody::Event(ref event) = frames[3].body else {
        panic!("expected an event");
    };
    assert_eq!(event.index, 12);
    assert_eq!(frames[4].body, FrameBody::WeaponAnim { anim: 2, body: 1 });
    let FrameBody::Sound(ref sound) = frames[5].body else {
        panic!("expected a sound");
    };
    assert_eq!(sound.sample, b"weapons/ak47-1.wav");
    assert_eq!(
        frames[6].body,
        FrameBody::DemoBuffer {
            buffer: vec![1, 2, 3]
        }
    );
    let FrameBody::GameData(ref gd) = frames[7].body else {
        panic!("expected game data");
    };
    assert_eq!(gd.kind, 1);
    assert_eq!(gd.payload, vec![0xAA, 0xBB]);
    assert_eq!(frames[8].body, FrameBody::NextSection);

    // Timestamps and indices rode along on every frame head.
    assert_eq!(frames[5].time, 0.5);
    assert_eq!(frames[5].index, 5);
}

#[test]
fn sound_sample_length_beats_embedded_nuls() {
    // Five declared bytes with NULs inside: the read consumes exactly five
    // bytes, and the following frames prove nothing desynchronized.
    let mut stream = FrameStream::new();
    stream
        .sound(0.0, 0, 3, b"a\0b\0c")
        .weapon_anim(0.1, 1, 9, 9)
        .next_section(0.2, 2);
    let bytes = DemoBuilder::new().entry(0, "seg", 0.0, stream).build();
    let file = write_demo(&bytes);

    let demo = decode_file(file.path()).unwrap();
    let frames = &demo.entries[0].frames;
    assert_eq!(frames.len(), 3);
    let FrameBody::Sound(ref sound) = frames[0].body else {
        panic!("expected a sound");
    };
    assert_eq!(sound.sample, b"a\0b\0c");
    assert_eq!(frames[1].body, FrameBody::WeaponAnim { anim: 9, body: 9 });
}

#[test]
fn corrupt_frame_stream_fails_the_decode() {
    // A sound frame that declares far more sample bytes than the file holds.
    let mut stream = FrameStream::new();
    stream
        .raw(&[hldemo::model::FRAME_SOUND])
        .raw(&0.0f32.to_le_bytes())
        .raw(&0u32.to_le_bytes())
        .raw(&0i32.to_le_bytes()) // channel
        .raw(&0x00FF_0000u32.to_le_bytes()); // declared sample length
    let bytes = DemoBuilder::new().entry(0, "seg", 0.0, stream).build();
    let file = write_demo(&bytes);
    assert!(matches!(
        decode_file(file.path()),
        Err(DemoError::BufferExhausted { .. })
    ));
}

#[test]
fn negative_directory_offset_is_rejected_not_a_panic() {
    // A negative offset sign-extends into a huge forward seek; that must
    // surface as a structured error, never an arithmetic panic.
    let mut bytes = DemoBuilder::new()
        .entry(0, "seg", 0.0, minimal_stream())
        .build();
    let slot = HEADER_SIZE as usize - 4;
    bytes[slot..slot + 4].copy_from_slice(&(-1i32).to_le_bytes());
    let file = write_demo(&bytes);
    assert!(matches!(
        decode_file(file.path()),
        Err(DemoError::BufferExhausted { .. })
    ));
}

#[test]
fn negative_entry_offset_yields_no_frames() {
    let bytes = DemoBuilder::new()
        .entry(0, "real", 0.0, minimal_stream())
        .entry_at_offset(0, "ghost", 0.0, -5)
        .build();
    let file = write_demo(&bytes);
    let demo = decode_file(file.path()).unwrap();
    assert_eq!(demo.entries[0].frames.len(), 2);
    assert!(demo.entries[1].frames.is_empty());
}

#[test]
fn entry_pointing_past_the_file_yields_no_frames() {
    // The out-of-range seek exhausts the cursor before the first frame
    // head, which terminates the entry cleanly rather than failing.
    let bytes = DemoBuilder::new()
        .entry(0, "real", 0.0, minimal_stream())
        .entry_at_offset(0, "ghost", 0.0, i32::MAX)
        .build();
    let file = write_demo(&bytes);
    let demo = decode_file(file.path()).unwrap();
    assert_eq!(demo.entries[0].frames.len(), 2);
    assert!(demo.entries[1].frames.is_empty());
}

#[test]
fn decoder_open_then_decode_matches_entry_point() {
    let bytes = DemoBuilder::new()
        .entry(1, "playback", 5.0, minimal_stream())
        .build();
    let file = write_demo(&bytes);
    let via_decoder = hldemo::DemoDecoder::open(file.path()).unwrap().decode().unwrap();
    let via_entry_point = decode_file(file.path()).unwrap();
    assert_eq!(via_decoder, via_entry_point);
}
