//! Demo file decoding.
//!
//! [`DemoDecoder`] drives three strictly sequential phases over a
//! [`FileSource`]:
//!
//! 1. open and validate (minimum size, `HLDEMO` signature),
//! 2. header and directory,
//! 3. per-entry frame streams.
//!
//! Between phases 2 and 3 the byte blob is released and re-acquired: the
//! structural pass is cheap, and dropping the blob between passes bounds
//! peak memory for very large files.
//!
//! Decoding is all-or-nothing. Any read failure aborts the decode and
//! propagates; there is no recovery or frame skipping, because frames are
//! not self-describing in length and a misread field would silently
//! desynchronize every byte after it.

use std::path::PathBuf;

use crate::cursor::{BitCursor, SeekOrigin};
use crate::error::DemoError;
use crate::model::{
    ClientData, Demo, DemoHeader, DemoInfo, DirectoryEntry, EntryKind, Event, EventArgs, Frame,
    FrameBody, GameData, MoveVars, RefParams, Sound, UserCmd, CONSOLE_COMMAND_SIZE,
    DIR_DESCRIPTION_SIZE, DIR_ENTRY_SIZE, FRAME_CLIENT_DATA, FRAME_CONSOLE_COMMAND,
    FRAME_DEMO_BUFFER, FRAME_DEMO_START, FRAME_EVENT, FRAME_NEXT_SECTION, FRAME_SOUND,
    FRAME_WEAPON_ANIM, GAME_DIR_SIZE, HEADER_SIZE, MAP_NAME_SIZE, MAX_DIR_ENTRIES,
    MIN_DIR_ENTRIES, SIGNATURE_FIELD_SIZE, SKY_NAME_SIZE,
};
use crate::source::FileSource;
use crate::SIGNATURE;

/// Decode the demo file at `path` into a fully populated [`Demo`].
///
/// This is the single entry point most callers want; see [`DemoDecoder`]
/// for the phase-explicit form.
pub fn decode_file(path: impl Into<PathBuf>) -> Result<Demo, DemoError> {
    DemoDecoder::open(path)?.decode()
}

/// Drives the three-phase decode of one demo file.
#[derive(Debug)]
pub struct DemoDecoder {
    source: FileSource,
}

impl DemoDecoder {
    /// Open the file and check the structural minimum: the fixed header
    /// plus at least one directory entry must fit.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DemoError> {
        let source = FileSource::open(path)?;
        let required = HEADER_SIZE + u64::from(MIN_DIR_ENTRIES) * DIR_ENTRY_SIZE;
        if source.size() < required {
            return Err(DemoError::TooSmall {
                size: source.size(),
                required,
            });
        }
        Ok(Self { source })
    }

    /// Run the decode to completion, consuming the decoder.
    pub fn decode(mut self) -> Result<Demo, DemoError> {
        // Structural pass: signature, header, directory.
        self.source.acquire()?;
        let cursor = self.source.cursor_mut()?;
        check_signature(cursor)?;
        let header = decode_header(cursor)?;
        let (mut entries, duration) = decode_directory(cursor, &header)?;

        // Content pass: reload the blob and walk every entry's stream.
        self.source.release();
        self.source.acquire()?;
        let cursor = self.source.cursor_mut()?;
        for entry in &mut entries {
            entry.frames = decode_frame_stream(cursor, entry.offset)?;
        }

        Ok(Demo {
            header,
            duration,
            entries,
        })
    }
}

fn check_signature(cursor: &mut BitCursor) -> Result<(), DemoError> {
    let bytes = cursor.read_bytes(SIGNATURE.len())?;
    if bytes != SIGNATURE {
        let mut found = [0u8; 6];
        found.copy_from_slice(&bytes);
        return Err(DemoError::BadSignature { found });
    }
    Ok(())
}

fn decode_header(cursor: &mut BitCursor) -> Result<DemoHeader, DemoError> {
    // The stored signature field is 8 bytes; only 6 were checked.
    cursor.seek(SIGNATURE_FIELD_SIZE, SeekOrigin::Begin);
    let demo_protocol = cursor.read_i32()?;
    let net_protocol = cursor.read_i32()?;
    // Map name: informational only, never retained.
    cursor.read_fixed_string(MAP_NAME_SIZE)?;
    let game_dir = trim_padding(&cursor.read_fixed_string(GAME_DIR_SIZE)?);
    let crc = cursor.read_i32()?;
    let directory_offset = cursor.read_i32()?;
    Ok(DemoHeader {
        demo_protocol,
        net_protocol,
        game_dir,
        crc,
        directory_offset,
    })
}

fn decode_directory(
    cursor: &mut BitCursor,
    header: &DemoHeader,
) -> Result<(Vec<DirectoryEntry>, f32), DemoError> {
    cursor.seek(header.directory_offset as usize, SeekOrigin::Begin);
    let count = cursor.read_u32()?;
    if !(MIN_DIR_ENTRIES..=MAX_DIR_ENTRIES).contains(&count) {
        return Err(DemoError::InvalidDirectoryCount { count });
    }

    let mut entries = Vec::with_capacity(count as usize);
    let mut duration = 0.0f32;
    for _ in 0..count {
        let kind = EntryKind::from_raw(cursor.read_u32()?);
        let description = trim_padding(&cursor.read_fixed_string(DIR_DESCRIPTION_SIZE)?);
        let flags = cursor.read_i32()?;
        let cd_track = cursor.read_i32()?;
        let track_time = cursor.read_f32()?;
        let frame_hint = cursor.read_i32()?;
        let offset = cursor.read_i32()?;
        let length = cursor.read_i32()?;

        if kind == EntryKind::Playback {
            // Sequential overwrite: the last playback entry wins.
            duration = track_time;
        }

        entries.push(DirectoryEntry {
            kind,
            description,
            flags,
            cd_track,
            track_time,
            frame_hint,
            offset,
            length,
            frames: Vec::new(),
        });
    }
    Ok((entries, duration))
}

/// Decode one entry's frame stream, starting at `offset` bytes from the
/// start of the file.
///
/// The stream ends at a `next_section` frame (included in the result) or
/// when the cursor reports exhaustion before the next frame head. A read
/// that overruns mid-frame is an error, not a termination.
fn decode_frame_stream(cursor: &mut BitCursor, offset: i32) -> Result<Vec<Frame>, DemoError> {
    cursor.seek(offset as usize, SeekOrigin::Begin);
    let mut frames = Vec::new();
    loop {
        if cursor.is_exhausted() {
            break;
        }
        let tag = cursor.read_byte()?;
        let time = cursor.read_f32()?;
        let index = cursor.read_u32()?;
        let body = decode_frame_body(cursor, tag)?;
        let done = matches!(body, FrameBody::NextSection);
        frames.push(Frame { time, index, body });
        if done {
            break;
        }
    }
    Ok(frames)
}

fn decode_frame_body(cursor: &mut BitCursor, tag: u8) -> Result<FrameBody, DemoError> {
    let body = match tag {
        FRAME_DEMO_START => FrameBody::DemoStart,
        FRAME_CONSOLE_COMMAND => FrameBody::ConsoleCommand {
            command: trim_padding(&cursor.read_fixed_string(CONSOLE_COMMAND_SIZE)?),
        },
        FRAME_CLIENT_DATA => FrameBody::ClientData(ClientData {
            origin: read_vec3(cursor)?,
            view_angles: read_vec3(cursor)?,
            weapon_bits: cursor.read_i32()?,
            fov: cursor.read_f32()?,
        }),
        FRAME_NEXT_SECTION => FrameBody::NextSection,
        FRAME_EVENT => FrameBody::Event(decode_event(cursor)?),
        FRAME_WEAPON_ANIM => FrameBody::WeaponAnim {
            anim: cursor.read_i32()?,
            body: cursor.read_i32()?,
        },
        FRAME_SOUND => FrameBody::Sound(decode_sound(cursor)?),
        FRAME_DEMO_BUFFER => {
            let len = cursor.read_u32()? as usize;
            FrameBody::DemoBuffer {
                buffer: cursor.read_bytes(len)?,
            }
        }
        // Tags 0 and 1 both carry the game-data layout, as does anything
        // unlisted: GoldSrc routes every other tag through the same default
        // case. The raw tag is preserved on the payload.
        other => FrameBody::GameData(Box::new(decode_game_data(cursor, other)?)),
    };
    Ok(body)
}

fn decode_event(cursor: &mut BitCursor) -> Result<Event, DemoError> {
    Ok(Event {
        flags: cursor.read_i32()?,
        index: cursor.read_i32()?,
        delay: cursor.read_f32()?,
        args: EventArgs {
            flags: cursor.read_i32()?,
            entity_index: cursor.read_i32()?,
            origin: read_vec3(cursor)?,
            angles: read_vec3(cursor)?,
            velocity: read_vec3(cursor)?,
            ducking: cursor.read_i32()?,
            fparams: [cursor.read_f32()?, cursor.read_f32()?],
            iparams: [cursor.read_i32()?, cursor.read_i32()?],
            bparams: [cursor.read_i32()?, cursor.read_i32()?],
        },
    })
}

fn decode_sound(cursor: &mut BitCursor) -> Result<Sound, DemoError> {
    let channel = cursor.read_i32()?;
    // The declared length drives a raw byte read: embedded NUL bytes must
    // not terminate it the way a C-string read would.
    let sample_len = cursor.read_u32()? as usize;
    let sample = cursor.read_bytes(sample_len)?;
    Ok(Sound {
        channel,
        sample,
        attenuation: cursor.read_f32()?,
        volume: cursor.read_f32()?,
        flags: cursor.read_i32()?,
        pitch: cursor.read_i32()?,
    })
}

fn decode_game_data(cursor: &mut BitCursor, kind: u8) -> Result<GameData, DemoError> {
    let demo_info = decode_demo_info(cursor)?;
    let incoming_sequence = cursor.read_i32()?;
    let incoming_acknowledged = cursor.read_i32()?;
    let incoming_reliable_acknowledged = cursor.read_i32()?;
    let incoming_reliable_sequence = cursor.read_i32()?;
    let outgoing_sequence = cursor.read_i32()?;
    let reliable_sequence = cursor.read_i32()?;
    let last_reliable_sequence = cursor.read_i32()?;
    let payload_len = cursor.read_u32()? as usize;
    let payload = cursor.read_bytes(payload_len)?;
    Ok(GameData {
        kind,
        demo_info,
        incoming_sequence,
        incoming_acknowledged,
        incoming_reliable_acknowledged,
        incoming_reliable_sequence,
        outgoing_sequence,
        reliable_sequence,
        last_reliable_sequence,
        payload,
    })
}

fn decode_demo_info(cursor: &mut BitCursor) -> Result<DemoInfo, DemoError> {
    Ok(DemoInfo {
        timestamp: cursor.read_f32()?,
        ref_params: decode_ref_params(cursor)?,
        user_cmd: decode_user_cmd(cursor)?,
        move_vars: decode_move_vars(cursor)?,
        view: read_vec3(cursor)?,
        viewmodel: cursor.read_i32()?,
    })
}

fn decode_ref_params(cursor: &mut BitCursor) -> Result<RefParams, DemoError> {
    Ok(RefParams {
        view_origin: read_vec3(cursor)?,
        view_angles: read_vec3(cursor)?,
        forward: read_vec3(cursor)?,
        right: read_vec3(cursor)?,
        up: read_vec3(cursor)?,
        frame_time: cursor.read_f32()?,
        time: cursor.read_f32()?,
        intermission: cursor.read_i32()?,
        paused: cursor.read_i32()?,
        spectator: cursor.read_i32()?,
        on_ground: cursor.read_i32()?,
        water_level: cursor.read_i32()?,
        sim_velocity: read_vec3(cursor)?,
        sim_origin: read_vec3(cursor)?,
        view_height: read_vec3(cursor)?,
        ideal_pitch: cursor.read_f32()?,
        client_view_angles: read_vec3(cursor)?,
        health: cursor.read_i32()?,
        crosshair_angle: read_vec3(cursor)?,
        view_size: cursor.read_f32()?,
        punch_angle: read_vec3(cursor)?,
        max_clients: cursor.read_i32()?,
        view_entity: cursor.read_i32()?,
        player_num: cursor.read_i32()?,
        max_entities: cursor.read_i32()?,
        demo_playback: cursor.read_i32()?,
        hardware: cursor.read_i32()?,
        smoothing: cursor.read_i32()?,
        cmd_ptr: cursor.read_i32()?,
        movevars_ptr: cursor.read_i32()?,
        viewport: [
            cursor.read_i32()?,
            cursor.read_i32()?,
            cursor.read_i32()?,
            cursor.read_i32()?,
        ],
        next_view: cursor.read_i32()?,
        only_client_draw: cursor.read_i32()?,
    })
}

fn decode_user_cmd(cursor: &mut BitCursor) -> Result<UserCmd, DemoError> {
    Ok(UserCmd {
        lerp_msec: cursor.read_i16()?,
        msec: cursor.read_byte()?,
        pad1: cursor.read_byte()?,
        view_angles: read_vec3(cursor)?,
        forward_move: cursor.read_f32()?,
        side_move: cursor.read_f32()?,
        up_move: cursor.read_f32()?,
        light_level: cursor.read_i8()?,
        pad2: cursor.read_byte()?,
        buttons: cursor.read_u16()?,
        impulse: cursor.read_i8()?,
        weapon_select: cursor.read_i8()?,
        pad3: [cursor.read_byte()?, cursor.read_byte()?],
        impact_index: cursor.read_i32()?,
        impact_position: read_vec3(cursor)?,
    })
}

fn decode_move_vars(cursor: &mut BitCursor) -> Result<MoveVars, DemoError> {
    Ok(MoveVars {
        gravity: cursor.read_f32()?,
        stop_speed: cursor.read_f32()?,
        max_speed: cursor.read_f32()?,
        spectator_max_speed: cursor.read_f32()?,
        accelerate: cursor.read_f32()?,
        air_accelerate: cursor.read_f32()?,
        water_accelerate: cursor.read_f32()?,
        friction: cursor.read_f32()?,
        edge_friction: cursor.read_f32()?,
        water_friction: cursor.read_f32()?,
        entity_gravity: cursor.read_f32()?,
        bounce: cursor.read_f32()?,
        step_size: cursor.read_f32()?,
        max_velocity: cursor.read_f32()?,
        z_max: cursor.read_f32()?,
        wave_height: cursor.read_f32()?,
        footsteps: cursor.read_i32()?,
        sky_name: trim_padding(&cursor.read_fixed_string(SKY_NAME_SIZE)?),
        roll_angle: cursor.read_f32()?,
        roll_speed: cursor.read_f32()?,
        sky_color: read_vec3(cursor)?,
        sky_vec: read_vec3(cursor)?,
    })
}

fn read_vec3(cursor: &mut BitCursor) -> Result<[f32; 3], DemoError> {
    Ok([cursor.read_f32()?, cursor.read_f32()?, cursor.read_f32()?])
}

/// Cut a fixed-size string field at its first NUL; padded fields retained
/// in the model keep only the text before the padding.
fn trim_padding(s: &str) -> String {
    match s.find('\0') {
        Some(i) => s[..i].to_owned(),
        None => s.to_owned(),
    }
}
