//! Data model for a decoded demo recording.
//!
//! Layout constants and frame-type tags mirror the on-disk format exactly;
//! see the crate docs for the byte layout. Everything here is plain owned
//! data: the model is built once during decoding and immutable afterwards.

// ── Wire layout constants (all sizes in bytes) ──────────────────

/// Total size of the fixed file header.
pub const HEADER_SIZE: u64 = 544;
/// Size of the stored signature field (the 6 checked bytes plus padding).
pub const SIGNATURE_FIELD_SIZE: usize = 8;
/// Size of the padded map name field in the header.
pub const MAP_NAME_SIZE: usize = 260;
/// Size of the padded game directory field in the header.
pub const GAME_DIR_SIZE: usize = 260;
/// Minimum number of directory entries a valid file can declare.
pub const MIN_DIR_ENTRIES: u32 = 1;
/// Maximum number of directory entries a valid file can declare.
pub const MAX_DIR_ENTRIES: u32 = 1024;
/// Size of one directory entry.
pub const DIR_ENTRY_SIZE: u64 = 92;
/// Size of the padded description field in a directory entry.
pub const DIR_DESCRIPTION_SIZE: usize = 64;
/// Size of the fixed command string in a console-command frame.
pub const CONSOLE_COMMAND_SIZE: usize = 64;
/// Size of the padded sky-texture name inside the move variables.
pub const SKY_NAME_SIZE: usize = 32;

// ── Frame type tags ─────────────────────────────────────────────
//
// Tags 0 and 1 (and anything unlisted) carry the game-data layout; the
// named tags below each select a fixed payload shape.

/// Frame tag for [`FrameBody::DemoStart`].
pub const FRAME_DEMO_START: u8 = 2;
/// Frame tag for [`FrameBody::ConsoleCommand`].
pub const FRAME_CONSOLE_COMMAND: u8 = 3;
/// Frame tag for [`FrameBody::ClientData`].
pub const FRAME_CLIENT_DATA: u8 = 4;
/// Frame tag for [`FrameBody::NextSection`].
pub const FRAME_NEXT_SECTION: u8 = 5;
/// Frame tag for [`FrameBody::Event`].
pub const FRAME_EVENT: u8 = 6;
/// Frame tag for [`FrameBody::WeaponAnim`].
pub const FRAME_WEAPON_ANIM: u8 = 7;
/// Frame tag for [`FrameBody::Sound`].
pub const FRAME_SOUND: u8 = 8;
/// Frame tag for [`FrameBody::DemoBuffer`].
pub const FRAME_DEMO_BUFFER: u8 = 9;

// ── Header and directory ────────────────────────────────────────

/// Fixed header fields of a demo file.
///
/// The 260-byte map name that sits between the protocol pair and the game
/// directory on disk is informational only and is not retained.
#[derive(Clone, Debug, PartialEq)]
pub struct DemoHeader {
    /// Demo file protocol version.
    pub demo_protocol: i32,
    /// Network protocol version the session was recorded under.
    pub net_protocol: i32,
    /// Game directory (e.g. `"valve"`, `"cstrike"`), NUL padding trimmed.
    pub game_dir: String,
    /// CRC32 checksum recorded by the engine.
    pub crc: i32,
    /// Byte offset of the directory from the start of the file.
    pub directory_offset: i32,
}

/// Kind tag of a directory entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    /// Segment recorded while the level was loading.
    Loading,
    /// The playback segment; its track time is the session duration.
    Playback,
    /// Any unrecognized kind value.
    Unknown,
}

impl EntryKind {
    /// Map the raw on-disk kind value (0 = loading, 1 = playback).
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::Loading,
            1 => Self::Playback,
            _ => Self::Unknown,
        }
    }
}

/// One table-of-contents record describing a segment of the recording and
/// the frame stream decoded from it.
#[derive(Clone, Debug, PartialEq)]
pub struct DirectoryEntry {
    /// Segment kind.
    pub kind: EntryKind,
    /// Free-text description, NUL padding trimmed.
    pub description: String,
    /// Entry flags.
    pub flags: i32,
    /// CD track index, or a negative value when unused.
    pub cd_track: i32,
    /// Segment duration in seconds.
    pub track_time: f32,
    /// Frame count hint recorded by the engine; not authoritative.
    pub frame_hint: i32,
    /// Byte offset into the file where this entry's frame stream begins.
    pub offset: i32,
    /// Byte length of this entry's frame stream.
    pub length: i32,
    /// Frames decoded from this entry's stream, in stream order.
    pub frames: Vec<Frame>,
}

// ── Frames ──────────────────────────────────────────────────────

/// One timestamped record within a segment's frame stream.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Timestamp in seconds.
    pub time: f32,
    /// Frame index. Intended to be monotonic but the format does not
    /// guarantee strict increase; callers must not assume it.
    pub index: u32,
    /// Kind-specific payload.
    pub body: FrameBody,
}

/// The payload of a frame, selected by its one-byte tag.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameBody {
    /// Start of the recording; no payload.
    DemoStart,
    /// A console command executed during the session.
    ConsoleCommand {
        /// The command text, NUL padding trimmed from its 64-byte field.
        command: String,
    },
    /// Local player view state.
    ClientData(ClientData),
    /// Terminates the current directory entry's frame stream; no payload.
    NextSection,
    /// A fired game event with its argument block.
    Event(Event),
    /// A viewmodel animation change.
    WeaponAnim {
        /// Animation sequence id.
        anim: i32,
        /// Body group id.
        body: i32,
    },
    /// A sound started on some channel.
    Sound(Sound),
    /// An opaque buffer the engine stashed into the demo.
    DemoBuffer {
        /// Raw buffer contents, length-prefixed on disk.
        buffer: Vec<u8>,
    },
    /// A telemetry block plus an embedded network-message payload.
    ///
    /// Boxed: the telemetry block is two orders of magnitude larger than
    /// every other variant.
    GameData(Box<GameData>),
}

/// Payload of a client-data frame.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientData {
    /// Player origin.
    pub origin: [f32; 3],
    /// Player view angles.
    pub view_angles: [f32; 3],
    /// Bitmask of carried weapons.
    pub weapon_bits: i32,
    /// Field of view in degrees.
    pub fov: f32,
}

/// Payload of an event frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Event flags.
    pub flags: i32,
    /// Event index.
    pub index: i32,
    /// Delay before the event fires, in seconds.
    pub delay: f32,
    /// The event's argument block.
    pub args: EventArgs,
}

/// Argument block nested inside an event frame.
#[derive(Clone, Debug, PartialEq)]
pub struct EventArgs {
    /// Argument flags.
    pub flags: i32,
    /// Index of the entity the event is attached to.
    pub entity_index: i32,
    /// Event origin.
    pub origin: [f32; 3],
    /// Event angles.
    pub angles: [f32; 3],
    /// Event velocity.
    pub velocity: [f32; 3],
    /// Nonzero if the entity is ducking.
    pub ducking: i32,
    /// Free-form float parameters.
    pub fparams: [f32; 2],
    /// Free-form integer parameters.
    pub iparams: [i32; 2],
    /// Free-form byte-sized parameters, widened on disk to 32 bits.
    pub bparams: [i32; 2],
}

/// Payload of a sound frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Sound {
    /// Sound channel.
    pub channel: i32,
    /// Sample name bytes. Length-prefixed on disk; embedded NUL bytes are
    /// preserved verbatim.
    pub sample: Vec<u8>,
    /// Attenuation factor.
    pub attenuation: f32,
    /// Playback volume.
    pub volume: f32,
    /// Sound flags.
    pub flags: i32,
    /// Playback pitch.
    pub pitch: i32,
}

// ── Game data ───────────────────────────────────────────────────

/// Payload shared by frame tags 0 and 1: a fixed-layout telemetry block
/// followed by an embedded network-message blob.
///
/// The two tags distinguish server-sent-unacknowledged from sent messages
/// in the originating engine, but the layout is identical, so only the raw
/// tag value is preserved.
#[derive(Clone, Debug, PartialEq)]
pub struct GameData {
    /// The raw frame tag this block was read under (0 or 1 in well-formed
    /// files).
    pub kind: u8,
    /// Render and movement telemetry captured with the frame.
    pub demo_info: DemoInfo,
    /// Incoming sequence number.
    pub incoming_sequence: i32,
    /// Last acknowledged incoming sequence number.
    pub incoming_acknowledged: i32,
    /// Last acknowledged incoming reliable sequence number.
    pub incoming_reliable_acknowledged: i32,
    /// Incoming reliable sequence number.
    pub incoming_reliable_sequence: i32,
    /// Outgoing sequence number.
    pub outgoing_sequence: i32,
    /// Reliable sequence number.
    pub reliable_sequence: i32,
    /// Last reliable sequence number.
    pub last_reliable_sequence: i32,
    /// The embedded network-message blob, exposed verbatim and never
    /// interpreted here.
    pub payload: Vec<u8>,
}

/// The 436-byte telemetry block inside a game-data frame.
#[derive(Clone, Debug, PartialEq)]
pub struct DemoInfo {
    /// Capture timestamp.
    pub timestamp: f32,
    /// Render reference parameters.
    pub ref_params: RefParams,
    /// The user command captured with the frame.
    pub user_cmd: UserCmd,
    /// Server movement variables.
    pub move_vars: MoveVars,
    /// View origin.
    pub view: [f32; 3],
    /// Viewmodel entity index.
    pub viewmodel: i32,
}

/// Render reference parameters (232 bytes on the wire).
#[derive(Clone, Debug, PartialEq)]
pub struct RefParams {
    /// View origin.
    pub view_origin: [f32; 3],
    /// View angles.
    pub view_angles: [f32; 3],
    /// Forward basis vector.
    pub forward: [f32; 3],
    /// Right basis vector.
    pub right: [f32; 3],
    /// Up basis vector.
    pub up: [f32; 3],
    /// Duration of the frame.
    pub frame_time: f32,
    /// Client time.
    pub time: f32,
    /// Nonzero during intermission.
    pub intermission: i32,
    /// Nonzero while paused.
    pub paused: i32,
    /// Nonzero while spectating.
    pub spectator: i32,
    /// Nonzero while on the ground.
    pub on_ground: i32,
    /// Water level of the view entity.
    pub water_level: i32,
    /// Simulated velocity.
    pub sim_velocity: [f32; 3],
    /// Simulated origin.
    pub sim_origin: [f32; 3],
    /// View height offset.
    pub view_height: [f32; 3],
    /// Ideal pitch.
    pub ideal_pitch: f32,
    /// Client view angles.
    pub client_view_angles: [f32; 3],
    /// Player health.
    pub health: i32,
    /// Crosshair angle offset.
    pub crosshair_angle: [f32; 3],
    /// View size.
    pub view_size: f32,
    /// Weapon punch angle.
    pub punch_angle: [f32; 3],
    /// Server max clients.
    pub max_clients: i32,
    /// Entity the view is attached to.
    pub view_entity: i32,
    /// Local player entity number.
    pub player_num: i32,
    /// Server max entities.
    pub max_entities: i32,
    /// Nonzero during demo playback.
    pub demo_playback: i32,
    /// Nonzero for hardware rendering.
    pub hardware: i32,
    /// View smoothing flag.
    pub smoothing: i32,
    /// Engine pointer slot for the current command; meaningless outside
    /// the recording process, kept for layout fidelity.
    pub cmd_ptr: i32,
    /// Engine pointer slot for the movement variables; see
    /// [`cmd_ptr`](Self::cmd_ptr).
    pub movevars_ptr: i32,
    /// Viewport rectangle (x, y, width, height).
    pub viewport: [i32; 4],
    /// Next view entity.
    pub next_view: i32,
    /// Nonzero when only the client draws.
    pub only_client_draw: i32,
}

/// The captured user command (52 bytes on the wire, alignment pads
/// included).
#[derive(Clone, Debug, PartialEq)]
pub struct UserCmd {
    /// Interpolation time in milliseconds.
    pub lerp_msec: i16,
    /// Duration of the command in milliseconds.
    pub msec: u8,
    /// Alignment padding byte present on the wire.
    pub pad1: u8,
    /// Command view angles.
    pub view_angles: [f32; 3],
    /// Forward movement speed.
    pub forward_move: f32,
    /// Sideways movement speed.
    pub side_move: f32,
    /// Upward movement speed.
    pub up_move: f32,
    /// Light level under the player.
    pub light_level: i8,
    /// Alignment padding byte present on the wire.
    pub pad2: u8,
    /// Pressed button bitmask.
    pub buttons: u16,
    /// Impulse command slot.
    pub impulse: i8,
    /// Selected weapon id.
    pub weapon_select: i8,
    /// Alignment padding bytes present on the wire.
    pub pad3: [u8; 2],
    /// Impact index for prediction.
    pub impact_index: i32,
    /// Impact position for prediction.
    pub impact_position: [f32; 3],
}

/// Server movement variables (132 bytes on the wire).
#[derive(Clone, Debug, PartialEq)]
pub struct MoveVars {
    /// World gravity.
    pub gravity: f32,
    /// Speed below which players stop.
    pub stop_speed: f32,
    /// Maximum player speed.
    pub max_speed: f32,
    /// Maximum spectator speed.
    pub spectator_max_speed: f32,
    /// Ground acceleration.
    pub accelerate: f32,
    /// Air acceleration.
    pub air_accelerate: f32,
    /// Water acceleration.
    pub water_accelerate: f32,
    /// Ground friction.
    pub friction: f32,
    /// Edge friction multiplier.
    pub edge_friction: f32,
    /// Water friction.
    pub water_friction: f32,
    /// Per-entity gravity scale.
    pub entity_gravity: f32,
    /// Bounce multiplier.
    pub bounce: f32,
    /// Maximum step height.
    pub step_size: f32,
    /// Maximum entity velocity.
    pub max_velocity: f32,
    /// Z extent of the map.
    pub z_max: f32,
    /// Water wave height.
    pub wave_height: f32,
    /// Nonzero when footstep sounds play.
    pub footsteps: i32,
    /// Sky texture name, NUL padding trimmed from its 32-byte field.
    pub sky_name: String,
    /// View roll angle.
    pub roll_angle: f32,
    /// View roll speed.
    pub roll_speed: f32,
    /// Sky color.
    pub sky_color: [f32; 3],
    /// Sky vector.
    pub sky_vec: [f32; 3],
}

// ── The decoded demo ────────────────────────────────────────────

/// A fully decoded demo recording.
///
/// Built once, synchronously, by [`decode_file`](crate::decode_file);
/// immutable afterwards and exclusively owned by the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct Demo {
    /// Validated header fields.
    pub header: DemoHeader,
    /// Session duration in seconds, taken from the track time of the last
    /// playback-tagged directory entry (0.0 if none exists).
    pub duration: f32,
    /// Directory entries with their decoded frame streams, in directory
    /// order.
    pub entries: Vec<DirectoryEntry>,
}
