//! Bit-addressable read cursor over an owned byte blob.
//!
//! Every field the decoder consumes, from one-bit flags up to 64-bit
//! integers, goes through [`BitCursor::read_bits`], so the arithmetic for
//! reads that straddle byte boundaries lives in exactly one place. Bits are
//! numbered least-significant-first within each byte, matching the
//! little-endian wire format.
//!
//! The cursor distinguishes two end-of-data conditions:
//!
//! - **Exhaustion**: skipping or consuming up to (or past) the end parks the
//!   cursor in an exhausted state without an error. This is the designed
//!   soft-EOF signal; the frame loop probes it with
//!   [`BitCursor::is_exhausted`].
//! - **Over-read**: asking for more bits than remain fails loudly with
//!   [`DemoError::BufferExhausted`] and leaves the position untouched.

use crate::error::DemoError;

/// Maximum number of bits a single [`BitCursor::read_bits`] call may request.
pub const MAX_READ_BITS: u32 = 64;

/// Origin for [`BitCursor::seek`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeekOrigin {
    /// Seek forward from the current position.
    Current,
    /// Seek forward from the start of the buffer.
    Begin,
    /// Seek backward from the end of the buffer.
    End,
}

/// Contiguous-ones masks indexed by bit count: `MASKS[n]` has the low `n`
/// bits set.
const MASKS: [u64; 65] = build_masks();

const fn build_masks() -> [u64; 65] {
    let mut table = [0u64; 65];
    let mut n = 1;
    while n <= 64 {
        table[n] = if n == 64 { u64::MAX } else { (1u64 << n) - 1 };
        n += 1;
    }
    table
}

/// A read-only byte blob with a bit-granular read head.
///
/// All read and seek operations take `&mut self`: position updates are
/// visible in the signature rather than hidden behind interior mutability.
#[derive(Debug)]
pub struct BitCursor {
    data: Vec<u8>,
    /// Index of the current byte, or `None` once the cursor is exhausted.
    pos: Option<usize>,
    /// Bit offset within the current byte, in `[0, 7]`.
    bit: u8,
}

impl BitCursor {
    /// Wrap an owned byte blob. An empty blob starts out exhausted.
    pub fn new(data: Vec<u8>) -> Self {
        let pos = if data.is_empty() { None } else { Some(0) };
        Self { data, pos, bit: 0 }
    }

    /// Total size of the underlying blob in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the underlying blob is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True once the cursor has been advanced to or past the end.
    ///
    /// Distinct from an over-wide or out-of-range read, which fails with an
    /// error instead of exhausting the cursor.
    pub fn is_exhausted(&self) -> bool {
        self.pos.is_none()
    }

    /// Absolute position in bits from the start of the blob, or `None` if
    /// the cursor is exhausted.
    pub fn bit_position(&self) -> Option<u64> {
        self.pos.map(|p| p as u64 * 8 + u64::from(self.bit))
    }

    /// Number of bits left between the current position and the end.
    pub fn remaining_bits(&self) -> u64 {
        match self.pos {
            None => 0,
            Some(p) => self.data.len() as u64 * 8 - (p as u64 * 8 + u64::from(self.bit)),
        }
    }

    /// True iff at least `n` more bits are available from the current
    /// position. Pure predicate; never changes state.
    pub fn bits_remaining(&self, n: u64) -> bool {
        self.remaining_bits() >= n
    }

    /// Read the next `n` bits (`n` in `[0, 64]`) as an unsigned integer,
    /// advancing the cursor by exactly `n` bits.
    ///
    /// The result is the low `n` bits of the little-endian value starting at
    /// the current bit position. `n == 0` returns 0 without consuming
    /// anything. Consuming exactly the final bits of the blob leaves the
    /// cursor exhausted.
    pub fn read_bits(&mut self, n: u32) -> Result<u64, DemoError> {
        let Some(pos) = self.pos else {
            return Err(DemoError::BufferExhausted {
                requested_bits: u64::from(n),
                remaining_bits: 0,
            });
        };
        if n > MAX_READ_BITS {
            return Err(DemoError::InvalidWidth { requested: n });
        }
        if n == 0 {
            return Ok(0);
        }
        if !self.bits_remaining(u64::from(n)) {
            return Err(DemoError::BufferExhausted {
                requested_bits: u64::from(n),
                remaining_bits: self.remaining_bits(),
            });
        }

        // Widest case is 7 leading bits plus 64 requested, spanning 9 bytes;
        // accumulate into a u128 so the shift below cannot overflow.
        let span = (self.bit as usize + n as usize).div_ceil(8);
        let end = self.data.len().min(pos + span);
        let mut window: u128 = 0;
        for (i, &byte) in self.data[pos..end].iter().enumerate() {
            window |= u128::from(byte) << (8 * i);
        }
        let value = (window >> self.bit) as u64 & MASKS[n as usize];

        self.skip_bits(u64::from(n));
        Ok(value)
    }

    /// Read a single bit.
    pub fn read_bit(&mut self) -> Result<u8, DemoError> {
        Ok(self.read_bits(1)? as u8)
    }

    /// Read one byte (8 bits from the current position, aligned or not).
    pub fn read_byte(&mut self) -> Result<u8, DemoError> {
        Ok(self.read_bits(8)? as u8)
    }

    /// Read `n` bytes verbatim.
    ///
    /// `n` may come straight from an untrusted length field, so the
    /// reservation is clamped to what the buffer can still yield.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, DemoError> {
        let mut out = Vec::with_capacity(n.min((self.remaining_bits() / 8) as usize));
        for _ in 0..n {
            out.push(self.read_byte()?);
        }
        Ok(out)
    }

    /// Read an `i8` from the next 8 bits.
    pub fn read_i8(&mut self) -> Result<i8, DemoError> {
        Ok(self.read_bits(8)? as u8 as i8)
    }

    /// Read a little-endian `u16` from the next 16 bits.
    pub fn read_u16(&mut self) -> Result<u16, DemoError> {
        Ok(self.read_bits(16)? as u16)
    }

    /// Read a little-endian `i16` from the next 16 bits.
    pub fn read_i16(&mut self) -> Result<i16, DemoError> {
        Ok(self.read_bits(16)? as u16 as i16)
    }

    /// Read a little-endian `u32` from the next 32 bits.
    pub fn read_u32(&mut self) -> Result<u32, DemoError> {
        Ok(self.read_bits(32)? as u32)
    }

    /// Read a little-endian `i32` from the next 32 bits.
    pub fn read_i32(&mut self) -> Result<i32, DemoError> {
        Ok(self.read_bits(32)? as u32 as i32)
    }

    /// Read a little-endian `f32`, reinterpreting the 32 bits verbatim so
    /// the IEEE-754 layout is preserved (not a numeric cast).
    pub fn read_f32(&mut self) -> Result<f32, DemoError> {
        Ok(f32::from_bits(self.read_bits(32)? as u32))
    }

    /// Read bytes until and including a NUL terminator, returning the text
    /// before it. Fails with [`DemoError::BufferExhausted`] if the blob ends
    /// before a terminator is seen.
    pub fn read_cstring(&mut self) -> Result<String, DemoError> {
        let mut bytes = Vec::new();
        loop {
            let b = self.read_byte()?;
            if b == 0 {
                break;
            }
            bytes.push(b);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read exactly `n` bytes as text, with no terminator semantics:
    /// embedded and trailing NULs are kept.
    pub fn read_fixed_string(&mut self, n: usize) -> Result<String, DemoError> {
        let bytes = self.read_bytes(n)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Advance by `n` bits. Landing on or past the end transitions the
    /// cursor to the exhausted state rather than failing, and an advance
    /// too large to even compute saturates into the same state.
    pub fn skip_bits(&mut self, n: u64) {
        let Some(pos) = self.pos else {
            return;
        };
        let total = self.data.len() as u64 * 8;
        let target = (pos as u64 * 8 + u64::from(self.bit)).saturating_add(n);
        if target >= total {
            self.pos = None;
            self.bit = 0;
        } else {
            self.pos = Some((target / 8) as usize);
            self.bit = (target % 8) as u8;
        }
    }

    /// Advance by `n` bytes, with the same exhaustion semantics as
    /// [`skip_bits`](Self::skip_bits).
    pub fn skip_bytes(&mut self, n: usize) {
        self.skip_bits((n as u64).saturating_mul(8));
    }

    /// Reposition the cursor by `amount` bytes relative to `origin`.
    ///
    /// Seeking past the end from `Begin` or `Current` exhausts the cursor
    /// per the skip semantics. Seeking from `End` with `amount` greater
    /// than or equal to the blob size resets to the beginning; otherwise it
    /// lands on byte `len - amount` with the bit offset at 7.
    pub fn seek(&mut self, amount: usize, origin: SeekOrigin) {
        match origin {
            SeekOrigin::Current => self.skip_bytes(amount),
            SeekOrigin::Begin => {
                self.rewind();
                self.skip_bytes(amount);
            }
            SeekOrigin::End => {
                if amount >= self.data.len() {
                    self.rewind();
                } else {
                    self.pos = Some(self.data.len() - amount);
                    self.bit = 7;
                }
            }
        }
    }

    /// Advance to the start of the next byte if mid-byte. No-op when
    /// byte-aligned, and also when still on the very first byte.
    pub fn align_to_byte(&mut self) {
        if let Some(pos) = self.pos {
            if self.bit > 0 && pos != 0 {
                self.skip_bits(u64::from(8 - self.bit));
            }
        }
    }

    fn rewind(&mut self) {
        self.pos = if self.data.is_empty() { None } else { Some(0) };
        self.bit = 0;
    }
}
