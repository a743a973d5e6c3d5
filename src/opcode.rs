//! Device command word encoding.
//!
//! ```text
//!  31     26 25   22 21          8 7       0
//! +---------+-------+-------------+---------+
//! | command | drum  |   unused    |  block  |
//! +---------+-------+-------------+---------+
//! ```

use core::fmt;

use crate::error::{Error, Result};

const COMMAND_SHIFT: u32 = 26;
const DRUM_SHIFT: u32 = 22;
const COMMAND_MASK: u32 = 0x3F;
const DRUM_MASK: u32 = 0xF;
const BLOCK_MASK: u32 = 0xFF;

/// Highest command value the device accepts.
pub const MAX_COMMAND: u32 = 9;

/// Commands understood by the disk array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    Mount = 0,
    Unmount = 1,
    SeekDrum = 2,
    SeekBlock = 3,
    ReadBlock = 4,
    WriteBlock = 5,
}

impl Command {
    pub fn from_bits(bits: u32) -> Option<Self> {
        Some(match bits {
            0 => Self::Mount,
            1 => Self::Unmount,
            2 => Self::SeekDrum,
            3 => Self::SeekBlock,
            4 => Self::ReadBlock,
            5 => Self::WriteBlock,
            _ => return None,
        })
    }
}

/// A 32-bit command word sent to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Opcode(u32);

impl Opcode {
    /// Pack a raw command, drum and block into an opcode.
    ///
    /// Fails with [`Error::OutOfRange`] if `command > 9`, `drum > 15` or `block > 255`.
    pub fn encode(command: u32, drum: u32, block: u32) -> Result<Self> {
        if command > MAX_COMMAND || drum > DRUM_MASK || block > BLOCK_MASK {
            return Err(Error::OutOfRange);
        }
        Ok(Self((command << COMMAND_SHIFT) | (drum << DRUM_SHIFT) | block))
    }

    /// Typed variant of [`Opcode::encode`].
    pub fn new(command: Command, drum: u8, block: u8) -> Result<Self> {
        Self::encode(command as u32, drum as u32, block as u32)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn command_bits(self) -> u32 {
        (self.0 >> COMMAND_SHIFT) & COMMAND_MASK
    }

    /// The named command, or `None` for the reserved values 6..=9.
    pub fn command(self) -> Option<Command> {
        Command::from_bits(self.command_bits())
    }

    pub fn drum(self) -> u8 {
        ((self.0 >> DRUM_SHIFT) & DRUM_MASK) as u8
    }

    pub fn block(self) -> u8 {
        (self.0 & BLOCK_MASK) as u8
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
