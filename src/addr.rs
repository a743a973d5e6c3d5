//! Disk array geometry and virtual address decomposition.
//!
//! A virtual address packs three fields:
//!
//! ```text
//!  19    16 15       8 7        0
//! +--------+----------+----------+
//! |  drum  |  block   |  offset  |
//! +--------+----------+----------+
//! ```

use core::fmt;

use crate::error::{Error, Result};

/// Bytes per block. The device only transfers whole blocks.
pub const BLOCK_SIZE: usize = 256;
/// Blocks per drum.
pub const BLOCKS_PER_DRUM: usize = 256;
/// Drums in the array.
pub const DRUM_COUNT: usize = 16;
/// Bytes per drum.
pub const DRUM_SIZE: usize = BLOCK_SIZE * BLOCKS_PER_DRUM;
/// Total capacity of the array in bytes.
pub const ARRAY_SIZE: usize = DRUM_SIZE * DRUM_COUNT;
/// Highest valid virtual address.
pub const MAX_ADDRESS: u32 = (ARRAY_SIZE - 1) as u32;

const DRUM_SHIFT: u32 = 16;
const BLOCK_SHIFT: u32 = 8;
const DRUM_MASK: u32 = 0xF;
const BLOCK_MASK: u32 = 0xFF;
const OFFSET_MASK: u32 = 0xFF;

/// A byte address into the flat array address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VirtualAddress(pub u32);

impl VirtualAddress {
    /// Build an address from coordinates.
    pub fn new(drum: u8, block: u8, offset: u8) -> Result<Self> {
        if drum as usize >= DRUM_COUNT {
            return Err(Error::OutOfRange);
        }
        Ok(Self(
            ((drum as u32) << DRUM_SHIFT) | ((block as u32) << BLOCK_SHIFT) | offset as u32,
        ))
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for VirtualAddress {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

impl fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#07x}", self.0)
    }
}

/// Physical coordinates of a byte: drum, block within the drum, offset within the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub drum: u8,
    pub block: u8,
    pub offset: u8,
}

impl Location {
    /// Recompose the virtual address of this location.
    pub fn to_address(self) -> VirtualAddress {
        VirtualAddress(
            ((self.drum as u32) << DRUM_SHIFT)
                | ((self.block as u32) << BLOCK_SHIFT)
                | self.offset as u32,
        )
    }
}

/// Split `addr` into drum, block and offset.
///
/// Addresses above [`MAX_ADDRESS`] are rejected instead of wrapping around.
pub fn decompose(addr: VirtualAddress) -> Result<Location> {
    let raw = addr.0;
    if raw > MAX_ADDRESS {
        return Err(Error::OutOfRange);
    }

    let drum = (raw >> DRUM_SHIFT) & DRUM_MASK;
    let block = (raw >> BLOCK_SHIFT) & BLOCK_MASK;
    let offset = raw & OFFSET_MASK;

    // The masks match the field widths, so these hold for every accepted address.
    debug_assert!((drum as usize) < DRUM_COUNT);
    debug_assert!((block as usize) < BLOCKS_PER_DRUM);
    debug_assert!((offset as usize) < BLOCK_SIZE);

    Ok(Location {
        drum: drum as u8,
        block: block as u8,
        offset: offset as u8,
    })
}
