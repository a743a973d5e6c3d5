//! Disk array device abstraction.
//!
//! The array is driven through 32-bit opcodes. It keeps an internal cursor
//! (drum, block) that seek commands set and that block transfers move, so
//! callers must seek before every transfer.

use log::trace;

use crate::addr::BLOCK_SIZE;
use crate::error::Result;
use crate::opcode::{Command, Opcode};

/// A command executor for the disk array.
///
/// Cursor effects of each command:
/// - seek-drum / seek-block: set the cursor.
/// - read-block: transfers the block under the cursor, then advances it.
/// - write-block: transfers the block under the cursor; the cursor is
///   unspecified afterwards.
///
/// In `no_std`, you typically implement this trait for:
/// - the hardware register interface of a real array
/// - a simulator
/// - an in-memory array (for tests)
pub trait DeviceCursor {
    /// Execute `op`. Block transfers require a buffer; other commands ignore it.
    fn execute(&mut self, op: Opcode, buf: Option<&mut [u8; BLOCK_SIZE]>) -> Result<()>;
}

impl<D: DeviceCursor + ?Sized> DeviceCursor for &mut D {
    fn execute(&mut self, op: Opcode, buf: Option<&mut [u8; BLOCK_SIZE]>) -> Result<()> {
        (**self).execute(op, buf)
    }
}

/// Point the cursor at `drum`/`block`.
pub fn seek<D: DeviceCursor + ?Sized>(dev: &mut D, drum: u8, block: u8) -> Result<()> {
    dev.execute(Opcode::new(Command::SeekDrum, drum, block)?, None)?;
    dev.execute(Opcode::new(Command::SeekBlock, drum, block)?, None)
}

/// Seek to `drum`/`block` and read it into `buf`.
pub fn read_block_at<D: DeviceCursor + ?Sized>(
    dev: &mut D,
    drum: u8,
    block: u8,
    buf: &mut [u8; BLOCK_SIZE],
) -> Result<()> {
    trace!("smsa: read block {}/{}", drum, block);
    seek(dev, drum, block)?;
    dev.execute(Opcode::new(Command::ReadBlock, drum, block)?, Some(buf))
}

/// Seek to `drum`/`block` and overwrite it with `buf`.
pub fn write_block_at<D: DeviceCursor + ?Sized>(
    dev: &mut D,
    drum: u8,
    block: u8,
    buf: &mut [u8; BLOCK_SIZE],
) -> Result<()> {
    trace!("smsa: write block {}/{}", drum, block);
    seek(dev, drum, block)?;
    dev.execute(Opcode::new(Command::WriteBlock, drum, block)?, Some(buf))
}

#[cfg(test)]
pub use self::mem::MemArray;
