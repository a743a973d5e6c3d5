//! Byte-addressed access to the disk array.

use log::{debug, info, warn};

use crate::addr::{decompose, VirtualAddress, BLOCKS_PER_DRUM, BLOCK_SIZE, DRUM_COUNT};
use crate::device::{self, DeviceCursor};
use crate::error::{Error, Result};
use crate::opcode::{Command, Opcode};
use crate::snapshot;

/// Drum/block pair walked by a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockPos {
    drum: u8,
    block: u8,
}

impl BlockPos {
    /// Step to the next block, rolling over into the next drum.
    fn advance(&mut self) -> Result<()> {
        if (self.block as usize) + 1 < BLOCKS_PER_DRUM {
            self.block += 1;
            return Ok(());
        }
        if (self.drum as usize) + 1 >= DRUM_COUNT {
            warn!("smsa: transfer ran past drum {}", self.drum);
            return Err(Error::AddressSpaceExhausted);
        }
        self.drum += 1;
        self.block = 0;
        Ok(())
    }
}

/// Mounted disk array handle.
pub struct Smsa<D: DeviceCursor> {
    dev: D,
}

impl<D: DeviceCursor> Smsa<D> {
    /// Mount the array.
    pub fn mount(mut dev: D) -> Result<Self> {
        dev.execute(Opcode::new(Command::Mount, 0, 0)?, None)?;
        info!("smsa: mounted");
        Ok(Self { dev })
    }

    /// Unmount the array and hand the device back.
    pub fn unmount(mut self) -> Result<D> {
        self.dev.execute(Opcode::new(Command::Unmount, 0, 0)?, None)?;
        info!("smsa: unmounted");
        Ok(self.dev)
    }

    pub fn device(&self) -> &D {
        &self.dev
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.dev
    }

    /// Return the underlying device without unmounting (useful in tests).
    pub fn into_device(self) -> D {
        self.dev
    }

    /// Read `buf.len()` bytes starting at `addr`.
    ///
    /// On failure `buf` holds whatever prefix was transferred before it.
    pub fn read(&mut self, addr: VirtualAddress, buf: &mut [u8]) -> Result<()> {
        let start = decompose(addr)?;
        if buf.is_empty() {
            return Ok(());
        }
        debug!("smsa: read {} bytes at {} ({:?})", buf.len(), addr, start);

        let mut pos = BlockPos { drum: start.drum, block: start.block };
        let mut offset = start.offset as usize;
        let mut scratch = [0u8; BLOCK_SIZE];
        let mut done = 0usize;

        loop {
            self.read_block(pos, &mut scratch)?;
            let take = (BLOCK_SIZE - offset).min(buf.len() - done);
            buf[done..done + take].copy_from_slice(&scratch[offset..offset + take]);
            done += take;
            offset = 0;

            if done == buf.len() {
                return Ok(());
            }
            pos.advance()?;
        }
    }

    /// Write `buf` starting at `addr`.
    ///
    /// Every touched block is read first so bytes outside `buf` survive.
    /// Blocks are committed one by one: on failure the blocks already written stay written.
    pub fn write(&mut self, addr: VirtualAddress, buf: &[u8]) -> Result<()> {
        let start = decompose(addr)?;
        if buf.is_empty() {
            return Ok(());
        }
        debug!("smsa: write {} bytes at {} ({:?})", buf.len(), addr, start);

        let mut pos = BlockPos { drum: start.drum, block: start.block };
        let mut offset = start.offset as usize;
        let mut scratch = [0u8; BLOCK_SIZE];
        let mut done = 0usize;

        loop {
            self.read_block(pos, &mut scratch)?;
            let take = (BLOCK_SIZE - offset).min(buf.len() - done);
            scratch[offset..offset + take].copy_from_slice(&buf[done..done + take]);
            self.write_block(pos, &mut scratch)?;
            done += take;
            offset = 0;

            if done == buf.len() {
                return Ok(());
            }
            pos.advance()?;
        }
    }

    /// Copy the whole array from `store` (see [`snapshot::load`]).
    pub fn load_snapshot(&mut self, store: &[u8]) -> Result<()> {
        snapshot::load(&mut self.dev, store)
    }

    /// Copy the whole array into `store` (see [`snapshot::save`]).
    pub fn save_snapshot(&mut self, store: &mut [u8]) -> Result<()> {
        snapshot::save(&mut self.dev, store)
    }

    // Reads move the device cursor, so each transfer seeks first.
    fn read_block(&mut self, pos: BlockPos, scratch: &mut [u8; BLOCK_SIZE]) -> Result<()> {
        device::read_block_at(&mut self.dev, pos.drum, pos.block, scratch)
    }

    fn write_block(&mut self, pos: BlockPos, scratch: &mut [u8; BLOCK_SIZE]) -> Result<()> {
        device::write_block_at(&mut self.dev, pos.drum, pos.block, scratch)
    }
}

#[cfg(feature = "std")]
impl<D: DeviceCursor> Smsa<D> {
    /// Mount the array and load it from the snapshot file at `path`, if present.
    pub fn mount_with_file<P: AsRef<std::path::Path>>(dev: D, path: P) -> Result<Self> {
        let mut smsa = Self::mount(dev)?;
        snapshot::load_file(&mut smsa.dev, path)?;
        Ok(smsa)
    }

    /// Save the array to the snapshot file at `path`, then unmount.
    pub fn unmount_with_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Result<D> {
        snapshot::save_file(&mut self.dev, path)?;
        self.unmount()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addr::{ARRAY_SIZE, MAX_ADDRESS};
    use crate::device::MemArray;
    use proptest::prelude::*;

    fn mounted() -> Smsa<MemArray> {
        Smsa::mount(MemArray::new()).expect("mount")
    }

    fn addr(drum: u8, block: u8, offset: u8) -> VirtualAddress {
        VirtualAddress::new(drum, block, offset).unwrap()
    }

    fn pattern(len: usize, seed: u8) -> Vec<u8> {
        (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
    }

    fn commands(dev: &MemArray) -> Vec<Command> {
        dev.ops().iter().map(|op| op.command().unwrap()).collect()
    }

    #[test]
    fn mount_and_unmount() {
        let smsa = mounted();
        assert!(smsa.device().is_mounted());
        let dev = smsa.unmount().expect("unmount");
        assert!(!dev.is_mounted());
        assert_eq!(commands(&dev), vec![Command::Mount, Command::Unmount]);
    }

    #[test]
    fn write_and_read_unaligned() {
        let mut smsa = mounted();
        let data = pattern(100, 7);
        smsa.write(VirtualAddress(0x0003_0201), &data).expect("write");

        let mut out = vec![0u8; 100];
        smsa.read(VirtualAddress(0x0003_0201), &mut out).expect("read");
        assert_eq!(out, data);
        assert_eq!(&smsa.device().data()[0x30201..0x30201 + 100], &data[..]);
    }

    #[test]
    fn single_block_write_reseeks_after_backup_read() {
        let mut smsa = mounted();
        smsa.device_mut().clear_log();
        smsa.write(addr(2, 9, 4), b"xyz").unwrap();

        assert_eq!(
            commands(smsa.device()),
            vec![
                Command::SeekDrum,
                Command::SeekBlock,
                Command::ReadBlock,
                Command::SeekDrum,
                Command::SeekBlock,
                Command::WriteBlock,
            ]
        );
        assert_eq!(smsa.device().written_blocks(), vec![(2, 9)]);
    }

    #[test]
    fn partial_write_preserves_rest_of_block() {
        let mut smsa = mounted();
        let block = pattern(BLOCK_SIZE, 3);
        smsa.write(addr(4, 4, 0), &block).unwrap();
        smsa.write(addr(4, 4, 77), &[0xEE]).unwrap();

        let mut out = vec![0u8; BLOCK_SIZE];
        smsa.read(addr(4, 4, 0), &mut out).unwrap();
        for (i, (&got, &orig)) in out.iter().zip(block.iter()).enumerate() {
            if i == 77 {
                assert_eq!(got, 0xEE);
            } else {
                assert_eq!(got, orig, "byte {i} changed");
            }
        }
    }

    #[test]
    fn span_across_drum_boundary() {
        let data = pattern(600, 11);
        let start = addr(0, 255, 250);

        let mut spanning = mounted();
        spanning.device_mut().clear_log();
        spanning.write(start, &data).unwrap();
        // 6 + 256 + 256 + 82 bytes.
        let touched = vec![(0, 255), (1, 0), (1, 1), (1, 2)];
        assert_eq!(spanning.device().written_blocks(), touched);

        // Same bytes as separate block-aligned writes.
        let mut pieces = mounted();
        pieces.write(start, &data[..6]).unwrap();
        pieces.write(addr(1, 0, 0), &data[6..262]).unwrap();
        pieces.write(addr(1, 1, 0), &data[262..518]).unwrap();
        pieces.write(addr(1, 2, 0), &data[518..]).unwrap();
        assert!(spanning.device().data() == pieces.device().data());

        let mut out = vec![0u8; 600];
        spanning.device_mut().clear_log();
        spanning.read(start, &mut out).unwrap();
        assert_eq!(out, data);
        let read_blocks: Vec<(u8, u8)> = spanning
            .device()
            .transfers()
            .iter()
            .map(|t| (t.1, t.2))
            .collect();
        assert_eq!(read_blocks, touched);
    }

    #[test]
    fn last_block_fits_exactly() {
        let mut smsa = mounted();
        let data = pattern(BLOCK_SIZE, 5);
        smsa.write(addr(15, 255, 0), &data).unwrap();

        let mut out = vec![0u8; BLOCK_SIZE];
        smsa.read(addr(15, 255, 0), &mut out).unwrap();
        assert_eq!(out, data);

        let mut last = [0u8; 1];
        smsa.read(VirtualAddress(MAX_ADDRESS), &mut last).unwrap();
        assert_eq!(last[0], data[255]);
    }

    #[test]
    fn write_past_capacity_is_not_rolled_back() {
        let mut smsa = mounted();
        let data = pattern(300, 9);
        let res = smsa.write(addr(15, 255, 0), &data);
        assert_eq!(res, Err(Error::AddressSpaceExhausted));

        // The block before the failure was committed.
        let tail = &smsa.device().data()[ARRAY_SIZE - BLOCK_SIZE..];
        assert_eq!(tail, &data[..BLOCK_SIZE]);
    }

    #[test]
    fn read_past_capacity_keeps_prefix() {
        let mut smsa = mounted();
        smsa.device_mut().data_mut()[ARRAY_SIZE - 1] = 0x5A;

        let mut out = vec![0u8; 2];
        let res = smsa.read(VirtualAddress(MAX_ADDRESS), &mut out);
        assert_eq!(res, Err(Error::AddressSpaceExhausted));
        assert_eq!(out[0], 0x5A);
    }

    #[test]
    fn zero_length_issues_no_commands() {
        let mut smsa = mounted();
        smsa.device_mut().clear_log();
        smsa.write(addr(1, 2, 3), &[]).unwrap();
        smsa.read(addr(1, 2, 3), &mut []).unwrap();
        assert!(smsa.device().ops().is_empty());
    }

    #[test]
    fn rejects_address_past_capacity() {
        let mut smsa = mounted();
        let mut out = [0u8; 4];
        assert_eq!(smsa.read(VirtualAddress(0x0010_0000), &mut out), Err(Error::OutOfRange));
        assert_eq!(smsa.write(VirtualAddress(0x0010_0000), &out), Err(Error::OutOfRange));
    }

    #[test]
    fn whole_array_round_trip() {
        let mut smsa = mounted();
        let data = pattern(ARRAY_SIZE, 1);
        smsa.write(VirtualAddress(0), &data).unwrap();

        let mut out = vec![0u8; ARRAY_SIZE];
        smsa.read(VirtualAddress(0), &mut out).unwrap();
        assert!(out == data);
    }

    #[test]
    fn unmounted_device_error_propagates() {
        let mut smsa = Smsa { dev: MemArray::new() };
        let mut out = [0u8; 1];
        assert_eq!(smsa.read(VirtualAddress(0), &mut out), Err(Error::Io));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn write_then_read_round_trips(
            start in 0u32..(ARRAY_SIZE as u32 - 2048),
            data in proptest::collection::vec(any::<u8>(), 0..2048),
        ) {
            let mut smsa = mounted();
            smsa.write(VirtualAddress(start), &data).unwrap();
            let mut out = vec![0u8; data.len()];
            smsa.read(VirtualAddress(start), &mut out).unwrap();
            prop_assert_eq!(out, data);
        }
    }
}
