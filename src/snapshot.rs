//! Whole-array snapshots.
//!
//! A snapshot is the raw concatenation of every block, drum-major then
//! block-minor, with no header: exactly [`ARRAY_SIZE`] bytes.

use log::info;

use crate::addr::{ARRAY_SIZE, BLOCKS_PER_DRUM, BLOCK_SIZE, DRUM_COUNT, DRUM_SIZE};
use crate::device::{read_block_at, write_block_at, DeviceCursor};
use crate::error::{Error, Result};

/// Default snapshot file name.
pub const DEFAULT_SNAPSHOT_FILE: &str = "smsa_data.dat";

fn block_range(drum: usize, block: usize) -> core::ops::Range<usize> {
    let start = drum * DRUM_SIZE + block * BLOCK_SIZE;
    start..start + BLOCK_SIZE
}

/// Overwrite the whole array with `store`.
pub fn load<D: DeviceCursor + ?Sized>(dev: &mut D, store: &[u8]) -> Result<()> {
    if store.len() != ARRAY_SIZE {
        return Err(Error::SnapshotSize);
    }

    let mut buf = [0u8; BLOCK_SIZE];
    for drum in 0..DRUM_COUNT {
        for block in 0..BLOCKS_PER_DRUM {
            buf.copy_from_slice(&store[block_range(drum, block)]);
            write_block_at(dev, drum as u8, block as u8, &mut buf)?;
        }
    }
    info!("smsa: loaded {} byte snapshot", ARRAY_SIZE);
    Ok(())
}

/// Copy the whole array into `store`.
pub fn save<D: DeviceCursor + ?Sized>(dev: &mut D, store: &mut [u8]) -> Result<()> {
    if store.len() != ARRAY_SIZE {
        return Err(Error::SnapshotSize);
    }

    let mut buf = [0u8; BLOCK_SIZE];
    for drum in 0..DRUM_COUNT {
        for block in 0..BLOCKS_PER_DRUM {
            read_block_at(dev, drum as u8, block as u8, &mut buf)?;
            store[block_range(drum, block)].copy_from_slice(&buf);
        }
    }
    info!("smsa: saved {} byte snapshot", ARRAY_SIZE);
    Ok(())
}

/// Load the array from the file at `path`.
///
/// A missing file is not an error: the array is left as is and `Ok(false)` is returned.
#[cfg(feature = "std")]
pub fn load_file<D, P>(dev: &mut D, path: P) -> Result<bool>
where
    D: DeviceCursor + ?Sized,
    P: AsRef<std::path::Path>,
{
    let path = path.as_ref();
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("smsa: {} does not exist, continuing without loading", path.display());
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };
    load(dev, &data)?;
    Ok(true)
}

/// Save the array to the file at `path`, replacing any previous contents.
#[cfg(feature = "std")]
pub fn save_file<D, P>(dev: &mut D, path: P) -> Result<()>
where
    D: DeviceCursor + ?Sized,
    P: AsRef<std::path::Path>,
{
    let mut data = std::vec![0u8; ARRAY_SIZE];
    save(dev, &mut data)?;
    std::fs::write(path, &data)?;
    Ok(())
}
