//! Errors for the SMSA driver.

use thiserror::Error;

/// Result alias used by this crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors returned by address translation, opcode encoding and transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// An address or opcode field is outside its valid range.
    #[error("address or opcode field out of range")]
    OutOfRange,
    /// The transfer would need a drum past the last one.
    #[error("transfer runs past the end of the disk array")]
    AddressSpaceExhausted,
    /// Underlying device or snapshot store I/O error.
    #[error("device i/o error")]
    Io,
    /// A snapshot byte store does not hold exactly one full array.
    #[error("snapshot store is not exactly one array in size")]
    SnapshotSize,
}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(_: std::io::Error) -> Self {
        Error::Io
    }
}
