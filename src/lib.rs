#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod addr;
pub mod array;
pub mod device;
pub mod error;
pub mod opcode;
pub mod shared;
pub mod snapshot;

pub use crate::addr::{decompose, Location, VirtualAddress};
pub use crate::array::Smsa;
pub use crate::device::DeviceCursor;
pub use crate::error::{Error, Result};
pub use crate::opcode::{Command, Opcode};
pub use crate::shared::SharedSmsa;
