//! Host-side register and memory access over a [`Transport`](crate::Transport).
//!
//! Outside a batch scope every access is its own bus round trip: a read is one
//! transaction, a whole-word write is one transaction and a field write is a
//! read followed by a write. A [`Batch`] collapses any number of field updates
//! on one register into one read and one write.

pub mod batch;
pub mod memory;
pub mod register;
pub mod value;

pub use batch::Batch;
pub use memory::Memory;
pub use register::{AccessOptions, Register};
pub use value::{FieldValue, RegisterValue, WriteValue};
