use thiserror::Error;

use crate::NodeKind;

/// Error classes used for reporting aggregation and caller policy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ErrorClass {
    /// Field or register layout rejected at tree-validation time.
    Layout,
    /// Field value exceeded its bit width under strict overflow policy.
    Range,
    /// Batch scope opened on a register that already has one open.
    Reentrancy,
    /// Host-side misuse of the access layer (unknown field, access flags, index).
    Access,
    /// Failure surfaced unchanged from the bus transport.
    Transport,
}

/// Structural defects in a register or memory layout.
///
/// These are detected once when a tree is validated. A register carrying one
/// is dropped from generation while the rest of the tree proceeds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum LayoutError {
    /// Register byte width outside `1..=8`.
    #[error("register width of {width_bytes} bytes is outside 1..=8")]
    InvalidRegisterWidth {
        /// Declared width in bytes.
        width_bytes: u8,
    },
    /// Field declared with zero bits.
    #[error("field '{field}' has zero width")]
    EmptyField {
        /// Field name.
        field: String,
    },
    /// Field bit range extends past the register's bit width.
    #[error("field '{field}' [{lsb}+{width}] exceeds the {register_bits}-bit register")]
    FieldOutOfRange {
        /// Field name.
        field: String,
        /// Declared least significant bit.
        lsb: u32,
        /// Declared width in bits.
        width: u32,
        /// Bit width of the owning register.
        register_bits: u32,
    },
    /// Two fields claim at least one common bit.
    #[error("fields '{first}' and '{second}' overlap")]
    OverlappingFields {
        /// Field that appears first in declaration order.
        first: String,
        /// Field that collides with `first`.
        second: String,
    },
    /// Two fields in one register share a name.
    #[error("field name '{field}' is declared more than once")]
    DuplicateField {
        /// Repeated field name.
        field: String,
    },
    /// Memory declared with no entries or an unsupported entry width.
    #[error("memory with {entries} entries of {entry_width_bytes} bytes is not addressable")]
    InvalidMemory {
        /// Declared entry count.
        entries: u64,
        /// Declared entry width in bytes.
        entry_width_bytes: u8,
    },
    /// Memory whose last byte lies past the end of the address space.
    #[error("memory of {size_bytes} bytes at {base:#x} overflows the address space")]
    AddressOverflow {
        /// Base address of entry zero.
        base: u64,
        /// Declared span in bytes, saturated at `u64::MAX`.
        size_bytes: u64,
    },
}

/// Per-node validation diagnostic collected while walking a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[error("{path}: {error}")]
pub struct NodeError {
    /// Dotted hierarchical path of the offending node.
    pub path: String,
    /// Kind of the offending node.
    pub kind: NodeKind,
    /// Underlying layout defect.
    pub error: LayoutError,
}

impl NodeError {
    /// Diagnostics class for this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        ErrorClass::Layout
    }
}

/// Failure reported by a bus transport. Propagated without modification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum TransportError {
    /// Transport could not complete a read.
    #[error("bus read at {address:#x} failed")]
    ReadFailed {
        /// Absolute address of the attempted read.
        address: u64,
    },
    /// Transport could not complete a write.
    #[error("bus write at {address:#x} failed")]
    WriteFailed {
        /// Absolute address of the attempted write.
        address: u64,
    },
    /// Transport is not connected or not configured for the operation.
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised synchronously by generated access code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// Value does not fit in the target bit width under [`OverflowPolicy::Reject`].
    ///
    /// [`OverflowPolicy::Reject`]: crate::OverflowPolicy::Reject
    #[error("value {value:#x} does not fit in {width} bits of '{target}'")]
    Range {
        /// Field or register name receiving the value.
        target: String,
        /// Rejected value.
        value: u64,
        /// Available bit width.
        width: u32,
    },
    /// A batch scope is already open on this register handle.
    #[error("register '{register}' already has an open batch scope")]
    Reentrancy {
        /// Register name.
        register: String,
    },
    /// Field name does not exist in the register layout.
    #[error("register '{register}' has no field named '{field}'")]
    UnknownField {
        /// Register name.
        register: String,
        /// Requested field name.
        field: String,
    },
    /// Field is not software readable.
    #[error("field '{field}' is not software readable")]
    NotReadable {
        /// Field name.
        field: String,
    },
    /// Field is not software writable.
    #[error("field '{field}' is not software writable")]
    NotWritable {
        /// Field name.
        field: String,
    },
    /// Memory entry index beyond the declared entry count.
    #[error("index {index} is out of range for memory '{memory}' with {len} entries")]
    IndexOutOfRange {
        /// Memory name.
        memory: String,
        /// Requested entry index.
        index: u64,
        /// Declared entry count.
        len: u64,
    },
    /// Transport failure passed through unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl AccessError {
    /// Returns the diagnostics class for this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Range { .. } => ErrorClass::Range,
            Self::Reentrancy { .. } => ErrorClass::Reentrancy,
            Self::UnknownField { .. }
            | Self::NotReadable { .. }
            | Self::NotWritable { .. }
            | Self::IndexOutOfRange { .. } => ErrorClass::Access,
            Self::Transport(_) => ErrorClass::Transport,
        }
    }
}
