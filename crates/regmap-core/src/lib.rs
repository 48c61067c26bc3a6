//! Register-map access model and compilation-unit partitioning.
//!
//! The crate consumes an already-elaborated register tree and provides the
//! runtime pieces generated bindings build on: bit-field algebra, register and
//! memory handles over a pluggable [`Transport`], scoped batch
//! read-modify-write, flag/enum views, and the partitioning that splits large
//! trees into independently generated units.

/// Error taxonomy shared by validation and runtime access.
pub mod error;
pub use error::{AccessError, ErrorClass, LayoutError, NodeError, TransportError};

/// Pure bit-field mask, extract, and compose helpers.
pub mod field;
pub use field::{compose, extract, field_mask, fit, low_mask, OverflowPolicy, RangeError, MAX_WORD_BITS};

/// Static register, field, and memory layouts with validation.
pub mod layout;
pub use layout::{FieldLayout, MemoryLayout, RegisterLayout, SoftwareAccess};

/// Enumerated flag/enum views derived from register layouts.
pub mod view;
pub use view::{EnumeratedView, FlagSet, ViewKind, ViewMember};

/// Elaborated node tree, traversal, and validation.
pub mod node;
pub use node::{
    join_path, validate_tree, MemoryRef, Node, NodeBody, NodeCounts, NodeKind, RegisterRef,
    Validation, PATH_SEPARATOR,
};

/// Bus transport contract.
pub mod transport;
pub use transport::Transport;

/// Register values, handles, batch scopes, and memory access.
pub mod access;
pub use access::{
    AccessOptions, Batch, FieldValue, Memory, Register, RegisterValue, WriteValue,
};

/// Compilation-unit partitioning engine.
pub mod partition;
pub use partition::{
    partition, CompilationUnit, Partition, PartitionConfig, PartitionMode,
    DEFAULT_SPLIT_THRESHOLD, MAIN_UNIT, TOP_LEVEL_UNIT,
};

/// Validation and partitioning combined into a render-ready plan.
pub mod plan;
pub use plan::{
    sanitize_identifier, BaseUnit, GenerationPlan, PlanConfig, PlannedUnit, DEFAULT_SOC_VERSION,
};

#[cfg(test)]
use proptest as _;
