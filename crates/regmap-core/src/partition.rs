//! Compilation-unit partitioning.
//!
//! Splits the registers of a tree into independently generated units so that
//! no single unit grows without bound. Count-based splitting chunks the
//! document-order register list; hierarchy-based splitting keeps every group
//! together and takes precedence when both are requested.

use std::collections::HashMap;

use tracing::debug;

use crate::RegisterRef;

/// Default register count above which count-based splitting kicks in.
pub const DEFAULT_SPLIT_THRESHOLD: usize = 100;

/// Unit name for registers placed directly under the root.
pub const TOP_LEVEL_UNIT: &str = "top_level";

/// Unit name used when no splitting happens.
pub const MAIN_UNIT: &str = "main";

/// Partitioning policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PartitionConfig {
    /// Maximum registers per unit; `0` disables count-based splitting.
    pub split_threshold: usize,
    /// Emit one unit per group instead of counting.
    pub split_by_hierarchy: bool,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            split_threshold: DEFAULT_SPLIT_THRESHOLD,
            split_by_hierarchy: false,
        }
    }
}

/// Strategy actually applied for a given register count and policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "mode", rename_all = "snake_case"))]
pub enum PartitionMode {
    /// Everything in one unit.
    Single,
    /// Fixed-size chunks in document order.
    ByCount {
        /// Registers per chunk.
        threshold: usize,
    },
    /// One unit per enclosing group.
    ByHierarchy,
}

impl PartitionMode {
    /// Picks the strategy for `register_count` registers.
    #[must_use]
    pub const fn select(config: PartitionConfig, register_count: usize) -> Self {
        if config.split_by_hierarchy {
            Self::ByHierarchy
        } else if config.split_threshold > 0 && register_count > config.split_threshold {
            Self::ByCount {
                threshold: config.split_threshold,
            }
        } else {
            Self::Single
        }
    }

    /// Returns `true` when registers are spread over several units.
    #[must_use]
    pub const fn is_split(self) -> bool {
        !matches!(self, Self::Single)
    }
}

/// An ordered bucket of registers generated together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit<'a> {
    /// Position of the unit in the partition, starting at zero.
    pub index: usize,
    /// Unit name: `main`, `chunk_<i>`, a group path, or `top_level`.
    pub name: String,
    /// Registers in document order.
    pub registers: Vec<RegisterRef<'a>>,
}

/// Result of partitioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition<'a> {
    /// Strategy that produced the units.
    pub mode: PartitionMode,
    /// Units in stable order.
    pub units: Vec<CompilationUnit<'a>>,
}

impl Partition<'_> {
    /// Total registers across all units.
    #[must_use]
    pub fn register_count(&self) -> usize {
        self.units.iter().map(|unit| unit.registers.len()).sum()
    }
}

/// Assigns every register to exactly one unit.
///
/// Unit order and membership depend only on the input order and `config`, so
/// repeated runs over the same tree give identical results. With hierarchy
/// splitting and no registers the result has no units; the single-unit mode
/// always yields one `main` unit, possibly empty.
#[must_use]
pub fn partition<'a>(registers: Vec<RegisterRef<'a>>, config: PartitionConfig) -> Partition<'a> {
    let mode = PartitionMode::select(config, registers.len());
    let units = match mode {
        PartitionMode::Single => vec![CompilationUnit {
            index: 0,
            name: MAIN_UNIT.to_owned(),
            registers,
        }],
        PartitionMode::ByCount { threshold } => by_count(registers, threshold),
        PartitionMode::ByHierarchy => by_hierarchy(registers),
    };
    debug!(?mode, units = units.len(), "registers partitioned");
    Partition { mode, units }
}

fn by_count(registers: Vec<RegisterRef<'_>>, threshold: usize) -> Vec<CompilationUnit<'_>> {
    let mut units: Vec<CompilationUnit<'_>> = Vec::new();
    for register in registers {
        match units.last_mut() {
            Some(unit) if unit.registers.len() < threshold => unit.registers.push(register),
            _ => {
                let index = units.len();
                units.push(CompilationUnit {
                    index,
                    name: format!("chunk_{index}"),
                    registers: vec![register],
                });
            }
        }
    }
    units
}

fn by_hierarchy(registers: Vec<RegisterRef<'_>>) -> Vec<CompilationUnit<'_>> {
    let mut units: Vec<CompilationUnit<'_>> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for register in registers {
        let key = register
            .group
            .clone()
            .unwrap_or_else(|| TOP_LEVEL_UNIT.to_owned());
        let position = *positions.entry(key).or_insert_with_key(|key| {
            units.push(CompilationUnit {
                index: units.len(),
                name: key.clone(),
                registers: Vec::new(),
            });
            units.len() - 1
        });
        units[position].registers.push(register);
    }
    units
}
