//! Generation plan: validation and partitioning combined into the description
//! an external renderer consumes.

use tracing::{debug, info};

use crate::partition::{partition, CompilationUnit, Partition, PartitionConfig, PartitionMode};
use crate::{validate_tree, MemoryRef, Node, NodeCounts, NodeError};

/// Module version used when none is configured.
pub const DEFAULT_SOC_VERSION: &str = "0.1.0";

/// Fallback identifier for names with no usable characters.
pub const FALLBACK_IDENTIFIER: &str = "soc";

/// Turns an arbitrary name into a C-style identifier.
///
/// Characters outside `[A-Za-z0-9_]` become `_`, a leading digit gets a `_`
/// prefix and an empty name becomes `soc`.
#[must_use]
pub fn sanitize_identifier(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if ident.is_empty() {
        FALLBACK_IDENTIFIER.to_owned()
    } else {
        ident
    }
}

/// Generator settings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlanConfig {
    /// Module name; the root node's name when `None`.
    pub soc_name: Option<String>,
    /// Module version.
    pub soc_version: String,
    /// Partitioning policy.
    pub partition: PartitionConfig,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            soc_name: None,
            soc_version: DEFAULT_SOC_VERSION.to_owned(),
            partition: PartitionConfig::default(),
        }
    }
}

/// The always-emitted main unit that names the module and pulls in the
/// split units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUnit {
    /// Sanitized module identifier.
    pub module: String,
    /// Module version.
    pub version: String,
    /// Source file of the main unit.
    pub source_file: String,
    /// Source files of the split units, in unit order. Empty when unsplit.
    pub unit_files: Vec<String>,
}

/// One planned unit with its render-ready names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUnit<'a> {
    /// The partitioned registers.
    pub unit: CompilationUnit<'a>,
    /// Sanitized identifier derived from the unit name.
    pub identifier: String,
    /// Source file the renderer writes this unit to.
    pub source_file: String,
}

/// Everything a renderer needs for one tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationPlan<'a> {
    /// Main unit.
    pub base: BaseUnit,
    /// Strategy used for the units.
    pub mode: PartitionMode,
    /// Units in stable order.
    pub units: Vec<PlannedUnit<'a>>,
    /// Valid memories in document order.
    pub memories: Vec<MemoryRef<'a>>,
    /// Node totals of the whole tree, rejected nodes included.
    pub counts: NodeCounts,
    /// One diagnostic per rejected node.
    pub errors: Vec<NodeError>,
}

impl<'a> GenerationPlan<'a> {
    /// Validates `root`, partitions its valid registers and names every
    /// output file.
    ///
    /// Malformed registers are reported in [`GenerationPlan::errors`] and left
    /// out of the units; they never prevent planning the rest of the tree.
    #[must_use]
    pub fn build(root: &'a Node, config: &PlanConfig) -> Self {
        let module = sanitize_identifier(config.soc_name.as_deref().unwrap_or(&root.name));
        let validation = validate_tree(root);
        let Partition { mode, units } = partition(validation.registers, config.partition);

        let source_file = format!("{module}_bindings.cpp");
        let units: Vec<PlannedUnit<'a>> = units
            .into_iter()
            .map(|unit| {
                let unit_file = if mode.is_split() {
                    format!("{module}_bindings_{}.cpp", unit.index)
                } else {
                    source_file.clone()
                };
                debug!(unit = %unit.name, registers = unit.registers.len(), file = %unit_file, "unit planned");
                PlannedUnit {
                    identifier: sanitize_identifier(&unit.name),
                    source_file: unit_file,
                    unit,
                }
            })
            .collect();
        let unit_files = if mode.is_split() {
            units.iter().map(|unit| unit.source_file.clone()).collect()
        } else {
            Vec::new()
        };

        let plan = Self {
            base: BaseUnit {
                module,
                version: config.soc_version.clone(),
                source_file,
                unit_files,
            },
            mode,
            units,
            memories: validation.memories,
            counts: root.counts(),
            errors: validation.errors,
        };
        info!(
            module = %plan.base.module,
            units = plan.units.len(),
            registers = plan.register_count(),
            errors = plan.errors.len(),
            "generation planned"
        );
        plan
    }

    /// Returns `true` when no node was rejected.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Registers across all units.
    #[must_use]
    pub fn register_count(&self) -> usize {
        self.units.iter().map(|planned| planned.unit.registers.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{sanitize_identifier, GenerationPlan, PlanConfig};
    use crate::{FieldLayout, MemoryLayout, Node, PartitionConfig, PartitionMode, RegisterLayout};

    #[rstest]
    #[case("my_soc", "my_soc")]
    #[case("my-soc.v2", "my_soc_v2")]
    #[case("2fast", "_2fast")]
    #[case("", "soc")]
    #[case("soc.uart", "soc_uart")]
    fn identifiers_are_sanitized(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_identifier(input), expected);
    }

    fn tree(count: u64) -> Node {
        let mut children: Vec<Node> = (0..count)
            .map(|i| {
                Node::register(
                    format!("r{i}"),
                    i * 4,
                    RegisterLayout::new(4).with_field(FieldLayout::new("v", 0, 8)),
                )
            })
            .collect();
        children.push(Node::memory("buf", 0x1000, MemoryLayout::new(16, 4)));
        Node::address_map("chip-a", 0, children)
    }

    #[test]
    fn unsplit_plan_uses_the_base_file_only() {
        let root = tree(3);
        let plan = GenerationPlan::build(&root, &PlanConfig::default());
        assert!(plan.is_success());
        assert_eq!(plan.base.module, "chip_a");
        assert_eq!(plan.base.version, "0.1.0");
        assert_eq!(plan.base.source_file, "chip_a_bindings.cpp");
        assert!(plan.base.unit_files.is_empty());
        assert_eq!(plan.mode, PartitionMode::Single);
        assert_eq!(plan.units.len(), 1);
        assert_eq!(plan.units[0].source_file, "chip_a_bindings.cpp");
        assert_eq!(plan.memories.len(), 1);
        assert_eq!(plan.counts.registers, 3);
    }

    #[test]
    fn split_plan_names_one_file_per_unit() {
        let root = tree(5);
        let config = PlanConfig {
            soc_name: Some("board".into()),
            soc_version: "2.0.0".into(),
            partition: PartitionConfig {
                split_threshold: 2,
                split_by_hierarchy: false,
            },
        };
        let plan = GenerationPlan::build(&root, &config);
        assert_eq!(
            plan.base.unit_files,
            vec![
                "board_bindings_0.cpp",
                "board_bindings_1.cpp",
                "board_bindings_2.cpp"
            ]
        );
        assert_eq!(plan.units[1].identifier, "chunk_1");
        assert_eq!(plan.register_count(), 5);
    }

    #[test]
    fn rejected_registers_are_reported_and_left_out() {
        let root = Node::address_map(
            "soc",
            0,
            vec![
                Node::register("ok", 0, RegisterLayout::new(4)),
                Node::register(
                    "broken",
                    4,
                    RegisterLayout::new(1)
                        .with_field(FieldLayout::new("a", 0, 4))
                        .with_field(FieldLayout::new("b", 2, 4)),
                ),
            ],
        );
        let plan = GenerationPlan::build(&root, &PlanConfig::default());
        assert!(!plan.is_success());
        assert_eq!(plan.errors.len(), 1);
        assert_eq!(plan.errors[0].path, "soc.broken.b");
        assert_eq!(plan.register_count(), 1);
        assert_eq!(plan.counts.registers, 2);
    }
}
