//! JSON manifest handed to the external renderer.
//!
//! The manifest is a flattened, owned snapshot of a [`GenerationPlan`]: every
//! register carries the field geometry and view members the renderer needs,
//! so the renderer never has to reload the tree.

use regmap_core::{
    EnumeratedView, FieldLayout, GenerationPlan, MemoryRef, NodeCounts, NodeError, NodeKind,
    PartitionMode, PlannedUnit, RegisterRef, ViewKind,
};
use serde::Serialize;

/// Top-level manifest document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    /// Sanitized module identifier.
    pub module: String,
    /// Module version.
    pub version: String,
    /// Source file of the always-emitted main unit.
    pub base_file: String,
    /// Split unit files included by the main unit.
    pub unit_files: Vec<String>,
    /// Partitioning strategy that produced `units`.
    pub partition: PartitionMode,
    /// Compilation units in stable order.
    pub units: Vec<UnitEntry>,
    /// Valid memories.
    pub memories: Vec<MemoryEntry>,
    /// Node totals of the input tree.
    pub counts: CountsEntry,
    /// Rejected nodes.
    pub errors: Vec<ErrorEntry>,
}

/// One compilation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitEntry {
    /// Position of the unit.
    pub index: usize,
    /// Unit name before sanitization.
    pub name: String,
    /// Identifier for the unit's entry point.
    pub identifier: String,
    /// Source file for the unit.
    pub source_file: String,
    /// Registers in document order.
    pub registers: Vec<RegisterEntry>,
}

/// One register with its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterEntry {
    /// Dotted path from the root.
    pub path: String,
    /// Instance name.
    pub name: String,
    /// Absolute byte address.
    pub address: u64,
    /// Register width in bytes.
    pub width_bytes: u8,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Fields in declaration order.
    pub fields: Vec<FieldEntry>,
    /// Flag or enum view, when annotated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<ViewEntry>,
}

/// One field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldEntry {
    /// Field name.
    pub name: String,
    /// Least significant bit.
    pub lsb: u32,
    /// Most significant bit.
    pub msb: u32,
    /// Width in bits.
    pub width: u32,
    /// In-word mask.
    pub mask: u64,
    /// Software readable.
    pub readable: bool,
    /// Software writable.
    pub writable: bool,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Derived view of a register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewEntry {
    /// View semantics.
    pub kind: ViewKind,
    /// Members as `(NAME, value)` pairs in field order.
    pub members: Vec<(String, u64)>,
}

/// One memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryEntry {
    /// Dotted path from the root.
    pub path: String,
    /// Absolute address of entry zero.
    pub address: u64,
    /// Entry count.
    pub entries: u64,
    /// Entry width in bytes.
    pub entry_width_bytes: u8,
    /// Total span in bytes.
    pub size_bytes: u64,
    /// Entry field layout, when declared.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entry_fields: Vec<FieldEntry>,
}

/// Node totals per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountsEntry {
    /// Address maps, root included.
    pub address_maps: usize,
    /// Register groups.
    pub register_groups: usize,
    /// Registers, rejected ones included.
    pub registers: usize,
    /// Fields.
    pub fields: usize,
    /// Memories.
    pub memories: usize,
}

/// One rejected node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEntry {
    /// Dotted path of the offending node.
    pub path: String,
    /// Kind of the offending node.
    pub kind: NodeKind,
    /// Human-readable reason.
    pub message: String,
}

impl From<&GenerationPlan<'_>> for Manifest {
    fn from(plan: &GenerationPlan<'_>) -> Self {
        Self {
            module: plan.base.module.clone(),
            version: plan.base.version.clone(),
            base_file: plan.base.source_file.clone(),
            unit_files: plan.base.unit_files.clone(),
            partition: plan.mode,
            units: plan.units.iter().map(UnitEntry::from).collect(),
            memories: plan.memories.iter().map(MemoryEntry::from).collect(),
            counts: plan.counts.into(),
            errors: plan.errors.iter().map(ErrorEntry::from).collect(),
        }
    }
}

impl From<&PlannedUnit<'_>> for UnitEntry {
    fn from(planned: &PlannedUnit<'_>) -> Self {
        Self {
            index: planned.unit.index,
            name: planned.unit.name.clone(),
            identifier: planned.identifier.clone(),
            source_file: planned.source_file.clone(),
            registers: planned.unit.registers.iter().map(RegisterEntry::from).collect(),
        }
    }
}

impl From<&RegisterRef<'_>> for RegisterEntry {
    fn from(register: &RegisterRef<'_>) -> Self {
        Self {
            path: register.path.clone(),
            name: register.name().to_owned(),
            address: register.address(),
            width_bytes: register.layout.width_bytes,
            description: register.node.description.clone(),
            fields: register.layout.fields.iter().map(FieldEntry::from).collect(),
            view: EnumeratedView::derive(register.layout).map(|view| ViewEntry::from(&view)),
        }
    }
}

impl From<&FieldLayout> for FieldEntry {
    fn from(field: &FieldLayout) -> Self {
        Self {
            name: field.name.clone(),
            lsb: field.lsb,
            msb: field.msb(),
            width: field.width,
            mask: field.mask(),
            readable: field.access.readable,
            writable: field.access.writable,
            description: field.description.clone(),
        }
    }
}

impl From<&EnumeratedView> for ViewEntry {
    fn from(view: &EnumeratedView) -> Self {
        Self {
            kind: view.kind(),
            members: view
                .members()
                .iter()
                .map(|member| (member.name.clone(), member.value))
                .collect(),
        }
    }
}

impl From<&MemoryRef<'_>> for MemoryEntry {
    fn from(memory: &MemoryRef<'_>) -> Self {
        Self {
            path: memory.path.clone(),
            address: memory.node.address,
            entries: memory.layout.entries,
            entry_width_bytes: memory.layout.entry_width_bytes,
            size_bytes: memory.layout.size_bytes(),
            entry_fields: memory
                .layout
                .entry
                .iter()
                .flat_map(|entry| entry.fields.iter().map(FieldEntry::from))
                .collect(),
        }
    }
}

impl From<NodeCounts> for CountsEntry {
    fn from(counts: NodeCounts) -> Self {
        Self {
            address_maps: counts.address_maps,
            register_groups: counts.register_groups,
            registers: counts.registers,
            fields: counts.fields,
            memories: counts.memories,
        }
    }
}

impl From<&NodeError> for ErrorEntry {
    fn from(error: &NodeError) -> Self {
        Self {
            path: error.path.clone(),
            kind: error.kind,
            message: error.error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use regmap_core::{
        FieldLayout, GenerationPlan, MemoryLayout, Node, PlanConfig, RegisterLayout,
        SoftwareAccess, ViewKind,
    };

    use super::Manifest;

    fn soc() -> Node {
        Node::address_map(
            "demo",
            0,
            vec![
                Node::register(
                    "status",
                    0x0,
                    RegisterLayout::new(4)
                        .with_field(FieldLayout::new("ready", 0, 1))
                        .with_field(
                            FieldLayout::new("code", 4, 4).with_access(SoftwareAccess::READ_ONLY),
                        )
                        .with_view(ViewKind::Flag),
                )
                .with_description("Status flags"),
                Node::register(
                    "broken",
                    0x4,
                    RegisterLayout::new(1).with_field(FieldLayout::new("wide", 0, 9)),
                ),
                Node::memory("ram", 0x100, MemoryLayout::new(32, 4)),
            ],
        )
    }

    #[test]
    fn manifest_mirrors_the_plan() {
        let root = soc();
        let plan = GenerationPlan::build(&root, &PlanConfig::default());
        let manifest = Manifest::from(&plan);

        assert_eq!(manifest.module, "demo");
        assert_eq!(manifest.base_file, "demo_bindings.cpp");
        assert_eq!(manifest.units.len(), 1);
        let status = &manifest.units[0].registers[0];
        assert_eq!(status.description.as_deref(), Some("Status flags"));
        assert_eq!(status.fields[1].mask, 0xF0);
        assert!(!status.fields[1].writable);
        let view = status.view.as_ref().expect("flag view");
        assert_eq!(
            view.members,
            vec![("READY".to_owned(), 0x1), ("CODE".to_owned(), 0xF0)]
        );
        assert_eq!(manifest.memories[0].size_bytes, 128);
        assert_eq!(manifest.counts.registers, 2);
        assert_eq!(manifest.errors.len(), 1);
        assert_eq!(manifest.errors[0].path, "demo.broken.wide");
    }

    #[test]
    fn manifest_serializes_with_tagged_partition_mode() {
        let root = soc();
        let plan = GenerationPlan::build(&root, &PlanConfig::default());
        let json = serde_json::to_value(Manifest::from(&plan)).expect("manifest encodes");

        assert_eq!(json["partition"]["mode"], "single");
        assert_eq!(json["units"][0]["name"], "main");
        assert_eq!(json["errors"][0]["kind"], "field");
        assert!(json["units"][0]["registers"][0].get("view").is_some());
        assert!(json["memories"][0].get("entry_fields").is_none());
    }
}
