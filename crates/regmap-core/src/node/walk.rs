use tracing::warn;

use crate::node::join_path;
use crate::{LayoutError, MemoryLayout, Node, NodeBody, NodeError, NodeKind, RegisterLayout};

/// A register located in the tree, with its path and grouping parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterRef<'a> {
    /// Dotted path from the root.
    pub path: String,
    /// Path of the nearest enclosing address map or register group below the
    /// root, or `None` for registers placed directly under the root.
    pub group: Option<String>,
    /// The register node.
    pub node: &'a Node,
    /// The register's layout.
    pub layout: &'a RegisterLayout,
}

impl RegisterRef<'_> {
    /// Instance name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.node.name
    }

    /// Absolute byte address.
    #[must_use]
    pub const fn address(&self) -> u64 {
        self.node.address
    }
}

/// A memory located in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRef<'a> {
    /// Dotted path from the root.
    pub path: String,
    /// The memory node.
    pub node: &'a Node,
    /// The memory's geometry.
    pub layout: &'a MemoryLayout,
}

/// A register or memory in walk order.
enum Leaf<'a> {
    Register(RegisterRef<'a>),
    Memory(MemoryRef<'a>),
}

impl Node {
    /// All registers of this subtree in document (pre-)order.
    #[must_use]
    pub fn registers(&self) -> Vec<RegisterRef<'_>> {
        leaves(self)
            .into_iter()
            .filter_map(|leaf| match leaf {
                Leaf::Register(register) => Some(register),
                Leaf::Memory(_) => None,
            })
            .collect()
    }

    /// All memories of this subtree in document order.
    #[must_use]
    pub fn memories(&self) -> Vec<MemoryRef<'_>> {
        leaves(self)
            .into_iter()
            .filter_map(|leaf| match leaf {
                Leaf::Memory(memory) => Some(memory),
                Leaf::Register(_) => None,
            })
            .collect()
    }
}

fn leaves(root: &Node) -> Vec<Leaf<'_>> {
    let mut out = Vec::new();
    collect(root, "", None, true, &mut out);
    out
}

fn collect<'a>(
    node: &'a Node,
    parent_path: &str,
    group: Option<&str>,
    is_root: bool,
    out: &mut Vec<Leaf<'a>>,
) {
    let path = join_path(parent_path, &node.name);
    match &node.body {
        NodeBody::AddressMap { children } | NodeBody::RegisterGroup { children } => {
            let child_group = if is_root { None } else { Some(path.as_str()) };
            for child in children {
                collect(child, &path, child_group, false, out);
            }
        }
        NodeBody::Register(layout) => out.push(Leaf::Register(RegisterRef {
            path,
            group: group.map(str::to_owned),
            node,
            layout,
        })),
        NodeBody::Memory(layout) => out.push(Leaf::Memory(MemoryRef { path, node, layout })),
    }
}

/// Registers and memories that passed validation, plus every rejection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Validation<'a> {
    /// Valid registers in document order.
    pub registers: Vec<RegisterRef<'a>>,
    /// Valid memories in document order.
    pub memories: Vec<MemoryRef<'a>>,
    /// One diagnostic per rejected node, in document order.
    pub errors: Vec<NodeError>,
}

impl Validation<'_> {
    /// Returns `true` when no node was rejected.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validates every register and memory layout below `root`.
///
/// A malformed node is excluded and reported; the rest of the tree is still
/// returned so one bad register never blocks the others. Memories are also
/// checked against their base address.
#[must_use]
pub fn validate_tree(root: &Node) -> Validation<'_> {
    let mut validation = Validation::default();
    for leaf in leaves(root) {
        match leaf {
            Leaf::Register(register) => match register.layout.validate() {
                Ok(()) => validation.registers.push(register),
                Err(error) => {
                    let node_error = locate(&register.path, NodeKind::Register, error);
                    warn!(path = %node_error.path, error = %node_error.error, "register rejected");
                    validation.errors.push(node_error);
                }
            },
            Leaf::Memory(memory) => match memory.layout.validate_at(memory.node.address) {
                Ok(()) => validation.memories.push(memory),
                Err(error) => {
                    let node_error = locate(&memory.path, NodeKind::Memory, error);
                    warn!(path = %node_error.path, error = %node_error.error, "memory rejected");
                    validation.errors.push(node_error);
                }
            },
        }
    }
    validation
}

/// Attributes field-specific defects to the field rather than its container.
fn locate(path: &str, kind: NodeKind, error: LayoutError) -> NodeError {
    let field = match &error {
        LayoutError::EmptyField { field }
        | LayoutError::FieldOutOfRange { field, .. }
        | LayoutError::DuplicateField { field }
        | LayoutError::OverlappingFields { second: field, .. } => Some(join_path(path, field)),
        LayoutError::InvalidRegisterWidth { .. }
        | LayoutError::InvalidMemory { .. }
        | LayoutError::AddressOverflow { .. } => None,
    };
    match field {
        Some(field_path) => NodeError {
            path: field_path,
            kind: NodeKind::Field,
            error,
        },
        None => NodeError {
            path: path.to_owned(),
            kind,
            error,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::validate_tree;
    use crate::{FieldLayout, LayoutError, MemoryLayout, Node, NodeKind, RegisterLayout};

    fn reg(name: &str, address: u64) -> Node {
        Node::register(
            name,
            address,
            RegisterLayout::new(4).with_field(FieldLayout::new("value", 0, 32)),
        )
    }

    fn soc() -> Node {
        Node::address_map(
            "soc",
            0,
            vec![
                reg("id", 0x0),
                Node::address_map(
                    "periph",
                    0x1000,
                    vec![
                        reg("ctrl", 0x1000),
                        Node::register_group("uart", 0x1100, vec![reg("data", 0x1100)]),
                    ],
                ),
                Node::memory("sram", 0x8000, MemoryLayout::new(64, 4)),
            ],
        )
    }

    #[test]
    fn registers_are_walked_in_document_order_with_groups() {
        let root = soc();
        let walked: Vec<(String, Option<String>)> = root
            .registers()
            .into_iter()
            .map(|register| (register.path, register.group))
            .collect();
        assert_eq!(
            walked,
            vec![
                ("soc.id".to_owned(), None),
                ("soc.periph.ctrl".to_owned(), Some("soc.periph".to_owned())),
                (
                    "soc.periph.uart.data".to_owned(),
                    Some("soc.periph.uart".to_owned())
                ),
            ]
        );
    }

    #[test]
    fn memories_are_collected_separately() {
        let root = soc();
        let memories = root.memories();
        assert_eq!(memories.len(), 1);
        assert_eq!(memories[0].path, "soc.sram");
        assert_eq!(memories[0].layout.entries, 64);
    }

    #[test]
    fn malformed_register_is_reported_without_blocking_the_rest() {
        let root = Node::address_map(
            "soc",
            0,
            vec![
                reg("good", 0x0),
                Node::register(
                    "bad",
                    0x4,
                    RegisterLayout::new(1).with_field(FieldLayout::new("wide", 4, 8)),
                ),
                reg("also_good", 0x8),
            ],
        );

        let validation = validate_tree(&root);
        assert!(!validation.is_clean());
        let names: Vec<&str> = validation.registers.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["good", "also_good"]);
        assert_eq!(validation.errors.len(), 1);
        assert_eq!(validation.errors[0].path, "soc.bad.wide");
        assert_eq!(validation.errors[0].kind, NodeKind::Field);
        assert!(matches!(
            validation.errors[0].error,
            LayoutError::FieldOutOfRange { register_bits: 8, .. }
        ));
    }

    #[test]
    fn register_level_defects_are_attributed_to_the_register() {
        let root = Node::address_map("soc", 0, vec![Node::register("r", 0, RegisterLayout::new(0))]);
        let validation = validate_tree(&root);
        assert_eq!(validation.errors[0].path, "soc.r");
        assert_eq!(validation.errors[0].kind, NodeKind::Register);
    }

    #[test]
    fn invalid_memory_is_reported_with_memory_kind() {
        let root = Node::address_map(
            "soc",
            0,
            vec![Node::memory("rom", 0, MemoryLayout::new(0, 4))],
        );
        let validation = validate_tree(&root);
        assert!(validation.memories.is_empty());
        assert_eq!(validation.errors[0].kind, NodeKind::Memory);
    }
    #[test]
    fn rejections_follow_document_order_across_kinds() {
        let root = Node::address_map(
            "soc",
            0,
            vec![
                Node::memory("rom", 0, MemoryLayout::new(0, 4)),
                Node::register("r", 0x10, RegisterLayout::new(0)),
                Node::memory("tail", u64::MAX - 3, MemoryLayout::new(2, 4)),
                reg("ok", 0x20),
            ],
        );
        let validation = validate_tree(&root);
        let rejected: Vec<(&str, NodeKind)> = validation
            .errors
            .iter()
            .map(|error| (error.path.as_str(), error.kind))
            .collect();
        assert_eq!(
            rejected,
            vec![
                ("soc.rom", NodeKind::Memory),
                ("soc.r", NodeKind::Register),
                ("soc.tail", NodeKind::Memory),
            ]
        );
        assert!(matches!(
            validation.errors[2].error,
            LayoutError::AddressOverflow { size_bytes: 8, .. }
        ));
        assert_eq!(validation.registers.len(), 1);
        assert!(validation.memories.is_empty());
    }
}
