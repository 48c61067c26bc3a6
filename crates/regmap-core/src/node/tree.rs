use crate::node::PATH_SEPARATOR;
use crate::{MemoryLayout, RegisterLayout};

/// Discriminant of the node family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NodeKind {
    /// Top-level or nested address map.
    AddressMap,
    /// Register file grouping related registers.
    RegisterGroup,
    /// Addressable register.
    Register,
    /// Bit range inside a register.
    Field,
    /// External array of entries.
    Memory,
}

/// Per-kind payload of a tree node.
///
/// Fields are owned by their register layout rather than appearing as child
/// nodes; they are still reported as [`NodeKind::Field`] in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum NodeBody {
    /// Address map owning ordered children.
    AddressMap {
        /// Children in document order.
        #[cfg_attr(feature = "serde", serde(default))]
        children: Vec<Node>,
    },
    /// Register group owning ordered children.
    RegisterGroup {
        /// Children in document order.
        #[cfg_attr(feature = "serde", serde(default))]
        children: Vec<Node>,
    },
    /// Register with its field layout.
    Register(RegisterLayout),
    /// Memory with its entry geometry.
    Memory(MemoryLayout),
}

/// One node of an already-elaborated register tree.
///
/// Addresses are absolute. The tree is built once and never mutated by the
/// access layer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Node {
    /// Instance name.
    pub name: String,
    /// Optional human-readable description.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub description: Option<String>,
    /// Resolved absolute byte address.
    #[cfg_attr(feature = "serde", serde(default))]
    pub address: u64,
    /// Kind-specific payload.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub body: NodeBody,
}

/// Node totals per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeCounts {
    /// Address maps, root included.
    pub address_maps: usize,
    /// Register groups.
    pub register_groups: usize,
    /// Registers.
    pub registers: usize,
    /// Fields across all registers.
    pub fields: usize,
    /// Memories.
    pub memories: usize,
}

impl Node {
    /// Creates an address map.
    #[must_use]
    pub fn address_map(name: impl Into<String>, address: u64, children: Vec<Self>) -> Self {
        Self::new(name, address, NodeBody::AddressMap { children })
    }

    /// Creates a register group.
    #[must_use]
    pub fn register_group(name: impl Into<String>, address: u64, children: Vec<Self>) -> Self {
        Self::new(name, address, NodeBody::RegisterGroup { children })
    }

    /// Creates a register.
    #[must_use]
    pub fn register(name: impl Into<String>, address: u64, layout: RegisterLayout) -> Self {
        Self::new(name, address, NodeBody::Register(layout))
    }

    /// Creates a memory.
    #[must_use]
    pub fn memory(name: impl Into<String>, address: u64, layout: MemoryLayout) -> Self {
        Self::new(name, address, NodeBody::Memory(layout))
    }

    fn new(name: impl Into<String>, address: u64, body: NodeBody) -> Self {
        Self {
            name: name.into(),
            description: None,
            address,
            body,
        }
    }

    /// Attaches a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Discriminant of this node.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self.body {
            NodeBody::AddressMap { .. } => NodeKind::AddressMap,
            NodeBody::RegisterGroup { .. } => NodeKind::RegisterGroup,
            NodeBody::Register(_) => NodeKind::Register,
            NodeBody::Memory(_) => NodeKind::Memory,
        }
    }

    /// Ordered children; empty for registers and memories.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        match &self.body {
            NodeBody::AddressMap { children } | NodeBody::RegisterGroup { children } => children,
            NodeBody::Register(_) | NodeBody::Memory(_) => &[],
        }
    }

    /// Returns `true` for address maps and register groups.
    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(
            self.body,
            NodeBody::AddressMap { .. } | NodeBody::RegisterGroup { .. }
        )
    }

    /// Register layout, when this node is a register.
    #[must_use]
    pub const fn register_layout(&self) -> Option<&RegisterLayout> {
        match &self.body {
            NodeBody::Register(layout) => Some(layout),
            _ => None,
        }
    }

    /// Memory layout, when this node is a memory.
    #[must_use]
    pub const fn memory_layout(&self) -> Option<&MemoryLayout> {
        match &self.body {
            NodeBody::Memory(layout) => Some(layout),
            _ => None,
        }
    }

    /// Resolves a dotted path whose first segment names this node.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&Self> {
        let mut segments = path.split(PATH_SEPARATOR);
        if segments.next()? != self.name {
            return None;
        }
        segments.try_fold(self, |node, segment| {
            node.children().iter().find(|child| child.name == segment)
        })
    }

    /// Counts nodes of every kind in this subtree.
    #[must_use]
    pub fn counts(&self) -> NodeCounts {
        let mut counts = NodeCounts::default();
        self.accumulate(&mut counts);
        counts
    }

    fn accumulate(&self, counts: &mut NodeCounts) {
        match &self.body {
            NodeBody::AddressMap { children } => {
                counts.address_maps += 1;
                children.iter().for_each(|child| child.accumulate(counts));
            }
            NodeBody::RegisterGroup { children } => {
                counts.register_groups += 1;
                children.iter().for_each(|child| child.accumulate(counts));
            }
            NodeBody::Register(layout) => {
                counts.registers += 1;
                counts.fields += layout.fields.len();
            }
            NodeBody::Memory(_) => counts.memories += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Node, NodeCounts, NodeKind};
    use crate::{FieldLayout, MemoryLayout, RegisterLayout};

    fn soc() -> Node {
        Node::address_map(
            "soc",
            0,
            vec![
                Node::register(
                    "ctrl",
                    0x0,
                    RegisterLayout::new(4).with_field(FieldLayout::new("enable", 0, 1)),
                ),
                Node::register_group(
                    "uart",
                    0x100,
                    vec![Node::register(
                        "status",
                        0x104,
                        RegisterLayout::new(4)
                            .with_field(FieldLayout::new("ready", 0, 1))
                            .with_field(FieldLayout::new("error", 1, 1)),
                    )],
                ),
                Node::memory("buffer", 0x1000, MemoryLayout::new(16, 4)),
            ],
        )
    }

    #[test]
    fn kind_discriminant_matches_body() {
        let root = soc();
        assert_eq!(root.kind(), NodeKind::AddressMap);
        assert!(root.is_container());
        let kinds: Vec<NodeKind> = root.children().iter().map(Node::kind).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Register, NodeKind::RegisterGroup, NodeKind::Memory]
        );
    }

    #[test]
    fn find_resolves_dotted_paths_from_the_root_name() {
        let root = soc();
        let status = root.find("soc.uart.status").expect("status exists");
        assert_eq!(status.address, 0x104);
        assert!(status.register_layout().is_some());
        assert!(root.find("soc").is_some());
        assert!(root.find("uart.status").is_none());
        assert!(root.find("soc.uart.missing").is_none());
    }

    #[test]
    fn counts_cover_every_kind() {
        assert_eq!(
            soc().counts(),
            NodeCounts {
                address_maps: 1,
                register_groups: 1,
                registers: 2,
                fields: 3,
                memories: 1,
            }
        );
    }

    #[test]
    fn leaves_have_no_children() {
        let root = soc();
        let buffer = root.find("soc.buffer").expect("buffer exists");
        assert!(buffer.children().is_empty());
        assert_eq!(buffer.memory_layout().map(|memory| memory.entries), Some(16));
    }
}
