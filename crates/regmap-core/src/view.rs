//! Flag and enum overlays derived from a register's field layout.
//!
//! A register annotated with [`ViewKind::Flag`] exposes each field as a
//! bitmask member that can be combined with `|`, `&`, and `-`. A register
//! annotated with [`ViewKind::Enum`] tags each field by its bit position and
//! treats the register as holding one discrete state at a time. Only one
//! active member is expected for enum views; nothing enforces it.
//!
//! Registers using a view are accessed through the view instead of per-field
//! accessors. That restriction is a usage contract, not a runtime check.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not, Sub};

use crate::field::field_mask;
use crate::RegisterLayout;

/// Enumerated-view annotation carried by a register layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ViewKind {
    /// Bitmask semantics: members combine by OR/AND.
    Flag,
    /// Discrete-state semantics: one member active at a time.
    Enum,
}

/// One named constant of an enumerated view.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewMember {
    /// Upper-cased field name.
    pub name: String,
    /// Member value in register-word coordinates.
    pub value: u64,
}

/// Immutable named-constant overlay over a register's raw value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumeratedView {
    kind: ViewKind,
    members: Vec<ViewMember>,
}

impl EnumeratedView {
    /// Derives the view for `layout`, or `None` when the register is unannotated.
    ///
    /// Flag members use `1 << lsb` for single-bit fields and the full field
    /// mask otherwise. Enum members always use `1 << lsb`, whatever the width.
    #[must_use]
    pub fn derive(layout: &RegisterLayout) -> Option<Self> {
        let kind = layout.view?;
        let members = layout
            .fields
            .iter()
            .map(|field| {
                let value = match kind {
                    ViewKind::Flag if field.width > 1 => field.mask(),
                    ViewKind::Flag | ViewKind::Enum => field_mask(field.lsb, 1),
                };
                ViewMember {
                    name: field.name.to_uppercase(),
                    value,
                }
            })
            .collect();
        Some(Self { kind, members })
    }

    /// View semantics.
    #[must_use]
    pub const fn kind(&self) -> ViewKind {
        self.kind
    }

    /// Members in field declaration order.
    #[must_use]
    pub fn members(&self) -> &[ViewMember] {
        &self.members
    }

    /// Looks up a member value by name, case-insensitively.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<u64> {
        self.members
            .iter()
            .find(|member| member.name.eq_ignore_ascii_case(name))
            .map(|member| member.value)
    }

    /// Wraps a raw register value as a flag set.
    #[must_use]
    pub const fn flags(&self, raw: u64) -> FlagSet {
        FlagSet(raw)
    }

    /// Members whose bits are all present in `raw`.
    pub fn active_members(&self, raw: u64) -> impl Iterator<Item = &ViewMember> + '_ {
        self.members
            .iter()
            .filter(move |member| raw & member.value == member.value)
    }

    /// Discrete state held by `raw` for enum views: the member equal to `raw`.
    #[must_use]
    pub fn state(&self, raw: u64) -> Option<&ViewMember> {
        self.members.iter().find(|member| member.value == raw)
    }
}

/// A raw register value interpreted with bitmask-set semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FlagSet(pub u64);

impl FlagSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Raw bits of the set.
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Membership test: `(value & member) == member`.
    #[must_use]
    pub const fn contains(self, member: u64) -> bool {
        self.0 & member == member
    }

    /// Returns `true` when no bits are set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for FlagSet {
    fn from(bits: u64) -> Self {
        Self(bits)
    }
}

impl From<FlagSet> for u64 {
    fn from(set: FlagSet) -> Self {
        set.0
    }
}

impl BitOr for FlagSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOr<u64> for FlagSet {
    type Output = Self;

    fn bitor(self, rhs: u64) -> Self {
        Self(self.0 | rhs)
    }
}

impl BitAnd for FlagSet {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitAnd<u64> for FlagSet {
    type Output = Self;

    fn bitand(self, rhs: u64) -> Self {
        Self(self.0 & rhs)
    }
}

impl Sub for FlagSet {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 & !rhs.0)
    }
}

impl Not for FlagSet {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl fmt::Display for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
