//! Runtime values pairing a plain word with the layout that gives it meaning.

use std::fmt;

use crate::field::{compose, extract, field_mask, RangeError};
use crate::{FieldLayout, FlagSet, OverflowPolicy, RegisterLayout};

/// A field-sized value tagged with the bit range it came from or targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldValue {
    value: u64,
    lsb: u32,
    width: u32,
}

impl FieldValue {
    /// Creates a value aimed at bits `[lsb, lsb + width)`.
    ///
    /// `value` is not clamped here; the write path applies the overflow policy.
    #[must_use]
    pub const fn new(value: u64, lsb: u32, width: u32) -> Self {
        Self { value, lsb, width }
    }

    /// Creates a value aimed at `field`.
    #[must_use]
    pub const fn of(field: &FieldLayout, value: u64) -> Self {
        Self::new(value, field.lsb, field.width)
    }

    /// The carried value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.value
    }

    /// Least significant bit of the target range.
    #[must_use]
    pub const fn lsb(self) -> u32 {
        self.lsb
    }

    /// Width of the target range in bits.
    #[must_use]
    pub const fn width(self) -> u32 {
        self.width
    }

    /// Most significant bit of the target range.
    #[must_use]
    pub const fn msb(self) -> u32 {
        self.lsb.saturating_add(self.width.saturating_sub(1))
    }

    /// In-word mask of the target range.
    #[must_use]
    pub const fn mask(self) -> u64 {
        field_mask(self.lsb, self.width)
    }

    /// Composes this value into `word`, leaving other bits untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError`] when the value is too wide under
    /// [`OverflowPolicy::Reject`].
    pub const fn apply(self, word: u64, policy: OverflowPolicy) -> Result<u64, RangeError> {
        compose(word, self.lsb, self.width, self.value, policy)
    }

    pub(crate) const fn matches(self, field: &FieldLayout) -> bool {
        self.lsb == field.lsb && self.width == field.width
    }
}

impl From<FieldValue> for u64 {
    fn from(value: FieldValue) -> Self {
        value.value
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FieldValue({:#x}, lsb={}, width={})",
            self.value, self.lsb, self.width
        )
    }
}

/// A register word read from (or destined for) a specific address.
///
/// Field accessors derive their values from the word; they never touch the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterValue<'l> {
    raw: u64,
    address: u64,
    layout: &'l RegisterLayout,
}

impl<'l> RegisterValue<'l> {
    /// Wraps a raw word.
    #[must_use]
    pub const fn new(raw: u64, address: u64, layout: &'l RegisterLayout) -> Self {
        Self {
            raw,
            address,
            layout,
        }
    }

    /// The raw word.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.raw
    }

    /// Absolute address of the owning register.
    #[must_use]
    pub const fn address(self) -> u64 {
        self.address
    }

    /// Field layout of the owning register.
    #[must_use]
    pub const fn layout(self) -> &'l RegisterLayout {
        self.layout
    }

    /// Register width in bytes.
    #[must_use]
    pub const fn width_bytes(self) -> u8 {
        self.layout.width_bytes
    }

    /// Value of a named field, or `None` if the register has no such field.
    #[must_use]
    pub fn field(self, name: &str) -> Option<FieldValue> {
        self.layout
            .field(name)
            .map(|field| FieldValue::of(field, extract(self.raw, field.lsb, field.width)))
    }

    /// Every field in declaration order.
    pub fn fields(self) -> impl Iterator<Item = (&'l str, FieldValue)> {
        self.layout.fields.iter().map(move |field| {
            (
                field.name.as_str(),
                FieldValue::of(field, extract(self.raw, field.lsb, field.width)),
            )
        })
    }

    /// The word interpreted as a flag set.
    #[must_use]
    pub const fn flags(self) -> FlagSet {
        FlagSet(self.raw)
    }
}

impl From<RegisterValue<'_>> for u64 {
    fn from(value: RegisterValue<'_>) -> Self {
        value.raw
    }
}

impl fmt::Display for RegisterValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RegisterValue({:#x}, address={:#x}, width={}, fields=[",
            self.raw, self.address, self.layout.width_bytes
        )?;
        if self.layout.fields.is_empty() {
            f.write_str("no fields")?;
        }
        for (index, field) in self.layout.fields.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&field.name)?;
        }
        f.write_str("])")
    }
}

/// Argument of the single register write entry point.
///
/// A whole word replaces the register; a field value patches only its bits
/// through a read-modify-write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteValue {
    /// Replace the full register word.
    Word(u64),
    /// Patch the bits described by the field value.
    Field(FieldValue),
}

impl From<u64> for WriteValue {
    fn from(word: u64) -> Self {
        Self::Word(word)
    }
}

impl From<FieldValue> for WriteValue {
    fn from(value: FieldValue) -> Self {
        Self::Field(value)
    }
}

impl From<RegisterValue<'_>> for WriteValue {
    fn from(value: RegisterValue<'_>) -> Self {
        Self::Word(value.raw)
    }
}

impl From<FlagSet> for WriteValue {
    fn from(set: FlagSet) -> Self {
        Self::Word(set.bits())
    }
}
