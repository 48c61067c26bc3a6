//! Field, register, and memory layout descriptors with construction-time validation.

use crate::field::{extract, field_mask, MAX_WORD_BITS};
use crate::{LayoutError, ViewKind};

/// Software access flags of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SoftwareAccess {
    /// Software may read the field.
    pub readable: bool,
    /// Software may write the field.
    pub writable: bool,
}

impl SoftwareAccess {
    /// Read-write access.
    pub const READ_WRITE: Self = Self {
        readable: true,
        writable: true,
    };
    /// Read-only access.
    pub const READ_ONLY: Self = Self {
        readable: true,
        writable: false,
    };
    /// Write-only access.
    pub const WRITE_ONLY: Self = Self {
        readable: false,
        writable: true,
    };
}

impl Default for SoftwareAccess {
    fn default() -> Self {
        Self::READ_WRITE
    }
}

/// A named bit range within a register.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct FieldLayout {
    /// Field name, unique within its register.
    pub name: String,
    /// Optional human-readable description.
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: Option<String>,
    /// Least significant bit offset.
    pub lsb: u32,
    /// Width in bits.
    pub width: u32,
    /// Software access flags.
    #[cfg_attr(feature = "serde", serde(default))]
    pub access: SoftwareAccess,
}

impl FieldLayout {
    /// Creates a read-write field.
    #[must_use]
    pub fn new(name: impl Into<String>, lsb: u32, width: u32) -> Self {
        Self {
            name: name.into(),
            description: None,
            lsb,
            width,
            access: SoftwareAccess::READ_WRITE,
        }
    }

    /// Replaces the access flags.
    #[must_use]
    pub const fn with_access(mut self, access: SoftwareAccess) -> Self {
        self.access = access;
        self
    }

    /// Attaches a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Most significant bit: `lsb + width - 1`.
    #[must_use]
    pub const fn msb(&self) -> u32 {
        self.lsb.saturating_add(self.width.saturating_sub(1))
    }

    /// In-word mask: `((1 << width) - 1) << lsb`.
    #[must_use]
    pub const fn mask(&self) -> u64 {
        field_mask(self.lsb, self.width)
    }

    /// Exclusive upper bound of the bit range.
    #[must_use]
    pub const fn end(&self) -> u32 {
        self.lsb.saturating_add(self.width)
    }

    /// Reads this field's bits out of a full register word.
    #[must_use]
    pub const fn extract(&self, word: u64) -> u64 {
        extract(word, self.lsb, self.width)
    }

    const fn overlaps(&self, other: &Self) -> bool {
        self.lsb < other.end() && other.lsb < self.end()
    }
}

/// Word layout of a register: byte width, fields, and optional view annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterLayout {
    /// Register width in bytes (`1..=8`).
    pub width_bytes: u8,
    /// Fields in declaration order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub fields: Vec<FieldLayout>,
    /// Flag/enum annotation requesting an enumerated view.
    #[cfg_attr(feature = "serde", serde(default))]
    pub view: Option<ViewKind>,
}

impl RegisterLayout {
    /// Creates a layout with no fields.
    #[must_use]
    pub const fn new(width_bytes: u8) -> Self {
        Self {
            width_bytes,
            fields: Vec::new(),
            view: None,
        }
    }

    /// Appends a field.
    #[must_use]
    pub fn with_field(mut self, field: FieldLayout) -> Self {
        self.fields.push(field);
        self
    }

    /// Sets the enumerated view annotation.
    #[must_use]
    pub const fn with_view(mut self, view: ViewKind) -> Self {
        self.view = Some(view);
        self
    }

    /// Register width in bits.
    #[must_use]
    pub const fn bit_width(&self) -> u32 {
        self.width_bytes as u32 * 8
    }

    /// Mask covering every bit of the register word.
    #[must_use]
    pub const fn word_mask(&self) -> u64 {
        field_mask(0, self.bit_width())
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Checks the register width and every field's range against each other.
    ///
    /// # Errors
    ///
    /// Returns the first [`LayoutError`] found: width outside `1..=8` bytes,
    /// zero-width or duplicate fields, fields past the register width, or
    /// overlapping fields.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let register_bits = self.bit_width();
        if self.width_bytes == 0 || register_bits > MAX_WORD_BITS {
            return Err(LayoutError::InvalidRegisterWidth {
                width_bytes: self.width_bytes,
            });
        }

        for (index, field) in self.fields.iter().enumerate() {
            if field.width == 0 {
                return Err(LayoutError::EmptyField {
                    field: field.name.clone(),
                });
            }
            if field.end() > register_bits {
                return Err(LayoutError::FieldOutOfRange {
                    field: field.name.clone(),
                    lsb: field.lsb,
                    width: field.width,
                    register_bits,
                });
            }
            for earlier in &self.fields[..index] {
                if earlier.name == field.name {
                    return Err(LayoutError::DuplicateField {
                        field: field.name.clone(),
                    });
                }
                if earlier.overlaps(field) {
                    return Err(LayoutError::OverlappingFields {
                        first: earlier.name.clone(),
                        second: field.name.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Layout of an external memory: an array of equally sized entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MemoryLayout {
    /// Number of entries.
    pub entries: u64,
    /// Width of one entry in bytes (`1..=8`).
    pub entry_width_bytes: u8,
    /// Optional field layout applied to every entry.
    #[cfg_attr(feature = "serde", serde(default))]
    pub entry: Option<RegisterLayout>,
}

impl MemoryLayout {
    /// Creates a memory layout without per-entry fields.
    #[must_use]
    pub const fn new(entries: u64, entry_width_bytes: u8) -> Self {
        Self {
            entries,
            entry_width_bytes,
            entry: None,
        }
    }

    /// Attaches a per-entry register layout.
    #[must_use]
    pub fn with_entry(mut self, entry: RegisterLayout) -> Self {
        self.entry = Some(entry);
        self
    }

    /// Total span in bytes covered by the memory.
    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        self.entries.saturating_mul(self.entry_width_bytes as u64)
    }

    /// Checks the entry count and width, then the entry layout if present.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidMemory`] for an empty memory or an entry
    /// width outside `1..=8`, or the entry layout's own error.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.entries == 0 || self.entry_width_bytes == 0 || self.entry_width_bytes > 8 {
            return Err(LayoutError::InvalidMemory {
                entries: self.entries,
                entry_width_bytes: self.entry_width_bytes,
            });
        }
        match &self.entry {
            Some(entry) if entry.width_bytes != self.entry_width_bytes => {
                Err(LayoutError::InvalidRegisterWidth {
                    width_bytes: entry.width_bytes,
                })
            }
            Some(entry) => entry.validate(),
            None => Ok(()),
        }
    }

    /// Validates the geometry and checks that every entry is addressable
    /// when the memory starts at `base`.
    ///
    /// # Errors
    ///
    /// Returns any [`MemoryLayout::validate`] error, or
    /// [`LayoutError::AddressOverflow`] when the span runs past `u64::MAX`.
    pub fn validate_at(&self, base: u64) -> Result<(), LayoutError> {
        self.validate()?;
        let span = self
            .entries
            .checked_mul(u64::from(self.entry_width_bytes))
            .and_then(|size| base.checked_add(size - 1));
        match span {
            Some(_) => Ok(()),
            None => Err(LayoutError::AddressOverflow {
                base,
                size_bytes: self.size_bytes(),
            }),
        }
    }
}
