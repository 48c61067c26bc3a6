//! Memory handles: indexed entry access over a contiguous address range.

use std::borrow::Cow;
use std::num::NonZeroU64;
use std::ops::Range;

use crate::access::register::Register;
use crate::field::fit;
use crate::{
    AccessError, AccessOptions, LayoutError, MemoryLayout, MemoryRef, RegisterLayout, Transport,
};

/// Access handle for one memory.
#[derive(Debug, Clone)]
pub struct Memory<'a> {
    name: String,
    base: u64,
    layout: &'a MemoryLayout,
    entry_layout: Cow<'a, RegisterLayout>,
    options: AccessOptions,
}

impl<'a> Memory<'a> {
    /// Creates a handle after validating `layout` at `base`.
    ///
    /// # Errors
    ///
    /// Returns the layout's [`LayoutError`] if it is malformed, or
    /// [`LayoutError::AddressOverflow`] if the last entry is not addressable.
    pub fn new(
        name: impl Into<String>,
        base: u64,
        layout: &'a MemoryLayout,
        options: AccessOptions,
    ) -> Result<Self, LayoutError> {
        layout.validate_at(base)?;
        let entry_layout = layout.entry.as_ref().map_or_else(
            || Cow::Owned(RegisterLayout::new(layout.entry_width_bytes)),
            Cow::Borrowed,
        );
        Ok(Self {
            name: name.into(),
            base,
            layout,
            entry_layout,
            options,
        })
    }

    /// Creates a handle for a memory found by a tree walk.
    ///
    /// # Errors
    ///
    /// Returns the layout's [`LayoutError`] if it is malformed.
    pub fn from_ref(memory: &MemoryRef<'a>, options: AccessOptions) -> Result<Self, LayoutError> {
        Self::new(memory.node.name.as_str(), memory.node.address, memory.layout, options)
    }

    /// Instance name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute address of entry zero.
    #[must_use]
    pub const fn base(&self) -> u64 {
        self.base
    }

    /// Entry geometry.
    #[must_use]
    pub const fn layout(&self) -> &'a MemoryLayout {
        self.layout
    }

    /// Number of entries.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.layout.entries
    }

    /// Returns `true` for a memory without entries. Validated layouts always
    /// have at least one.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.layout.entries == 0
    }

    /// Absolute address of entry `index`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::IndexOutOfRange`] past the last entry.
    pub fn address_of(&self, index: u64) -> Result<u64, AccessError> {
        let out_of_range = || AccessError::IndexOutOfRange {
            memory: self.name.clone(),
            index,
            len: self.layout.entries,
        };
        if index >= self.layout.entries {
            return Err(out_of_range());
        }
        // Construction checked the span, so this only fails for a bad index.
        index
            .checked_mul(u64::from(self.layout.entry_width_bytes))
            .and_then(|offset| self.base.checked_add(offset))
            .ok_or_else(out_of_range)
    }

    /// Reads one entry.
    ///
    /// # Errors
    ///
    /// Fails for an out-of-range index or on transport failure.
    pub fn read<T: Transport + ?Sized>(&self, bus: &mut T, index: u64) -> Result<u64, AccessError> {
        let address = self.address_of(index)?;
        Ok(bus.read(address, self.layout.entry_width_bytes)?)
    }

    /// Writes one entry.
    ///
    /// # Errors
    ///
    /// Fails for an out-of-range index, a value wider than the entry under
    /// [`OverflowPolicy::Reject`](crate::OverflowPolicy::Reject), or on
    /// transport failure.
    pub fn write<T: Transport + ?Sized>(
        &self,
        bus: &mut T,
        index: u64,
        value: u64,
    ) -> Result<(), AccessError> {
        let address = self.address_of(index)?;
        let value = fit(value, self.entry_layout.bit_width(), self.options.overflow)
            .map_err(|err| err.for_target(&self.name))?;
        Ok(bus.write(address, value, self.layout.entry_width_bytes)?)
    }

    /// Register handle for entry `index`, with the entry's field layout.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::IndexOutOfRange`] past the last entry.
    pub fn entry(&self, index: u64) -> Result<Register<'_>, AccessError> {
        let address = self.address_of(index)?;
        Ok(Register::unchecked(
            format!("{}[{index}]", self.name),
            address,
            &self.entry_layout,
            self.options,
        ))
    }

    /// Reads the entries in `range`, one transaction each.
    ///
    /// # Errors
    ///
    /// Fails before any bus traffic if the range exceeds the memory, or on the
    /// first transport failure.
    pub fn read_range<T: Transport + ?Sized>(
        &self,
        bus: &mut T,
        range: Range<u64>,
    ) -> Result<Vec<u64>, AccessError> {
        self.read_stepped(bus, range, NonZeroU64::MIN)
    }

    /// Reads every `step`-th entry of `range`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Memory::read_range`].
    pub fn read_stepped<T: Transport + ?Sized>(
        &self,
        bus: &mut T,
        range: Range<u64>,
        step: NonZeroU64,
    ) -> Result<Vec<u64>, AccessError> {
        self.check_range(&range)?;
        let step = usize::try_from(step.get()).unwrap_or(usize::MAX);
        range
            .step_by(step)
            .map(|index| self.read(bus, index))
            .collect()
    }

    /// Writes `values` to consecutive entries starting at `start`.
    ///
    /// # Errors
    ///
    /// Fails before any bus traffic if the values run past the memory, or on
    /// the first value or transport failure.
    pub fn write_range<T: Transport + ?Sized>(
        &self,
        bus: &mut T,
        start: u64,
        values: &[u64],
    ) -> Result<(), AccessError> {
        let count = u64::try_from(values.len()).unwrap_or(u64::MAX);
        self.check_range(&(start..start.saturating_add(count)))?;
        values
            .iter()
            .zip(start..)
            .try_for_each(|(&value, index)| self.write(bus, index, value))
    }

    fn check_range(&self, range: &Range<u64>) -> Result<(), AccessError> {
        if range.end > self.layout.entries {
            return Err(AccessError::IndexOutOfRange {
                memory: self.name.clone(),
                index: range.end.saturating_sub(1),
                len: self.layout.entries,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::num::NonZeroU64;

    use super::Memory;
    use crate::{
        AccessError, AccessOptions, FieldLayout, LayoutError, MemoryLayout, RegisterLayout,
        Transport, TransportError,
    };

    #[derive(Default)]
    struct Bus {
        words: BTreeMap<u64, u64>,
        reads: Vec<u64>,
    }

    impl Transport for Bus {
        fn read(&mut self, address: u64, _width_bytes: u8) -> Result<u64, TransportError> {
            self.reads.push(address);
            Ok(self.words.get(&address).copied().unwrap_or(0))
        }

        fn write(&mut self, address: u64, value: u64, _width_bytes: u8) -> Result<(), TransportError> {
            self.words.insert(address, value);
            Ok(())
        }
    }

    #[test]
    fn memories_running_past_the_address_space_are_rejected() {
        let layout = MemoryLayout::new(4, 4);
        assert_eq!(
            Memory::new("tail", u64::MAX - 3, &layout, AccessOptions::default()).unwrap_err(),
            LayoutError::AddressOverflow {
                base: u64::MAX - 3,
                size_bytes: 16,
            }
        );

        let huge = MemoryLayout::new(u64::MAX, 8);
        assert!(matches!(
            Memory::new("huge", 0, &huge, AccessOptions::default()),
            Err(LayoutError::AddressOverflow { .. })
        ));

        let flush = MemoryLayout::new(4, 4);
        let mem = Memory::new("flush", u64::MAX - 15, &flush, AccessOptions::default()).unwrap();
        assert_eq!(mem.address_of(3), Ok(u64::MAX - 3));
    }

    #[test]
    fn entries_are_addressed_by_stride() {
        let layout = MemoryLayout::new(8, 4);
        let mem = Memory::new("sram", 0x2000, &layout, AccessOptions::default()).unwrap();
        assert_eq!(mem.len(), 8);
        assert!(!mem.is_empty());
        assert_eq!(mem.address_of(0), Ok(0x2000));
        assert_eq!(mem.address_of(7), Ok(0x201C));
        assert_eq!(
            mem.address_of(8),
            Err(AccessError::IndexOutOfRange {
                memory: "sram".into(),
                index: 8,
                len: 8
            })
        );
    }

    #[test]
    fn single_entry_access_hits_the_right_address() {
        let layout = MemoryLayout::new(4, 2);
        let mem = Memory::new("buf", 0x100, &layout, AccessOptions::default()).unwrap();
        let mut bus = Bus::default();

        mem.write(&mut bus, 3, 0xBEEF).unwrap();
        assert_eq!(bus.words.get(&0x106), Some(&0xBEEF));
        assert_eq!(mem.read(&mut bus, 3), Ok(0xBEEF));
        assert!(matches!(
            mem.write(&mut bus, 0, 0x1_0000),
            Err(AccessError::Range { width: 16, .. })
        ));
    }

    #[test]
    fn range_reads_honour_step_and_bounds() {
        let layout = MemoryLayout::new(6, 1);
        let mem = Memory::new("lut", 0, &layout, AccessOptions::default()).unwrap();
        let mut bus = Bus::default();
        mem.write_range(&mut bus, 0, &[10, 11, 12, 13, 14, 15]).unwrap();

        assert_eq!(mem.read_range(&mut bus, 1..4), Ok(vec![11, 12, 13]));
        let step = NonZeroU64::new(2).unwrap();
        assert_eq!(mem.read_stepped(&mut bus, 0..6, step), Ok(vec![10, 12, 14]));

        bus.reads.clear();
        assert!(mem.read_range(&mut bus, 4..7).is_err());
        assert!(bus.reads.is_empty());
        assert!(mem.write_range(&mut bus, 5, &[1, 2]).is_err());
        assert_eq!(bus.words.get(&5), Some(&15));
    }

    #[test]
    fn entries_expose_the_entry_field_layout() {
        let layout = MemoryLayout::new(4, 4).with_entry(
            RegisterLayout::new(4)
                .with_field(FieldLayout::new("valid", 0, 1))
                .with_field(FieldLayout::new("tag", 8, 8)),
        );
        let mem = Memory::new("tags", 0x40, &layout, AccessOptions::default()).unwrap();
        let mut bus = Bus::default();

        let entry = mem.entry(2).unwrap();
        assert_eq!(entry.name(), "tags[2]");
        assert_eq!(entry.address(), 0x48);
        entry.write_field(&mut bus, "tag", 0xAB).unwrap();
        entry.write_field(&mut bus, "valid", 1).unwrap();
        assert_eq!(bus.words.get(&0x48), Some(&0xAB01));
        assert!(mem.entry(4).is_err());
    }
}
