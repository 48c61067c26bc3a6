//! Register handles: reads, whole-word writes, and per-field read-modify-write.

use std::cell::Cell;

use tracing::trace;

use crate::access::batch::Batch;
use crate::field::fit;
use crate::{
    AccessError, EnumeratedView, FieldLayout, FieldValue, FlagSet, LayoutError, OverflowPolicy,
    RegisterLayout, RegisterRef, RegisterValue, Transport, WriteValue,
};

/// Host-side policies applied by register and memory handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct AccessOptions {
    /// What happens when a value is wider than its target bits.
    pub overflow: OverflowPolicy,
    /// Honour the software readable/writable flags of fields.
    pub access_checks: bool,
}

impl Default for AccessOptions {
    fn default() -> Self {
        Self {
            overflow: OverflowPolicy::Reject,
            access_checks: true,
        }
    }
}

/// Access handle for one register.
///
/// A handle is meant for one logical thread of control; it holds the batch
/// reentrancy flag and is therefore neither `Sync` nor shareable across
/// concurrent callers.
#[derive(Debug)]
pub struct Register<'a> {
    name: String,
    address: u64,
    layout: &'a RegisterLayout,
    options: AccessOptions,
    pub(crate) batch_open: Cell<bool>,
}

impl<'a> Register<'a> {
    /// Creates a handle after validating `layout`.
    ///
    /// # Errors
    ///
    /// Returns the layout's [`LayoutError`] if it is malformed.
    pub fn new(
        name: impl Into<String>,
        address: u64,
        layout: &'a RegisterLayout,
        options: AccessOptions,
    ) -> Result<Self, LayoutError> {
        layout.validate()?;
        Ok(Self::unchecked(name, address, layout, options))
    }

    pub(crate) fn unchecked(
        name: impl Into<String>,
        address: u64,
        layout: &'a RegisterLayout,
        options: AccessOptions,
    ) -> Self {
        Self {
            name: name.into(),
            address,
            layout,
            options,
            batch_open: Cell::new(false),
        }
    }

    /// Creates a handle for a register found by a tree walk.
    ///
    /// # Errors
    ///
    /// Returns the layout's [`LayoutError`] if it is malformed.
    pub fn from_ref(register: &RegisterRef<'a>, options: AccessOptions) -> Result<Self, LayoutError> {
        Self::new(register.name(), register.address(), register.layout, options)
    }

    /// Instance name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute byte address.
    #[must_use]
    pub const fn address(&self) -> u64 {
        self.address
    }

    /// Field layout.
    #[must_use]
    pub const fn layout(&self) -> &'a RegisterLayout {
        self.layout
    }

    /// Policies in effect for this handle.
    #[must_use]
    pub const fn options(&self) -> AccessOptions {
        self.options
    }

    /// Flag/enum view derived from the layout annotation, if any.
    #[must_use]
    pub fn view(&self) -> Option<EnumeratedView> {
        EnumeratedView::derive(self.layout)
    }

    /// Reads the register: one transport read.
    ///
    /// # Errors
    ///
    /// Propagates transport failures unchanged.
    pub fn read<T: Transport + ?Sized>(&self, bus: &mut T) -> Result<RegisterValue<'a>, AccessError> {
        let raw = bus.read(self.address, self.layout.width_bytes)?;
        trace!(register = %self.name, address = self.address, raw, "read");
        Ok(self.wrap(raw))
    }

    /// Reads one field: one transport read.
    ///
    /// # Errors
    ///
    /// Fails for unknown or non-readable fields, or on transport failure.
    pub fn read_field<T: Transport + ?Sized>(
        &self,
        bus: &mut T,
        name: &str,
    ) -> Result<FieldValue, AccessError> {
        let field = self.readable_field(name)?;
        let raw = bus.read(self.address, self.layout.width_bytes)?;
        Ok(FieldValue::of(field, field.extract(raw)))
    }

    /// Reads the register as a flag set.
    ///
    /// # Errors
    ///
    /// Propagates transport failures unchanged.
    pub fn read_flags<T: Transport + ?Sized>(&self, bus: &mut T) -> Result<FlagSet, AccessError> {
        self.read(bus).map(RegisterValue::flags)
    }

    /// Single write entry point.
    ///
    /// A [`WriteValue::Word`] replaces the register with one transport write.
    /// A [`WriteValue::Field`] performs read, compose, write on the field's
    /// bits only: two transport transactions.
    ///
    /// # Errors
    ///
    /// Fails on values too wide for their target under
    /// [`OverflowPolicy::Reject`], field values outside the register or
    /// targeting a read-only field, and transport failures.
    pub fn write<T: Transport + ?Sized>(
        &self,
        bus: &mut T,
        value: impl Into<WriteValue>,
    ) -> Result<(), AccessError> {
        match value.into() {
            WriteValue::Word(word) => {
                let word = self.fit_word(word)?;
                self.store(bus, word)
            }
            WriteValue::Field(field_value) => {
                self.check_field_value(field_value)?;
                let current = bus.read(self.address, self.layout.width_bytes)?;
                let word = self.compose_field_value(current, field_value)?;
                self.store(bus, word)
            }
        }
    }

    /// Writes one named field by read-modify-write: two transport transactions.
    ///
    /// # Errors
    ///
    /// Fails for unknown or read-only fields, values too wide under
    /// [`OverflowPolicy::Reject`], and transport failures.
    pub fn write_field<T: Transport + ?Sized>(
        &self,
        bus: &mut T,
        name: &str,
        value: u64,
    ) -> Result<(), AccessError> {
        let field = self.writable_field(name)?;
        self.write(bus, FieldValue::of(field, value))
    }

    /// Opens a batch scope: one read now, one write when the scope closes.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Reentrancy`] when a batch is already open on this
    /// handle, or the transport's error if the seeding read fails.
    pub fn batch<'r, T: Transport + ?Sized>(
        &'r self,
        bus: &'r mut T,
    ) -> Result<Batch<'r, T>, AccessError> {
        Batch::open(self, bus)
    }

    /// Runs `body` inside a batch scope.
    ///
    /// The accumulated word is written once if `body` succeeds. If `body`
    /// returns an error nothing is written and the error is returned.
    ///
    /// # Errors
    ///
    /// Returns errors from opening the scope, from `body`, or from the commit.
    pub fn modify<T, R, F>(&self, bus: &mut T, body: F) -> Result<R, AccessError>
    where
        T: Transport + ?Sized,
        F: FnOnce(&mut Batch<'_, T>) -> Result<R, AccessError>,
    {
        let mut batch = self.batch(bus)?;
        match body(&mut batch) {
            Ok(output) => {
                batch.commit()?;
                Ok(output)
            }
            Err(err) => {
                batch.discard();
                Err(err)
            }
        }
    }

    pub(crate) const fn wrap(&self, raw: u64) -> RegisterValue<'a> {
        RegisterValue::new(raw, self.address, self.layout)
    }

    pub(crate) fn store<T: Transport + ?Sized>(&self, bus: &mut T, word: u64) -> Result<(), AccessError> {
        trace!(register = %self.name, address = self.address, word, "write");
        bus.write(self.address, word, self.layout.width_bytes)
            .map_err(AccessError::from)
    }

    pub(crate) fn fit_word(&self, word: u64) -> Result<u64, AccessError> {
        fit(word, self.layout.bit_width(), self.options.overflow)
            .map_err(|err| err.for_target(&self.name))
    }

    pub(crate) fn lookup(&self, name: &str) -> Result<&'a FieldLayout, AccessError> {
        self.layout.field(name).ok_or_else(|| AccessError::UnknownField {
            register: self.name.clone(),
            field: name.to_owned(),
        })
    }

    pub(crate) fn readable_field(&self, name: &str) -> Result<&'a FieldLayout, AccessError> {
        let field = self.lookup(name)?;
        if self.options.access_checks && !field.access.readable {
            return Err(AccessError::NotReadable {
                field: field.name.clone(),
            });
        }
        Ok(field)
    }

    pub(crate) fn writable_field(&self, name: &str) -> Result<&'a FieldLayout, AccessError> {
        let field = self.lookup(name)?;
        if self.options.access_checks && !field.access.writable {
            return Err(AccessError::NotWritable {
                field: field.name.clone(),
            });
        }
        Ok(field)
    }

    /// Rejects field values that fall outside the register or touch any bit
    /// of a declared read-only field.
    pub(crate) fn check_field_value(&self, value: FieldValue) -> Result<(), AccessError> {
        if value.width() == 0 || value.lsb().saturating_add(value.width()) > self.layout.bit_width() {
            return Err(AccessError::UnknownField {
                register: self.name.clone(),
                field: format!("bits[{}:{}]", value.msb(), value.lsb()),
            });
        }
        if self.options.access_checks {
            let mask = value.mask();
            if let Some(field) = self
                .layout
                .fields
                .iter()
                .find(|field| !field.access.writable && field.mask() & mask != 0)
            {
                return Err(AccessError::NotWritable {
                    field: field.name.clone(),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn compose_field_value(&self, word: u64, value: FieldValue) -> Result<u64, AccessError> {
        value.apply(word, self.options.overflow).map_err(|err| {
            let target = self
                .layout
                .fields
                .iter()
                .find(|field| value.matches(field))
                .map_or(self.name.as_str(), |field| field.name.as_str());
            err.for_target(target)
        })
    }
}
