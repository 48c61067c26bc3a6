//! Scoped read-modify-write guard.
//!
//! Opening a [`Batch`] reads the register once into a shadow word. Every
//! access through the guard touches only the shadow. Closing the guard writes
//! the shadow back once, so any number of field updates costs one read and one
//! write on the bus.

use std::thread;

use tracing::{debug, warn};

use crate::access::register::Register;
use crate::{AccessError, FieldValue, RegisterValue, Transport, WriteValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    Poisoned,
    Closed,
}

/// Guard for an open batch scope on one register.
///
/// Dropping an open guard commits the shadow word. The write is skipped when
/// the thread is unwinding or when an operation on the guard has failed, so a
/// scope left through an error path never publishes partial state. Use
/// [`Batch::commit`] to observe the commit result and [`Batch::discard`] to
/// abandon the scope explicitly.
#[derive(Debug)]
pub struct Batch<'r, T: Transport + ?Sized> {
    register: &'r Register<'r>,
    bus: &'r mut T,
    shadow: u64,
    state: State,
}

impl<'r, T: Transport + ?Sized> Batch<'r, T> {
    pub(crate) fn open(register: &'r Register<'r>, bus: &'r mut T) -> Result<Self, AccessError> {
        if register.batch_open.get() {
            return Err(AccessError::Reentrancy {
                register: register.name().to_owned(),
            });
        }
        let shadow = bus.read(register.address(), register.layout().width_bytes)?;
        register.batch_open.set(true);
        debug!(register = register.name(), address = register.address(), shadow, "batch opened");
        Ok(Self {
            register,
            bus,
            shadow,
            state: State::Open,
        })
    }

    /// The register this scope is bound to.
    #[must_use]
    pub const fn register(&self) -> &Register<'r> {
        self.register
    }

    /// Current shadow word. No bus traffic.
    #[must_use]
    pub const fn read(&self) -> RegisterValue<'r> {
        self.register.wrap(self.shadow)
    }

    /// Reads one field from the shadow word. No bus traffic.
    ///
    /// # Errors
    ///
    /// Fails for unknown or non-readable fields.
    pub fn read_field(&mut self, name: &str) -> Result<FieldValue, AccessError> {
        let result = self
            .register
            .readable_field(name)
            .map(|field| FieldValue::of(field, field.extract(self.shadow)));
        self.track(result)
    }

    /// Updates the shadow word. No bus traffic.
    ///
    /// A whole word replaces the shadow; a field value patches only its bits.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Register::write`], minus transport failures.
    pub fn write(&mut self, value: impl Into<WriteValue>) -> Result<(), AccessError> {
        let result = match value.into() {
            WriteValue::Word(word) => self.register.fit_word(word),
            WriteValue::Field(field_value) => self
                .register
                .check_field_value(field_value)
                .and_then(|()| self.register.compose_field_value(self.shadow, field_value)),
        };
        let word = self.track(result)?;
        self.shadow = word;
        Ok(())
    }

    /// Composes a value into one named field of the shadow word. No bus traffic.
    ///
    /// # Errors
    ///
    /// Fails for unknown or read-only fields and for values too wide under
    /// [`OverflowPolicy::Reject`](crate::OverflowPolicy::Reject).
    pub fn write_field(&mut self, name: &str, value: u64) -> Result<(), AccessError> {
        let result = self
            .register
            .writable_field(name)
            .map(|field| FieldValue::of(field, value));
        let field_value = self.track(result)?;
        self.write(field_value)
    }

    /// Returns `true` once an operation on this guard has failed.
    #[must_use]
    pub fn is_poisoned(&self) -> bool {
        self.state == State::Poisoned
    }

    /// Writes the shadow word once and closes the scope.
    ///
    /// Failed operations never alter the shadow, so an explicit commit after a
    /// handled error publishes only the updates that succeeded.
    ///
    /// # Errors
    ///
    /// Propagates the transport's write failure.
    pub fn commit(mut self) -> Result<(), AccessError> {
        self.state = State::Closed;
        debug!(register = self.register.name(), word = self.shadow, "batch committed");
        self.register.store(&mut *self.bus, self.shadow)
    }

    /// Closes the scope without touching the bus.
    pub fn discard(mut self) {
        self.state = State::Closed;
        debug!(register = self.register.name(), "batch discarded");
    }

    fn track<R>(&mut self, result: Result<R, AccessError>) -> Result<R, AccessError> {
        if result.is_err() {
            self.state = State::Poisoned;
        }
        result
    }
}

impl<T: Transport + ?Sized> Drop for Batch<'_, T> {
    fn drop(&mut self) {
        match self.state {
            State::Open if !thread::panicking() => {
                debug!(register = self.register.name(), word = self.shadow, "batch committed on drop");
                if let Err(error) = self.register.store(&mut *self.bus, self.shadow) {
                    warn!(register = self.register.name(), %error, "batch commit failed on drop");
                }
            }
            State::Open | State::Poisoned => {
                debug!(register = self.register.name(), "batch discarded on abnormal exit");
            }
            State::Closed => {}
        }
        self.register.batch_open.set(false);
    }
}
