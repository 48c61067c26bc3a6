//! Word-granular bus contract consumed by the register access layer.
//!
//! Timeout and retry policy belong to implementations; the access layer calls
//! each operation at most once per request and surfaces failures unchanged.

use crate::TransportError;

/// Synchronous word access to an absolute address space.
///
/// Every call moves exactly one word of `width_bytes` bytes. Implementations
/// are assumed to be single-channel; callers serialize access.
pub trait Transport {
    /// Reads one word.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the transaction cannot complete.
    fn read(&mut self, address: u64, width_bytes: u8) -> Result<u64, TransportError>;

    /// Writes one word.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the transaction cannot complete.
    fn write(&mut self, address: u64, value: u64, width_bytes: u8) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn read(&mut self, address: u64, width_bytes: u8) -> Result<u64, TransportError> {
        (**self).read(address, width_bytes)
    }

    fn write(&mut self, address: u64, value: u64, width_bytes: u8) -> Result<(), TransportError> {
        (**self).write(address, value, width_bytes)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn read(&mut self, address: u64, width_bytes: u8) -> Result<u64, TransportError> {
        (**self).read(address, width_bytes)
    }

    fn write(&mut self, address: u64, value: u64, width_bytes: u8) -> Result<(), TransportError> {
        (**self).write(address, value, width_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::Transport;
    use crate::TransportError;

    struct Failing;

    impl Transport for Failing {
        fn read(&mut self, address: u64, _width_bytes: u8) -> Result<u64, TransportError> {
            Err(TransportError::ReadFailed { address })
        }

        fn write(&mut self, address: u64, _value: u64, _width_bytes: u8) -> Result<(), TransportError> {
            Err(TransportError::WriteFailed { address })
        }
    }

    #[test]
    fn boxed_and_borrowed_transports_forward_unchanged() {
        let mut boxed: Box<dyn Transport> = Box::new(Failing);
        assert_eq!(
            boxed.read(0x10, 4),
            Err(TransportError::ReadFailed { address: 0x10 })
        );

        let mut inner = Failing;
        let mut borrowed: &mut Failing = &mut inner;
        assert_eq!(
            Transport::write(&mut borrowed, 0x20, 1, 4),
            Err(TransportError::WriteFailed { address: 0x20 })
        );
    }
}
