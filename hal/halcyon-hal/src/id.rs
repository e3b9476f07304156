//! Unique device identification
//!
//! Each platform exposes the best identifier it has: an in-silicon serial
//! number where one exists, otherwise something written at provisioning
//! time. Identifier bytes are always ordered most-significant first.

/// Source of the microcontroller's unique identifier
pub trait UniqueId {
    /// Startup work needed before [`UniqueId::read`]; most platforms need none
    fn init(&mut self) {}

    /// Copy the identifier into `buffer`
    ///
    /// If the identifier is longer than `buffer`, it is truncated from the
    /// least-significant side. A truncated identifier is not a valid
    /// identifier; read enough bytes for every target platform.
    ///
    /// Returns the number of bytes written.
    fn read(&self, buffer: &mut [u8]) -> usize;

    /// Store a new identifier
    ///
    /// Only platforms without a usable in-silicon identifier support this.
    /// Everyone else keeps this default, which does nothing and returns 0.
    fn write(&mut self, content: &[u8]) -> usize {
        let _ = content;
        0
    }
}

/// Copy an MSB-first identifier into `buffer`, dropping the least-significant
/// bytes that do not fit
///
/// Platform implementations of [`UniqueId::read`] should go through this so
/// truncation behaves the same everywhere.
pub fn copy_truncated(id: &[u8], buffer: &mut [u8]) -> usize {
    let n = id.len().min(buffer.len());
    buffer[..n].copy_from_slice(&id[..n]);
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: [u8; 8] = [0x10, 0x32, 0x54, 0x76, 0x98, 0xBA, 0xDC, 0xFE];

    #[test]
    fn test_truncates_least_significant_side() {
        let mut buf = [0u8; 4];
        assert_eq!(copy_truncated(&ID, &mut buf), 4);
        assert_eq!(buf, [0x10, 0x32, 0x54, 0x76]);
    }

    #[test]
    fn test_long_buffer_gets_whole_id() {
        let mut buf = [0u8; 12];
        assert_eq!(copy_truncated(&ID, &mut buf), 8);
        assert_eq!(&buf[..8], &ID);
        assert_eq!(&buf[8..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_default_write_is_noop() {
        struct Fixed;
        impl UniqueId for Fixed {
            fn read(&self, buffer: &mut [u8]) -> usize {
                copy_truncated(&ID, buffer)
            }
        }
        assert_eq!(Fixed.write(&[1, 2, 3]), 0);
    }
}
