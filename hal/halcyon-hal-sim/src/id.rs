//! Simulated unique identifier

use halcyon_hal::id::{copy_truncated, UniqueId};

/// Eight-byte identifier, optionally writable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimId {
    id: [u8; 8],
    writable: bool,
}

impl SimId {
    /// Fixed identifier, most-significant byte first
    pub const fn new(id: [u8; 8]) -> Self {
        Self {
            id,
            writable: false,
        }
    }

    /// Identifier that can be provisioned with [`UniqueId::write`]
    pub const fn writable(mut self) -> Self {
        self.writable = true;
        self
    }
}

impl UniqueId for SimId {
    fn read(&self, buffer: &mut [u8]) -> usize {
        copy_truncated(&self.id, buffer)
    }

    fn write(&mut self, content: &[u8]) -> usize {
        if !self.writable {
            return 0;
        }
        let n = content.len().min(self.id.len());
        self.id[..n].copy_from_slice(&content[..n]);
        n
    }
}
