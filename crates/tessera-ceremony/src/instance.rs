//! Ceremony instance identifiers.

use std::fmt;

use rand::RngCore;
use tessera_types::InstanceBytes;

/// A fresh random identifier, one per ceremony. Never reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(InstanceBytes);

impl InstanceId {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &InstanceBytes {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceId({})", self.to_hex())
    }
}
