//! Name resolution.
//!
//! Typed-data payloads may carry human-readable names where an address is
//! expected. Names are resolved before hashing; unresolvable names are
//! hashed as given.

use std::collections::HashMap;

use async_trait::async_trait;
use tessera_crypto::address::Address;

use crate::Result;

/// Resolves human-readable names to addresses.
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// The address behind `name`, or `None` if the name is unknown.
    async fn resolve_name(&self, name: &str) -> Result<Option<Address>>;
}

/// Resolver backed by a fixed table.
#[derive(Clone, Debug, Default)]
pub struct StaticNameResolver {
    entries: HashMap<String, Address>,
}

impl StaticNameResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, address: Address) {
        self.entries.insert(name.into().to_ascii_lowercase(), address);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Address)> for StaticNameResolver {
    fn from_iter<I: IntoIterator<Item = (String, Address)>>(iter: I) -> Self {
        let mut resolver = Self::new();
        for (name, address) in iter {
            resolver.insert(name, address);
        }
        resolver
    }
}

#[async_trait]
impl NameResolver for StaticNameResolver {
    async fn resolve_name(&self, name: &str) -> Result<Option<Address>> {
        Ok(self.entries.get(&name.to_ascii_lowercase()).copied())
    }
}
