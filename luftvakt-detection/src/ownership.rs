//! ## luftvakt-detection::ownership
//! Addresses of the protected network's own infrastructure.

use std::collections::HashSet;

use luftvakt_core::error::CoreError;
use luftvakt_core::mac::MacAddr;

/// Ownership lookup consulted during dispatch.
pub trait OwnershipFilter {
    /// Exact match against a configured address.
    fn is_own(&self, mac: &MacAddr) -> bool;

    /// True if any present address field is one of ours.
    fn any_own(&self, addresses: &[Option<MacAddr>; 4]) -> bool {
        addresses.iter().flatten().any(|mac| self.is_own(mac))
    }
}

#[derive(Clone, Debug, Default)]
pub struct OwnMacSet {
    macs: HashSet<MacAddr>,
}

impl OwnMacSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the set from configured address strings.
    pub fn try_from_strings<I, S>(entries: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let macs = entries
            .into_iter()
            .map(|entry| entry.as_ref().parse())
            .collect::<Result<HashSet<MacAddr>, _>>()?;
        Ok(Self { macs })
    }

    pub fn insert(&mut self, mac: MacAddr) -> bool {
        self.macs.insert(mac)
    }

    pub fn len(&self) -> usize {
        self.macs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macs.is_empty()
    }
}

impl OwnershipFilter for OwnMacSet {
    #[inline]
    fn is_own(&self, mac: &MacAddr) -> bool {
        self.macs.contains(mac)
    }
}

impl FromIterator<MacAddr> for OwnMacSet {
    fn from_iter<T: IntoIterator<Item = MacAddr>>(iter: T) -> Self {
        Self {
            macs: iter.into_iter().collect(),
        }
    }
}
