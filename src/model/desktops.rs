use tracing::{debug, info};

use crate::common::collections::HashMap;
use crate::sys::desktop::{DesktopError, DesktopId, DesktopProvider};

/// Bijection between host desktops and grid indices for one session.
///
/// Built once by [`DesktopRegistry::initialize`] and never mutated; a new
/// session builds a new registry.
#[derive(Debug, Clone)]
pub struct DesktopRegistry {
    desktops: Vec<DesktopId>,
    lookup: HashMap<DesktopId, usize>,
}

impl DesktopRegistry {
    /// Creates or removes desktops until exactly `desired` exist, then assigns
    /// indices in the host's enumeration order.
    ///
    /// Surplus desktops are removed from the end; their windows go to the
    /// desktop before them.
    pub fn initialize(
        provider: &dyn DesktopProvider,
        desired: usize,
    ) -> Result<DesktopRegistry, DesktopError> {
        if desired == 0 {
            return Err(DesktopError::Failed("desktop grid is empty".to_string()));
        }

        let mut existing = provider.desktops()?;
        if existing.is_empty() {
            return Err(DesktopError::Unavailable("host reported no desktops".to_string()));
        }

        while existing.len() > desired {
            let Some(surplus) = existing.pop() else { break };
            let Some(&fallback) = existing.last() else { break };
            debug!(%surplus, %fallback, "Removing surplus desktop");
            provider.remove_desktop(surplus, fallback)?;
        }
        while existing.len() < desired {
            let created = provider.create_desktop()?;
            debug!(%created, "Created desktop");
            existing.push(created);
        }

        let desktops = provider.desktops()?;
        Self::from_ids(desktops, desired)
    }

    pub fn from_ids(desktops: Vec<DesktopId>, expected: usize) -> Result<DesktopRegistry, DesktopError> {
        if desktops.len() != expected {
            return Err(DesktopError::Failed(format!(
                "expected {expected} desktops, host has {}",
                desktops.len()
            )));
        }

        let mut lookup = HashMap::default();
        for (index, &id) in desktops.iter().enumerate() {
            if lookup.insert(id, index).is_some() {
                return Err(DesktopError::Failed(format!("desktop {id} listed twice")));
            }
        }

        info!(count = desktops.len(), "Desktop registry initialized");
        Ok(DesktopRegistry { desktops, lookup })
    }

    pub fn len(&self) -> usize { self.desktops.len() }

    pub fn is_empty(&self) -> bool { self.desktops.is_empty() }

    pub fn identity(&self, index: usize) -> Option<DesktopId> { self.desktops.get(index).copied() }

    pub fn index_of(&self, desktop: DesktopId) -> Option<usize> { self.lookup.get(&desktop).copied() }

    pub fn iter(&self) -> impl Iterator<Item = (usize, DesktopId)> + '_ {
        self.desktops.iter().copied().enumerate()
    }
}
