//! # Module Handles
//!
//! Feature modules are external to the core. The core only needs to know two
//! things about them: who they are, and whether they are enabled *right now*.
//! That is the [`Toggle`] capability.
//!
//! The enabled flag is an atomic so the host's network thread can observe a
//! module being switched off from the simulation thread without a lock.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{EventError, EventResult};

/// Identifier assigned by the [`ModuleRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub u32);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module#{}", self.0)
    }
}

/// Capability checked at dispatch and arbitration time.
pub trait Toggle: Send + Sync {
    /// Stable identity.
    fn id(&self) -> ModuleId;
    /// Human readable name, used in diagnostics.
    fn name(&self) -> &str;
    /// Whether the owner currently participates.
    fn is_enabled(&self) -> bool;
}

struct ModuleState {
    id: ModuleId,
    name: String,
    enabled: AtomicBool,
}

/// Cheap, cloneable handle to a registered module.
#[derive(Clone)]
pub struct ModuleHandle {
    inner: Arc<ModuleState>,
}

impl ModuleHandle {
    fn new(id: ModuleId, name: String, enabled: bool) -> Self {
        Self {
            inner: Arc::new(ModuleState {
                id,
                name,
                enabled: AtomicBool::new(enabled),
            }),
        }
    }

    /// Enables the module.
    pub fn enable(&self) {
        self.set_enabled(true);
    }

    /// Disables the module. Its subscribers stop running at the next dispatch
    /// and its rotation requests expire at the next evaluation.
    pub fn disable(&self) {
        self.set_enabled(false);
    }

    /// Sets the enabled flag.
    pub fn set_enabled(&self, enabled: bool) {
        let was = self.inner.enabled.swap(enabled, Ordering::AcqRel);
        if was != enabled {
            tracing::debug!(module = %self.inner.name, enabled, "module toggled");
        }
    }
}

impl Toggle for ModuleHandle {
    fn id(&self) -> ModuleId {
        self.inner.id
    }

    fn name(&self) -> &str {
        &self.inner.name
    }

    fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::Acquire)
    }
}

impl fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleHandle")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl PartialEq for ModuleHandle {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for ModuleHandle {}

/// Creates and looks up module handles.
///
/// Modules register once at load; handles are never removed, mirroring a
/// client whose module list is fixed after startup.
#[derive(Default)]
pub struct ModuleRegistry {
    next_id: AtomicU32,
    modules: RwLock<Vec<ModuleHandle>>,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a module, initially disabled.
    ///
    /// # Errors
    ///
    /// [`EventError::DuplicateModule`] if the name is taken.
    pub fn register(&self, name: impl Into<String>) -> EventResult<ModuleHandle> {
        let name = name.into();
        let mut modules = self.modules.write();
        if modules.iter().any(|m| m.name() == name) {
            return Err(EventError::DuplicateModule(name));
        }

        let id = ModuleId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let handle = ModuleHandle::new(id, name, false);
        modules.push(handle.clone());
        Ok(handle)
    }

    /// Looks a module up by name.
    ///
    /// # Errors
    ///
    /// [`EventError::UnknownModule`] if no module has that name.
    pub fn get(&self, name: &str) -> EventResult<ModuleHandle> {
        self.modules
            .read()
            .iter()
            .find(|m| m.name() == name)
            .cloned()
            .ok_or_else(|| EventError::UnknownModule(name.to_string()))
    }

    /// All handles, in registration order.
    #[must_use]
    pub fn all(&self) -> Vec<ModuleHandle> {
        self.modules.read().clone()
    }

    /// Number of enabled modules.
    #[must_use]
    pub fn enabled_count(&self) -> usize {
        self.modules.read().iter().filter(|m| m.is_enabled()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modules_start_disabled_and_toggle() {
        let registry = ModuleRegistry::new();
        let aura = registry.register("KillAura").unwrap();
        assert!(!aura.is_enabled());

        aura.enable();
        assert!(aura.is_enabled());
        assert_eq!(registry.enabled_count(), 1);

        // Clones observe the same flag.
        let other = registry.get("KillAura").unwrap();
        other.disable();
        assert!(!aura.is_enabled());
    }

    #[test]
    fn names_are_unique() {
        let registry = ModuleRegistry::new();
        registry.register("Freecam").unwrap();
        assert_eq!(
            registry.register("Freecam").unwrap_err(),
            EventError::DuplicateModule("Freecam".into())
        );
        assert!(matches!(registry.get("Nuker"), Err(EventError::UnknownModule(_))));
    }

    #[test]
    fn ids_are_sequential() {
        let registry = ModuleRegistry::new();
        let a = registry.register("A").unwrap();
        let b = registry.register("B").unwrap();
        assert_eq!(a.id(), ModuleId(0));
        assert_eq!(b.id(), ModuleId(1));
        assert_ne!(a, b);
    }
}
