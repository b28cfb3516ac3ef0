use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    sync::{atomic::Ordering, RwLock},
};

use anyhow::Result;
use log::{debug, info};

use super::probe::{Probe, ProbeId};
use crate::module::{Module, ModuleSlot};

/// Number of hash buckets in a registry. Probes are distributed with
/// `hash(name) % PROBE_BUCKETS`.
pub(crate) const PROBE_BUCKETS: usize = 65536;

/// Bucket storage. Append-only: probes are never removed, which is also
/// why shared-mode readers never race with reclamation.
pub(super) struct Buckets {
    pub(super) buckets: Vec<Vec<&'static Probe>>,
    pub(super) count: usize,
}

/// The probe registry, mapping probe names to caller-owned descriptors and
/// holding the tracing-module slot. Built once at process start and shared
/// (e.g. as an `Arc<Registry>`) with every instrumented call site.
///
/// ```
/// use std::sync::Arc;
/// use tracefire::{Probe, Registry};
///
/// static CONNECT: Probe = Probe::new("tcp_connect", 7);
///
/// let registry = Arc::new(Registry::new());
/// registry.register(&CONNECT)?;
/// assert!(registry.find("tcp_connect").is_some());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct Registry {
    /// Single lock protecting bucket insertion, control-plane reads and
    /// the module slot during dispatch and deregistration.
    pub(super) inner: RwLock<Buckets>,
    pub(super) module: ModuleSlot,
}

impl Registry {
    pub fn new() -> Registry {
        Registry {
            inner: RwLock::new(Buckets {
                buckets: vec![Vec::new(); PROBE_BUCKETS],
                count: 0,
            }),
            module: ModuleSlot::new(),
        }
    }

    /// Register a probe descriptor.
    ///
    /// The registry stores the reference only; the descriptor stays owned
    /// by the declaring subsystem and is never freed here. Duplicate names
    /// are not detected: a later registration shadows earlier ones on
    /// lookup.
    pub fn register(&self, probe: &'static Probe) -> Result<()> {
        Probe::validate_name(probe.name())?;

        let mut inner = self.inner.write().unwrap();

        // Probes always start out quiet; the control plane activates them
        // explicitly.
        probe.active.store(false, Ordering::Relaxed);

        let bucket = Self::bucket(probe.name());
        inner.buckets[bucket].push(probe);
        inner.count += 1;

        debug!("Registered probe {probe}");
        Ok(())
    }

    /// Look up a probe by name.
    ///
    /// Bucket chains are walked newest-first, so when a name was registered
    /// more than once this returns the most recent descriptor. Not finding
    /// a probe is an ordinary result, not an error.
    pub fn find(&self, name: &str) -> Option<&'static Probe> {
        let inner = self.inner.read().unwrap();

        inner.buckets[Self::bucket(name)]
            .iter()
            .rev()
            .find(|p| p.name() == name)
            .copied()
    }

    /// Return the registered probe with the smallest id strictly greater
    /// than `after`, or the smallest id overall when `after` is `None`.
    /// Lets a control plane enumerate all probes without knowing their
    /// names in advance.
    pub fn next(&self, after: Option<ProbeId>) -> Option<&'static Probe> {
        let inner = self.inner.read().unwrap();

        inner
            .buckets
            .iter()
            .flatten()
            .filter(|p| match after {
                Some(id) => p.id() > id,
                None => true,
            })
            .min_by_key(|p| p.id())
            .copied()
    }

    /// Allow a probe to fire.
    pub fn activate(&self, probe: &Probe) {
        let _inner = self.inner.write().unwrap();
        probe.active.store(true, Ordering::Relaxed);

        debug!("Activated probe {probe}");
    }

    /// Stop a probe from firing. Idempotent.
    ///
    /// This is the only supported way to quiesce a probe: the descriptor
    /// stays in its bucket and the registry never reclaims it. A fire that
    /// already passed the fast-path check may still complete; draining is
    /// a request, not a barrier. A full unregister would have to drain
    /// in-flight callers first (an epoch- or refcount-based scheme), which
    /// this design does not provide.
    pub fn drain(&self, probe: &Probe) {
        let _inner = self.inner.write().unwrap();
        probe.active.store(false, Ordering::Relaxed);

        debug!("Drained probe {probe}");
    }

    /// Attach a tracing module.
    ///
    /// The install is a single pointer-sized swap and is deliberately not
    /// serialized against `fire()`: a fire in flight may observe either the
    /// dummy or the new module, never a torn value.
    ///
    /// # Panics
    ///
    /// Panics if a module is already attached. The instrumentation being
    /// activated twice means the host's load sequencing is broken; that is
    /// not a recoverable condition.
    pub fn module_register(&self, module: Box<dyn Module>) {
        self.module.install(module);

        info!("Tracing module attached");
    }

    /// Detach the current tracing module, restoring the built-in no-op
    /// module.
    ///
    /// Takes the registry lock for the swap. `fire()` holds the same lock
    /// while invoking the module, so this cannot complete while a fire is
    /// executing, and no fire starting afterwards can observe the outgoing
    /// module.
    ///
    /// # Panics
    ///
    /// Panics if no module is attached.
    pub fn module_deregister(&self) {
        {
            let _inner = self.inner.write().unwrap();
            self.module.clear();
        }

        info!("Tracing module detached");
    }

    /// Number of registered probes.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bucket(name: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        hasher.finish() as usize % PROBE_BUCKETS
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_case::test_case;

    fn probe(name: &'static str, id: u32) -> &'static Probe {
        Box::leak(Box::new(Probe::new(name, id)))
    }

    #[test]
    fn register_and_find() {
        let registry = Registry::new();

        registry.register(probe("sys_read", 3)).unwrap();
        registry.register(probe("sys_write", 5)).unwrap();

        let found = registry.find("sys_read").unwrap();
        assert_eq!(found.name(), "sys_read");
        assert_eq!(found.id(), ProbeId(3));

        let found = registry.find("sys_write").unwrap();
        assert_eq!(found.id(), ProbeId(5));

        assert!(registry.find("sys_open").is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test_case("" ; "empty name")]
    #[test_case("name_one_byte_over_the_limit____" ; "name too long")]
    fn register_invalid_name(name: &'static str) {
        let registry = Registry::new();
        assert!(registry.register(probe(name, 1)).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn duplicate_names_resolve_to_newest() {
        let registry = Registry::new();

        registry.register(probe("dup", 1)).unwrap();
        registry.register(probe("dup", 2)).unwrap();

        // No duplicate detection on register; lookup shadows the older
        // descriptor.
        assert_eq!(registry.find("dup").unwrap().id(), ProbeId(2));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn register_resets_active() {
        let registry = Registry::new();
        let p = probe("reset", 1);

        registry.activate(p);
        assert!(p.maybe_active());

        registry.register(p).unwrap();
        assert!(!p.maybe_active());
    }

    #[test]
    fn next_iterates_by_ascending_id() {
        let registry = Registry::new();

        registry.register(probe("five", 5)).unwrap();
        registry.register(probe("one", 1)).unwrap();
        registry.register(probe("three", 3)).unwrap();

        let first = registry.next(None).unwrap();
        assert_eq!(first.id(), ProbeId(1));

        let second = registry.next(Some(first.id())).unwrap();
        assert_eq!(second.id(), ProbeId(3));

        let third = registry.next(Some(second.id())).unwrap();
        assert_eq!(third.id(), ProbeId(5));

        assert!(registry.next(Some(third.id())).is_none());
    }

    #[test]
    fn next_on_empty_registry() {
        let registry = Registry::new();
        assert!(registry.next(None).is_none());
    }

    #[test]
    fn activate_and_drain() {
        let registry = Registry::new();
        let p = probe("svc.start", 1);

        registry.register(p).unwrap();
        let handle = registry.find("svc.start").unwrap();
        assert!(!handle.maybe_active());

        registry.activate(handle);
        assert!(registry.find("svc.start").unwrap().maybe_active());

        registry.drain(handle);
        assert!(!registry.find("svc.start").unwrap().maybe_active());
    }

    #[test]
    fn drain_is_idempotent() {
        let registry = Registry::new();
        let p = probe("quiet", 1);

        registry.register(p).unwrap();
        registry.activate(p);

        registry.drain(p);
        registry.drain(p);
        registry.drain(p);
        assert!(!p.maybe_active());
    }

    #[test]
    #[should_panic(expected = "No tracing module")]
    fn deregister_without_module() {
        let registry = Registry::new();
        registry.module_deregister();
    }
}
