use std::{
    fmt,
    sync::atomic::{AtomicBool, Ordering},
};

use thiserror::Error;

/// Maximum length of a probe name, in bytes.
pub const PROBE_NAME_MAX: usize = 31;

/// Ways a probe name can be rejected at registration time.
#[derive(Debug, Error)]
pub enum ProbeNameError {
    #[error("probe name is empty")]
    Empty,
    #[error("probe name '{0}' is longer than {PROBE_NAME_MAX} bytes")]
    TooLong(String),
}

/// Stable numeric identifier of a probe. Ids order the control plane's
/// probe enumeration, see `Registry::next()`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ProbeId(pub u32);

impl fmt::Display for ProbeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named tracepoint descriptor.
///
/// Descriptors are owned by the subsystem declaring them, usually as
/// statics; the registry only ever stores references to them and never
/// frees one. A probe always starts out inactive and is toggled by the
/// control plane through `Registry::activate()` / `Registry::drain()`.
pub struct Probe {
    name: &'static str,
    id: ProbeId,
    /// Firing gate. Only authoritative when read under the registry lock;
    /// unsynchronized readers may observe a stale value.
    pub(super) active: AtomicBool,
}

impl Probe {
    /// Build a new probe descriptor. Usable in statics:
    ///
    /// ```
    /// use tracefire::Probe;
    ///
    /// static SYS_READ: Probe = Probe::new("sys_read", 3);
    /// ```
    ///
    /// The name is validated when the probe is registered, not here, so
    /// that descriptors stay const-constructible.
    pub const fn new(name: &'static str, id: u32) -> Probe {
        Probe {
            name,
            id: ProbeId(id),
            active: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn id(&self) -> ProbeId {
        self.id
    }

    /// Unsynchronized fast-path check, meant to gate instrumented call
    /// sites before they pay for the lock in `Registry::fire()`.
    ///
    /// The value may be stale: a probe drained moments ago can still
    /// report true once, a probe just activated can be missed once. The
    /// authoritative re-check happens inside `fire()`.
    #[inline]
    pub fn maybe_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    pub(super) fn validate_name(name: &str) -> Result<(), ProbeNameError> {
        if name.is_empty() {
            return Err(ProbeNameError::Empty);
        }
        if name.len() > PROBE_NAME_MAX {
            return Err(ProbeNameError::TooLong(name.to_string()));
        }
        Ok(())
    }
}

/// Allow nice log messages.
impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}
