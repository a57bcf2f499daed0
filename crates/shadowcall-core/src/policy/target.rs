//! Identity handle for the object a bypass is armed for.
//!
//! Rules:
//! - Equality is address plus concrete type, never value equality. A struct
//!   and its first field share an address but are different objects.
//! - The handle never borrows or owns the object; it is only compared.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Non-owning identity of a target object.
#[derive(Clone, Copy)]
pub struct TargetRef {
    addr: usize,
    type_id: TypeId,
    /// Diagnostics only; not part of identity.
    type_name: &'static str,
}

impl TargetRef {
    /// Capture the identity of `target`.
    ///
    /// The same object seen through a different type (e.g. `&dyn Trait`)
    /// is a different target. Zero-sized values of one type may share an
    /// address; targets are expected to be real, sized instances.
    pub fn of<T: ?Sized + 'static>(target: &T) -> Self {
        Self {
            addr: (target as *const T).cast::<()>() as usize,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn addr(&self) -> usize {
        self.addr
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for TargetRef {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr && self.type_id == other.type_id
    }
}

impl Eq for TargetRef {}

impl Hash for TargetRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr.hash(state);
        self.type_id.hash(state);
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#x}", self.type_name, self.addr)
    }
}

impl fmt::Debug for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Render an optional target the way violation messages expect.
pub(crate) fn describe(target: Option<TargetRef>) -> String {
    match target {
        Some(t) => t.to_string(),
        None => "none".into(),
    }
}
