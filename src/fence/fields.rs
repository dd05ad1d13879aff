//! `VolatileFields<V>`: a fixed set of named, ordered slots.

use core::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use super::{load_fence, store_fence, Fenced};
use crate::error::{Error, Result};

/// Named volatile storage for objects that address their fields dynamically.
///
/// The field names are declared once at construction; every slot starts
/// empty. Prefer [`super::Volatile`] when the field set is known statically.
///
/// ```rust
/// use synchro::fence::VolatileFields;
///
/// let fields = VolatileFields::new(&["state", "reason"]).unwrap();
/// fields.set_field_volatile("state", "running").unwrap();
/// assert_eq!(fields.get_field_volatile("state").unwrap().as_deref(), Some(&"running"));
/// assert_eq!(fields.get_field_volatile("reason").unwrap(), None);
/// assert!(fields.get_field_volatile("missing").is_err());
/// ```
pub struct VolatileFields<V> {
    names: Box<[&'static str]>,
    slots: Box<[ArcSwapOption<V>]>,
}

impl<V> VolatileFields<V> {
    /// Declares the fields `names`.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] if a name is declared twice.
    pub fn new(names: &[&'static str]) -> Result<Self> {
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(Error::invalid_argument(format!(
                    "field `{name}` declared more than once"
                )));
            }
        }
        Ok(Self {
            names: names.into(),
            slots: names.iter().map(|_| ArcSwapOption::empty()).collect(),
        })
    }

    /// Load fence, then an ordered read of `name`.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] for an undeclared name.
    pub fn get_field_volatile(&self, name: &str) -> Result<Option<Arc<V>>> {
        let slot = self.slot(name)?;
        load_fence();
        Ok(slot.load_full())
    }

    /// Ordered write of `name`, then a store fence.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] for an undeclared name; nothing is written.
    pub fn set_field_volatile(&self, name: &str, value: V) -> Result<()> {
        let slot = self.slot(name)?;
        slot.store(Some(Arc::new(value)));
        store_fence();
        Ok(())
    }

    /// Empties `name`, returning what it held.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] for an undeclared name.
    pub fn take_field(&self, name: &str) -> Result<Option<Arc<V>>> {
        let previous = self.slot(name)?.swap(None);
        store_fence();
        Ok(previous)
    }

    /// Declared field names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.names.iter().copied()
    }

    fn slot(&self, name: &str) -> Result<&ArcSwapOption<V>> {
        self.names
            .iter()
            .position(|declared| *declared == name)
            .map(|i| &self.slots[i])
            .ok_or_else(|| Error::invalid_argument(format!("unknown field `{name}`")))
    }
}

impl<V> Fenced for VolatileFields<V> {}

impl<V: fmt::Debug> fmt::Debug for VolatileFields<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, slot) in self.names.iter().zip(self.slots.iter()) {
            map.entry(name, &slot.load_full());
        }
        map.finish()
    }
}
