//! The process-wide cache of entity specs.
//!
//! Specs are built lazily, the first time a type is resolved, and kept for as long as
//! the registry lives. Concurrent first resolutions of the same type wait for a single
//! construction and all observe the same [`Spec`].

use crate::{
    errors::Error,
    spec::{Embed, Spec, SpecBuilder},
};
use hashbrown::HashMap;
use once_cell::sync::{Lazy, OnceCell};
use std::{
    any::{Any, TypeId},
    fmt,
    sync::{Arc, PoisonError, RwLock},
};
use tracing::debug;

type Slot = Arc<OnceCell<Arc<dyn Any + Send + Sync>>>;

/// A cache from type identity to [`Spec`].
#[derive(Default)]
pub struct Registry {
    slots: RwLock<HashMap<TypeId, Slot>>,
}

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self { Registry::default() }

    /// The registry shared by the whole process.
    pub fn global() -> &'static Registry { &GLOBAL }

    fn slot(&self, id: TypeId) -> Slot {
        if let Some(slot) = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
        {
            return slot.clone();
        }
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id)
            .or_default()
            .clone()
    }

    /// Returns the spec of `T`, building it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spec`] if `T` declares a malformed spec. A failed construction
    /// is not cached, so every resolution of such a type fails the same way.
    ///
    /// # Example
    ///
    /// ```
    /// use kat::prelude::*;
    /// use std::sync::Arc;
    ///
    /// #[derive(KatRep, Default)]
    /// struct Point {
    ///     x: i32,
    ///     y: i32,
    /// }
    ///
    /// let registry = Registry::new();
    /// let a = registry.resolve::<Point>().unwrap();
    /// let b = registry.resolve::<Point>().unwrap();
    ///
    /// assert!(Arc::ptr_eq(&a, &b));
    /// assert_eq!(a.fields().len(), 2);
    /// ```
    pub fn resolve<T: Embed>(&self) -> Result<Arc<Spec<T>>, Error> {
        let slot = self.slot(TypeId::of::<T>());
        let spec = slot.get_or_try_init(|| {
            let mut builder = SpecBuilder::<T>::new();
            T::expose(&mut builder);
            match builder.build() {
                Ok(spec) => {
                    debug!(
                        entity = spec.name(),
                        fields = spec.fields().len(),
                        sealed = spec.is_sealed(),
                        "built spec"
                    );
                    let spec: Arc<dyn Any + Send + Sync> = Arc::new(spec);
                    Ok(spec)
                }
                Err(e) => {
                    debug!(error = %e, "rejected spec");
                    Err(e)
                }
            }
        })?;
        match spec.clone().downcast::<Spec<T>>() {
            Ok(spec) => Ok(spec),
            Err(_) => Err(Error::spec(
                std::any::type_name::<T>(),
                "registry slot holds a different type",
            )),
        }
    }

    /// Indicates whether the spec of `T` has been built.
    pub fn contains<T: Embed>(&self) -> bool {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&TypeId::of::<T>())
            .map_or(false, |slot| slot.get().is_some())
    }

    /// The number of specs built so far.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Registry").field("len", &self.len()).finish()
    }
}
