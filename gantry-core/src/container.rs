// Dependency injection container

use crate::logging::{debug, trace};
use crate::{Error, Injectable, Provider};
use parking_lot::{ReentrantMutex, RwLock};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

type SharedInstance = Arc<dyn Any + Send + Sync>;
type BoxedFactory = Arc<dyn Fn(&Container) -> Result<SharedInstance, Error> + Send + Sync>;

/// How long a resolved instance lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// A fresh instance per resolution
    Transient,
    /// One instance for the container's lifetime
    Singleton,
}

#[derive(Clone)]
struct Binding {
    factory: BoxedFactory,
    lifecycle: Lifecycle,
    type_name: &'static str,
}

/// The dependency injection container.
///
/// Bindings map a type to a factory and a lifecycle; materialized singletons
/// live in a separate instance cache that is consulted before factories.
/// Clones share the same underlying state.
#[derive(Clone)]
pub struct Container {
    bindings: Arc<RwLock<HashMap<TypeId, Binding>>>,
    instances: Arc<RwLock<HashMap<TypeId, SharedInstance>>>,
    // Serializes singleton materialization so concurrent first access runs a
    // factory exactly once. Reentrant: a factory may resolve further
    // singletons on the same thread.
    materialize: Arc<ReentrantMutex<()>>,
}

impl Container {
    pub fn new() -> Self {
        debug!("Creating new DI container");
        Self {
            bindings: Arc::new(RwLock::new(HashMap::new())),
            instances: Arc::new(RwLock::new(HashMap::new())),
            materialize: Arc::new(ReentrantMutex::new(())),
        }
    }

    /// Register a transient factory: each resolution runs it again
    pub fn bind<T, F>(&self, factory: F)
    where
        T: Provider,
        F: Fn(&Container) -> Result<T, Error> + Send + Sync + 'static,
    {
        self.bind_with(Lifecycle::Transient, factory);
    }

    /// Register a singleton factory: the first resolution caches its result
    pub fn singleton<T, F>(&self, factory: F)
    where
        T: Provider,
        F: Fn(&Container) -> Result<T, Error> + Send + Sync + 'static,
    {
        self.bind_with(Lifecycle::Singleton, factory);
    }

    /// Bind an injectable type to its own constructor, transiently
    pub fn autowire<T: Injectable>(&self) {
        self.bind_with(Lifecycle::Transient, T::construct);
    }

    /// Bind an injectable type to its own constructor, as a singleton
    pub fn autowire_singleton<T: Injectable>(&self) {
        self.bind_with(Lifecycle::Singleton, T::construct);
    }

    fn bind_with<T, F>(&self, lifecycle: Lifecycle, factory: F)
    where
        T: Provider,
        F: Fn(&Container) -> Result<T, Error> + Send + Sync + 'static,
    {
        let type_name = std::any::type_name::<T>();
        let binding = Binding {
            factory: Arc::new(move |container| {
                factory(container).map(|value| Arc::new(value) as SharedInstance)
            }),
            lifecycle,
            type_name,
        };

        let mut bindings = self.bindings.write();
        bindings.insert(TypeId::of::<T>(), binding);

        debug!(provider = type_name, lifecycle = ?lifecycle, "Binding registered");
    }

    /// Register a pre-built singleton value, bypassing factories entirely
    pub fn register<T: Provider>(&self, instance: T) {
        let type_name = std::any::type_name::<T>();

        trace!(provider = type_name, "Acquiring write lock for registration");
        let mut instances = self.instances.write();
        instances.insert(TypeId::of::<T>(), Arc::new(instance));

        debug!(provider = type_name, "Instance registered in DI container");
    }

    /// Resolve a provider by type.
    ///
    /// Resolution order: materialized instance cache, then registered
    /// binding. Singleton factories run under the materialization lock with
    /// a post-lock re-check, so a shared singleton is constructed exactly
    /// once even under concurrent first access.
    pub fn resolve<T: Provider>(&self) -> Result<Arc<T>, Error> {
        let type_id = TypeId::of::<T>();
        let type_name = std::any::type_name::<T>();

        trace!(provider = type_name, "Attempting to resolve provider");

        if let Some(instance) = self.instances.read().get(&type_id) {
            return downcast::<T>(instance.clone(), type_name);
        }

        let binding = self.bindings.read().get(&type_id).cloned();
        let Some(binding) = binding else {
            debug!(provider = type_name, "Provider not found in container");
            return Err(Error::ProviderNotFound(format!(
                "Provider not found: {}",
                type_name
            )));
        };

        match binding.lifecycle {
            Lifecycle::Transient => {
                trace!(provider = type_name, "Running transient factory");
                let instance = (binding.factory)(self)?;
                downcast::<T>(instance, type_name)
            }
            Lifecycle::Singleton => {
                let _guard = self.materialize.lock();

                // Another worker may have materialized while we waited
                if let Some(instance) = self.instances.read().get(&type_id) {
                    return downcast::<T>(instance.clone(), type_name);
                }

                let instance = (binding.factory)(self)?;
                self.instances.write().insert(type_id, instance.clone());

                debug!(provider = binding.type_name, "Singleton materialized");
                downcast::<T>(instance, type_name)
            }
        }
    }

    /// Resolve, falling back to auto-construction when nothing is registered
    pub fn resolve_or_build<T: Injectable>(&self) -> Result<Arc<T>, Error> {
        match self.resolve::<T>() {
            Ok(instance) => Ok(instance),
            Err(Error::ProviderNotFound(_)) => {
                trace!(
                    provider = std::any::type_name::<T>(),
                    "No binding, auto-building"
                );
                self.build::<T>().map(Arc::new)
            }
            Err(err) => Err(err),
        }
    }

    /// Resolve, falling back to the type's default when resolution fails
    pub fn resolve_or_default<T: Provider + Default>(&self) -> Arc<T> {
        self.resolve::<T>()
            .unwrap_or_else(|_| Arc::new(T::default()))
    }

    /// Construct a fresh instance, ignoring bindings and the instance cache
    pub fn build<T: Injectable>(&self) -> Result<T, Error> {
        T::construct(self)
    }

    /// Check if a binding or a materialized instance exists.
    ///
    /// Never triggers construction.
    pub fn has<T: Provider>(&self) -> bool {
        let type_id = TypeId::of::<T>();
        let exists = self.instances.read().contains_key(&type_id)
            || self.bindings.read().contains_key(&type_id);

        trace!(
            provider = std::any::type_name::<T>(),
            exists = exists,
            "Checked provider existence"
        );
        exists
    }

    /// Clear all bindings and instances
    pub fn clear(&self) {
        let mut bindings = self.bindings.write();
        let mut instances = self.instances.write();
        let count = bindings.len() + instances.len();
        bindings.clear();
        instances.clear();

        debug!(entry_count = count, "Cleared container");
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

fn downcast<T: Provider>(
    instance: SharedInstance,
    type_name: &'static str,
) -> Result<Arc<T>, Error> {
    instance.downcast::<T>().map_err(|_| {
        Error::DependencyInjection(format!(
            "Stored instance for {} has an unexpected type",
            type_name
        ))
    })
}
