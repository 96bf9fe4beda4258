use crate::error::{MvcError, Result};
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;

type Instance = Arc<dyn Any + Send + Sync>;

/// Turns a registered implementation into an `Arc<dyn Trait>` wrapped in `Arc<dyn Any>`.
type CasterFn = Arc<dyn Fn(Instance) -> Option<Instance> + Send + Sync>;

/// Thread-safe store of values that controller handlers can pull in through
/// [`RequestContext::inject`](crate::context::RequestContext::inject).
///
/// Values are keyed by type. Trait objects are supported through an explicit
/// binding from the trait to a registered implementation.
#[derive(Clone, Default)]
pub struct Injector {
    services: DashMap<TypeId, Instance>,
    trait_mappings: DashMap<TypeId, TypeId>,
    casters: DashMap<TypeId, CasterFn>,
}

impl Injector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: 'static + Send + Sync>(&mut self, instance: T) -> &mut Self {
        self.services.insert(TypeId::of::<T>(), Arc::new(instance));
        self
    }

    /// Bind `Trait` to the registered implementation `Impl`.
    pub fn register_trait<Trait, Impl, F>(&mut self, caster_fn: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        Impl: 'static + Send + Sync,
        F: Fn(Arc<Impl>) -> Arc<Trait> + 'static + Send + Sync,
    {
        let trait_id = TypeId::of::<Trait>();
        self.trait_mappings.insert(trait_id, TypeId::of::<Impl>());

        let caster: CasterFn = Arc::new(move |instance: Instance| {
            let concrete = instance.downcast::<Impl>().ok()?;
            let trait_obj: Arc<Trait> = caster_fn(concrete);
            Some(Arc::new(trait_obj) as Instance)
        });
        self.casters.insert(trait_id, caster);
        self
    }

    pub fn resolve<T: 'static + Send + Sync>(&self) -> Result<Arc<T>> {
        let entry = self
            .services
            .get(&TypeId::of::<T>())
            .ok_or_else(|| MvcError::DependencyNotFound {
                type_name: std::any::type_name::<T>().to_string(),
            })?;
        entry
            .value()
            .clone()
            .downcast::<T>()
            .map_err(|_| MvcError::DowncastFailed {
                type_name: std::any::type_name::<T>().to_string(),
            })
    }

    pub fn resolve_trait<T: ?Sized + 'static + Send + Sync>(&self) -> Result<Arc<T>> {
        let trait_id = TypeId::of::<T>();
        let not_found = || MvcError::DependencyNotFound {
            type_name: std::any::type_name::<T>().to_string(),
        };

        let caster = self.casters.get(&trait_id).ok_or_else(not_found)?;
        let impl_id = *self.trait_mappings.get(&trait_id).ok_or_else(not_found)?;
        let instance = self
            .services
            .get(&impl_id)
            .ok_or_else(|| MvcError::DependencyNotFound {
                type_name: format!(
                    "implementation for '{}' not registered",
                    std::any::type_name::<T>()
                ),
            })?
            .value()
            .clone();

        let downcast_failed = || MvcError::DowncastFailed {
            type_name: std::any::type_name::<T>().to_string(),
        };
        // The caster yields Arc<Arc<T>> behind `dyn Any`; unwrap one level.
        let wrapper = (caster.value())(instance)
            .ok_or_else(downcast_failed)?
            .downcast::<Arc<T>>()
            .map_err(|_| downcast_failed())?;
        Ok(wrapper.as_ref().clone())
    }

    pub fn contains<T: 'static>(&self) -> bool {
        let type_id = TypeId::of::<T>();
        self.services.contains_key(&type_id) || self.trait_mappings.contains_key(&type_id)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
