use crate::di::Injector;
use std::sync::Arc;

/// Fluent builder for an [`Injector`].
///
/// ```
/// use dirmvc::InjectorBuilder;
///
/// struct SiteTitle(String);
///
/// let injector = InjectorBuilder::new()
///     .register(SiteTitle("Docs".to_string()))
///     .build();
/// assert!(injector.contains::<SiteTitle>());
/// ```
#[derive(Default)]
pub struct InjectorBuilder {
    injector: Injector,
}

impl InjectorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: 'static + Send + Sync>(mut self, instance: T) -> Self {
        self.injector.register(instance);
        self
    }

    /// Bind a trait to a registered implementation so handlers can resolve
    /// `Arc<dyn Trait>`.
    pub fn bind<Trait, Impl, F>(mut self, caster: F) -> Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        Impl: 'static + Send + Sync,
        F: Fn(Arc<Impl>) -> Arc<Trait> + 'static + Send + Sync,
    {
        self.injector.register_trait::<Trait, Impl, F>(caster);
        self
    }

    pub fn build(self) -> Injector {
        self.injector
    }
}
