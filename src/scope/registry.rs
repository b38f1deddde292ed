//! Registration table: descriptors keyed by service token.

use crate::capability::{View, ViewKind, ViewModel};
use crate::error::ScopeError;
use crate::scope::{Instance, ResolutionScope, TypeToken};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Builds an instance inside a scope.
pub type Factory = Arc<dyn Fn(&dyn ResolutionScope) -> Result<Instance, ScopeError> + Send + Sync>;

/// Runs once when the scope that created an instance is disposed.
pub type ReleaseHook = Arc<dyn Fn(&Instance) + Send + Sync>;

/// Instance lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// One instance per registration layer
    Singleton,
    /// One instance per scope
    Scoped,
    /// A new instance per resolve
    Transient,
}

/// One registration
#[derive(Clone)]
pub struct ServiceDescriptor {
    service: TypeToken,
    implementation: TypeToken,
    lifetime: Lifetime,
    priority: f64,
    overrides: Option<TypeToken>,
    view_kind: Option<ViewKind>,
    factory: Factory,
    release: Option<ReleaseHook>,
}

impl ServiceDescriptor {
    fn build<T, F>(lifetime: Lifetime, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn ResolutionScope) -> Result<T, ScopeError> + Send + Sync + 'static,
    {
        Self::from_factory(
            TypeToken::of::<T>(),
            lifetime,
            Arc::new(move |scope: &dyn ResolutionScope| {
                factory(scope).map(|value| Instance::service(Arc::new(value)))
            }),
        )
    }

    /// Register an arbitrary factory for `service`.
    pub fn from_factory(service: TypeToken, lifetime: Lifetime, factory: Factory) -> Self {
        Self {
            service,
            implementation: service,
            lifetime,
            priority: 0.0,
            overrides: None,
            view_kind: None,
            factory,
            release: None,
        }
    }

    pub fn singleton<T, F>(factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn ResolutionScope) -> Result<T, ScopeError> + Send + Sync + 'static,
    {
        Self::build(Lifetime::Singleton, factory)
    }

    pub fn scoped<T, F>(factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn ResolutionScope) -> Result<T, ScopeError> + Send + Sync + 'static,
    {
        Self::build(Lifetime::Scoped, factory)
    }

    pub fn transient<T, F>(factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn ResolutionScope) -> Result<T, ScopeError> + Send + Sync + 'static,
    {
        Self::build(Lifetime::Transient, factory)
    }

    /// Singleton backed by an existing shared value.
    pub fn shared<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self::from_factory(
            TypeToken::of::<T>(),
            Lifetime::Singleton,
            Arc::new(move |_: &dyn ResolutionScope| {
                Ok(Instance::service(value.clone()))
            }),
        )
    }

    pub fn view_model<T, F>(lifetime: Lifetime, factory: F) -> Self
    where
        T: ViewModel,
        F: Fn(&dyn ResolutionScope) -> Result<T, ScopeError> + Send + Sync + 'static,
    {
        Self::from_factory(
            TypeToken::of::<T>(),
            lifetime,
            Arc::new(move |scope: &dyn ResolutionScope| {
                factory(scope).map(|vm| Instance::view_model(Arc::new(vm)))
            }),
        )
    }

    pub fn view<T, F>(lifetime: Lifetime, factory: F) -> Self
    where
        T: View,
        F: Fn(&dyn ResolutionScope) -> Result<T, ScopeError> + Send + Sync + 'static,
    {
        let mut descriptor = Self::from_factory(
            TypeToken::of::<T>(),
            lifetime,
            Arc::new(move |scope: &dyn ResolutionScope| {
                factory(scope).map(|view| Instance::view(Arc::new(view)))
            }),
        );
        descriptor.view_kind = Some(T::kind());
        descriptor
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }

    /// Name the implementation behind `service` (defaults to the service type itself).
    pub fn implemented_by<I: Any + ?Sized>(mut self) -> Self {
        self.implementation = TypeToken::of::<I>();
        self
    }

    /// Declare that this implementation specializes `B`; it replaces a registration
    /// implemented by `B` regardless of priority.
    pub fn overriding<B: Any + ?Sized>(mut self) -> Self {
        self.overrides = Some(TypeToken::of::<B>());
        self
    }

    pub fn on_release<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Instance) + Send + Sync + 'static,
    {
        self.release = Some(Arc::new(hook));
        self
    }

    pub fn service(&self) -> TypeToken {
        self.service
    }

    pub fn implementation(&self) -> TypeToken {
        self.implementation
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    pub fn priority(&self) -> f64 {
        self.priority
    }

    pub fn view_kind(&self) -> Option<ViewKind> {
        self.view_kind
    }

    pub(crate) fn factory(&self) -> &Factory {
        &self.factory
    }

    pub(crate) fn release_hook(&self) -> Option<&ReleaseHook> {
        self.release.as_ref()
    }

    /// Priority rule: a different implementation wins on strictly higher priority, or
    /// when it declares an override of the current implementation.
    fn supersedes(&self, current: &ServiceDescriptor) -> bool {
        self.implementation != current.implementation
            && (current.priority < self.priority || self.overrides == Some(current.implementation))
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("service", &self.service)
            .field("implementation", &self.implementation)
            .field("lifetime", &self.lifetime)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Registration table built at startup.
#[derive(Clone, Default)]
pub struct ServiceCollection {
    descriptors: HashMap<TypeToken, ServiceDescriptor>,
}

impl ServiceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `descriptor`; a later registration for the same service wins.
    pub fn add(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
        self.descriptors.insert(descriptor.service, descriptor);
        self
    }

    /// Register only when the service has no registration yet.
    pub fn try_add(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
        self.descriptors
            .entry(descriptor.service)
            .or_insert(descriptor);
        self
    }

    /// Register with priority selection against an existing registration.
    pub fn add_prioritized(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
        match self.descriptors.get(&descriptor.service) {
            Some(current) if !descriptor.supersedes(current) => {
                debug!(
                    service = %descriptor.service,
                    kept = %current.implementation,
                    rejected = %descriptor.implementation,
                    "Registration kept over lower-priority candidate"
                );
            }
            _ => {
                self.descriptors.insert(descriptor.service, descriptor);
            }
        }
        self
    }

    /// Add every registration of `other`, later ones winning.
    pub fn extend(&mut self, other: ServiceCollection) -> &mut Self {
        self.descriptors.extend(other.descriptors);
        self
    }

    pub fn add_singleton<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn ResolutionScope) -> Result<T, ScopeError> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::singleton(factory))
    }

    pub fn add_scoped<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn ResolutionScope) -> Result<T, ScopeError> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::scoped(factory))
    }

    pub fn add_transient<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn ResolutionScope) -> Result<T, ScopeError> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::transient(factory))
    }

    pub fn add_instance<T: Any + Send + Sync>(&mut self, value: T) -> &mut Self {
        self.add(ServiceDescriptor::shared(Arc::new(value)))
    }

    pub fn add_shared<T: Any + Send + Sync>(&mut self, value: Arc<T>) -> &mut Self {
        self.add(ServiceDescriptor::shared(value))
    }

    /// View-models default to one instance per page scope.
    pub fn add_view_model<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ViewModel,
        F: Fn(&dyn ResolutionScope) -> Result<T, ScopeError> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::view_model(Lifetime::Scoped, factory))
    }

    /// Views default to a new instance per resolve, which is what makes them reloadable.
    pub fn add_view<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: View,
        F: Fn(&dyn ResolutionScope) -> Result<T, ScopeError> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::view(Lifetime::Transient, factory))
    }

    pub fn get(&self, service: &TypeToken) -> Option<&ServiceDescriptor> {
        self.descriptors.get(service)
    }

    pub fn contains<T: Any + ?Sized>(&self) -> bool {
        self.descriptors.contains_key(&TypeToken::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.descriptors.values()
    }

    /// View classification for every registered view type.
    pub fn view_catalog(&self) -> HashMap<TypeToken, ViewKind> {
        self.descriptors
            .values()
            .filter_map(|d| d.view_kind.map(|kind| (d.service, kind)))
            .collect()
    }

    pub(crate) fn into_descriptors(self) -> HashMap<TypeToken, ServiceDescriptor> {
        self.descriptors
    }
}

impl fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.descriptors.values()).finish()
    }
}
