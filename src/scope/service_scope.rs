//! Bundled resolution scope backed by a [`ServiceCollection`].

use crate::error::ScopeError;
use crate::policy::{DefaultViewPolicy, ViewPolicyRef};
use crate::scope::registry::{Lifetime, ReleaseHook, ServiceCollection, ServiceDescriptor};
use crate::scope::{Instance, ResolutionScope, ScopeId, TypeToken};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use tracing::{debug, trace};

/// Registrations introduced by one scope, chained to its parent's layer.
struct Layer {
    owner: ScopeId,
    /// Scope that created the layer; singleton factories resolve through it.
    scope: OnceLock<Weak<ServiceScope>>,
    descriptors: HashMap<TypeToken, ServiceDescriptor>,
    singletons: Mutex<HashMap<TypeToken, Instance>>,
    releases: Mutex<Vec<(Instance, ReleaseHook)>>,
    parent: Option<Arc<Layer>>,
}

impl Layer {
    fn new(
        owner: ScopeId,
        descriptors: HashMap<TypeToken, ServiceDescriptor>,
        parent: Option<Arc<Layer>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            owner,
            scope: OnceLock::new(),
            descriptors,
            singletons: Mutex::new(HashMap::new()),
            releases: Mutex::new(Vec::new()),
            parent,
        })
    }

    /// Innermost layer registering `token`, with its descriptor.
    fn find(self: &Arc<Self>, token: &TypeToken) -> Option<(Arc<Layer>, ServiceDescriptor)> {
        let mut current = Some(self.clone());
        while let Some(layer) = current {
            if let Some(descriptor) = layer.descriptors.get(token) {
                return Some((layer.clone(), descriptor.clone()));
            }
            current = layer.parent.clone();
        }
        None
    }

    fn owning_scope(&self) -> Result<Arc<ServiceScope>, ScopeError> {
        self.scope
            .get()
            .and_then(Weak::upgrade)
            .filter(|scope| !scope.is_disposed())
            .ok_or(ScopeError::Disposed(self.owner))
    }

    fn visible_tokens(self: &Arc<Self>) -> Vec<TypeToken> {
        let mut tokens = Vec::new();
        let mut current = Some(self.clone());
        while let Some(layer) = current {
            for token in layer.descriptors.keys() {
                if !tokens.contains(token) {
                    tokens.push(*token);
                }
            }
            current = layer.parent.clone();
        }
        tokens
    }

    fn release(&self) {
        let releases = std::mem::take(&mut *self.releases.lock());
        for (instance, hook) in releases.iter().rev() {
            hook(instance);
        }
        self.singletons.lock().clear();
        trace!(owner = %self.owner, released = releases.len(), "Registration layer released");
    }
}

/// Scope over a chain of registration layers.
///
/// Singletons are cached in the layer that registered them and built through the scope
/// that owns that layer; scoped instances are cached in the scope itself. Disposing a scope disposes its live children first, then runs release hooks in
/// reverse creation order.
pub struct ServiceScope {
    id: ScopeId,
    parent: Option<ScopeId>,
    layer: Arc<Layer>,
    owns_layer: bool,
    scoped: Mutex<HashMap<TypeToken, Instance>>,
    releases: Mutex<Vec<(Instance, ReleaseHook)>>,
    children: Mutex<Vec<Weak<ServiceScope>>>,
    resolving: Mutex<Vec<TypeToken>>,
    disposed: AtomicBool,
}

impl ServiceScope {
    /// Create a root scope from a registration table.
    ///
    /// A [`ViewPolicyRef`] built from the table's view catalog is registered unless the
    /// table already provides one.
    pub fn root(mut services: ServiceCollection) -> Arc<Self> {
        let policy = ViewPolicyRef::new(DefaultViewPolicy::from_services(&services));
        services.try_add(ServiceDescriptor::shared(Arc::new(policy)));
        let id = ScopeId::next();
        let layer = Layer::new(id, services.into_descriptors(), None);
        debug!(scope = %id, registrations = layer.descriptors.len(), "Root scope created");
        Self::with_layer(id, None, layer, true)
    }

    fn with_layer(
        id: ScopeId,
        parent: Option<ScopeId>,
        layer: Arc<Layer>,
        owns_layer: bool,
    ) -> Arc<Self> {
        let scope = Arc::new(Self {
            id,
            parent,
            layer,
            owns_layer,
            scoped: Mutex::new(HashMap::new()),
            releases: Mutex::new(Vec::new()),
            children: Mutex::new(Vec::new()),
            resolving: Mutex::new(Vec::new()),
            disposed: AtomicBool::new(false),
        });
        if owns_layer {
            let _ = scope.layer.scope.set(Arc::downgrade(&scope));
        }
        scope
    }

    pub fn parent_id(&self) -> Option<ScopeId> {
        self.parent
    }

    /// Number of child scopes that are still alive and undisposed.
    pub fn live_children(&self) -> usize {
        self.children
            .lock()
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|child| !child.is_disposed())
            .count()
    }

    /// Create a child scope and keep the concrete type.
    pub fn child(&self, registrations: ServiceCollection) -> Result<Arc<ServiceScope>, ScopeError> {
        if self.is_disposed() {
            return Err(ScopeError::Disposed(self.id));
        }
        let id = ScopeId::next();
        let (layer, owns_layer) = if registrations.is_empty() {
            (self.layer.clone(), false)
        } else {
            (
                Layer::new(id, registrations.into_descriptors(), Some(self.layer.clone())),
                true,
            )
        };
        let child = Self::with_layer(id, Some(self.id), layer, owns_layer);
        let mut children = self.children.lock();
        children.retain(|c| c.strong_count() > 0);
        children.push(Arc::downgrade(&child));
        debug!(scope = %id, parent = %self.id, own_layer = owns_layer, "Child scope created");
        Ok(child)
    }

    fn create(&self, token: TypeToken, descriptor: &ServiceDescriptor) -> Result<Instance, ScopeError> {
        {
            let mut stack = self.resolving.lock();
            if stack.contains(&token) {
                return Err(ScopeError::Cycle(token));
            }
            stack.push(token);
        }
        let scope: &dyn ResolutionScope = self;
        let created = (descriptor.factory())(scope);
        self.resolving.lock().retain(|t| *t != token);
        created
    }

    fn cache(
        cache: &Mutex<HashMap<TypeToken, Instance>>,
        releases: &Mutex<Vec<(Instance, ReleaseHook)>>,
        token: TypeToken,
        instance: Instance,
        descriptor: &ServiceDescriptor,
    ) -> Instance {
        let mut cache = cache.lock();
        if let Some(existing) = cache.get(&token) {
            return existing.clone();
        }
        if let Some(hook) = descriptor.release_hook() {
            releases.lock().push((instance.clone(), hook.clone()));
        }
        cache.insert(token, instance.clone());
        instance
    }
}

impl ResolutionScope for ServiceScope {
    fn id(&self) -> ScopeId {
        self.id
    }

    fn resolve(&self, token: TypeToken) -> Result<Instance, ScopeError> {
        if self.is_disposed() {
            return Err(ScopeError::Disposed(self.id));
        }
        let (layer, descriptor) = self
            .layer
            .find(&token)
            .ok_or(ScopeError::NotRegistered(token))?;

        match descriptor.lifetime() {
            Lifetime::Singleton => {
                if let Some(existing) = layer.singletons.lock().get(&token) {
                    return Ok(existing.clone());
                }
                let owner = layer.owning_scope()?;
                let instance = owner.create(token, &descriptor)?;
                Ok(Self::cache(
                    &layer.singletons,
                    &layer.releases,
                    token,
                    instance,
                    &descriptor,
                ))
            }
            Lifetime::Scoped => {
                if let Some(existing) = self.scoped.lock().get(&token) {
                    return Ok(existing.clone());
                }
                let instance = self.create(token, &descriptor)?;
                Ok(Self::cache(
                    &self.scoped,
                    &self.releases,
                    token,
                    instance,
                    &descriptor,
                ))
            }
            Lifetime::Transient => {
                let instance = self.create(token, &descriptor)?;
                if let Some(hook) = descriptor.release_hook() {
                    self.releases.lock().push((instance.clone(), hook.clone()));
                }
                Ok(instance)
            }
        }
    }

    fn create_child_scope(
        &self,
        registrations: ServiceCollection,
    ) -> Result<Arc<dyn ResolutionScope>, ScopeError> {
        let child: Arc<dyn ResolutionScope> = self.child(registrations)?;
        Ok(child)
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let children: Vec<Weak<ServiceScope>> = self.children.lock().drain(..).collect();
        for child in children.iter().rev().filter_map(Weak::upgrade) {
            child.dispose();
        }

        let releases = std::mem::take(&mut *self.releases.lock());
        for (instance, hook) in releases.iter().rev() {
            hook(instance);
        }
        self.scoped.lock().clear();
        if self.owns_layer {
            self.layer.release();
        }
        debug!(scope = %self.id, released = releases.len(), "Scope disposed");
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn token_named(&self, name: &str) -> Option<TypeToken> {
        let tokens = self.layer.visible_tokens();
        if let Some(token) = tokens.iter().find(|t| t.name() == name) {
            return Some(*token);
        }
        let mut matches = tokens.iter().filter(|t| t.short_name() == name);
        match (matches.next(), matches.next()) {
            (Some(token), None) => Some(*token),
            _ => None,
        }
    }
}

impl Drop for ServiceScope {
    fn drop(&mut self) {
        self.dispose();
    }
}
