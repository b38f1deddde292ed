//! Resolution Scopes
//!
//! The boundary the shell consumes to obtain view-models, views and their dependencies.
//! A scope resolves instances by [`TypeToken`], creates child scopes carrying extra
//! registrations, and releases everything it resolved when disposed.
//!
//! [`ServiceScope`] is the bundled implementation, built from a [`ServiceCollection`]
//! registration table.

use crate::capability::{View, ViewKind, ViewModel};
use crate::error::ScopeError;
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

mod registry;
mod service_scope;

pub use registry::{Factory, Lifetime, ReleaseHook, ServiceCollection, ServiceDescriptor};
pub use service_scope::ServiceScope;

static SCOPE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identifies a type for resolution.
///
/// Equality and hashing use the `TypeId` only; the name is carried for diagnostics and
/// name-based lookup.
#[derive(Clone, Copy)]
pub struct TypeToken {
    id: TypeId,
    name: &'static str,
}

impl TypeToken {
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Full Rust type path
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of the type name, generics included.
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        match base.rfind("::") {
            Some(idx) => &self.name[idx + 2..],
            None => self.name,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }
}

impl PartialEq for TypeToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeToken {}

impl Hash for TypeToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeToken({})", self.name)
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Scope identifier, unique for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

impl ScopeId {
    pub(crate) fn next() -> Self {
        ScopeId(SCOPE_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope-{}", self.0)
    }
}

/// How a resolved instance may be used by the shell.
#[derive(Clone)]
pub enum InstanceRole {
    Service,
    ViewModel(Arc<dyn ViewModel>),
    View(Arc<dyn View>, ViewKind),
}

impl InstanceRole {
    pub fn label(&self) -> &'static str {
        match self {
            InstanceRole::Service => "service",
            InstanceRole::ViewModel(_) => "view model",
            InstanceRole::View(..) => "view",
        }
    }
}

/// A resolved instance together with its role.
#[derive(Clone)]
pub struct Instance {
    token: TypeToken,
    value: Arc<dyn Any + Send + Sync>,
    role: InstanceRole,
}

impl Instance {
    pub fn service<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            token: TypeToken::of::<T>(),
            value,
            role: InstanceRole::Service,
        }
    }

    pub fn view_model<T: ViewModel>(value: Arc<T>) -> Self {
        Self {
            token: TypeToken::of::<T>(),
            value: value.clone(),
            role: InstanceRole::ViewModel(value),
        }
    }

    pub fn view<T: View>(value: Arc<T>) -> Self {
        Self {
            token: TypeToken::of::<T>(),
            value: value.clone(),
            role: InstanceRole::View(value, T::kind()),
        }
    }

    /// Concrete type of the instance
    pub fn token(&self) -> TypeToken {
        self.token
    }

    pub fn role(&self) -> &InstanceRole {
        &self.role
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }

    /// Address of the shared value, stable for the instance lifetime.
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.value) as *const () as usize
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("token", &self.token)
            .field("role", &self.role.label())
            .finish()
    }
}

/// A disposable resolution context.
pub trait ResolutionScope: Send + Sync {
    fn id(&self) -> ScopeId;

    /// Resolve an instance for `token`. Scoped and singleton registrations yield the same
    /// instance for repeated calls within the scope's lifetime.
    fn resolve(&self, token: TypeToken) -> Result<Instance, ScopeError>;

    /// Like [`resolve`](Self::resolve), but a missing registration is `Ok(None)`.
    fn try_resolve(&self, token: TypeToken) -> Result<Option<Instance>, ScopeError> {
        match self.resolve(token) {
            Ok(instance) => Ok(Some(instance)),
            Err(ScopeError::NotRegistered(missing)) if missing == token => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create a child scope; `registrations` are visible to the child and its descendants.
    fn create_child_scope(
        &self,
        registrations: ServiceCollection,
    ) -> Result<Arc<dyn ResolutionScope>, ScopeError>;

    /// Release every instance resolved through this scope. Idempotent.
    fn dispose(&self);

    fn is_disposed(&self) -> bool;

    /// Map a type name (full path or unambiguous last segment) to a registered token.
    fn token_named(&self, name: &str) -> Option<TypeToken>;
}

impl<'a> dyn ResolutionScope + 'a {
    /// Resolve and downcast in one step.
    pub fn get<T: Any + Send + Sync>(&self) -> Result<Arc<T>, ScopeError> {
        let token = TypeToken::of::<T>();
        self.resolve(token)?
            .downcast::<T>()
            .ok_or(ScopeError::Downcast(token))
    }

    pub fn try_get<T: Any + Send + Sync>(&self) -> Result<Option<Arc<T>>, ScopeError> {
        let token = TypeToken::of::<T>();
        match self.try_resolve(token)? {
            Some(instance) => instance
                .downcast::<T>()
                .map(Some)
                .ok_or(ScopeError::Downcast(token)),
            None => Ok(None),
        }
    }
}

/// Non-owning back-reference registered into a scope.
///
/// Lets code resolved inside a scope reach the object that owns the scope (its page,
/// shell, navigator or dialog) without creating a reference cycle. The link is set once,
/// after the owner is constructed.
pub struct Link<T> {
    target: OnceLock<Weak<T>>,
}

impl<T> Link<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            target: OnceLock::new(),
        })
    }

    /// Bind the link; later calls are ignored.
    pub fn bind(&self, target: &Arc<T>) {
        let _ = self.target.set(Arc::downgrade(target));
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.target.get().and_then(Weak::upgrade)
    }

    pub fn is_bound(&self) -> bool {
        self.target.get().is_some()
    }
}
