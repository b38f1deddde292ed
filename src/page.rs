//! Page Contexts
//!
//! A [`PageContext`] pairs a view-model with a view, owns exactly one resolution scope and
//! releases it exactly once. Shells, navigators and dialogs all build their pages through
//! [`create_page_context`].

use crate::capability::{View, ViewKind, ViewModel};
use crate::error::{ScopeError, ShellError};
use crate::scope::{Instance, InstanceRole, ResolutionScope, TypeToken};
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

mod context;
mod data;
mod factory;

pub use context::PageContext;
pub use data::{PageData, SimplePageData};
pub use factory::{create_page_context, create_page_context_with_data, page_of};
pub(crate) use factory::create_owned_page_context;

static PAGE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Runs against a freshly resolved pair before the page is shown.
pub type Initializer<'a> = Box<dyn FnOnce(&ViewModelHandle, &ViewHandle) + Send + 'a>;

/// Page identifier, unique for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct PageId(u64);

impl PageId {
    pub(crate) fn next() -> Self {
        PageId(PAGE_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page-{}", self.0)
    }
}

/// One side of a page pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSide {
    ViewModel,
    View,
}

impl fmt::Display for PageSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSide::ViewModel => f.write_str("view model"),
            PageSide::View => f.write_str("view"),
        }
    }
}

/// How a request names a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageTarget {
    Type(TypeToken),
    Named(String),
}

impl PageTarget {
    fn token(&self, scope: &dyn ResolutionScope) -> Result<TypeToken, ShellError> {
        match self {
            PageTarget::Type(token) => Ok(*token),
            PageTarget::Named(name) => scope
                .token_named(name)
                .ok_or_else(|| ShellError::UnknownType(name.clone())),
        }
    }
}

/// What to open: either side may be omitted and paired from the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub view_model: Option<PageTarget>,
    pub view: Option<PageTarget>,
    pub title: Option<String>,
}

impl PageRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request by view-model type; the view comes from its default pairing.
    pub fn view_model<T: ViewModel>() -> Self {
        Self::new().with_view_model::<T>()
    }

    /// Request by view type; the view-model comes from its default pairing.
    pub fn view<T: View>() -> Self {
        Self::new().with_view::<T>()
    }

    /// Request by type names, resolved against the opening scope.
    pub fn named(view_model: Option<&str>, view: Option<&str>) -> Self {
        Self {
            view_model: view_model.map(|n| PageTarget::Named(n.to_string())),
            view: view.map(|n| PageTarget::Named(n.to_string())),
            title: None,
        }
    }

    pub fn with_view_model<T: ViewModel>(mut self) -> Self {
        self.view_model = Some(PageTarget::Type(TypeToken::of::<T>()));
        self
    }

    pub fn with_view<T: View>(mut self) -> Self {
        self.view = Some(PageTarget::Type(TypeToken::of::<T>()));
        self
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub(crate) fn tokens(
        &self,
        scope: &dyn ResolutionScope,
    ) -> Result<(Option<TypeToken>, Option<TypeToken>), ShellError> {
        let view_model = self.view_model.as_ref().map(|t| t.token(scope)).transpose()?;
        let view = self.view.as_ref().map(|t| t.token(scope)).transpose()?;
        Ok((view_model, view))
    }
}

/// Resolved view-model of a page.
#[derive(Clone)]
pub struct ViewModelHandle {
    instance: Instance,
    view_model: Arc<dyn ViewModel>,
}

impl ViewModelHandle {
    pub fn from_instance(instance: Instance) -> Result<Self, ScopeError> {
        match instance.role().clone() {
            InstanceRole::ViewModel(view_model) => Ok(Self {
                instance,
                view_model,
            }),
            other => Err(ScopeError::RoleMismatch {
                token: instance.token(),
                expected: "view model",
                actual: other.label(),
            }),
        }
    }

    pub fn token(&self) -> TypeToken {
        self.instance.token()
    }

    pub fn get(&self) -> &dyn ViewModel {
        self.view_model.as_ref()
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.instance.downcast::<T>()
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Identity of the underlying instance.
    pub fn addr(&self) -> usize {
        self.instance.addr()
    }
}

impl fmt::Debug for ViewModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViewModelHandle({})", self.token())
    }
}

/// Resolved view of a page.
#[derive(Clone)]
pub struct ViewHandle {
    instance: Instance,
    view: Arc<dyn View>,
    kind: ViewKind,
}

impl ViewHandle {
    pub fn from_instance(instance: Instance) -> Result<Self, ScopeError> {
        match instance.role().clone() {
            InstanceRole::View(view, kind) => Ok(Self {
                instance,
                view,
                kind,
            }),
            other => Err(ScopeError::RoleMismatch {
                token: instance.token(),
                expected: "view",
                actual: other.label(),
            }),
        }
    }

    pub fn token(&self) -> TypeToken {
        self.instance.token()
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn get(&self) -> &dyn View {
        self.view.as_ref()
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.instance.downcast::<T>()
    }

    pub fn addr(&self) -> usize {
        self.instance.addr()
    }
}

impl fmt::Debug for ViewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViewHandle({}, {:?})", self.token(), self.kind)
    }
}
