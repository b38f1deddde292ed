//! View Resolution Policy
//!
//! Decides whether a view may be recreated in place without disposing its page scope.
//! The answer depends only on the view's type classification, so it stays valid after the
//! page is disposed.

use crate::capability::ViewKind;
use crate::scope::{ServiceCollection, TypeToken};
use std::collections::HashMap;
use std::sync::Arc;

pub trait ViewResolutionPolicy: Send + Sync {
    fn can_reload(&self, view: TypeToken) -> bool;

    fn view_kind(&self, view: TypeToken) -> Option<ViewKind>;
}

/// Forbids reloading top-level windows; everything else (and any unknown type) reloads.
#[derive(Debug, Clone, Default)]
pub struct DefaultViewPolicy {
    catalog: HashMap<TypeToken, ViewKind>,
}

impl DefaultViewPolicy {
    pub fn new(catalog: HashMap<TypeToken, ViewKind>) -> Self {
        Self { catalog }
    }

    pub fn from_services(services: &ServiceCollection) -> Self {
        Self::new(services.view_catalog())
    }
}

impl ViewResolutionPolicy for DefaultViewPolicy {
    fn can_reload(&self, view: TypeToken) -> bool {
        self.view_kind(view) != Some(ViewKind::Window)
    }

    fn view_kind(&self, view: TypeToken) -> Option<ViewKind> {
        self.catalog.get(&view).copied()
    }
}

/// Scope-resolvable handle to the active policy.
#[derive(Clone)]
pub struct ViewPolicyRef(pub Arc<dyn ViewResolutionPolicy>);

impl ViewPolicyRef {
    pub fn new<P: ViewResolutionPolicy + 'static>(policy: P) -> Self {
        Self(Arc::new(policy))
    }

    pub fn policy(&self) -> &dyn ViewResolutionPolicy {
        self.0.as_ref()
    }
}
