//! Page creation from a parent scope.

use super::{PageContext, PageData, PageRequest};
use crate::error::ShellError;
use crate::scope::{Link, ResolutionScope, ServiceCollection};
use std::sync::Arc;

/// The page bound to `scope`, if `scope` belongs to a live page.
pub fn page_of(scope: &dyn ResolutionScope) -> Result<Option<Arc<PageContext>>, ShellError> {
    Ok(scope
        .try_get::<Link<PageContext>>()?
        .and_then(|link| link.get())
        .filter(|page| !page.is_disposed()))
}

fn page_scope(
    parent: &dyn ResolutionScope,
    mut registrations: ServiceCollection,
    fallback_owner: Option<Arc<PageContext>>,
) -> Result<(Option<Arc<PageContext>>, Arc<dyn ResolutionScope>), ShellError> {
    let owner = page_of(parent)?.or(fallback_owner);
    registrations.add_shared(Link::<PageContext>::new());
    let scope = parent.create_child_scope(registrations)?;
    Ok((owner, scope))
}

/// Open `request` in a new child of `parent`.
///
/// When `parent` is itself a page scope, that page becomes the owner. `registrations` are
/// visible only inside the new page scope.
pub fn create_page_context(
    parent: &dyn ResolutionScope,
    request: &PageRequest,
    registrations: ServiceCollection,
) -> Result<Arc<PageContext>, ShellError> {
    create_owned_page_context(parent, request, registrations, None)
}

/// Like [`create_page_context`]; `fallback_owner` is used when `parent` is not a page scope.
pub(crate) fn create_owned_page_context(
    parent: &dyn ResolutionScope,
    request: &PageRequest,
    registrations: ServiceCollection,
    fallback_owner: Option<Arc<PageContext>>,
) -> Result<Arc<PageContext>, ShellError> {
    let (view_model, view) = request.tokens(parent)?;
    let (owner, scope) = page_scope(parent, registrations, fallback_owner)?;
    let page = PageContext::initialize(scope, owner.as_ref(), view_model, view)?;
    if let Some(title) = &request.title {
        page.set_title(title.clone())?;
    }
    Ok(page)
}

/// Open a page described by external page data in a new child of `parent`.
pub fn create_page_context_with_data(
    parent: &dyn ResolutionScope,
    data: Arc<dyn PageData>,
    registrations: ServiceCollection,
) -> Result<Arc<PageContext>, ShellError> {
    let (owner, scope) = page_scope(parent, registrations, None)?;
    PageContext::with_page_data(scope, owner.as_ref(), data)
}
