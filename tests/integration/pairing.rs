//! View-model/view pairing and reload rules

use crate::integration::test_utils::{
    catalog, AlphaView, AlphaViewModel, BetaView, BetaViewModel, Events, LooseView,
    OrphanViewModel, PromptViewModel, PromptWindow,
};
use pageshell::capability::ViewKind;
use pageshell::error::ShellError;
use pageshell::page::{create_page_context, PageRequest, PageSide};
use pageshell::policy::{ViewPolicyRef, ViewResolutionPolicy};
use pageshell::scope::{ServiceCollection, ServiceScope, TypeToken};
use std::sync::Arc;

fn root(events: &Events) -> Arc<ServiceScope> {
    ServiceScope::root(catalog(events))
}

#[test]
fn test_pair_from_either_side() {
    let events = Events::new();
    let root = root(&events);
    let from_vm = create_page_context(
        root.as_ref(),
        &PageRequest::view_model::<BetaViewModel>(),
        ServiceCollection::new(),
    )
    .unwrap();
    assert_eq!(from_vm.view().token(), TypeToken::of::<BetaView>());

    let from_view = create_page_context(
        root.as_ref(),
        &PageRequest::view::<AlphaView>(),
        ServiceCollection::new(),
    )
    .unwrap();
    assert_eq!(from_view.view_model().token(), TypeToken::of::<AlphaViewModel>());

    let explicit = create_page_context(
        root.as_ref(),
        &PageRequest::view_model::<AlphaViewModel>().with_view::<BetaView>(),
        ServiceCollection::new(),
    )
    .unwrap();
    assert_eq!(explicit.view().token(), TypeToken::of::<BetaView>());
}

#[test]
fn test_pairing_failures_leave_no_scope() {
    let events = Events::new();
    let root = root(&events);

    let err = create_page_context(
        root.as_ref(),
        &PageRequest::view_model::<OrphanViewModel>(),
        ServiceCollection::new(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ShellError::Pairing { missing: PageSide::View, from: Some(token) }
            if token == TypeToken::of::<OrphanViewModel>()
    ));

    let err = create_page_context(
        root.as_ref(),
        &PageRequest::view::<LooseView>(),
        ServiceCollection::new(),
    )
    .unwrap_err();
    assert!(matches!(err, ShellError::Pairing { missing: PageSide::ViewModel, .. }));

    let err = create_page_context(root.as_ref(), &PageRequest::new(), ServiceCollection::new())
        .unwrap_err();
    assert!(matches!(err, ShellError::Pairing { from: None, .. }));

    assert_eq!(root.live_children(), 0);
}

#[test]
fn test_window_views_are_not_reloaded() {
    let events = Events::new();
    let root = root(&events);
    let policy = (root.as_ref() as &dyn pageshell::ResolutionScope)
        .get::<ViewPolicyRef>()
        .unwrap();
    assert!(!policy.policy().can_reload(TypeToken::of::<PromptWindow>()));
    assert_eq!(
        policy.policy().view_kind(TypeToken::of::<PromptWindow>()),
        Some(ViewKind::Window)
    );

    let dialog = create_page_context(
        root.as_ref(),
        &PageRequest::view_model::<PromptViewModel>(),
        ServiceCollection::new(),
    )
    .unwrap();
    let before = dialog.view().addr();
    assert!(dialog.reload_view().unwrap().is_none());
    assert_eq!(dialog.view().addr(), before);

    let page = create_page_context(
        root.as_ref(),
        &PageRequest::view_model::<AlphaViewModel>(),
        ServiceCollection::new(),
    )
    .unwrap();
    let before = page.view().addr();
    let vm_before = page.view_model().addr();
    let reloaded = page.reload_view().unwrap().unwrap();
    assert_ne!(reloaded.addr(), before);
    assert_eq!(page.view_model().addr(), vm_before);
}

struct NeverReload;

impl ViewResolutionPolicy for NeverReload {
    fn can_reload(&self, _view: TypeToken) -> bool {
        false
    }

    fn view_kind(&self, _view: TypeToken) -> Option<ViewKind> {
        None
    }
}

#[test]
fn test_custom_policy_replaces_default() {
    let events = Events::new();
    let mut services = catalog(&events);
    services.add_instance(ViewPolicyRef::new(NeverReload));
    let root = ServiceScope::root(services);
    let page = create_page_context(
        root.as_ref(),
        &PageRequest::view_model::<AlphaViewModel>(),
        ServiceCollection::new(),
    )
    .unwrap();
    assert!(!page.can_reload_view());
}
