//! Keyed service providers sharing one shell selection

use crate::integration::test_utils::{catalog, AlphaViewModel, BetaViewModel, Events};
use pageshell::error::ShellError;
use pageshell::page::{PageRequest, SimplePageData};
use pageshell::scope::{ResolutionScope, ServiceCollection};
use pageshell::shell::{MultiProviderShell, ShellBuilder};
use std::sync::Arc;

struct Tenant(&'static str);

fn multi(events: &Events) -> MultiProviderShell<String> {
    MultiProviderShell::new(ShellBuilder::new().with_services(catalog(events)).build())
}

#[test]
fn test_providers_are_independent_roots() {
    let events = Events::new();
    let multi = multi(&events);
    let mut north = ServiceCollection::new();
    north.add_instance(Tenant("north"));
    multi.create_provider("north".to_string(), north).unwrap();
    multi
        .create_provider("south".to_string(), ServiceCollection::new())
        .unwrap();

    let page = multi
        .open_page_in(&"north".to_string(), PageRequest::view_model::<AlphaViewModel>())
        .unwrap();
    assert_eq!(page.get::<Tenant>().unwrap().0, "north");
    assert_eq!(page.get::<String>().unwrap().as_str(), "north");

    let south = multi.provider(&"south".to_string()).unwrap();
    let south_scope: &dyn ResolutionScope = south.as_ref();
    assert!(south_scope.try_get::<Tenant>().unwrap().is_none());

    let mut keys = multi.keys();
    keys.sort();
    assert_eq!(keys, vec!["north".to_string(), "south".to_string()]);
}

#[test]
fn test_selection_is_shared_across_providers() {
    let events = Events::new();
    let multi = multi(&events);
    multi
        .create_provider("a".to_string(), ServiceCollection::new())
        .unwrap();
    multi
        .create_provider("b".to_string(), ServiceCollection::new())
        .unwrap();

    let first = multi
        .open_page_in(&"a".to_string(), PageRequest::view_model::<BetaViewModel>())
        .unwrap();
    let second = multi
        .open_page_data_in(
            &"b".to_string(),
            Arc::new(SimplePageData::new("Beta").with_view_model("BetaViewModel")),
        )
        .unwrap();
    assert!(first.is_disposed());
    assert_eq!(
        multi.shell().selected_page().map(|p| p.id()),
        Some(second.id())
    );
    assert_eq!(
        events.take(),
        vec!["beta loaded", "beta loaded", "beta released"]
    );
}

#[test]
fn test_duplicate_unknown_and_removed_keys() {
    let events = Events::new();
    let multi = multi(&events);
    multi
        .create_provider("x".to_string(), ServiceCollection::new())
        .unwrap();
    assert!(matches!(
        multi.create_provider("x".to_string(), ServiceCollection::new()),
        Err(ShellError::DuplicateProvider(key)) if key == "x"
    ));
    assert!(matches!(
        multi.open_page_in(&"y".to_string(), PageRequest::view_model::<BetaViewModel>()),
        Err(ShellError::UnknownProvider(key)) if key == "y"
    ));

    let page = multi
        .open_page_in(&"x".to_string(), PageRequest::view_model::<BetaViewModel>())
        .unwrap();
    assert!(multi.remove_provider(&"x".to_string()));
    assert!(page.is_disposed());
    assert!(!multi.remove_provider(&"x".to_string()));
    assert!(multi.is_empty());
}
