//! Back-stack navigation scenarios

use crate::integration::test_utils::{catalog, AlphaViewModel, Events};
use pageshell::config::{ClearOrder, ShellConfig};
use pageshell::host::demo::{self, DetailsViewModel, SettingsViewModel};
use pageshell::navigation::{BackStackNavigator, NavigationManager};
use pageshell::notify::Property;
use pageshell::page::{Initializer, PageRequest, ViewHandle, ViewModelHandle};
use pageshell::shell::ShellBuilder;
use parking_lot::Mutex;
use std::sync::Arc;

fn labelled(label: &'static str) -> Option<Initializer<'static>> {
    Some(Box::new(move |vm: &ViewModelHandle, _: &ViewHandle| {
        if let Some(alpha) = vm.downcast::<AlphaViewModel>() {
            *alpha.label.lock() = label.to_string();
        }
    }))
}

fn navigator(events: &Events, order: ClearOrder) -> Arc<BackStackNavigator> {
    let mut config = ShellConfig::default();
    config.navigation.clear_order = order;
    ShellBuilder::new()
        .with_services(catalog(events))
        .with_config(config)
        .build_navigator()
}

#[test]
fn test_settings_details_go_back() {
    let (services, journal) = demo::catalog();
    let navigator = ShellBuilder::new().with_services(services).build_navigator();

    let settings = navigator
        .navigate(PageRequest::view_model::<SettingsViewModel>().titled("Settings"), None)
        .unwrap();
    let init: Initializer<'_> = Box::new(|vm: &ViewModelHandle, _: &ViewHandle| {
        if let Some(details) = vm.downcast::<DetailsViewModel>() {
            *details.item.lock() = "network".to_string();
        }
    });
    let details = navigator
        .navigate(PageRequest::view_model::<DetailsViewModel>(), Some(init))
        .unwrap();
    assert!(navigator.can_go_back());
    assert!(!settings.is_disposed());
    assert_eq!(
        details.view_model().downcast::<DetailsViewModel>().unwrap().item.lock().as_str(),
        "network"
    );

    assert!(navigator.go_back().unwrap());
    assert!(details.is_disposed());
    assert_eq!(navigator.current().map(|p| p.id()), Some(settings.id()));
    assert_eq!(navigator.current().unwrap().title(), "Settings");
    assert!(!navigator.can_go_back());
    assert_eq!(
        journal.drain(),
        vec!["SettingsViewModel loaded", "DetailsViewModel released"]
    );
}

#[test]
fn test_initializer_runs_before_loaded_hook() {
    let events = Events::new();
    let navigator = navigator(&events, ClearOrder::TopDown);
    navigator
        .navigate(PageRequest::view_model::<AlphaViewModel>(), labelled("seeded"))
        .unwrap();
    assert_eq!(events.take(), vec!["alpha seeded loaded"]);
}

#[test]
fn test_go_back_on_single_entry_is_noop() {
    let events = Events::new();
    let navigator = navigator(&events, ClearOrder::TopDown);
    assert!(!navigator.go_back().unwrap());
    let only = navigator
        .navigate(PageRequest::view_model::<AlphaViewModel>(), labelled("only"))
        .unwrap();
    assert!(!navigator.go_back().unwrap());
    assert!(!only.is_disposed());
    assert_eq!(navigator.len(), 1);
}

#[test]
fn test_clear_back_stack_both_orders() {
    for (order, expected) in [
        (
            ClearOrder::TopDown,
            vec!["alpha c released", "alpha b released", "alpha a released"],
        ),
        (
            ClearOrder::BottomUp,
            vec!["alpha a released", "alpha b released", "alpha c released"],
        ),
    ] {
        let events = Events::new();
        let navigator = navigator(&events, order);
        for label in ["a", "b", "c", "d"] {
            navigator
                .navigate(PageRequest::view_model::<AlphaViewModel>(), labelled(label))
                .unwrap();
        }
        events.take();
        assert_eq!(navigator.clear_back_stack(), 3);
        assert_eq!(events.take(), expected);
        assert!(!navigator.can_go_back());
        assert!(!navigator.go_back().unwrap());
    }
}

#[test]
fn test_can_go_back_notifications() {
    let events = Events::new();
    let navigator = navigator(&events, ClearOrder::TopDown);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    navigator.subscribe(move |e| sink.lock().push(e.property));

    for label in ["a", "b", "c"] {
        navigator
            .navigate(PageRequest::view_model::<AlphaViewModel>(), labelled(label))
            .unwrap();
    }
    navigator.clear_back_stack();
    assert_eq!(
        *seen.lock(),
        vec![
            Property::CurrentPage,
            Property::CurrentPage,
            Property::CanGoBack,
            Property::CurrentPage,
            Property::CanGoBack,
        ]
    );
}
