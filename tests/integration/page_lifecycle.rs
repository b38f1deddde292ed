//! Page context lifecycle: disposal, ownership, notifications and page data

use crate::integration::test_utils::{catalog, AlphaView, AlphaViewModel, BetaViewModel, Events};
use pageshell::error::ShellError;
use pageshell::notify::Property;
use pageshell::page::{
    create_page_context, create_page_context_with_data, page_of, PageData, PageRequest,
    SimplePageData,
};
use pageshell::scope::{ResolutionScope, ServiceCollection, ServiceScope};
use parking_lot::Mutex;
use std::sync::Arc;

fn open(parent: &dyn ResolutionScope, request: PageRequest) -> Arc<pageshell::PageContext> {
    create_page_context(parent, &request, ServiceCollection::new()).unwrap()
}

#[test]
fn test_dispose_releases_exactly_once_and_keeps_readers() {
    let events = Events::new();
    let root = ServiceScope::root(catalog(&events));
    let page = open(root.as_ref(), PageRequest::view_model::<AlphaViewModel>().titled("Alpha"));
    page.view_model()
        .downcast::<AlphaViewModel>()
        .unwrap()
        .label
        .lock()
        .push_str("one");

    assert!(page.dispose());
    assert!(!page.dispose());
    assert_eq!(events.take(), vec!["alpha one released"]);

    assert!(page.is_disposed());
    assert_eq!(page.title(), "Alpha");
    assert_eq!(page.view().token(), pageshell::TypeToken::of::<AlphaView>());
    assert_eq!(
        page.view_model().downcast::<AlphaViewModel>().unwrap().label.lock().as_str(),
        "one"
    );
    assert!(matches!(page.set_title("x"), Err(ShellError::UseAfterDispose(id)) if id == page.id()));
    assert!(matches!(page.set_result(Some(true)), Err(ShellError::UseAfterDispose(_))));
    assert!(matches!(page.reload_view(), Err(ShellError::UseAfterDispose(_))));
}

#[test]
fn test_dropping_last_reference_disposes() {
    let events = Events::new();
    let root = ServiceScope::root(catalog(&events));
    {
        let _page = open(root.as_ref(), PageRequest::view_model::<BetaViewModel>());
    }
    assert_eq!(events.take(), vec!["beta released"]);
    assert_eq!(root.live_children(), 0);
}

#[test]
fn test_owner_chain_and_cascade() {
    let events = Events::new();
    let root = ServiceScope::root(catalog(&events));
    let outer = open(root.as_ref(), PageRequest::view_model::<BetaViewModel>());
    let middle = open(outer.scope().as_ref(), PageRequest::view_model::<AlphaViewModel>());
    let inner = open(middle.scope().as_ref(), PageRequest::view_model::<BetaViewModel>());

    assert_eq!(inner.depth(), 2);
    assert_eq!(inner.owner().unwrap().id(), middle.id());
    assert_eq!(middle.owner().unwrap().id(), outer.id());
    assert!(page_of(root.as_ref()).unwrap().is_none());

    middle.dispose();
    assert!(inner.is_disposed());
    assert!(inner.owner().is_none());
    assert!(!outer.is_disposed());
    assert_eq!(events.take(), vec!["beta released", "alpha  released"]);
}

#[test]
fn test_notifications_and_loaded_once() {
    let events = Events::new();
    let root = ServiceScope::root(catalog(&events));
    let page = open(root.as_ref(), PageRequest::view_model::<AlphaViewModel>());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    page.subscribe(move |e| sink.lock().push(e.property));

    page.set_title("First").unwrap();
    page.set_result(Some(false)).unwrap();
    assert!(page.reload_view().unwrap().is_some());
    assert!(page.notify_loaded());
    assert!(!page.notify_loaded());
    page.dispose();

    assert_eq!(
        *seen.lock(),
        vec![Property::Title, Property::Result, Property::View, Property::Disposed]
    );
    assert_eq!(events.take(), vec!["alpha  loaded", "alpha  released"]);
}

#[test]
fn test_page_data_drives_title() {
    let events = Events::new();
    let root = ServiceScope::root(catalog(&events));
    let data = Arc::new(
        SimplePageData::new("Report")
            .with_view_model("AlphaViewModel")
            .with_view("AlphaView"),
    );
    let page =
        create_page_context_with_data(root.as_ref(), data.clone(), ServiceCollection::new())
            .unwrap();
    let titles = Arc::new(Mutex::new(0));
    let counter = titles.clone();
    page.subscribe(move |e| {
        if e.property == Property::Title {
            *counter.lock() += 1;
        }
    });

    assert_eq!(page.title(), "Report");
    data.set_title("Quarterly".to_string());
    assert_eq!(page.title(), "Quarterly");
    page.set_title("Annual").unwrap();
    assert_eq!(data.title(), "Annual");
    assert_eq!(*titles.lock(), 2);

    page.dispose();
    data.set_title("After".to_string());
    assert_eq!(*titles.lock(), 2);
}
