//! Modal dialog protocol: closing-query negotiation, results and ownership

use crate::integration::test_utils::{
    catalog, AlphaViewModel, Events, PromptPanel, PromptViewModel,
};
use async_trait::async_trait;
use pageshell::capability::{QueryClosing, View, ViewModel};
use pageshell::config::DialogConfig;
use pageshell::dialog::{
    CloseOutcome, CloseTrigger, DialogCoordinator, DialogHandle, DialogLink, DialogPlacement,
    DialogPresenter,
};
use pageshell::error::ShellError;
use pageshell::page::{create_page_context, Initializer, PageRequest, ViewHandle, ViewModelHandle};
use pageshell::scope::{
    Lifetime, ResolutionScope, ServiceCollection, ServiceDescriptor, ServiceScope, TypeToken,
};
use pageshell::shell::ShellBuilder;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

/// Forwards every dialog to the test body.
struct ChannelPresenter(mpsc::UnboundedSender<DialogHandle>);

#[async_trait]
impl DialogPresenter for ChannelPresenter {
    async fn present(&self, dialog: DialogHandle) -> Result<(), ShellError> {
        dialog.notify_loaded();
        self.0
            .send(dialog)
            .map_err(|_| ShellError::Presentation("closed".to_string()))
    }
}

fn coordinator() -> (DialogCoordinator, mpsc::UnboundedReceiver<DialogHandle>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        DialogCoordinator::new(Arc::new(ChannelPresenter(tx)), DialogConfig::default()),
        rx,
    )
}

#[tokio::test]
async fn test_cancel_yields_false_and_disposes() {
    let events = Events::new();
    let root = ServiceScope::root(catalog(&events));
    let (coordinator, mut rx) = coordinator();

    let shown = coordinator.show_dialog(
        root.as_ref(),
        PageRequest::view_model::<PromptViewModel>(),
        None,
    );
    let host = async {
        let handle = rx.recv().await.unwrap();
        assert_eq!(handle.placement(), DialogPlacement::CenterScreen);
        assert!(!handle.needs_window_chrome());
        assert_eq!(
            handle.request_close(CloseTrigger::Cancel).await,
            CloseOutcome::Closed(Some(false))
        );
        handle
    };
    let (outcome, handle) = tokio::join!(shown, host);
    let outcome = outcome.unwrap();

    assert_eq!(outcome.result, Some(false));
    assert!(outcome.page.is_disposed());
    assert_eq!(events.take(), vec!["prompt released"]);
    let vm = outcome.view_model_as::<PromptViewModel>().unwrap();
    assert_eq!(*vm.queried.lock(), vec![false]);
    assert_eq!(
        handle.request_close(CloseTrigger::Confirm).await,
        CloseOutcome::AlreadyClosed
    );
    assert_eq!(*vm.queried.lock(), vec![false]);
}

#[tokio::test]
async fn test_veto_then_confirm() {
    let events = Events::new();
    let root = ServiceScope::root(catalog(&events));
    let (coordinator, mut rx) = coordinator();

    let init: Initializer<'_> = Box::new(|vm: &ViewModelHandle, _: &ViewHandle| {
        if let Some(prompt) = vm.downcast::<PromptViewModel>() {
            prompt.decisions.lock().extend([false, false]);
        }
    });
    let shown = coordinator.show_dialog(
        root.as_ref(),
        PageRequest::view_model::<PromptViewModel>().titled("Delete?"),
        Some(init),
    );
    let host = async {
        let handle = rx.recv().await.unwrap();
        assert_eq!(handle.title(), "Delete?");
        for trigger in [CloseTrigger::Confirm, CloseTrigger::WindowClose] {
            assert_eq!(handle.request_close(trigger).await, CloseOutcome::Vetoed);
            assert!(handle.is_open());
            assert_eq!(handle.page().result(), None);
            assert!(!handle.page().is_disposed());
        }
        handle.request_close(CloseTrigger::Confirm).await
    };
    let (outcome, last) = tokio::join!(shown, host);
    assert_eq!(last, CloseOutcome::Closed(Some(true)));
    let outcome = outcome.unwrap();
    assert_eq!(outcome.result, Some(true));
    let vm = outcome.view_model_as::<PromptViewModel>().unwrap();
    assert_eq!(*vm.queried.lock(), vec![true, false, true]);
}

#[tokio::test]
async fn test_result_written_during_query_wins() {
    let events = Events::new();
    let root = ServiceScope::root(catalog(&events));
    let (coordinator, mut rx) = coordinator();

    let shown = coordinator.show_dialog_with::<PromptViewModel, _>(root.as_ref(), None, |vm| {
        *vm.write_during_query.lock() = Some(true);
    });
    let host = async {
        let handle = rx.recv().await.unwrap();
        handle.request_close(CloseTrigger::Cancel).await
    };
    let (outcome, closed) = tokio::join!(shown, host);
    assert_eq!(closed, CloseOutcome::Closed(Some(true)));
    assert_eq!(outcome.unwrap().result, Some(true));
}

#[tokio::test]
async fn test_view_model_closes_itself_through_link() {
    let events = Events::new();
    let root = ServiceScope::root(catalog(&events));
    let (coordinator, mut rx) = coordinator();

    let shown = coordinator.show_dialog(root.as_ref(), PageRequest::view::<PromptPanel>(), None);
    let host = async {
        let handle = rx.recv().await.unwrap();
        assert!(handle.needs_window_chrome());
        let link = handle.page().get::<DialogLink>().unwrap();
        let own = link.get().unwrap();
        assert_eq!(own.id(), handle.id());
        own.request_close(CloseTrigger::Result(false)).await
    };
    let (outcome, closed) = tokio::join!(shown, host);
    assert_eq!(closed, CloseOutcome::Closed(Some(false)));
    assert_eq!(outcome.unwrap().result, Some(false));
}

#[tokio::test]
async fn test_abandoned_dialog_returns_none() {
    let events = Events::new();
    let root = ServiceScope::root(catalog(&events));
    let (coordinator, mut rx) = coordinator();

    let shown = coordinator.show_dialog(
        root.as_ref(),
        PageRequest::view_model::<PromptViewModel>(),
        None,
    );
    let host = async {
        let handle = rx.recv().await.unwrap();
        drop(handle);
    };
    let (outcome, ()) = tokio::join!(shown, host);
    let outcome = outcome.unwrap();
    assert_eq!(outcome.result, None);
    assert!(outcome.page.is_disposed());
    assert_eq!(coordinator.open_dialogs(), 0);
}

#[tokio::test]
async fn test_owner_falls_back_to_active_page() {
    let events = Events::new();
    let shell = ShellBuilder::new().with_services(catalog(&events)).build();
    let selected = shell
        .open_page(PageRequest::view_model::<AlphaViewModel>())
        .unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let coordinator =
        DialogCoordinator::new(Arc::new(ChannelPresenter(tx)), DialogConfig::default())
            .with_active_page(&shell);

    let shown = coordinator.show_dialog(
        shell.root_scope().as_ref(),
        PageRequest::view_model::<PromptViewModel>(),
        None,
    );
    let host = async {
        let handle = rx.recv().await.unwrap();
        assert_eq!(handle.placement(), DialogPlacement::CenterOwner(selected.id()));
        assert_eq!(handle.page().owner().map(|o| o.id()), Some(selected.id()));
        assert_eq!(handle.page().depth(), 1);
        handle.request_close(CloseTrigger::Confirm).await
    };
    let (outcome, _) = tokio::join!(shown, host);
    assert_eq!(outcome.unwrap().result, Some(true));
}

#[tokio::test]
async fn test_nested_dialog_is_owned_by_outer_dialog() {
    let events = Events::new();
    let root = ServiceScope::root(catalog(&events));
    let (coordinator, mut rx) = coordinator();

    let outer = coordinator.show_dialog(
        root.as_ref(),
        PageRequest::view_model::<PromptViewModel>(),
        None,
    );
    let host = async {
        let outer_handle = rx.recv().await.unwrap();
        let inner = coordinator.show_dialog_from(
            outer_handle.page(),
            PageRequest::view_model::<PromptViewModel>(),
            None,
        );
        let inner_host = async {
            let inner_handle = rx.recv().await.unwrap();
            assert_eq!(
                inner_handle.placement(),
                DialogPlacement::CenterOwner(outer_handle.id())
            );
            inner_handle.request_close(CloseTrigger::Confirm).await
        };
        let (inner_outcome, _) = tokio::join!(inner, inner_host);
        assert_eq!(inner_outcome.unwrap().result, Some(true));
        outer_handle.request_close(CloseTrigger::Cancel).await
    };
    let (outcome, _) = tokio::join!(outer, host);
    assert_eq!(outcome.unwrap().result, Some(false));
    assert_eq!(events.take(), vec!["prompt released", "prompt released"]);
}

#[tokio::test]
async fn test_show_from_disposed_page_fails() {
    let events = Events::new();
    let shell = ShellBuilder::new().with_services(catalog(&events)).build();
    let page = shell
        .open_page(PageRequest::view_model::<AlphaViewModel>())
        .unwrap();
    page.dispose();
    let (coordinator, _rx) = coordinator();
    let err = coordinator
        .show_dialog_from(&page, PageRequest::view_model::<PromptViewModel>(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ShellError::UseAfterDispose(id) if id == page.id()));
}

/// Closing query that waits until released by the test, then answers `allow`.
struct GatedViewModel {
    gate: Arc<Notify>,
    allow: bool,
}

impl ViewModel for GatedViewModel {
    fn default_view(&self) -> Option<TypeToken> {
        Some(TypeToken::of::<GatedView>())
    }

    fn as_query_closing(&self) -> Option<&dyn QueryClosing> {
        Some(self)
    }
}

#[async_trait]
impl QueryClosing for GatedViewModel {
    async fn query_closing(&self, _tentative: bool) -> bool {
        self.gate.notified().await;
        self.allow
    }
}

struct GatedView;

impl View for GatedView {}

fn gated_root(gate: Arc<Notify>, lifetime: Lifetime, allow: bool) -> Arc<ServiceScope> {
    let mut services = ServiceCollection::new();
    services
        .add(ServiceDescriptor::view_model(
            lifetime,
            move |_: &dyn ResolutionScope| {
                Ok(GatedViewModel {
                    gate: gate.clone(),
                    allow,
                })
            },
        ))
        .add_view(|_| Ok(GatedView));
    ServiceScope::root(services)
}

#[tokio::test]
async fn test_concurrent_close_reports_in_progress() {
    let gate = Arc::new(Notify::new());
    let root = gated_root(gate.clone(), Lifetime::Scoped, true);
    let (coordinator, mut rx) = coordinator();

    let shown = coordinator.show_dialog(
        root.as_ref(),
        PageRequest::view_model::<GatedViewModel>(),
        None,
    );
    let host = async {
        let handle = rx.recv().await.unwrap();
        let first = handle.request_close(CloseTrigger::Confirm);
        let second = async {
            let outcome = handle.request_close(CloseTrigger::Cancel).await;
            gate.notify_one();
            outcome
        };
        tokio::join!(first, second)
    };
    let (outcome, (first, second)) = tokio::join!(shown, host);
    assert_eq!(first, CloseOutcome::Closed(Some(true)));
    assert_eq!(second, CloseOutcome::InProgress);
    assert_eq!(outcome.unwrap().result, Some(true));
}

#[tokio::test]
async fn test_same_view_model_cannot_be_shown_twice() {
    let gate = Arc::new(Notify::new());
    let root = gated_root(gate.clone(), Lifetime::Singleton, true);
    let (coordinator, mut rx) = coordinator();

    let first = coordinator.show_dialog(
        root.as_ref(),
        PageRequest::view_model::<GatedViewModel>(),
        None,
    );
    let host = async {
        let handle = rx.recv().await.unwrap();
        let second = coordinator
            .show_dialog(
                root.as_ref(),
                PageRequest::view_model::<GatedViewModel>(),
                None,
            )
            .await;
        assert!(matches!(second, Err(ShellError::DialogAlreadyOpen(_))));
        assert_eq!(coordinator.open_dialogs(), 1);
        gate.notify_one();
        handle.request_close(CloseTrigger::Confirm).await
    };
    let (outcome, closed) = tokio::join!(first, host);
    assert_eq!(closed, CloseOutcome::Closed(Some(true)));
    assert_eq!(outcome.unwrap().result, Some(true));
    assert_eq!(coordinator.open_dialogs(), 0);
}

#[tokio::test]
async fn test_result_write_requests_close() {
    let events = Events::new();
    let root = ServiceScope::root(catalog(&events));
    let (coordinator, mut rx) = coordinator();

    let init: Initializer<'_> = Box::new(|vm: &ViewModelHandle, _: &ViewHandle| {
        if let Some(prompt) = vm.downcast::<PromptViewModel>() {
            prompt.decisions.lock().push_back(false);
        }
    });
    let shown = coordinator.show_dialog(
        root.as_ref(),
        PageRequest::view_model::<PromptViewModel>(),
        Some(init),
    );
    let host = async {
        let handle = rx.recv().await.unwrap();
        let vm = handle
            .page()
            .view_model()
            .downcast::<PromptViewModel>()
            .unwrap();

        handle.page().set_result(Some(true)).unwrap();
        while vm.queried.lock().is_empty() {
            tokio::task::yield_now().await;
        }
        assert!(handle.is_open());
        assert_eq!(handle.page().result(), None);

        handle.page().set_result(Some(false)).unwrap();
        handle
    };
    let (outcome, handle) = tokio::time::timeout(Duration::from_secs(5), async {
        tokio::join!(shown, host)
    })
    .await
    .expect("dialog closes after a result is written");

    let outcome = outcome.unwrap();
    assert_eq!(outcome.result, Some(false));
    assert!(!handle.is_open());
    assert!(outcome.page.is_disposed());
    let vm = outcome.view_model_as::<PromptViewModel>().unwrap();
    assert_eq!(*vm.queried.lock(), vec![true, false]);
    assert_eq!(
        handle.request_close(CloseTrigger::Confirm).await,
        CloseOutcome::AlreadyClosed
    );
}

#[tokio::test]
async fn test_owner_disposed_during_query_closes_dialog() {
    let gate = Arc::new(Notify::new());
    let root = gated_root(gate.clone(), Lifetime::Scoped, false);
    let opener = create_page_context(
        root.as_ref(),
        &PageRequest::view_model::<GatedViewModel>(),
        ServiceCollection::new(),
    )
    .unwrap();
    let (coordinator, mut rx) = coordinator();

    let shown = coordinator.show_dialog_from(
        &opener,
        PageRequest::view_model::<GatedViewModel>(),
        None,
    );
    let host = async {
        let handle = rx.recv().await.unwrap();
        let closing = handle.request_close(CloseTrigger::Confirm);
        let dispose_opener = async {
            tokio::task::yield_now().await;
            opener.dispose();
            gate.notify_one();
        };
        let (closed, ()) = tokio::join!(closing, dispose_opener);
        assert!(!handle.is_open());
        assert!(handle.page().is_disposed());
        closed
    };
    let (outcome, closed) = tokio::time::timeout(Duration::from_secs(5), async {
        tokio::join!(shown, host)
    })
    .await
    .expect("caller resumes once the owner is gone");

    assert_eq!(closed, CloseOutcome::Closed(None));
    assert_eq!(outcome.unwrap().result, None);
    assert_eq!(coordinator.open_dialogs(), 0);
}
