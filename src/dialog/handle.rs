//! Presenter-facing handle of one open dialog.

use super::{CloseOutcome, CloseTrigger, DialogPlacement};
use crate::capability::ViewKind;
use crate::page::{PageContext, PageId};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use tokio::sync::oneshot;
use tracing::{debug, info};

pub(crate) struct DialogState {
    page: Arc<PageContext>,
    placement: DialogPlacement,
    completion: Mutex<Option<oneshot::Sender<Option<bool>>>>,
    negotiating: AtomicBool,
    closed: AtomicBool,
}

/// Shared handle to an open dialog.
///
/// The presenter keeps at least one clone while the dialog is on screen. Dropping every
/// clone without closing abandons the dialog: the caller resumes with no result.
#[derive(Clone)]
pub struct DialogHandle {
    state: Arc<DialogState>,
}

impl DialogHandle {
    pub(crate) fn new(
        page: Arc<PageContext>,
        placement: DialogPlacement,
        completion: oneshot::Sender<Option<bool>>,
    ) -> Self {
        Self {
            state: Arc::new(DialogState {
                page,
                placement,
                completion: Mutex::new(Some(completion)),
                negotiating: AtomicBool::new(false),
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn page(&self) -> &Arc<PageContext> {
        &self.state.page
    }

    pub fn id(&self) -> PageId {
        self.state.page.id()
    }

    pub fn title(&self) -> String {
        self.state.page.title()
    }

    pub fn placement(&self) -> DialogPlacement {
        self.state.placement
    }

    /// Whether the host must wrap the view in a window of its own.
    pub fn needs_window_chrome(&self) -> bool {
        self.state.page.view().kind() != ViewKind::Window
    }

    /// Called by the presenter once the dialog is on screen.
    pub fn notify_loaded(&self) -> bool {
        self.state.page.notify_loaded()
    }

    pub fn is_open(&self) -> bool {
        !self.state.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn is_negotiating(&self) -> bool {
        self.state.negotiating.load(Ordering::SeqCst)
    }

    pub fn downgrade(&self) -> WeakDialogHandle {
        WeakDialogHandle(Arc::downgrade(&self.state))
    }

    /// Ask the dialog to close.
    ///
    /// The tentative result is fixed by `trigger` before the view-model's closing query
    /// runs. A veto leaves the dialog open with no result. On success the first result
    /// written wins, the page scope is disposed and the waiting caller resumes.
    pub async fn request_close(&self, trigger: CloseTrigger) -> CloseOutcome {
        let state = &self.state;
        if state.closed.load(Ordering::SeqCst) {
            return CloseOutcome::AlreadyClosed;
        }
        if state.negotiating.swap(true, Ordering::SeqCst) {
            return CloseOutcome::InProgress;
        }

        let page = &state.page;
        let tentative = trigger.tentative();
        let allowed = if page.is_disposed() {
            true
        } else {
            let view_model = page.view_model();
            match view_model.get().as_query_closing() {
                Some(query) => query.query_closing(tentative).await,
                None => true,
            }
        };

        // the owner may have been disposed while the query was pending
        let allowed = allowed || page.is_disposed();
        if !allowed {
            let _ = page.set_result(None);
            state.negotiating.store(false, Ordering::SeqCst);
            info!(page = %page.id(), tentative, "Dialog close vetoed");
            return CloseOutcome::Vetoed;
        }

        let result = match page.result() {
            Some(written) => Some(written),
            None if page.is_disposed() => None,
            None => {
                let _ = page.set_result(Some(tentative));
                Some(tentative)
            }
        };
        state.closed.store(true, Ordering::SeqCst);
        page.dispose();
        if let Some(completion) = state.completion.lock().take() {
            let _ = completion.send(result);
        }
        info!(page = %page.id(), ?trigger, ?result, "Dialog closed");
        CloseOutcome::Closed(result)
    }
}

/// Non-owning dialog handle.
#[derive(Clone)]
pub struct WeakDialogHandle(Weak<DialogState>);

impl WeakDialogHandle {
    pub fn upgrade(&self) -> Option<DialogHandle> {
        self.0.upgrade().map(|state| DialogHandle { state })
    }
}

/// Registered in every dialog scope so the dialog's own view-model can close it.
#[derive(Default)]
pub struct DialogLink {
    target: OnceLock<WeakDialogHandle>,
}

impl DialogLink {
    pub(crate) fn bind(&self, handle: &DialogHandle) {
        if self.target.set(handle.downgrade()).is_err() {
            debug!(page = %handle.id(), "Dialog link already bound");
        }
    }

    /// The dialog, while a presenter still holds it.
    pub fn get(&self) -> Option<DialogHandle> {
        self.target.get().and_then(WeakDialogHandle::upgrade)
    }
}
