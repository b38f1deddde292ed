//! Dialogs
//!
//! Modal dialogs opened in a child of the caller's scope. `show_dialog` suspends until the
//! dialog closes, negotiating every close request with the view-model's closing query, and
//! returns the tri-state result together with the view-model. Writing a result to an open
//! dialog's page outside a negotiation requests a close with that result.

use crate::config::DialogConfig;
use crate::error::ShellError;
use crate::notify::Property;
use crate::page::{
    create_owned_page_context, page_of, Initializer, PageContext, PageId, PageRequest,
    ViewHandle, ViewModelHandle,
};
use crate::scope::{ResolutionScope, ServiceCollection};
use crate::shell::ActivePage;
use crate::capability::ViewModel;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

mod handle;

pub use handle::{DialogHandle, DialogLink, WeakDialogHandle};

/// What asked the dialog to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseTrigger {
    /// Affirmative action
    Confirm,
    /// Dismiss action
    Cancel,
    /// Window-manager close box
    WindowClose,
    /// Explicit result
    Result(bool),
}

impl CloseTrigger {
    /// Result the close would produce if nothing else is written.
    pub fn tentative(self) -> bool {
        match self {
            CloseTrigger::Confirm => true,
            CloseTrigger::Cancel | CloseTrigger::WindowClose => false,
            CloseTrigger::Result(value) => value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseOutcome {
    Closed(Option<bool>),
    Vetoed,
    AlreadyClosed,
    /// Another close request is still awaiting the closing query.
    InProgress,
}

/// Where the host should place the dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogPlacement {
    CenterOwner(PageId),
    CenterScreen,
}

/// Rendering boundary for dialogs.
///
/// `present` registers the dialog with the host and returns; the host later calls
/// [`DialogHandle::request_close`]. The host may also drive the whole dialog inside
/// `present`.
#[async_trait]
pub trait DialogPresenter: Send + Sync {
    async fn present(&self, dialog: DialogHandle) -> Result<(), ShellError>;
}

/// Result of a closed dialog
#[derive(Clone)]
pub struct DialogOutcome {
    pub result: Option<bool>,
    pub view_model: ViewModelHandle,
    pub page: Arc<PageContext>,
}

impl DialogOutcome {
    pub fn view_model_as<T: ViewModel>(&self) -> Option<Arc<T>> {
        self.view_model.downcast::<T>()
    }
}

impl std::fmt::Debug for DialogOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogOutcome")
            .field("result", &self.result)
            .field("view_model", &self.view_model)
            .finish()
    }
}

/// Releases the re-entrancy slot and the dialog scope on every exit path.
struct OpenDialog<'a> {
    open: &'a Mutex<HashSet<usize>>,
    addr: usize,
    page: Arc<PageContext>,
}

impl Drop for OpenDialog<'_> {
    fn drop(&mut self) {
        self.open.lock().remove(&self.addr);
        self.page.dispose();
    }
}

/// Opens dialogs and waits for them to close.
pub struct DialogCoordinator {
    presenter: Arc<dyn DialogPresenter>,
    active: Option<Weak<dyn ActivePage>>,
    config: DialogConfig,
    open: Mutex<HashSet<usize>>,
}

impl DialogCoordinator {
    pub fn new(presenter: Arc<dyn DialogPresenter>, config: DialogConfig) -> Self {
        Self {
            presenter,
            active: None,
            config,
            open: Mutex::new(HashSet::new()),
        }
    }

    /// Use `active` as the owner when a dialog is opened from outside any page.
    pub fn with_active_page<A: ActivePage + 'static>(mut self, active: &Arc<A>) -> Self {
        let weak: Weak<dyn ActivePage> = Arc::downgrade(active) as Weak<dyn ActivePage>;
        self.active = Some(weak);
        self
    }

    pub fn open_dialogs(&self) -> usize {
        self.open.lock().len()
    }

    /// Show a dialog from `caller` and wait for it to close.
    pub async fn show_dialog(
        &self,
        caller: &dyn ResolutionScope,
        request: PageRequest,
        initializer: Option<Initializer<'_>>,
    ) -> Result<DialogOutcome, ShellError> {
        let fallback_owner = match page_of(caller)? {
            Some(_) => None,
            None => self
                .active
                .as_ref()
                .and_then(Weak::upgrade)
                .and_then(|active| active.active_page()),
        };

        let link = Arc::new(DialogLink::default());
        let mut registrations = ServiceCollection::new();
        registrations.add_shared(link.clone());
        let page = create_owned_page_context(caller, &request, registrations, fallback_owner)?;

        if page.depth() > self.config.max_nesting {
            page.dispose();
            return Err(ShellError::NestingTooDeep(self.config.max_nesting));
        }

        let view_model = page.view_model();
        let addr = view_model.addr();
        if !self.open.lock().insert(addr) {
            page.dispose();
            warn!(view_model = %view_model.token(), "Dialog already open for view model");
            return Err(ShellError::DialogAlreadyOpen(view_model.token()));
        }
        let guard = OpenDialog {
            open: &self.open,
            addr,
            page: page.clone(),
        };

        if let Some(initializer) = initializer {
            initializer(&view_model, &page.view());
        }

        let placement = match page.owner() {
            Some(owner) => DialogPlacement::CenterOwner(owner.id()),
            None => DialogPlacement::CenterScreen,
        };
        let (completion, mut closed) = oneshot::channel();
        let handle = DialogHandle::new(page.clone(), placement, completion);
        link.bind(&handle);
        info!(
            page = %page.id(),
            view_model = %view_model.token(),
            ?placement,
            depth = page.depth(),
            "Dialog shown"
        );

        let (written_tx, mut written) = mpsc::unbounded_channel();
        let weak = handle.downgrade();
        let subscription = page.subscribe(move |event| {
            if event.property != Property::Result {
                return;
            }
            let Some(handle) = weak.upgrade() else {
                return;
            };
            if handle.is_negotiating() {
                return;
            }
            if let Some(result) = handle.page().result() {
                let _ = written_tx.send(result);
            }
        });
        let weak = handle.downgrade();

        let presented = self.presenter.present(handle).await;
        if let Err(e) = presented {
            page.unsubscribe(subscription);
            return Err(e);
        }

        let result = loop {
            tokio::select! {
                biased;
                closed_result = &mut closed => break match closed_result {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(page = %page.id(), "Dialog abandoned without closing");
                        None
                    }
                },
                Some(result) = written.recv() => {
                    if let Some(handle) = weak.upgrade() {
                        debug!(page = %page.id(), result, "Result written, closing dialog");
                        handle.request_close(CloseTrigger::Result(result)).await;
                    }
                }
            }
        };
        page.unsubscribe(subscription);
        drop(guard);
        Ok(DialogOutcome {
            result,
            view_model,
            page,
        })
    }

    /// Show a dialog owned by `page`.
    pub async fn show_dialog_from(
        &self,
        page: &PageContext,
        request: PageRequest,
        initializer: Option<Initializer<'_>>,
    ) -> Result<DialogOutcome, ShellError> {
        if page.is_disposed() {
            return Err(ShellError::UseAfterDispose(page.id()));
        }
        self.show_dialog(page.scope().as_ref(), request, initializer)
            .await
    }

    /// Show a dialog for view-model `T`, seeding it through `init`.
    pub async fn show_dialog_with<T, F>(
        &self,
        caller: &dyn ResolutionScope,
        title: Option<&str>,
        init: F,
    ) -> Result<DialogOutcome, ShellError>
    where
        T: ViewModel,
        F: FnOnce(&T) + Send,
    {
        let mut request = PageRequest::view_model::<T>();
        request.title = title.map(str::to_string);
        let initializer: Initializer<'_> =
            Box::new(move |view_model: &ViewModelHandle, _: &ViewHandle| {
                if let Some(view_model) = view_model.downcast::<T>() {
                    init(&view_model);
                }
            });
        self.show_dialog(caller, request, Some(initializer)).await
    }
}
