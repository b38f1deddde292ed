//! The page lifecycle unit.

use super::{PageData, PageId, PageSide, ViewHandle, ViewModelHandle};
use crate::capability::ViewKind;
use crate::error::ShellError;
use crate::notify::{Notifier, Property, PropertyChanged, SubscriptionId};
use crate::policy::ViewPolicyRef;
use crate::scope::{Instance, Link, ResolutionScope, TypeToken};
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

/// A view-model and view pair bound to one exclusively owned scope.
///
/// Readers keep working after disposal; mutators fail with
/// [`ShellError::UseAfterDispose`]. Dropping the last reference disposes the scope if
/// nothing did so earlier.
pub struct PageContext {
    id: PageId,
    scope: Arc<dyn ResolutionScope>,
    owner: Option<Weak<PageContext>>,
    depth: usize,
    view_model: ViewModelHandle,
    view: Mutex<ViewHandle>,
    title: Mutex<String>,
    page_data: Option<Arc<dyn PageData>>,
    page_data_subscription: Mutex<Option<SubscriptionId>>,
    result: Mutex<Option<bool>>,
    loaded: AtomicBool,
    disposed: AtomicBool,
    notifier: Notifier,
}

impl PageContext {
    /// Resolve the pair from `scope` and take ownership of it.
    ///
    /// When one side is omitted, it is taken from the other side's default pairing. On any
    /// failure `scope` is disposed before the error is returned.
    pub fn initialize(
        scope: Arc<dyn ResolutionScope>,
        owner: Option<&Arc<PageContext>>,
        view_model: Option<TypeToken>,
        view: Option<TypeToken>,
    ) -> Result<Arc<PageContext>, ShellError> {
        Self::build(scope, owner, view_model, view, None)
    }

    /// Like [`initialize`](Self::initialize), with the title owned by `data`.
    pub fn with_page_data(
        scope: Arc<dyn ResolutionScope>,
        owner: Option<&Arc<PageContext>>,
        data: Arc<dyn PageData>,
    ) -> Result<Arc<PageContext>, ShellError> {
        let lookup = |name: Option<String>| -> Result<Option<TypeToken>, ShellError> {
            name.map(|n| scope.token_named(&n).ok_or(ShellError::UnknownType(n)))
                .transpose()
        };
        let tokens = lookup(data.view_model_type_name())
            .and_then(|vm| lookup(data.view_type_name()).map(|v| (vm, v)));
        let (view_model, view) = match tokens {
            Ok(pair) => pair,
            Err(e) => {
                scope.dispose();
                return Err(e);
            }
        };
        Self::build(scope, owner, view_model, view, Some(data))
    }

    fn build(
        scope: Arc<dyn ResolutionScope>,
        owner: Option<&Arc<PageContext>>,
        view_model: Option<TypeToken>,
        view: Option<TypeToken>,
        page_data: Option<Arc<dyn PageData>>,
    ) -> Result<Arc<PageContext>, ShellError> {
        let (view_model, view) = match resolve_pair(scope.as_ref(), view_model, view) {
            Ok(pair) => pair,
            Err(e) => {
                warn!(scope = %scope.id(), error = %e, "Page initialization failed");
                scope.dispose();
                return Err(e);
            }
        };

        let page = Arc::new(PageContext {
            id: PageId::next(),
            owner: owner.map(Arc::downgrade),
            depth: owner.map(|o| o.depth + 1).unwrap_or(0),
            view_model,
            view: Mutex::new(view),
            title: Mutex::new(String::new()),
            page_data,
            page_data_subscription: Mutex::new(None),
            result: Mutex::new(None),
            loaded: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            notifier: Notifier::new(),
            scope,
        });

        if let Ok(Some(link)) = page.scope.try_get::<Link<PageContext>>() {
            link.bind(&page);
        }

        if let Some(data) = &page.page_data {
            let weak = Arc::downgrade(&page);
            let id = data.subscribe(Arc::new(move |event: &PropertyChanged| {
                if event.property == Property::Title {
                    if let Some(page) = weak.upgrade() {
                        page.notifier.raise(Property::Title);
                    }
                }
            }));
            *page.page_data_subscription.lock() = Some(id);
        }

        debug!(
            page = %page.id,
            scope = %page.scope.id(),
            view_model = %page.view_model.token(),
            view = %page.view.lock().token(),
            depth = page.depth,
            "Page context initialized"
        );
        Ok(page)
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn view_model(&self) -> ViewModelHandle {
        self.view_model.clone()
    }

    pub fn view(&self) -> ViewHandle {
        self.view.lock().clone()
    }

    pub fn title(&self) -> String {
        match &self.page_data {
            Some(data) => data.title(),
            None => self.title.lock().clone(),
        }
    }

    pub fn page_data(&self) -> Option<&Arc<dyn PageData>> {
        self.page_data.as_ref()
    }

    pub fn result(&self) -> Option<bool> {
        *self.result.lock()
    }

    /// The opening page, while it is alive and undisposed.
    pub fn owner(&self) -> Option<Arc<PageContext>> {
        self.owner
            .as_ref()
            .and_then(Weak::upgrade)
            .filter(|owner| !owner.is_disposed())
    }

    /// Owner-chain length; root pages are at depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn scope(&self) -> &Arc<dyn ResolutionScope> {
        &self.scope
    }

    /// True once this context or an ancestor scope has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst) || self.scope.is_disposed()
    }

    fn ensure_live(&self) -> Result<(), ShellError> {
        if self.is_disposed() {
            Err(ShellError::UseAfterDispose(self.id))
        } else {
            Ok(())
        }
    }

    pub fn set_title(&self, title: impl Into<String>) -> Result<(), ShellError> {
        self.ensure_live()?;
        let title = title.into();
        if let Some(data) = &self.page_data {
            data.set_title(title);
            return Ok(());
        }
        {
            let mut current = self.title.lock();
            if *current == title {
                return Ok(());
            }
            *current = title;
        }
        self.notifier.raise(Property::Title);
        Ok(())
    }

    pub fn set_result(&self, result: Option<bool>) -> Result<(), ShellError> {
        self.ensure_live()?;
        {
            let mut current = self.result.lock();
            if *current == result {
                return Ok(());
            }
            *current = result;
        }
        self.notifier.raise(Property::Result);
        Ok(())
    }

    /// Resolve a further dependency through the page scope.
    pub fn resolve(&self, token: TypeToken) -> Result<Instance, ShellError> {
        self.ensure_live()?;
        Ok(self.scope.resolve(token)?)
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Result<Arc<T>, ShellError> {
        self.ensure_live()?;
        Ok(self.scope.get::<T>()?)
    }

    pub fn can_reload_view(&self) -> bool {
        let view = self.view.lock().clone();
        match self.scope.try_get::<ViewPolicyRef>() {
            Ok(Some(policy)) => {
                let policy = policy.policy();
                match policy.view_kind(view.token()) {
                    Some(_) => policy.can_reload(view.token()),
                    // registered outside the policy's catalog
                    None => view.kind() != ViewKind::Window && policy.can_reload(view.token()),
                }
            }
            _ => view.kind() != ViewKind::Window,
        }
    }

    /// Recreate the view from the page scope, keeping the view-model.
    ///
    /// Returns `Ok(None)` when the view type is not reloadable.
    pub fn reload_view(&self) -> Result<Option<ViewHandle>, ShellError> {
        self.ensure_live()?;
        if !self.can_reload_view() {
            debug!(page = %self.id, "View reload not permitted");
            return Ok(None);
        }
        let token = self.view.lock().token();
        let view = ViewHandle::from_instance(self.scope.resolve(token)?)?;
        *self.view.lock() = view.clone();
        self.notifier.raise(Property::View);
        debug!(page = %self.id, view = %token, "View reloaded");
        Ok(Some(view))
    }

    /// Run the view-model's loaded hook. At most once per context, never after disposal.
    pub fn notify_loaded(&self) -> bool {
        if self.is_disposed() || self.loaded.swap(true, Ordering::SeqCst) {
            return false;
        }
        if let Some(hook) = self.view_model.get().as_notify_loaded() {
            hook.on_loaded();
        }
        true
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&PropertyChanged) + Send + Sync + 'static,
    {
        self.notifier.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Dispose the owned scope. Returns `true` only for the call that released it; a scope
    /// already released by its parent makes this a no-op apart from notifying.
    pub fn dispose(&self) -> bool {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return false;
        }
        if let (Some(data), Some(id)) = (&self.page_data, self.page_data_subscription.lock().take()) {
            data.unsubscribe(id);
        }
        let released = !self.scope.is_disposed();
        self.scope.dispose();
        debug!(page = %self.id, scope = %self.scope.id(), released, "Page context disposed");
        self.notifier.raise(Property::Disposed);
        self.notifier.clear();
        released
    }
}

impl Drop for PageContext {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for PageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageContext")
            .field("id", &self.id)
            .field("view_model", &self.view_model.token())
            .field("depth", &self.depth)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

fn resolve_pair(
    scope: &dyn ResolutionScope,
    view_model: Option<TypeToken>,
    view: Option<TypeToken>,
) -> Result<(ViewModelHandle, ViewHandle), ShellError> {
    match (view_model, view) {
        (Some(vm_token), view_token) => {
            let vm = ViewModelHandle::from_instance(scope.resolve(vm_token)?)?;
            let view_token = view_token
                .or_else(|| vm.get().default_view())
                .ok_or(ShellError::Pairing {
                    missing: PageSide::View,
                    from: Some(vm_token),
                })?;
            let view = ViewHandle::from_instance(scope.resolve(view_token)?)?;
            Ok((vm, view))
        }
        (None, Some(view_token)) => {
            let view = ViewHandle::from_instance(scope.resolve(view_token)?)?;
            let vm_token = view.get().default_view_model().ok_or(ShellError::Pairing {
                missing: PageSide::ViewModel,
                from: Some(view_token),
            })?;
            let vm = ViewModelHandle::from_instance(scope.resolve(vm_token)?)?;
            Ok((vm, view))
        }
        (None, None) => Err(ShellError::Pairing {
            missing: PageSide::ViewModel,
            from: None,
        }),
    }
}
