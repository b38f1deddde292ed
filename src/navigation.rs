//! Navigation
//!
//! Back-stack host for multi-page shells. The last entry is the current page; earlier
//! entries stay alive so `go_back` can return to them.

use crate::config::{ClearOrder, ShellConfig};
use crate::error::{ScopeError, ShellError};
use crate::notify::{Notifier, Property, PropertyChanged, SubscriptionId};
use crate::page::{create_page_context, Initializer, PageContext, PageRequest};
use crate::scope::{Link, ResolutionScope, ServiceCollection, ServiceScope};
use crate::shell::ActivePage;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

/// Back-stack operations.
pub trait NavigationManager: Send + Sync {
    /// Open a page and push it; nothing is disposed.
    fn navigate(
        &self,
        request: PageRequest,
        initializer: Option<Initializer<'_>>,
    ) -> Result<Arc<PageContext>, ShellError>;

    /// Pop and dispose the current page. `Ok(false)` when there is nothing to go back to.
    fn go_back(&self) -> Result<bool, ShellError>;

    fn can_go_back(&self) -> bool;

    /// Dispose every entry below the current page; returns how many were removed.
    fn clear_back_stack(&self) -> usize;

    fn current(&self) -> Option<Arc<PageContext>>;
}

/// Stack-backed [`NavigationManager`].
pub struct BackStackNavigator {
    root: Arc<ServiceScope>,
    config: ShellConfig,
    stack: Mutex<Vec<Arc<PageContext>>>,
    notifier: Notifier,
}

impl BackStackNavigator {
    /// Build a navigator with its own root scope; `Link<BackStackNavigator>` is registered
    /// so pages can reach it.
    pub fn build(mut services: ServiceCollection, config: ShellConfig) -> Arc<Self> {
        let link = Link::<BackStackNavigator>::new();
        services.add_shared(link.clone());
        let navigator = Arc::new(Self {
            root: ServiceScope::root(services),
            config,
            stack: Mutex::new(Vec::new()),
            notifier: Notifier::new(),
        });
        link.bind(&navigator);
        info!(scope = %navigator.root.id(), "Navigator created");
        navigator
    }

    pub fn root_scope(&self) -> &Arc<ServiceScope> {
        &self.root
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.stack.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.lock().is_empty()
    }

    /// Snapshot of the stack, oldest first.
    pub fn entries(&self) -> Vec<Arc<PageContext>> {
        self.stack.lock().clone()
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

    fn raise_changes(&self, could_go_back: bool, current_changed: bool) {
        if current_changed {
            self.notifier.raise(Property::CurrentPage);
        }
        if could_go_back != self.can_go_back() {
            self.notifier.raise(Property::CanGoBack);
        }
    }

    /// Dispose every entry, newest first, then the root scope.
    pub fn shutdown(&self) {
        let entries: Vec<_> = self.stack.lock().drain(..).collect();
        let had_entries = !entries.is_empty();
        for page in entries.iter().rev() {
            page.dispose();
        }
        if had_entries {
            self.notifier.raise(Property::CurrentPage);
        }
        self.root.dispose();
        info!(scope = %self.root.id(), disposed = entries.len(), "Navigator shut down");
    }
}

impl NavigationManager for BackStackNavigator {
    fn navigate(
        &self,
        request: PageRequest,
        initializer: Option<Initializer<'_>>,
    ) -> Result<Arc<PageContext>, ShellError> {
        let page = create_page_context(self.root.as_ref(), &request, ServiceCollection::new())?;
        if let Some(initializer) = initializer {
            initializer(&page.view_model(), &page.view());
        }

        let could_go_back = self.can_go_back();
        let depth = {
            let mut stack = self.stack.lock();
            stack.push(page.clone());
            stack.len()
        };
        self.raise_changes(could_go_back, true);
        page.notify_loaded();
        debug!(page = %page.id(), view_model = %page.view_model().token(), depth, "Navigated");
        Ok(page)
    }

    fn go_back(&self) -> Result<bool, ShellError> {
        if self.root.is_disposed() {
            return Err(ScopeError::Disposed(self.root.id()).into());
        }
        let popped = {
            let mut stack = self.stack.lock();
            if stack.len() <= 1 {
                return Ok(false);
            }
            stack.pop()
        };
        self.raise_changes(true, true);
        if let Some(page) = popped {
            page.dispose();
            debug!(page = %page.id(), remaining = self.len(), "Went back");
        }
        Ok(true)
    }

    fn can_go_back(&self) -> bool {
        self.stack.lock().len() > 1
    }

    fn clear_back_stack(&self) -> usize {
        let removed: Vec<Arc<PageContext>> = {
            let mut stack = self.stack.lock();
            if stack.len() <= 1 {
                return 0;
            }
            let keep_from = stack.len() - 1;
            stack.drain(..keep_from).collect()
        };
        self.raise_changes(true, false);

        match self.config.navigation.clear_order {
            ClearOrder::TopDown => removed.iter().rev().for_each(|page| {
                page.dispose();
            }),
            ClearOrder::BottomUp => removed.iter().for_each(|page| {
                page.dispose();
            }),
        }
        debug!(
            removed = removed.len(),
            order = ?self.config.navigation.clear_order,
            "Back stack cleared"
        );
        removed.len()
    }

    fn current(&self) -> Option<Arc<PageContext>> {
        self.stack.lock().last().cloned()
    }
}

impl ActivePage for BackStackNavigator {
    fn active_page(&self) -> Option<Arc<PageContext>> {
        self.current().filter(|page| !page.is_disposed())
    }
}
