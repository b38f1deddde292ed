//! Shell
//!
//! Root aggregate of a single-page host. The shell owns the root scope and the currently
//! selected page. Opening a page swaps the selection, runs the new page's loaded hook and
//! only then disposes the outgoing page.

use crate::config::ShellConfig;
use crate::error::ShellError;
use crate::navigation::BackStackNavigator;
use crate::notify::{Notifier, Property, PropertyChanged, SubscriptionId};
use crate::page::{
    create_page_context, create_page_context_with_data, PageContext, PageData, PageRequest,
};
use crate::scope::{Link, ResolutionScope, ServiceCollection, ServiceScope};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

mod multi;

pub use multi::MultiProviderShell;

/// Source of the page that currently has focus, used as the fallback dialog owner.
pub trait ActivePage: Send + Sync {
    fn active_page(&self) -> Option<Arc<PageContext>>;
}

/// Assembles a [`Shell`] or [`BackStackNavigator`] from registrations and config.
#[derive(Default)]
pub struct ShellBuilder {
    services: ServiceCollection,
    config: ShellConfig,
}

impl ShellBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_services(mut self, services: ServiceCollection) -> Self {
        self.services.extend(services);
        self
    }

    pub fn configure<F: FnOnce(&mut ServiceCollection)>(mut self, f: F) -> Self {
        f(&mut self.services);
        self
    }

    pub fn with_config(mut self, config: ShellConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Arc<Shell> {
        let mut base = self.services;
        let link = Link::<Shell>::new();
        base.add_shared(link.clone());
        let root = ServiceScope::root(base.clone());
        let shell = Arc::new(Shell {
            title: Mutex::new(self.config.shell.title.clone()),
            icon: Mutex::new(None),
            root,
            base,
            config: self.config,
            selected: Mutex::new(None),
            notifier: Notifier::new(),
        });
        link.bind(&shell);
        info!(scope = %shell.root.id(), title = %shell.title(), "Shell created");
        shell
    }

    pub fn build_navigator(self) -> Arc<BackStackNavigator> {
        BackStackNavigator::build(self.services, self.config)
    }
}

/// Single-page host.
pub struct Shell {
    root: Arc<ServiceScope>,
    base: ServiceCollection,
    config: ShellConfig,
    title: Mutex<String>,
    icon: Mutex<Option<String>>,
    selected: Mutex<Option<Arc<PageContext>>>,
    notifier: Notifier,
}

impl Shell {
    pub fn builder() -> ShellBuilder {
        ShellBuilder::new()
    }

    pub fn root_scope(&self) -> &Arc<ServiceScope> {
        &self.root
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Registrations every root scope of this shell starts from.
    pub(crate) fn base_services(&self) -> &ServiceCollection {
        &self.base
    }

    pub fn open_page(&self, request: PageRequest) -> Result<Arc<PageContext>, ShellError> {
        self.open_in(self.root.as_ref(), &request)
    }

    /// Open by type names; empty names count as omitted.
    pub fn open_page_named(
        &self,
        view_model: Option<&str>,
        view: Option<&str>,
        title: Option<&str>,
    ) -> Result<Arc<PageContext>, ShellError> {
        fn non_empty(name: Option<&str>) -> Option<&str> {
            name.map(str::trim).filter(|n| !n.is_empty())
        }
        let mut request = PageRequest::named(non_empty(view_model), non_empty(view));
        request.title = title.map(str::to_string);
        self.open_page(request)
    }

    pub fn open_page_data(&self, data: Arc<dyn PageData>) -> Result<Arc<PageContext>, ShellError> {
        self.open_data_in(self.root.as_ref(), data)
    }

    pub(crate) fn open_in(
        &self,
        scope: &dyn ResolutionScope,
        request: &PageRequest,
    ) -> Result<Arc<PageContext>, ShellError> {
        let page = create_page_context(scope, request, ServiceCollection::new())?;
        self.select(page.clone());
        Ok(page)
    }

    pub(crate) fn open_data_in(
        &self,
        scope: &dyn ResolutionScope,
        data: Arc<dyn PageData>,
    ) -> Result<Arc<PageContext>, ShellError> {
        let page = create_page_context_with_data(scope, data, ServiceCollection::new())?;
        self.select(page.clone());
        Ok(page)
    }

    /// swap, then notify-loaded, then dispose the outgoing page
    fn select(&self, page: Arc<PageContext>) {
        let previous = self.selected.lock().replace(page.clone());
        self.notifier.raise(Property::SelectedPage);
        page.notify_loaded();
        if let Some(previous) = previous {
            previous.dispose();
        }
        debug!(page = %page.id(), view_model = %page.view_model().token(), "Page selected");
    }

    pub fn selected_page(&self) -> Option<Arc<PageContext>> {
        self.selected.lock().clone()
    }

    pub fn title(&self) -> String {
        self.title.lock().clone()
    }

    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        {
            let mut current = self.title.lock();
            if *current == title {
                return;
            }
            *current = title;
        }
        self.notifier.raise(Property::Title);
    }

    /// Icon resource name, if the host was given one.
    pub fn icon(&self) -> Option<String> {
        self.icon.lock().clone()
    }

    pub fn set_icon(&self, icon: Option<String>) {
        {
            let mut current = self.icon.lock();
            if *current == icon {
                return;
            }
            *current = icon;
        }
        self.notifier.raise(Property::Icon);
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

    /// Dispose the selected page, then the root scope.
    pub fn shutdown(&self) {
        let selected = self.selected.lock().take();
        if let Some(page) = selected {
            page.dispose();
            self.notifier.raise(Property::SelectedPage);
        }
        self.root.dispose();
        info!(scope = %self.root.id(), "Shell shut down");
    }
}

impl ActivePage for Shell {
    fn active_page(&self) -> Option<Arc<PageContext>> {
        self.selected_page().filter(|page| !page.is_disposed())
    }
}
