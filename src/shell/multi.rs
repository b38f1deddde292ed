//! Shell with several independent root scopes selected by key.

use super::Shell;
use crate::error::ShellError;
use crate::page::{PageContext, PageData, PageRequest};
use crate::scope::{ResolutionScope, ServiceCollection, ServiceScope};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;
use tracing::info;

/// Keyed root scopes sharing one page selection.
///
/// Each provider root starts from the shell's base registrations, adds its own, and
/// registers the key itself as a singleton.
pub struct MultiProviderShell<K> {
    shell: Arc<Shell>,
    providers: Mutex<HashMap<K, Arc<ServiceScope>>>,
}

impl<K> MultiProviderShell<K>
where
    K: Clone + Eq + Hash + Display + Send + Sync + 'static,
{
    pub fn new(shell: Arc<Shell>) -> Self {
        Self {
            shell,
            providers: Mutex::new(HashMap::new()),
        }
    }

    pub fn shell(&self) -> &Arc<Shell> {
        &self.shell
    }

    pub fn create_provider(
        &self,
        key: K,
        services: ServiceCollection,
    ) -> Result<Arc<ServiceScope>, ShellError> {
        let mut providers = self.providers.lock();
        if providers.contains_key(&key) {
            return Err(ShellError::DuplicateProvider(key.to_string()));
        }
        let mut registrations = self.shell.base_services().clone();
        registrations.extend(services);
        registrations.add_instance(key.clone());
        let root = ServiceScope::root(registrations);
        info!(key = %key, scope = %root.id(), "Service provider created");
        providers.insert(key, root.clone());
        Ok(root)
    }

    /// Remove and dispose the provider for `key`, including any page opened from it.
    pub fn remove_provider(&self, key: &K) -> bool {
        let removed = self.providers.lock().remove(key);
        match removed {
            Some(root) => {
                root.dispose();
                info!(key = %key, "Service provider removed");
                true
            }
            None => false,
        }
    }

    pub fn provider(&self, key: &K) -> Option<Arc<ServiceScope>> {
        self.providers.lock().get(key).cloned()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.providers.lock().contains_key(key)
    }

    pub fn keys(&self) -> Vec<K> {
        self.providers.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.providers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.lock().is_empty()
    }

    fn require(&self, key: &K) -> Result<Arc<ServiceScope>, ShellError> {
        self.provider(key)
            .ok_or_else(|| ShellError::UnknownProvider(key.to_string()))
    }

    pub fn open_page_in(
        &self,
        key: &K,
        request: PageRequest,
    ) -> Result<Arc<PageContext>, ShellError> {
        let root = self.require(key)?;
        self.shell.open_in(root.as_ref(), &request)
    }

    pub fn open_page_data_in(
        &self,
        key: &K,
        data: Arc<dyn PageData>,
    ) -> Result<Arc<PageContext>, ShellError> {
        let root = self.require(key)?;
        self.shell.open_data_in(root.as_ref(), data)
    }
}
