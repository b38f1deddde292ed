//! External page data that owns a page's title.

use crate::notify::{Callback, Notifier, Property, SubscriptionId};
use parking_lot::Mutex;
use serde::Deserialize;

/// Title plus the type names a page should be opened with.
pub trait PageData: Send + Sync {
    fn title(&self) -> String;

    fn set_title(&self, title: String);

    fn view_model_type_name(&self) -> Option<String>;

    fn view_type_name(&self) -> Option<String>;

    /// Observe title changes.
    fn subscribe(&self, callback: Callback) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

#[derive(Debug, Clone, Deserialize)]
struct PageDataFile {
    title: String,
    view_model: Option<String>,
    view: Option<String>,
}

/// In-memory [`PageData`].
pub struct SimplePageData {
    title: Mutex<String>,
    view_model: Option<String>,
    view: Option<String>,
    notifier: Notifier,
}

impl SimplePageData {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Mutex::new(title.into()),
            view_model: None,
            view: None,
            notifier: Notifier::new(),
        }
    }

    pub fn with_view_model(mut self, name: impl Into<String>) -> Self {
        self.view_model = Some(name.into());
        self
    }

    pub fn with_view(mut self, name: impl Into<String>) -> Self {
        self.view = Some(name.into());
        self
    }

    /// Parse `title`, `view_model` and `view` keys from a TOML table.
    pub fn from_toml(source: &str) -> Result<Self, toml::de::Error> {
        let file: PageDataFile = toml::from_str(source)?;
        Ok(Self {
            title: Mutex::new(file.title),
            view_model: file.view_model,
            view: file.view,
            notifier: Notifier::new(),
        })
    }
}

impl PageData for SimplePageData {
    fn title(&self) -> String {
        self.title.lock().clone()
    }

    fn set_title(&self, title: String) {
        {
            let mut current = self.title.lock();
            if *current == title {
                return;
            }
            *current = title;
        }
        self.notifier.raise(Property::Title);
    }

    fn view_model_type_name(&self) -> Option<String> {
        self.view_model.clone()
    }

    fn view_type_name(&self) -> Option<String> {
        self.view.clone()
    }

    fn subscribe(&self, callback: Callback) -> SubscriptionId {
        self.notifier.add(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }
}
