//! Demo page catalog used by the headless host.

use super::message::{JournalFocus, ScriptedMessageBox};
use crate::capability::{NotifyLoaded, QueryClosing, View, ViewKind, ViewModel};
use crate::message::{FocusHandlerRef, Message, MessageBoxRef, MessageImage};
use crate::scope::{Instance, Lifetime, ResolutionScope, ServiceCollection, ServiceDescriptor, TypeToken};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Lifecycle events recorded by the demo view-models.
#[derive(Default)]
pub struct Journal {
    entries: Mutex<Vec<String>>,
}

impl Journal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// Take every entry recorded so far.
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

pub struct HomeViewModel {
    journal: Arc<Journal>,
}

impl ViewModel for HomeViewModel {
    fn default_view(&self) -> Option<TypeToken> {
        Some(TypeToken::of::<HomeView>())
    }

    fn as_notify_loaded(&self) -> Option<&dyn NotifyLoaded> {
        Some(self)
    }
}

impl NotifyLoaded for HomeViewModel {
    fn on_loaded(&self) {
        self.journal.record("HomeViewModel loaded");
    }
}

pub struct HomeView;

impl View for HomeView {
    fn default_view_model(&self) -> Option<TypeToken> {
        Some(TypeToken::of::<HomeViewModel>())
    }
}

pub struct SettingsViewModel {
    journal: Arc<Journal>,
}

impl ViewModel for SettingsViewModel {
    fn default_view(&self) -> Option<TypeToken> {
        Some(TypeToken::of::<SettingsView>())
    }

    fn as_notify_loaded(&self) -> Option<&dyn NotifyLoaded> {
        Some(self)
    }
}

impl NotifyLoaded for SettingsViewModel {
    fn on_loaded(&self) {
        self.journal.record("SettingsViewModel loaded");
    }
}

pub struct SettingsView;

impl View for SettingsView {}

/// Detail page; `item` is seeded by the navigator's initializer.
pub struct DetailsViewModel {
    pub item: Mutex<String>,
}

impl ViewModel for DetailsViewModel {
    fn default_view(&self) -> Option<TypeToken> {
        Some(TypeToken::of::<DetailsView>())
    }
}

pub struct DetailsView;

impl View for DetailsView {
    fn default_view_model(&self) -> Option<TypeToken> {
        Some(TypeToken::of::<DetailsViewModel>())
    }
}

/// Confirmation dialog that vetoes the next `vetoes` close requests.
///
/// Every veto focuses the missing field and explains itself in a message box.
pub struct ConfirmViewModel {
    journal: Arc<Journal>,
    message_box: Arc<MessageBoxRef>,
    focus: Arc<FocusHandlerRef>,
    vetoes: AtomicUsize,
    pub queries: Mutex<Vec<bool>>,
}

impl ConfirmViewModel {
    pub fn veto_next(&self, count: usize) {
        self.vetoes.store(count, Ordering::SeqCst);
    }
}

impl ViewModel for ConfirmViewModel {
    fn default_view(&self) -> Option<TypeToken> {
        Some(TypeToken::of::<ConfirmWindow>())
    }

    fn as_query_closing(&self) -> Option<&dyn QueryClosing> {
        Some(self)
    }
}

#[async_trait]
impl QueryClosing for ConfirmViewModel {
    async fn query_closing(&self, tentative: bool) -> bool {
        self.queries.lock().push(tentative);
        let remaining = self.vetoes.load(Ordering::SeqCst);
        if remaining > 0 {
            self.vetoes.store(remaining - 1, Ordering::SeqCst);
            self.journal.record(format!("ConfirmViewModel vetoed close ({tentative})"));
            self.focus.focus("Reason");
            self.message_box
                .show(
                    Message::new("Reason missing.")
                        .caption("Input error")
                        .icon(MessageImage::Warning),
                )
                .await;
            return false;
        }
        true
    }
}

/// Top-level window view; never reloaded.
pub struct ConfirmWindow;

impl View for ConfirmWindow {
    fn default_view_model(&self) -> Option<TypeToken> {
        Some(TypeToken::of::<ConfirmViewModel>())
    }

    fn kind() -> ViewKind {
        ViewKind::Window
    }
}

fn released(journal: &Arc<Journal>, name: &'static str) -> impl Fn(&Instance) + Send + Sync + 'static {
    let journal = journal.clone();
    move |_: &Instance| journal.record(format!("{name} released"))
}

/// Register the demo catalog, `journal` and the scripted message box into `services`.
pub fn register(services: &mut ServiceCollection, journal: &Arc<Journal>) {
    services.add_shared(journal.clone());
    let message_box = Arc::new(ScriptedMessageBox::new(journal.clone()));
    services
        .add_shared(message_box.clone())
        .add_instance(MessageBoxRef::from_arc(message_box))
        .add_instance(FocusHandlerRef::new(JournalFocus::new(journal.clone())));

    let j = journal.clone();
    services.add(
        ServiceDescriptor::view_model(Lifetime::Scoped, move |_: &dyn ResolutionScope| {
            Ok(HomeViewModel { journal: j.clone() })
        })
        .on_release(released(journal, "HomeViewModel")),
    );
    let j = journal.clone();
    services.add(
        ServiceDescriptor::view_model(Lifetime::Scoped, move |_: &dyn ResolutionScope| {
            Ok(SettingsViewModel { journal: j.clone() })
        })
        .on_release(released(journal, "SettingsViewModel")),
    );
    services.add(
        ServiceDescriptor::view_model(Lifetime::Scoped, |_: &dyn ResolutionScope| {
            Ok(DetailsViewModel {
                item: Mutex::new(String::new()),
            })
        })
        .on_release(released(journal, "DetailsViewModel")),
    );
    services.add(
        ServiceDescriptor::view_model(Lifetime::Scoped, |scope: &dyn ResolutionScope| {
            Ok(ConfirmViewModel {
                journal: scope.get::<Journal>()?,
                message_box: scope.get::<MessageBoxRef>()?,
                focus: scope.get::<FocusHandlerRef>()?,
                vetoes: AtomicUsize::new(0),
                queries: Mutex::new(Vec::new()),
            })
        })
        .on_release(released(journal, "ConfirmViewModel")),
    );

    services
        .add_view(|_| Ok(HomeView))
        .add_view(|_| Ok(SettingsView))
        .add_view(|_| Ok(DetailsView))
        .add_view(|_| Ok(ConfirmWindow));
}

/// A fresh catalog with its own journal.
pub fn catalog() -> (ServiceCollection, Arc<Journal>) {
    let journal = Journal::new();
    let mut services = ServiceCollection::new();
    register(&mut services, &journal);
    (services, journal)
}
