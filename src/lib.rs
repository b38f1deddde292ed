//! Pageshell: Page and Dialog Lifecycle for Application Shells
//!
//! Opens view-model/view pairs inside disposable resolution scopes, hosts them in a
//! single-page shell or a back-stack navigator, runs modal dialogs whose closing is
//! negotiated with the view-model, and shows message boxes through scope-registered hosts.

pub mod capability;
pub mod cli;
pub mod config;
pub mod dialog;
pub mod error;
pub mod host;
pub mod logging;
pub mod message;
pub mod navigation;
pub mod notify;
pub mod page;
pub mod policy;
pub mod scope;
pub mod shell;

pub use capability::{NotifyLoaded, QueryClosing, View, ViewKind, ViewModel};
pub use config::{ConfigLoader, ShellConfig};
pub use dialog::{
    CloseOutcome, CloseTrigger, DialogCoordinator, DialogHandle, DialogOutcome, DialogPlacement,
    DialogPresenter,
};
pub use error::{ScopeError, ShellError};
pub use message::{Message, MessageBox, MessageBoxButton, MessageBoxResult, MessageImage};
pub use navigation::{BackStackNavigator, NavigationManager};
pub use page::{PageContext, PageId, PageRequest};
pub use scope::{ResolutionScope, ServiceCollection, ServiceScope, TypeToken};
pub use shell::{Shell, ShellBuilder};
