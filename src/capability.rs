//! View and View-Model Capabilities
//!
//! Traits implemented by application view-models and views. Optional capabilities
//! (loaded notification, closing query) are exposed through accessor methods so the shell
//! can probe for them on a type-erased handle.

use crate::scope::TypeToken;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::any::Any;

/// Classification of a view type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    /// Content hosted inside a window or page host
    #[default]
    Element,
    /// A top-level window
    Window,
}

/// A view-model resolved into a page context.
pub trait ViewModel: Any + Send + Sync {
    /// Default view type paired with this view-model.
    fn default_view(&self) -> Option<TypeToken> {
        None
    }

    fn as_notify_loaded(&self) -> Option<&dyn NotifyLoaded> {
        None
    }

    fn as_query_closing(&self) -> Option<&dyn QueryClosing> {
        None
    }
}

/// A view resolved into a page context. The shell never renders it.
pub trait View: Any + Send + Sync {
    /// Default view-model type paired with this view.
    fn default_view_model(&self) -> Option<TypeToken> {
        None
    }

    fn kind() -> ViewKind
    where
        Self: Sized,
    {
        ViewKind::Element
    }
}

/// Hook run once a view-model has become the active page.
pub trait NotifyLoaded: Send + Sync {
    fn on_loaded(&self);
}

/// Veto hook consulted before a dialog is torn down.
#[async_trait]
pub trait QueryClosing: Send + Sync {
    /// Return `false` to keep the dialog open. `tentative` is the result the close would
    /// produce.
    async fn query_closing(&self, tentative: bool) -> bool;
}
