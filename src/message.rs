//! Message Boxes
//!
//! Short modal prompts a view-model raises without opening a page: a text, a caption, a
//! set of buttons and an image. Hosts register a [`MessageBox`] (and optionally a
//! [`FocusHandler`]) behind [`MessageBoxRef`] / [`FocusHandlerRef`] so any scope can reach
//! them.

use crate::error::ShellError;
use crate::scope::ResolutionScope;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Buttons offered by a message box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageBoxButton {
    #[default]
    Ok,
    OkCancel,
    YesNoCancel,
    YesNo,
}

impl MessageBoxButton {
    /// Answers a user can give with these buttons.
    pub fn choices(self) -> &'static [MessageBoxResult] {
        use MessageBoxResult::*;
        match self {
            MessageBoxButton::Ok => &[Ok],
            MessageBoxButton::OkCancel => &[Ok, Cancel],
            MessageBoxButton::YesNoCancel => &[Yes, No, Cancel],
            MessageBoxButton::YesNo => &[Yes, No],
        }
    }

    pub fn accepts(self, result: MessageBoxResult) -> bool {
        self.choices().contains(&result)
    }

    /// Answer produced when the box is dismissed without pressing a button.
    pub fn dismissed(self) -> MessageBoxResult {
        match self {
            MessageBoxButton::Ok => MessageBoxResult::Ok,
            MessageBoxButton::OkCancel | MessageBoxButton::YesNoCancel => MessageBoxResult::Cancel,
            MessageBoxButton::YesNo => MessageBoxResult::None,
        }
    }
}

/// Image shown next to the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageImage {
    #[default]
    None,
    #[serde(alias = "hand", alias = "stop")]
    Error,
    Question,
    #[serde(alias = "exclamation")]
    Warning,
    #[serde(alias = "asterisk")]
    Information,
}

/// Button the user pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageBoxResult {
    /// No answer
    #[default]
    None,
    Ok,
    Cancel,
    Yes,
    No,
}

impl fmt::Display for MessageBoxResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MessageBoxResult::None => "none",
            MessageBoxResult::Ok => "ok",
            MessageBoxResult::Cancel => "cancel",
            MessageBoxResult::Yes => "yes",
            MessageBoxResult::No => "no",
        };
        f.write_str(label)
    }
}

/// One message box request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub button: MessageBoxButton,
    #[serde(default)]
    pub icon: MessageImage,
    /// Preselected answer
    #[serde(default)]
    pub default_result: MessageBoxResult,
}

impl Message {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            caption: String::new(),
            button: MessageBoxButton::Ok,
            icon: MessageImage::None,
            default_result: MessageBoxResult::None,
        }
    }

    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }

    pub fn button(mut self, button: MessageBoxButton) -> Self {
        self.button = button;
        self
    }

    pub fn icon(mut self, icon: MessageImage) -> Self {
        self.icon = icon;
        self
    }

    pub fn default_result(mut self, result: MessageBoxResult) -> Self {
        self.default_result = result;
        self
    }

    /// Answer for a dismissed box: the preselected answer when the buttons allow it.
    pub fn fallback(&self) -> MessageBoxResult {
        if self.button.accepts(self.default_result) {
            self.default_result
        } else {
            self.button.dismissed()
        }
    }
}

#[async_trait]
pub trait MessageBox: Send + Sync {
    /// Show `message` and wait for the answer.
    async fn show(&self, message: Message) -> MessageBoxResult;
}

/// Moves input focus to a named control or bound property.
pub trait FocusHandler: Send + Sync {
    /// Returns whether focus was set.
    fn focus(&self, name: &str) -> bool;
}

/// Scope-resolvable handle to the host's message box.
#[derive(Clone)]
pub struct MessageBoxRef(pub Arc<dyn MessageBox>);

impl MessageBoxRef {
    pub fn new<M: MessageBox + 'static>(message_box: M) -> Self {
        Self(Arc::new(message_box))
    }

    pub fn from_arc(message_box: Arc<dyn MessageBox>) -> Self {
        Self(message_box)
    }

    pub async fn show(&self, message: Message) -> MessageBoxResult {
        self.0.show(message).await
    }
}

/// Scope-resolvable handle to the host's focus handler.
#[derive(Clone)]
pub struct FocusHandlerRef(pub Arc<dyn FocusHandler>);

impl FocusHandlerRef {
    pub fn new<F: FocusHandler + 'static>(handler: F) -> Self {
        Self(Arc::new(handler))
    }

    pub fn from_arc(handler: Arc<dyn FocusHandler>) -> Self {
        Self(handler)
    }

    pub fn focus(&self, name: &str) -> bool {
        self.0.focus(name)
    }
}

/// Show `message` through the message box registered in `scope`.
///
/// An answer the buttons cannot produce is replaced by [`Message::fallback`].
pub async fn show_message(
    scope: &dyn ResolutionScope,
    message: Message,
) -> Result<MessageBoxResult, ShellError> {
    let message_box = scope.get::<MessageBoxRef>()?;
    let button = message.button;
    let fallback = message.fallback();
    let answer = message_box.show(message).await;
    let answer = if button.accepts(answer) { answer } else { fallback };
    debug!(scope = %scope.id(), ?button, %answer, "Message box answered");
    Ok(answer)
}

/// Focus `name` through the handler registered in `scope`; `false` when none is registered.
pub fn focus(scope: &dyn ResolutionScope, name: &str) -> Result<bool, ShellError> {
    Ok(scope
        .try_get::<FocusHandlerRef>()?
        .map(|handler| handler.focus(name))
        .unwrap_or(false))
}
