//! Scripted sessions
//!
//! A session script is a TOML list of `[[step]]` tables, run in order against a shell,
//! a back-stack navigator and a dialog coordinator built over the demo catalog:
//!
//! ```toml
//! [[step]]
//! action = "navigate"
//! view_model = "SettingsViewModel"
//! title = "Settings"
//!
//! [[step]]
//! action = "dialog"
//! view_model = "ConfirmViewModel"
//! close = "cancel"
//! vetoes = 1
//! ```
//!
//! A failing step is recorded in the transcript and the run continues.

use super::demo::{self, ConfirmViewModel, DetailsViewModel, Journal};
use super::message::ScriptedMessageBox;
use crate::config::ShellConfig;
use crate::dialog::{
    CloseOutcome, CloseTrigger, DialogCoordinator, DialogHandle, DialogOutcome, DialogPresenter,
};
use crate::error::ShellError;
use crate::message::{self, Message, MessageBoxButton, MessageBoxResult, MessageImage};
use crate::navigation::{BackStackNavigator, NavigationManager};
use crate::page::{Initializer, PageContext, PageRequest, ViewHandle, ViewModelHandle};
use crate::scope::ResolutionScope;
use crate::shell::{Shell, ShellBuilder};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Upper bound on close attempts per dialog step.
const MAX_CLOSE_ATTEMPTS: usize = 32;

/// Parsed session script
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Script {
    #[serde(rename = "step", default)]
    pub steps: Vec<Step>,
}

impl Script {
    pub fn parse(source: &str) -> Result<Self, ShellError> {
        toml::from_str(source).map_err(|e| ShellError::Script(e.to_string()))
    }
}

/// Where a dialog step opens its dialog from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogSource {
    /// The navigator's current page, else the shell's selected page
    #[default]
    Page,
    /// The navigator's root scope; the owner falls back to the active page
    Root,
}

fn default_trigger() -> CloseTrigger {
    CloseTrigger::Confirm
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Open a page in the single-page shell.
    Open {
        view_model: Option<String>,
        view: Option<String>,
        title: Option<String>,
    },
    /// Push a page on the back stack.
    Navigate {
        view_model: Option<String>,
        view: Option<String>,
        title: Option<String>,
        /// Seeds `DetailsViewModel::item`
        item: Option<String>,
    },
    Back,
    Clear,
    /// Show a dialog and close it with `close`.
    Dialog {
        view_model: Option<String>,
        view: Option<String>,
        title: Option<String>,
        #[serde(default = "default_trigger")]
        close: CloseTrigger,
        /// Close requests `ConfirmViewModel` vetoes before allowing one
        #[serde(default)]
        vetoes: usize,
        #[serde(default)]
        from: DialogSource,
        /// Drop the dialog without ever requesting a close.
        #[serde(default)]
        abandon: bool,
    },
    /// Reload the current page's view.
    Reload,
    /// Show a message box from the current page, answered with `answer`.
    Message {
        text: String,
        #[serde(default)]
        caption: String,
        #[serde(default)]
        button: MessageBoxButton,
        #[serde(default)]
        icon: MessageImage,
        #[serde(default)]
        default_result: MessageBoxResult,
        answer: Option<MessageBoxResult>,
    },
    /// Move focus to a named field of the current page.
    Focus { name: String },
}

impl Step {
    pub fn action(&self) -> &'static str {
        match self {
            Step::Open { .. } => "open",
            Step::Navigate { .. } => "navigate",
            Step::Back => "back",
            Step::Clear => "clear",
            Step::Dialog { .. } => "dialog",
            Step::Reload => "reload",
            Step::Message { .. } => "message",
            Step::Focus { .. } => "focus",
        }
    }
}

/// One executed step
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub index: usize,
    pub action: String,
    pub ok: bool,
    pub page: Option<String>,
    pub title: Option<String>,
    pub detail: String,
    pub back_stack: usize,
    /// Lifecycle events recorded while the step ran
    pub events: Vec<String>,
}

/// Result of a session run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    pub shell_title: String,
    pub steps: Vec<StepRecord>,
    /// Events raised by the final shutdown
    pub shutdown: Vec<String>,
}

impl Transcript {
    pub fn failures(&self) -> usize {
        self.steps.iter().filter(|step| !step.ok).count()
    }
}

/// Hands every dialog to the runner through a channel.
struct ChannelPresenter {
    sender: mpsc::UnboundedSender<DialogHandle>,
}

#[async_trait]
impl DialogPresenter for ChannelPresenter {
    async fn present(&self, dialog: DialogHandle) -> Result<(), ShellError> {
        self.sender
            .send(dialog)
            .map_err(|_| ShellError::Presentation("dialog receiver closed".to_string()))
    }
}

struct StepResult {
    page: Option<Arc<PageContext>>,
    detail: String,
}

/// Executes scripts against one shell, navigator and coordinator.
pub struct ScriptRunner {
    shell: Arc<Shell>,
    navigator: Arc<BackStackNavigator>,
    coordinator: DialogCoordinator,
    dialogs: mpsc::UnboundedReceiver<DialogHandle>,
    journal: Arc<Journal>,
}

impl ScriptRunner {
    pub fn new(config: ShellConfig) -> Self {
        let (services, journal) = demo::catalog();
        let shell = ShellBuilder::new()
            .with_services(services.clone())
            .with_config(config.clone())
            .build();
        let navigator = ShellBuilder::new()
            .with_services(services)
            .with_config(config.clone())
            .build_navigator();
        let (sender, dialogs) = mpsc::unbounded_channel();
        let coordinator =
            DialogCoordinator::new(Arc::new(ChannelPresenter { sender }), config.dialog.clone())
                .with_active_page(&navigator);
        Self {
            shell,
            navigator,
            coordinator,
            dialogs,
            journal,
        }
    }

    pub fn shell(&self) -> &Arc<Shell> {
        &self.shell
    }

    pub fn navigator(&self) -> &Arc<BackStackNavigator> {
        &self.navigator
    }

    pub fn journal(&self) -> &Arc<Journal> {
        &self.journal
    }

    /// Run every step, then shut the shell and navigator down.
    pub async fn run(mut self, script: &Script) -> Transcript {
        let mut transcript = Transcript {
            shell_title: self.shell.title(),
            ..Default::default()
        };
        for (index, step) in script.steps.iter().enumerate() {
            let record = self.run_step(index, step).await;
            transcript.steps.push(record);
        }

        self.shell.shutdown();
        self.navigator.shutdown();
        transcript.shutdown = self.journal.drain();
        info!(
            steps = transcript.steps.len(),
            failures = transcript.failures(),
            "Script finished"
        );
        transcript
    }

    async fn run_step(&mut self, index: usize, step: &Step) -> StepRecord {
        debug!(index, action = step.action(), "Running step");
        let result = self.execute(step).await;
        let back_stack = self.navigator.len();
        let events = self.journal.drain();
        match result {
            Ok(StepResult { page, detail }) => StepRecord {
                index,
                action: step.action().to_string(),
                ok: true,
                title: page.as_ref().map(|p| p.title()),
                page: page.map(|p| p.id().to_string()),
                detail,
                back_stack,
                events,
            },
            Err(e) => {
                warn!(index, action = step.action(), error = %e, "Step failed");
                StepRecord {
                    index,
                    action: step.action().to_string(),
                    ok: false,
                    page: None,
                    title: None,
                    detail: e.to_string(),
                    back_stack,
                    events,
                }
            }
        }
    }

    async fn execute(&mut self, step: &Step) -> Result<StepResult, ShellError> {
        match step {
            Step::Open {
                view_model,
                view,
                title,
            } => {
                let page = self.shell.open_page_named(
                    view_model.as_deref(),
                    view.as_deref(),
                    title.as_deref(),
                )?;
                Ok(StepResult {
                    detail: format!("selected {}", page.view_model().token()),
                    page: Some(page),
                })
            }
            Step::Navigate {
                view_model,
                view,
                title,
                item,
            } => {
                let request = named_request(view_model, view, title);
                let item = item.clone();
                let initializer: Option<Initializer<'_>> = item.map(|item| {
                    Box::new(move |vm: &ViewModelHandle, _: &ViewHandle| {
                        if let Some(details) = vm.downcast::<DetailsViewModel>() {
                            *details.item.lock() = item;
                        }
                    }) as Initializer<'_>
                });
                let page = self.navigator.navigate(request, initializer)?;
                Ok(StepResult {
                    detail: format!("pushed {}", page.view_model().token()),
                    page: Some(page),
                })
            }
            Step::Back => {
                let went_back = self.navigator.go_back()?;
                Ok(StepResult {
                    page: self.navigator.current(),
                    detail: if went_back {
                        "went back".to_string()
                    } else {
                        "nothing to go back to".to_string()
                    },
                })
            }
            Step::Clear => {
                let removed = self.navigator.clear_back_stack();
                Ok(StepResult {
                    page: self.navigator.current(),
                    detail: format!("removed {removed}"),
                })
            }
            Step::Dialog {
                view_model,
                view,
                title,
                close,
                vetoes,
                from,
                abandon,
            } => {
                let request = named_request(view_model, view, title);
                let outcome = self
                    .show_dialog(request, *close, *vetoes, *from, *abandon)
                    .await?;
                Ok(StepResult {
                    detail: format!("result {}", describe_result(outcome.result)),
                    page: Some(outcome.page),
                })
            }
            Step::Reload => {
                let page = self
                    .current_page()
                    .ok_or_else(|| ShellError::Script("no page to reload".to_string()))?;
                let detail = match page.reload_view()? {
                    Some(view) => format!("reloaded {}", view.token()),
                    None => format!("{} is not reloadable", page.view().token()),
                };
                Ok(StepResult {
                    page: Some(page),
                    detail,
                })
            }
            Step::Message {
                text,
                caption,
                button,
                icon,
                default_result,
                answer,
            } => {
                let page = self.current_page();
                let scope = self.caller_scope(page.as_ref());
                if let Some(answer) = answer {
                    scope.get::<ScriptedMessageBox>()?.queue([*answer]);
                }
                let request = Message::new(text.clone())
                    .caption(caption.clone())
                    .button(*button)
                    .icon(*icon)
                    .default_result(*default_result);
                let answered = message::show_message(scope.as_ref(), request).await?;
                Ok(StepResult {
                    page,
                    detail: format!("answered {answered}"),
                })
            }
            Step::Focus { name } => {
                let page = self.current_page();
                let scope = self.caller_scope(page.as_ref());
                let detail = if message::focus(scope.as_ref(), name)? {
                    format!("focused {name}")
                } else {
                    format!("nothing named {name}")
                };
                Ok(StepResult { page, detail })
            }
        }
    }

    fn caller_scope(&self, page: Option<&Arc<PageContext>>) -> Arc<dyn ResolutionScope> {
        match page {
            Some(page) => page.scope().clone(),
            None => self.navigator.root_scope().clone(),
        }
    }

    fn current_page(&self) -> Option<Arc<PageContext>> {
        self.navigator
            .current()
            .or_else(|| self.shell.selected_page())
    }

    async fn show_dialog(
        &mut self,
        request: PageRequest,
        trigger: CloseTrigger,
        vetoes: usize,
        from: DialogSource,
        abandon: bool,
    ) -> Result<DialogOutcome, ShellError> {
        let caller: Arc<dyn ResolutionScope> = match (from, self.current_page()) {
            (DialogSource::Page, Some(page)) => page.scope().clone(),
            _ => self.navigator.root_scope().clone(),
        };
        let initializer: Initializer<'_> = Box::new(move |vm: &ViewModelHandle, _: &ViewHandle| {
            if let Some(confirm) = vm.downcast::<ConfirmViewModel>() {
                confirm.veto_next(vetoes);
            }
        });

        let Self {
            coordinator,
            dialogs,
            journal,
            ..
        } = self;
        let shown = coordinator.show_dialog(caller.as_ref(), request, Some(initializer));
        let driven = drive_dialog(dialogs, journal, trigger, abandon);
        let (outcome, _) = tokio::join!(shown, driven);
        outcome
    }
}

/// Plays the host side of one dialog.
async fn drive_dialog(
    dialogs: &mut mpsc::UnboundedReceiver<DialogHandle>,
    journal: &Journal,
    trigger: CloseTrigger,
    abandon: bool,
) {
    let Some(handle) = dialogs.recv().await else {
        return;
    };
    handle.notify_loaded();
    journal.record(format!("dialog {} shown {:?}", handle.id(), handle.placement()));
    if abandon {
        journal.record(format!("dialog {} abandoned", handle.id()));
        return;
    }
    for _ in 0..MAX_CLOSE_ATTEMPTS {
        match handle.request_close(trigger).await {
            CloseOutcome::Vetoed => continue,
            outcome => {
                debug!(dialog = %handle.id(), ?outcome, "Dialog close finished");
                return;
            }
        }
    }
    warn!(dialog = %handle.id(), "Dialog kept vetoing; abandoning it");
}

fn named_request(
    view_model: &Option<String>,
    view: &Option<String>,
    title: &Option<String>,
) -> PageRequest {
    let mut request = PageRequest::named(view_model.as_deref(), view.as_deref());
    request.title = title.clone();
    request
}

fn describe_result(result: Option<bool>) -> &'static str {
    match result {
        Some(true) => "true",
        Some(false) => "false",
        None => "none",
    }
}

/// Parse `source` and run it on a fresh runner.
pub async fn run_script(source: &str, config: ShellConfig) -> Result<Transcript, ShellError> {
    let script = Script::parse(source)?;
    info!(steps = script.steps.len(), "Running session script");
    Ok(ScriptRunner::new(config).run(&script).await)
}
