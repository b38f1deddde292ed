//! Headless Host
//!
//! Drives a shell, a navigator and a dialog coordinator without any UI: a demo page catalog,
//! scripted message boxes, a TOML session script runner and transcript formatting.

pub mod demo;
pub mod message;
pub mod output;
pub mod script;

pub use demo::Journal;
pub use message::{JournalFocus, ScriptedMessageBox};
pub use output::{format_transcript_json, format_transcript_text};
pub use script::{run_script, Script, ScriptRunner, Step, StepRecord, Transcript};
