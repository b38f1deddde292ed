//! Headless session scripts end to end

use pageshell::config::ShellConfig;
use pageshell::host::{format_transcript_text, run_script};

const SESSION: &str = r#"
[[step]]
action = "open"
view_model = "HomeViewModel"
title = "Home"

[[step]]
action = "navigate"
view_model = "SettingsViewModel"
title = "Settings"

[[step]]
action = "navigate"
view = "DetailsView"
item = "display"

[[step]]
action = "dialog"
view_model = "ConfirmViewModel"
close = "cancel"
vetoes = 2

[[step]]
action = "reload"

[[step]]
action = "back"

[[step]]
action = "back"

[[step]]
action = "dialog"
view_model = "ConfirmViewModel"
abandon = true
"#;

#[tokio::test]
async fn test_full_session() {
    let transcript = run_script(SESSION, ShellConfig::default()).await.unwrap();
    assert_eq!(transcript.failures(), 0);
    let steps = &transcript.steps;

    assert_eq!(steps[0].events, vec!["HomeViewModel loaded"]);
    assert_eq!(steps[1].back_stack, 1);
    assert_eq!(steps[2].back_stack, 2);

    assert_eq!(steps[3].detail, "result false");
    assert_eq!(
        steps[3]
            .events
            .iter()
            .filter(|e| e.starts_with("ConfirmViewModel vetoed"))
            .count(),
        2
    );
    assert_eq!(steps[3].events.last().unwrap(), "ConfirmViewModel released");

    assert!(steps[4].detail.starts_with("reloaded"));

    assert_eq!(steps[5].detail, "went back");
    assert_eq!(steps[5].events, vec!["DetailsViewModel released"]);
    assert_eq!(steps[5].title.as_deref(), Some("Settings"));
    assert_eq!(steps[6].detail, "nothing to go back to");

    assert_eq!(steps[7].detail, "result none");
    assert!(steps[7].events.iter().any(|e| e.ends_with("abandoned")));

    assert!(transcript
        .shutdown
        .contains(&"HomeViewModel released".to_string()));
    assert!(transcript
        .shutdown
        .contains(&"SettingsViewModel released".to_string()));
}

#[tokio::test]
async fn test_text_transcript_mentions_every_step() {
    let transcript = run_script(SESSION, ShellConfig::default()).await.unwrap();
    let text = format_transcript_text(&transcript, false);
    for action in ["open", "navigate", "dialog", "reload", "back"] {
        assert!(text.contains(action));
    }
    assert!(text.ends_with("8 steps, 0 failed"));
}
