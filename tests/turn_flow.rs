mod common;

use std::sync::Arc;
use std::time::Duration;

use common::ScriptedBackend;
use lantern::adventure::host::HOST_WARNING;
use lantern::adventure::session::{lock, SessionError};
use lantern::adventure::{
    DisplaySession, HostError, HostSession, RevealOutcome, Speaker, StoryBackend, TranscriptStyle,
    TurnController, TurnError, TurnReport, View,
};

fn controller(backend: Arc<ScriptedBackend>, host: Option<HostSession>) -> TurnController {
    TurnController::new(
        backend,
        host,
        DisplaySession::new(TranscriptStyle::default()).shared(),
        Duration::from_millis(1),
    )
}

async fn finish(report: TurnReport) -> RevealOutcome {
    match report {
        TurnReport::Narrating(handle) => handle.finished().await,
        TurnReport::Failed(e) => panic!("turn failed: {}", e),
    }
}

#[tokio::test]
async fn open_the_door_scenario() {
    let backend = ScriptedBackend::new(vec![Ok("The door creaks open.".into())]);
    let c = controller(Arc::clone(&backend), Some(HostSession::new("<id>")));

    let report = c.play_turn("open the door").await.unwrap();
    {
        // Player line is shown while the narration is still being typed.
        let s = lock(c.session());
        assert_eq!(s.lines()[0], "Ты: open the door");
        assert!(s.is_busy());
    }
    let outcome = finish(report).await;

    let text = "The door creaks open.";
    assert_eq!(
        outcome,
        RevealOutcome::Completed {
            steps: text.chars().count()
        }
    );
    assert_eq!(
        backend.calls(),
        vec![("<id>".to_string(), "open the door".to_string())]
    );

    let s = lock(c.session());
    assert!(!s.is_busy());
    assert!(s.can_send());
    let lines = s.lines();
    assert_eq!(lines[0], "Ты: open the door");
    assert_eq!(lines[1], "Повествователь: The door creaks open.");
    assert_eq!(s.transcript()[2].speaker, Speaker::Separator);
}

#[tokio::test]
async fn opening_turn_sends_empty_action_without_player_line() {
    let backend = ScriptedBackend::new(vec![Ok("Ты просыпаешься у костра.".into())]);
    let c = controller(Arc::clone(&backend), Some(HostSession::new("q=1")));

    assert!(lock(c.session()).enter_adventure());
    let report = c.play_turn("").await.unwrap();
    finish(report).await;

    assert_eq!(backend.calls(), vec![("q=1".to_string(), String::new())]);
    let s = lock(c.session());
    assert_eq!(s.transcript()[0].speaker, Speaker::Narrator);
    assert!(!s.lines().iter().any(|l| l.starts_with("Ты:")));
}

#[tokio::test]
async fn failure_shows_error_marker_and_reenables_send() {
    let backend = ScriptedBackend::new(vec![Err(TurnError::Rejected("Invalid initData".into()))]);
    let c = controller(Arc::clone(&backend), Some(HostSession::new("bad")));

    let report = c.play_turn("look around").await.unwrap();
    assert!(matches!(report, TurnReport::Failed(TurnError::Rejected(_))));

    let s = lock(c.session());
    assert!(s.can_send());
    assert_eq!(s.lines().last().unwrap(), "❌ Invalid initData");
}

#[tokio::test]
async fn missing_host_data_never_contacts_backend() {
    let backend = ScriptedBackend::new(vec![Ok("unused".into())]);
    let c = controller(Arc::clone(&backend), None);

    let err = c.play_turn("").await.unwrap_err();
    assert_eq!(err, SessionError::Disabled);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn second_turn_while_busy_is_refused() {
    let backend = ScriptedBackend::with_delay(
        vec![Ok("first".into()), Ok("second".into())],
        Duration::from_millis(100),
    );
    let c = controller(Arc::clone(&backend), Some(HostSession::new("id")));

    let first = {
        let c = c.clone();
        tokio::spawn(async move { c.play_turn("one").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    let err = c.play_turn("two").await.unwrap_err();
    assert_eq!(err, SessionError::Busy);

    finish(first.await.unwrap().unwrap()).await;
    assert_eq!(backend.calls().len(), 1);
    assert!(lock(c.session()).can_send());
}

#[tokio::test]
async fn submit_trims_input_and_clears_it_on_success() {
    let backend = ScriptedBackend::new(vec![Ok("ok".into())]);
    let c = controller(Arc::clone(&backend), Some(HostSession::new("id")));

    for ch in "   ".chars() {
        lock(c.session()).push_input(ch);
    }
    assert!(c.submit_input().await.is_none());
    assert!(backend.calls().is_empty());

    for ch in "go north ".chars() {
        lock(c.session()).push_input(ch);
    }
    let report = c.submit_input().await.expect("sent").unwrap();
    finish(report).await;

    assert_eq!(backend.calls()[0].1, "go north");
    assert_eq!(lock(c.session()).input(), "");
}

#[tokio::test]
async fn failed_turn_keeps_input_for_retry() {
    let backend = ScriptedBackend::new(vec![Err(TurnError::Timeout(60))]);
    let c = controller(Arc::clone(&backend), Some(HostSession::new("id")));

    for ch in "climb".chars() {
        lock(c.session()).push_input(ch);
    }
    c.submit_input().await.expect("sent").unwrap();

    let s = lock(c.session());
    assert_eq!(s.input(), "climb");
    assert_eq!(s.lines().last().unwrap(), "❌ no reply within 60s");
}

#[tokio::test]
async fn startup_without_host_data_shows_warning_and_stays_silent() {
    let backend = ScriptedBackend::new(vec![Ok("unused".into())]);
    let host: Result<HostSession, HostError> = Err(HostError::MissingInitData {
        env_var: "LANTERN_INIT_DATA".into(),
    });
    let session = DisplaySession::for_host(TranscriptStyle::default(), &host).shared();
    let c = TurnController::new(
        Arc::clone(&backend) as Arc<dyn StoryBackend>,
        host.ok(),
        session,
        Duration::from_millis(1),
    );

    {
        let mut s = lock(c.session());
        assert_eq!(s.view(), View::Adventure);
        assert_eq!(s.lines(), HOST_WARNING.to_vec());
        assert!(s.is_disabled());
        assert!(!s.can_send());
        // Leaving to the menu and coming back must not request the opening turn.
        s.show_menu();
        assert!(!s.enter_adventure());
        s.push_input('x');
        assert_eq!(s.input(), "");
    }

    assert_eq!(c.play_turn("").await.unwrap_err(), SessionError::Disabled);
    assert!(backend.calls().is_empty());
}

#[test]
fn startup_with_host_data_opens_on_menu() {
    let host = Ok(HostSession::new("query_id=1"));
    let s = DisplaySession::for_host(TranscriptStyle::default(), &host);
    assert_eq!(s.view(), View::Menu);
    assert!(s.transcript().is_empty());
    assert!(s.can_send());
}
