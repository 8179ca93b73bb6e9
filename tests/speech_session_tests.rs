// Tests for the speech session controller's lifecycle guarantees.
//
// The engine is a scripted fake: the tests fire engine events on
// command and assert on which primitives the controller invoked. The
// tokio clock starts paused, so debounce and watchdog windows elapse
// deterministically.

use cartscribe::{
    EngineCall, EngineError, EngineEvent, ErrorKind, Hypothesis, ScriptedEngine, ScriptedHandle,
    SessionEvent, SpeechConfig, SpeechSession,
};
use std::time::Duration;
use tokio::sync::mpsc;

async fn new_session(
    config: SpeechConfig,
) -> (
    SpeechSession,
    ScriptedHandle,
    mpsc::UnboundedReceiver<SessionEvent>,
) {
    let (engine, handle) = ScriptedEngine::new();
    let (session, events) = SpeechSession::new(Some(Box::new(engine)), config)
        .await
        .expect("session should open");
    (session, handle, events)
}

fn final_hyp(text: &str) -> Hypothesis {
    Hypothesis {
        text: text.to_string(),
        is_final: true,
        confidence: Some(0.9),
    }
}

fn interim_hyp(text: &str) -> Hypothesis {
    Hypothesis {
        text: text.to_string(),
        is_final: false,
        confidence: None,
    }
}

/// Let the dispatch task drain; short enough that no debounce or
/// watchdog window elapses.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

fn drain(events: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

#[tokio::test(start_paused = true)]
async fn unsupported_session_reports_unsupported_and_start_is_noop() {
    let (session, _events) = SpeechSession::new(None, SpeechConfig::default())
        .await
        .expect("unsupported session should still construct");

    assert!(!session.is_supported());
    assert!(!session.is_listening());

    session.start_listening().await;
    assert!(!session.is_listening(), "start must be a no-op without an engine");

    // Stop and reset must be equally harmless.
    session.stop_listening().await;
    session.reset_transcript().await;
}

#[tokio::test(start_paused = true)]
async fn start_clears_both_transcripts() {
    let (session, handle, _events) = new_session(SpeechConfig::default()).await;

    session.start_listening().await;
    assert!(session.is_listening());

    handle
        .emit(EngineEvent::Result(vec![
            final_hyp("add milk"),
            interim_hyp("and"),
        ]))
        .await;
    settle().await;
    assert_eq!(session.final_transcript().await, "add milk");
    assert_eq!(session.transcript().await, "and");

    // A fresh start begins from an empty transcript, both sides.
    session.start_listening().await;
    assert_eq!(session.final_transcript().await, "");
    assert_eq!(session.transcript().await, "");
    assert_eq!(handle.call_count(EngineCall::Start), 2);
}

#[tokio::test(start_paused = true)]
async fn stop_listening_is_idempotent() {
    let (session, handle, _events) = new_session(SpeechConfig::default()).await;

    session.start_listening().await;
    session.stop_listening().await;
    assert!(!session.is_listening());

    session.stop_listening().await;
    assert!(!session.is_listening());

    // However many times stop was called, a late capture-end must not
    // revive the session.
    handle.emit(EngineEvent::AudioEnded).await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(handle.call_count(EngineCall::Start), 1);
}

#[tokio::test(start_paused = true)]
async fn interim_only_results_never_mutate_final_transcript() {
    let (session, handle, _events) = new_session(SpeechConfig::default()).await;
    session.start_listening().await;

    handle
        .emit(EngineEvent::Result(vec![interim_hyp("milk")]))
        .await;
    settle().await;

    assert_eq!(session.transcript().await, "milk");
    assert_eq!(session.final_transcript().await, "");
}

#[tokio::test(start_paused = true)]
async fn final_only_results_never_mutate_interim_transcript() {
    let (session, handle, _events) = new_session(SpeechConfig::default()).await;
    session.start_listening().await;

    handle
        .emit(EngineEvent::Result(vec![interim_hyp("add mi")]))
        .await;
    settle().await;

    handle
        .emit(EngineEvent::Result(vec![final_hyp("add milk")]))
        .await;
    settle().await;

    assert_eq!(session.final_transcript().await, "add milk");
    assert_eq!(
        session.transcript().await,
        "add mi",
        "a final-only result must leave the interim transcript alone"
    );
}

#[tokio::test(start_paused = true)]
async fn mixed_results_append_final_and_replace_interim() {
    let (session, handle, mut events) = new_session(SpeechConfig::default()).await;
    session.start_listening().await;

    handle
        .emit(EngineEvent::Result(vec![
            final_hyp("add milk"),
            interim_hyp("and eggs"),
        ]))
        .await;
    settle().await;
    handle
        .emit(EngineEvent::Result(vec![
            final_hyp("add eggs"),
            interim_hyp("then"),
        ]))
        .await;
    settle().await;

    assert_eq!(session.final_transcript().await, "add milk add eggs");
    assert_eq!(session.transcript().await, "then");

    let transcripts = drain(&mut events);
    assert_eq!(
        transcripts,
        vec![
            SessionEvent::Transcript {
                text: "add milk".to_string(),
                is_final: true
            },
            SessionEvent::Transcript {
                text: "and eggs".to_string(),
                is_final: false
            },
            SessionEvent::Transcript {
                text: "add eggs".to_string(),
                is_final: true
            },
            SessionEvent::Transcript {
                text: "then".to_string(),
                is_final: false
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn continuous_session_restarts_after_engine_ends_capture() {
    let (session, handle, _events) = new_session(SpeechConfig::default()).await;
    session.start_listening().await;

    handle.emit(EngineEvent::AudioEnded).await;
    settle().await;
    // Debounce window still open.
    assert_eq!(handle.call_count(EngineCall::Start), 1);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(
        handle.call_count(EngineCall::Start),
        2,
        "engine start must be invoked exactly once more after the debounce"
    );
    assert!(session.is_listening());

    // And only once: no second restart creeps in later.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(handle.call_count(EngineCall::Start), 2);
}

#[tokio::test(start_paused = true)]
async fn stop_beats_capture_end_arriving_afterwards() {
    let (session, handle, _events) = new_session(SpeechConfig::default()).await;
    session.start_listening().await;

    session.stop_listening().await;
    assert!(!session.is_listening());

    // The engine's own end event trails the stop; nothing may restart.
    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.emit(EngineEvent::AudioEnded).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(handle.call_count(EngineCall::Start), 1);
    assert!(!session.is_listening());
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_an_already_scheduled_restart() {
    let (session, handle, _events) = new_session(SpeechConfig::default()).await;
    session.start_listening().await;

    handle.emit(EngineEvent::AudioEnded).await;
    settle().await;
    // Restart debounce is pending now; stop must kill it.
    session.stop_listening().await;

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(handle.call_count(EngineCall::Start), 1);
}

#[tokio::test(start_paused = true)]
async fn silence_timeout_force_stops_without_error() {
    let config = SpeechConfig {
        inactivity_timeout_ms: 3000,
        ..SpeechConfig::default()
    };
    let (session, handle, mut events) = new_session(config).await;
    session.start_listening().await;

    tokio::time::sleep(Duration::from_millis(3100)).await;

    assert_eq!(handle.call_count(EngineCall::Abort), 1);
    assert!(!session.is_listening());
    assert!(
        drain(&mut events)
            .iter()
            .all(|e| !matches!(e, SessionEvent::Error(_))),
        "a silence timeout is control flow, not an error"
    );

    // The consumer is free to start again.
    session.start_listening().await;
    assert!(session.is_listening());
}

#[tokio::test(start_paused = true)]
async fn silence_timeout_stop_does_not_auto_restart() {
    let config = SpeechConfig {
        inactivity_timeout_ms: 1000,
        ..SpeechConfig::default()
    };
    let (session, handle, _events) = new_session(config).await;
    session.start_listening().await;

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(handle.call_count(EngineCall::Abort), 1);

    // The abort makes the engine end capture; that must not schedule a
    // restart, this stop was deliberate.
    handle.emit(EngineEvent::AudioEnded).await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(handle.call_count(EngineCall::Start), 1);
}

#[tokio::test(start_paused = true)]
async fn results_keep_pushing_the_watchdog_out() {
    let config = SpeechConfig {
        inactivity_timeout_ms: 1000,
        ..SpeechConfig::default()
    };
    let (session, handle, _events) = new_session(config).await;
    session.start_listening().await;

    for _ in 0..3 {
        tokio::time::sleep(Duration::from_millis(600)).await;
        handle
            .emit(EngineEvent::Result(vec![interim_hyp("still talking")]))
            .await;
        settle().await;
    }

    // Never a full quiet window, so no force-stop yet.
    assert_eq!(handle.call_count(EngineCall::Abort), 0);
    assert!(session.is_listening());

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(handle.call_count(EngineCall::Abort), 1);
    assert!(!session.is_listening());
}

#[tokio::test(start_paused = true)]
async fn no_speech_error_is_absorbed() {
    let (session, handle, mut events) = new_session(SpeechConfig::default()).await;
    session.start_listening().await;
    drain(&mut events);

    handle.emit(EngineEvent::Error(ErrorKind::NoSpeech)).await;
    settle().await;

    assert!(drain(&mut events).is_empty());
    assert!(session.is_listening(), "no-speech must not change listening state");
}

#[tokio::test(start_paused = true)]
async fn aborted_error_is_ignored() {
    let (session, handle, mut events) = new_session(SpeechConfig::default()).await;
    session.start_listening().await;
    drain(&mut events);

    handle.emit(EngineEvent::Error(ErrorKind::Aborted)).await;
    settle().await;

    assert!(drain(&mut events).is_empty());
    assert!(session.is_listening());
}

#[tokio::test(start_paused = true)]
async fn not_allowed_error_is_fatal() {
    let (session, handle, mut events) = new_session(SpeechConfig::default()).await;
    session.start_listening().await;

    handle.emit(EngineEvent::Error(ErrorKind::NotAllowed)).await;
    settle().await;

    let errors: Vec<SessionEvent> = drain(&mut events)
        .into_iter()
        .filter(|e| matches!(e, SessionEvent::Error(_)))
        .collect();
    assert_eq!(errors, vec![SessionEvent::Error(ErrorKind::NotAllowed)]);
    assert!(!session.is_listening());

    // Permission failures are not recoverable by restarting.
    handle.emit(EngineEvent::AudioEnded).await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(handle.call_count(EngineCall::Start), 1);
}

#[tokio::test(start_paused = true)]
async fn ended_event_reaches_consumer_unless_stop_was_manual() {
    let (session, handle, mut events) = new_session(SpeechConfig::default()).await;
    session.start_listening().await;

    handle.emit(EngineEvent::Ended).await;
    settle().await;
    assert!(drain(&mut events).contains(&SessionEvent::Ended));

    session.start_listening().await;
    session.stop_listening().await;
    drain(&mut events);

    handle.emit(EngineEvent::Ended).await;
    settle().await;
    assert!(
        !drain(&mut events).contains(&SessionEvent::Ended),
        "a manually stopped session must not report the engine's end"
    );
}

#[tokio::test(start_paused = true)]
async fn one_shot_session_does_not_restart() {
    let config = SpeechConfig {
        continuous: false,
        ..SpeechConfig::default()
    };
    let (session, handle, mut events) = new_session(config).await;
    session.start_listening().await;

    handle
        .emit(EngineEvent::Result(vec![final_hyp("add milk")]))
        .await;
    handle.emit(EngineEvent::AudioEnded).await;
    handle.emit(EngineEvent::Ended).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(handle.call_count(EngineCall::Start), 1);
    assert!(!session.is_listening());
    assert!(drain(&mut events).contains(&SessionEvent::Ended));
    assert_eq!(session.final_transcript().await, "add milk");
}

#[tokio::test(start_paused = true)]
async fn reset_clears_transcripts_without_stopping() {
    let (session, handle, _events) = new_session(SpeechConfig::default()).await;
    session.start_listening().await;

    handle
        .emit(EngineEvent::Result(vec![
            final_hyp("add milk"),
            interim_hyp("and"),
        ]))
        .await;
    settle().await;

    session.reset_transcript().await;
    assert_eq!(session.final_transcript().await, "");
    assert_eq!(session.transcript().await, "");
    assert!(session.is_listening());
}

#[tokio::test(start_paused = true)]
async fn rejected_engine_start_reverts_listening_flags() {
    let (session, handle, mut events) = new_session(SpeechConfig::default()).await;

    handle.fail_next_start(EngineError::AlreadyStarted);
    session.start_listening().await;

    assert!(!session.is_listening());
    assert!(
        drain(&mut events).is_empty(),
        "a rejected start is recoverable and must not be surfaced"
    );

    // The next start is back to normal.
    session.start_listening().await;
    assert!(session.is_listening());
    assert_eq!(handle.call_count(EngineCall::Start), 2);
}

#[tokio::test(start_paused = true)]
async fn stats_track_results_and_restarts() {
    let (session, handle, _events) = new_session(SpeechConfig::default()).await;
    session.start_listening().await;

    handle
        .emit(EngineEvent::Result(vec![final_hyp("add milk")]))
        .await;
    settle().await;
    handle.emit(EngineEvent::AudioEnded).await;
    tokio::time::sleep(Duration::from_millis(150)).await;

    let stats = session.stats().await;
    assert!(stats.supported);
    assert!(stats.listening);
    assert_eq!(stats.result_events, 1);
    assert_eq!(stats.restarts, 1);
    assert!(stats.started_at.is_some());
}
