//! Controller tests
//!
//! Drive the trainer state through a scripted speech engine and check the
//! playback, editing and persistence behavior the user relies on.

mod common;

use common::{voice, Harness, SharedStore};
use ptrain::playback::PlaybackMode;
use ptrain::speech::SpeechEvent;
use ptrain::store::KeyValueStore;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn test_blank_phrase_is_rejected() {
    let mut h = Harness::with_phrases(&["Hello"]);
    let now = h.at(0);

    assert!(!h.state.add_phrase("", now));
    assert!(!h.state.add_phrase("   \t", now));
    assert_eq!(h.state.phrases().phrases(), ["Hello"]);
    assert_eq!(h.notice().as_deref(), Some("Type a phrase first"));
}

#[test]
fn test_add_then_delete_restores_list() {
    let mut h = Harness::with_phrases(&["Hello", "Goodbye"]);
    let now = h.at(0);
    let before = h.state.phrases().phrases().to_vec();

    assert!(h.state.add_phrase("  See you later ", now));
    assert_eq!(h.state.phrases().get(2), Some("See you later"));
    assert!(h.state.delete_phrase(2, "See you later", now));
    assert_eq!(h.state.phrases().phrases(), before.as_slice());
}

#[test]
fn test_stale_delete_is_ignored() {
    let mut h = Harness::with_phrases(&["Hello", "Goodbye"]);
    assert!(!h.state.delete_phrase(0, "Goodbye", h.at(0)));
    assert!(!h.state.delete_phrase(7, "Hello", h.at(0)));
    assert_eq!(h.state.phrases().len(), 2);
}

#[test]
fn test_play_all_speaks_in_order() {
    let mut h = Harness::with_phrases(&["A", "B", "C"]);
    assert!(h.state.play_all(h.at(0)));
    assert!(h.state.is_playing_all());
    assert_eq!(h.state.active_index(), Some(0));

    h.finish(h.at(500));
    assert_eq!(h.state.active_index(), Some(1));
    h.finish(h.at(1000));
    assert_eq!(h.state.active_index(), Some(2));
    h.finish(h.at(1500));

    assert_eq!(h.spoken(), ["A", "B", "C"]);
    assert_eq!(h.state.mode(), PlaybackMode::Idle);
    assert!(!h.state.is_playing_all());
    assert_eq!(h.notice().as_deref(), Some("Finished all phrases"));
}

#[test]
fn test_play_all_uses_a_snapshot() {
    let mut h = Harness::with_phrases(&["A", "B"]);
    h.state.play_all(h.at(0));
    h.state.add_phrase("C", h.at(10));

    h.finish(h.at(500));
    h.finish(h.at(1000));
    assert_eq!(h.spoken(), ["A", "B"]);
    assert_eq!(h.state.mode(), PlaybackMode::Idle);
}

#[test]
fn test_play_all_on_empty_list() {
    let mut h = Harness::with_phrases(&[]);
    assert!(!h.state.play_all(h.at(0)));
    assert_eq!(h.state.mode(), PlaybackMode::Idle);
    assert_eq!(h.notice().as_deref(), Some("No phrases to play"));
}

#[test]
fn test_speaking_one_phrase_abandons_play_all() {
    let mut h = Harness::with_phrases(&["A", "B", "C"]);
    h.state.play_all(h.at(0));
    assert!(h.state.speak_phrase(2, h.at(100)));
    assert!(!h.state.is_playing_all());

    h.finish(h.at(600));
    assert_eq!(h.spoken(), ["A", "C"]);
    assert_eq!(h.state.mode(), PlaybackMode::Idle);
}

#[test]
fn test_starting_new_speech_cancels_previous() {
    let mut h = Harness::with_phrases(&["A", "B"]);
    h.state.speak_phrase(0, h.at(0));
    let cancels = h.script.lock().unwrap().cancels;
    h.state.speak_phrase(1, h.at(100));
    assert_eq!(h.script.lock().unwrap().cancels, cancels + 1);
    assert_eq!(h.state.active_index(), Some(1));
}

#[test]
fn test_end_of_superseded_utterance_is_ignored() {
    let mut h = Harness::with_phrases(&["A", "B"]);
    h.state.speak_phrase(0, h.at(0));
    let first = h.last_id().unwrap();
    h.state.speak_phrase(1, h.at(100));

    h.script.lock().unwrap().pending.push(SpeechEvent::Ended(first));
    h.state.update(h.at(200));
    assert_eq!(h.state.mode(), PlaybackMode::Speaking);
    assert_eq!(h.state.active_index(), Some(1));
}

#[test]
fn test_pause_and_resume_are_noops_in_wrong_mode() {
    let mut h = Harness::with_phrases(&["A", "B"]);
    assert!(!h.state.pause_phrase(0, h.at(0)));
    assert!(!h.state.pause_all(h.at(0)));
    assert!(!h.state.resume_all(h.at(0)));
    assert_eq!(h.state.mode(), PlaybackMode::Idle);

    h.state.speak_phrase(0, h.at(0));
    assert!(!h.state.resume_phrase(0, h.at(10)));
    assert!(!h.state.pause_phrase(1, h.at(10)), "phrase 1 is not active");
    assert_eq!(h.state.mode(), PlaybackMode::Speaking);

    assert!(h.state.pause_phrase(0, h.at(20)));
    assert!(!h.state.pause_phrase(0, h.at(30)));
    assert_eq!(h.state.mode(), PlaybackMode::Paused);
    assert_eq!(h.script.lock().unwrap().pauses, 1);
}

#[test]
fn test_pause_failure_keeps_speaking() {
    let mut h = Harness::with_phrases(&["A"]);
    h.script.lock().unwrap().fail_pause = true;
    h.state.speak_phrase(0, h.at(0));

    assert!(!h.state.pause_all(h.at(10)));
    assert_eq!(h.state.mode(), PlaybackMode::Speaking);
}

#[test]
fn test_stop_is_idempotent() {
    let mut h = Harness::with_phrases(&["A", "B"]);
    h.state.play_all(h.at(0));

    h.state.stop_all(h.at(10));
    h.state.stop_all(h.at(20));
    assert_eq!(h.state.mode(), PlaybackMode::Idle);
    assert!(!h.state.is_playing_all());
    assert_eq!(h.state.active_index(), None);
    assert_eq!(h.notice().as_deref(), Some("Stopped"));

    h.state.update(h.at(30));
    assert!(h.spoken().len() == 1, "nothing new starts after stop");
}

#[test]
fn test_fifteen_words_estimate_six_seconds() {
    let phrase = "one two three four five six seven eight nine ten eleven twelve thirteen fourteen fifteen";
    let mut h = Harness::with_phrases(&[phrase]);

    h.state.speak_phrase(0, h.at(0));
    assert!(close(h.state.telemetry().estimated_seconds, 6.0));
    assert!(close(h.state.telemetry().remaining_seconds, 6.0));

    h.state.stop_all(h.at(10));
    h.state.set_rate(2.0);
    h.state.speak_phrase(0, h.at(20));
    assert!(close(h.state.telemetry().estimated_seconds, 3.0));
}

#[test]
fn test_pause_freezes_progress() {
    let phrase = "one two three four five six seven eight nine ten eleven twelve thirteen fourteen fifteen";
    let mut h = Harness::with_phrases(&[phrase]);

    h.state.speak_phrase(0, h.at(0));
    h.state.update(h.at(0));
    h.state.update(h.at(1000));
    assert!(close(h.state.telemetry().elapsed_seconds, 1.0));

    h.state.pause_all(h.at(1500));
    h.state.update(h.at(5000));
    let t = h.state.telemetry();
    assert!(close(t.elapsed_seconds, 1.5));
    assert!(close(t.remaining_seconds, 4.5));
    assert!(close(t.progress_percent, 25.0));

    h.state.resume_all(h.at(5000));
    h.state.update(h.at(6000));
    assert!(close(h.state.telemetry().elapsed_seconds, 2.5));
}

#[test]
fn test_completion_snaps_progress() {
    let mut h = Harness::with_phrases(&["A long phrase with several words in it"]);
    h.state.speak_phrase(0, h.at(0));
    h.state.update(h.at(0));
    h.finish(h.at(100));

    let t = h.state.telemetry();
    assert!(close(t.progress_percent, 100.0));
    assert!(close(t.remaining_seconds, 0.0));
}

#[test]
fn test_deleting_active_phrase_stops_first() {
    let mut h = Harness::with_phrases(&["A", "B", "C"]);
    h.state.speak_phrase(1, h.at(0));
    let cancels = h.script.lock().unwrap().cancels;

    assert!(h.state.delete_phrase(1, "B", h.at(10)));
    assert_eq!(h.state.mode(), PlaybackMode::Idle);
    assert_eq!(h.state.active_index(), None);
    assert!(h.script.lock().unwrap().cancels > cancels);
    assert_eq!(h.state.phrases().phrases(), ["A", "C"]);
}

#[test]
fn test_deleting_other_phrase_keeps_playing() {
    let mut h = Harness::with_phrases(&["A", "B", "C"]);
    h.state.speak_phrase(2, h.at(0));
    assert!(h.state.delete_phrase(0, "A", h.at(10)));
    assert_eq!(h.state.mode(), PlaybackMode::Speaking);
}

#[test]
fn test_clear_during_play_all() {
    let mut h = Harness::with_phrases(&["A", "B", "C"]);
    h.state.play_all(h.at(0));
    let first = h.last_id().unwrap();

    assert!(h.state.request_clear(h.at(10)));
    h.state.clear_phrases(h.at(20));
    assert_eq!(h.state.mode(), PlaybackMode::Idle);
    assert!(!h.state.is_playing_all());
    assert!(h.state.phrases().is_empty());
    assert!(h.state.empty_prompt());
    assert_eq!(h.notice().as_deref(), Some("All phrases cleared"));

    // A late end report must not restart the abandoned run
    h.script.lock().unwrap().pending.push(SpeechEvent::Ended(first));
    h.state.update(h.at(30));
    assert_eq!(h.spoken(), ["A"]);

    assert!(!h.state.request_clear(h.at(40)));
    h.state.dismiss_empty_prompt();
    assert!(!h.state.empty_prompt());
}

#[test]
fn test_speak_without_voice() {
    let mut h = Harness::with_store(SharedStore::default(), Vec::new());
    assert!(!h.state.speak_phrase(0, h.at(0)));
    assert_eq!(h.state.mode(), PlaybackMode::Idle);
    assert_eq!(h.notice().as_deref(), Some("No voice available"));
    assert!(h.spoken().is_empty());
}

#[test]
fn test_speak_missing_phrase() {
    let mut h = Harness::with_phrases(&["A"]);
    assert!(!h.state.speak_phrase(3, h.at(0)));
    assert_eq!(h.notice().as_deref(), Some("No such phrase"));
}

#[test]
fn test_state_survives_reload() {
    let store = SharedStore::default();
    store
        .clone()
        .set("trainer_data", r#"{"phrases":["A","B"],"rate":1.2,"timestamp":5}"#)
        .unwrap();

    let mut h = Harness::with_store(store.clone(), vec![voice("en")]);
    assert_eq!(h.state.phrases().phrases(), ["A", "B"]);
    assert!((h.state.rate() - 1.2).abs() < 1e-6);

    h.state.add_phrase("C", h.at(0));
    h.state.set_rate(0.5);

    let reloaded = Harness::with_store(store, vec![voice("en")]);
    assert_eq!(reloaded.state.phrases().phrases(), ["A", "B", "C"]);
    assert!((reloaded.state.rate() - 0.5).abs() < 1e-6);
}

#[test]
fn test_cleared_list_reloads_empty() {
    let mut h = Harness::with_phrases(&["A"]);
    h.state.clear_phrases(h.at(0));

    let reloaded = Harness::with_store(h.store.clone(), vec![voice("en")]);
    assert!(reloaded.state.phrases().is_empty());
}

#[test]
fn test_rate_is_clamped_and_used() {
    let mut h = Harness::with_phrases(&["A"]);
    assert!((h.state.set_rate(5.0) - 2.0).abs() < 1e-6);
    h.state.speak_phrase(0, h.at(0));
    let rate = h.script.lock().unwrap().spoken[0].rate;
    assert!((rate - 2.0).abs() < 1e-6);
}

#[test]
fn test_voice_choice_is_remembered() {
    let voices = vec![voice("en"), voice("fr")];
    let mut h = Harness::with_store(SharedStore::default(), voices.clone());
    assert_eq!(h.state.current_voice().map(|v| v.id.as_str()), Some("en"));

    assert!(h.state.select_voice(1, h.at(0)));
    assert!(!h.state.select_voice(9, h.at(0)));
    h.state.speak_phrase(0, h.at(10));
    let used = h.script.lock().unwrap().spoken[0].voice.clone();
    assert_eq!(used.as_deref(), Some("fr"));

    let reloaded = Harness::with_store(h.store.clone(), voices);
    assert_eq!(
        reloaded.state.current_voice().map(|v| v.id.as_str()),
        Some("fr")
    );
}
