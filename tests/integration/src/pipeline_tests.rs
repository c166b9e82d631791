//! Frame-to-submission pipeline tests.

use crate::test_utils::{group_text_frame, one_km_north, test_location, RecordingCollector};
use echogrid_core::{Config, EntryKind};
use echogrid_crypto::derive_material;
use echogrid_uplink::SessionContext;

const PROBE: &str = "@[MapperBot] 45.42153, -75.69719";

fn config() -> Config {
    Config::default_config()
}

#[tokio::test]
async fn echo_window_produces_ranked_results_and_tx_entry() {
    let collector = RecordingCollector::default();
    let mut session = SessionContext::new(&config(), &collector);
    session.session_started("session-token", 0);

    let material = derive_material("#coverage").unwrap();
    assert!(session.open_echo_window(PROBE));

    // A relay that prepends its sender name still correlates.
    let frame = group_text_frame(&material, &[0x4E], &format!("Relay1: {}", PROBE), 11.5);
    session.handle_frame(&frame, test_location(), 1_000);

    let candidates = session.close_echo_window(test_location(), 30_000).await;
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].repeater_id, "4e");
    assert_eq!(candidates[0].best_snr, 11.5);
    assert_eq!(candidates[0].occurrences, 1);

    // Debounce elapses, the TX entry is submitted.
    session.tick(test_location(), 36_000).await;

    let batches = collector.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0][0].kind, EntryKind::Tx);
    assert_eq!(batches[0][0].heard, "4e(11.5)");
}

#[tokio::test]
async fn echo_dedup_across_multiple_relays() {
    let collector = RecordingCollector::default();
    let mut session = SessionContext::new(&config(), &collector);
    session.session_started("session-token", 0);

    let material = derive_material("#coverage").unwrap();
    session.open_echo_window(PROBE);

    // 0x4E echoes twice, 0xB7 once.
    session.handle_frame(
        &group_text_frame(&material, &[0x4E], PROBE, 8.0),
        test_location(),
        1_000,
    );
    session.handle_frame(
        &group_text_frame(&material, &[0x4E], PROBE, 11.5),
        test_location(),
        1_500,
    );
    session.handle_frame(
        &group_text_frame(&material, &[0xB7], PROBE, 9.75),
        test_location(),
        2_000,
    );

    let candidates = session.close_echo_window(test_location(), 30_000).await;
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].repeater_id, "4e");
    assert_eq!(candidates[0].best_snr, 11.5);
    assert_eq!(candidates[0].occurrences, 2);
    assert_eq!(candidates[1].repeater_id, "b7");

    session.tick(test_location(), 36_000).await;
    let batches = collector.batches();
    assert_eq!(batches[0][0].heard, "4e(11.5),b7(9.75)");
}

#[tokio::test]
async fn passive_flush_by_distance_submits_rx_entry() {
    let collector = RecordingCollector::default();
    let mut session = SessionContext::new(&config(), &collector);
    session.session_started("session-token", 0);

    let material = derive_material("#coverage").unwrap();
    session.handle_frame(
        &group_text_frame(&material, &[0x12, 0xB7], "third party chatter", 9.75),
        test_location(),
        1_000,
    );
    assert_eq!(session.status().passive_buffers, 1);

    // Still close by: no flush yet.
    session.tick(test_location(), 2_000).await;
    assert_eq!(session.status().passive_buffers, 1);

    // One kilometer of movement exceeds the 500m default threshold; the
    // buffer flushes and rides the periodic deadline later.
    session.tick(one_km_north(), 3_000).await;
    assert_eq!(session.status().passive_buffers, 0);
    assert_eq!(session.status().queue_depth, 1);

    session.tick(one_km_north(), 60_000).await;
    let batches = collector.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 1);
    assert_eq!(batches[0][0].kind, EntryKind::Rx);
    assert_eq!(batches[0][0].heard, "b7(9.75)");
}

#[tokio::test]
async fn passive_flush_by_time_without_movement() {
    let collector = RecordingCollector::default();
    let mut session = SessionContext::new(&config(), &collector);
    session.session_started("session-token", 0);

    let material = derive_material("#coverage").unwrap();
    session.handle_frame(
        &group_text_frame(&material, &[0xB7], "chatter", 4.0),
        test_location(),
        1_000,
    );

    // Default buffer age is 120s; nothing flushes before that. This
    // tick also services an (empty) periodic deadline at 60s.
    session.tick(test_location(), 100_000).await;
    assert_eq!(session.status().passive_buffers, 1);
    assert_eq!(collector.submission_count(), 0);

    session.tick(test_location(), 121_000).await;
    assert_eq!(session.status().passive_buffers, 0);
    assert_eq!(session.status().queue_depth, 1);

    // The next periodic deadline carries the entry out.
    session.tick(test_location(), 161_000).await;
    let batches = collector.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0][0].kind, EntryKind::Rx);
    assert_eq!(session.status().queue_depth, 0);
}

#[tokio::test]
async fn silent_repeater_never_produces_an_entry() {
    let collector = RecordingCollector::default();
    let mut session = SessionContext::new(&config(), &collector);
    session.session_started("session-token", 0);

    let material = derive_material("#coverage").unwrap();
    session.handle_frame(
        &group_text_frame(&material, &[0x4E], "chatter", 5.0),
        test_location(),
        1_000,
    );

    session.session_ending(test_location(), 2_000).await;

    for batch in collector.batches() {
        for entry in batch {
            assert!(!entry.heard.contains("b7("));
        }
    }
}

#[tokio::test]
async fn capacity_flush_fires_before_any_deadline() {
    let mut config = config();
    config.queue.capacity = 2;

    let collector = RecordingCollector::default();
    let mut session = SessionContext::new(&config, &collector);
    session.session_started("session-token", 0);

    let material = derive_material("#coverage").unwrap();
    session.handle_frame(
        &group_text_frame(&material, &[0x4E], "chatter", 5.0),
        test_location(),
        1_000,
    );
    session.handle_frame(
        &group_text_frame(&material, &[0xB7], "chatter", 6.0),
        test_location(),
        1_100,
    );

    // Both buffers flush on movement, hitting capacity 2; the batch goes
    // out at t=2s, long before the debounce or periodic deadlines.
    session.tick(one_km_north(), 2_000).await;

    let batches = collector.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 2);
    assert_eq!(session.status().queue_depth, 0);
}

#[tokio::test]
async fn back_to_back_ticks_yield_one_submission() {
    let collector = RecordingCollector::default();
    let mut session = SessionContext::new(&config(), &collector);
    session.session_started("session-token", 0);

    session.open_echo_window(PROBE);
    session.close_echo_window(test_location(), 30_000).await;

    // Both ticks are past the debounce deadline; the first flush clears
    // it, so the second is a no-op rather than a duplicate submission.
    session.tick(test_location(), 36_000).await;
    session.tick(test_location(), 36_001).await;

    assert_eq!(collector.submission_count(), 1);
}

#[tokio::test]
async fn revocation_propagates_and_new_session_recovers() {
    let collector = RecordingCollector::default();
    let mut session = SessionContext::new(&config(), &collector);
    session.session_started("session-token", 0);

    collector.reject_next();
    session.open_echo_window(PROBE);
    session.close_echo_window(test_location(), 30_000).await;
    session.tick(test_location(), 36_000).await;

    assert!(session.is_revoked());
    assert_eq!(session.queue_status(), "Queued (0/50)");

    session.session_started("new-token", 40_000);
    assert!(!session.is_revoked());
}
