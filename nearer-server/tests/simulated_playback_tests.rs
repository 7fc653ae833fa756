//! Queue manager driving the simulated player end to end
//!
//! Notifications flow from the player thread through the channel and the
//! pump back into the manager.

mod helpers;

use helpers::RecordingBroadcaster;
use nearer_common::config::CatalogEntry;
use nearer_common::PlaybackStatus;
use nearer_server::playback::{
    notification_channel, Broadcaster, NativePlayer, NotificationReceiver, QueueManager,
    QueueOptions, SimulatedPlayer,
};
use nearer_server::resolver::CatalogResolver;
use std::sync::Arc;
use std::time::Duration;

fn entry(key: &str, duration: u64) -> CatalogEntry {
    CatalogEntry {
        key: key.to_string(),
        url: format!("file:///music/{}.flac", key),
        title: key.to_string(),
        duration,
        thumb: String::new(),
        thumb_big: String::new(),
    }
}

struct Rig {
    manager: Arc<QueueManager>,
    player: Arc<SimulatedPlayer>,
    broadcaster: Arc<RecordingBroadcaster>,
    notifications: NotificationReceiver,
}

/// Manager wired to a live player, pump not yet running
fn rig() -> Rig {
    let catalog = [entry("blip", 0), entry("long", 600)];
    let (tx, notifications) = notification_channel();
    let player = Arc::new(SimulatedPlayer::spawn(tx).unwrap());
    let broadcaster = Arc::new(RecordingBroadcaster::default());
    let manager = Arc::new(QueueManager::new(
        Arc::clone(&player) as Arc<dyn NativePlayer>,
        Arc::new(CatalogResolver::new(&catalog, None)),
        Arc::clone(&broadcaster) as Arc<dyn Broadcaster>,
        QueueOptions::default(),
    ));
    Rig {
        manager,
        player,
        broadcaster,
        notifications,
    }
}

fn start() -> (Arc<QueueManager>, Arc<RecordingBroadcaster>) {
    let rig = rig();
    tokio::spawn(Arc::clone(&rig.manager).run_notifications(rig.notifications));
    (rig.manager, rig.broadcaster)
}

async fn wait_for_status(manager: &QueueManager, expected: PlaybackStatus) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while manager.status().await != expected {
        assert!(
            tokio::time::Instant::now() < deadline,
            "status never became {}",
            expected
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn test_short_track_plays_out_and_stops() {
    let (manager, broadcaster) = start();

    manager.add("alice", "blip").await.unwrap();
    wait_for_status(&manager, PlaybackStatus::Stopped).await;

    let snapshot = manager.init_snapshot().await;
    assert_eq!(snapshot.current_song_idx, -1);
    assert_eq!(snapshot.songs.len(), 1);
    assert_eq!(broadcaster.names(), vec!["added", "status", "ended"]);
}

#[tokio::test]
async fn test_pause_round_trip_through_player() {
    let (manager, _broadcaster) = start();

    manager.add("alice", "long").await.unwrap();
    wait_for_status(&manager, PlaybackStatus::Playing).await;

    manager.toggle_pause("alice");
    wait_for_status(&manager, PlaybackStatus::Paused).await;

    manager.toggle_pause("alice");
    wait_for_status(&manager, PlaybackStatus::Playing).await;
    assert_eq!(manager.query_progress().duration, Duration::from_secs(600));
}

#[tokio::test]
async fn test_skip_to_queued_track() {
    let (manager, _broadcaster) = start();

    manager.add("alice", "long").await.unwrap();
    manager.add("bob", "long").await.unwrap();
    wait_for_status(&manager, PlaybackStatus::Playing).await;

    assert!(manager.skip("alice").await);
    wait_for_status(&manager, PlaybackStatus::Playing).await;
    assert_eq!(manager.init_snapshot().await.current_song_idx, 0);

    assert!(manager.skip("alice").await);
    wait_for_status(&manager, PlaybackStatus::Stopped).await;
}

#[tokio::test]
async fn test_skip_racing_natural_end_keeps_player_in_step() {
    let rig = rig();
    let manager = rig.manager;

    manager.add("alice", "blip").await.unwrap();
    manager.add("alice", "long").await.unwrap();
    manager.add("alice", "long").await.unwrap();

    // The player finishes blip and starts the first long track before the
    // pump has seen any of it
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(rig.player.duration(), Duration::from_secs(600));

    assert!(manager.skip("bob").await);
    tokio::spawn(Arc::clone(&manager).run_notifications(rig.notifications));
    wait_for_status(&manager, PlaybackStatus::Playing).await;
    assert_eq!(manager.init_snapshot().await.current_song_idx, 1);
    assert_eq!(rig.player.duration(), Duration::from_secs(600));

    assert!(manager.skip("bob").await);
    wait_for_status(&manager, PlaybackStatus::Playing).await;
    let snapshot = manager.init_snapshot().await;
    assert_eq!(snapshot.current_song_idx, 0);
    assert_eq!(snapshot.length, 600_000);
    assert!(rig.player.elapsed() < Duration::from_secs(1));

    assert!(manager.skip("bob").await);
    wait_for_status(&manager, PlaybackStatus::Stopped).await;
    assert_eq!(rig.player.duration(), Duration::ZERO);
}
