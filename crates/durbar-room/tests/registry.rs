//! Registry behaviour: creation, membership bookkeeping, listing, and the
//! stale-room sweep.

use std::time::Duration;

use durbar_game::GameConfig;
use durbar_protocol::{ErrorKind, PlayerId, RoomFilter, RoomId, RoomState, ServerEvent};
use durbar_room::{EventSender, Player, Registry, RegistryConfig, RoomError};
use tokio::sync::mpsc;

fn channel() -> (EventSender, mpsc::UnboundedReceiver<ServerEvent>) {
    mpsc::unbounded_channel()
}

fn player(id: u64, name: &str) -> Player {
    Player::new(PlayerId(id), name, id == 1).unwrap()
}

fn registry() -> Registry {
    Registry::new(RegistryConfig::default(), GameConfig::default())
}

// ===========================================================================
// Creation
// ===========================================================================

#[tokio::test]
async fn test_create_room_seats_the_creator() {
    let mut registry = registry();
    let (tx, _rx) = channel();

    let view = registry
        .create_room(player(1, "asha"), tx, None, 4)
        .await
        .unwrap();

    assert_eq!(view.player_count, 1);
    assert_eq!(view.state, RoomState::Waiting);
    assert!(view.players[0].is_creator);
    assert_eq!(view.room_id.as_str().len(), 6);
    assert!(registry.room_of(PlayerId(1)).is_some());
}

#[tokio::test]
async fn test_create_while_already_in_a_room() {
    let mut registry = registry();
    let (tx, _rx) = channel();
    registry
        .create_room(player(1, "asha"), tx.clone(), None, 4)
        .await
        .unwrap();

    let err = registry
        .create_room(player(1, "asha"), tx, None, 4)
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::AlreadyInRoom(PlayerId(1))));
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_create_rejects_bad_room_size() {
    let mut registry = registry();
    let (tx, _rx) = channel();
    let err = registry
        .create_room(player(1, "asha"), tx, None, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::InvalidMaxPlayers(1)));
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_create_rejects_oversized_room() {
    // Four players exactly; a bigger room could never start a game.
    let mut registry = registry();
    let (tx, _rx) = channel();
    let err = registry
        .create_room(player(1, "asha"), tx, None, 8)
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::InvalidMaxPlayers(8)));
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_room_limit_enforced() {
    let config = RegistryConfig {
        max_rooms: 2,
        ..RegistryConfig::default()
    };
    let mut registry = Registry::new(config, GameConfig::default());
    for id in 1..=2 {
        let (tx, _rx) = channel();
        registry
            .create_room(player(id, &format!("p{id}")), tx, None, 4)
            .await
            .unwrap();
    }

    let (tx, _rx) = channel();
    let err = registry
        .create_room(player(3, "p3"), tx, None, 4)
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::ServerFull));
    assert_eq!(err.kind(), ErrorKind::Capacity);
}

// ===========================================================================
// Joining and leaving
// ===========================================================================

#[tokio::test]
async fn test_join_broadcasts_player_joined() {
    let mut registry = registry();
    let (creator_tx, mut creator_rx) = channel();
    let view = registry
        .create_room(player(1, "asha"), creator_tx, None, 4)
        .await
        .unwrap();

    let (tx, _rx) = channel();
    let joined = registry
        .join_room(&view.room_id, player(2, "bina"), None, tx)
        .await
        .unwrap();
    assert_eq!(joined.player_count, 2);

    let ServerEvent::PlayerJoined { player, room } = creator_rx.recv().await.unwrap() else {
        panic!("expected playerJoined");
    };
    assert_eq!(player.id, PlayerId(2));
    assert_eq!(room.player_count, 2);
}

#[tokio::test]
async fn test_join_distinguishes_own_room_from_another() {
    let mut registry = registry();
    let (tx, _rx) = channel();
    let own = registry
        .create_room(player(1, "asha"), tx, None, 4)
        .await
        .unwrap();
    let (tx, _rx) = channel();
    let other = registry
        .create_room(player(2, "bina"), tx, None, 4)
        .await
        .unwrap();

    // Re-joining the room the player already occupies.
    let (tx, _rx) = channel();
    let err = registry
        .join_room(&own.room_id, player(1, "asha"), None, tx)
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::AlreadyInThisRoom(PlayerId(1))));
    assert_eq!(err.to_string(), "player P-1 is already in this room");

    // Joining a second room while seated elsewhere.
    let (tx, _rx) = channel();
    let err = registry
        .join_room(&other.room_id, player(1, "asha"), None, tx)
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::AlreadyInRoom(PlayerId(1))));
    assert_eq!(err.to_string(), "player P-1 is already in a room");
}

#[tokio::test]
async fn test_join_unknown_room() {
    let mut registry = registry();
    let (tx, _rx) = channel();
    let err = registry
        .join_room(&RoomId("QQQQQQ".into()), player(1, "asha"), None, tx)
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::NotFound(_)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_join_with_wrong_password() {
    let mut registry = registry();
    let (tx, _rx) = channel();
    let view = registry
        .create_room(player(1, "asha"), tx, Some("sesame".into()), 4)
        .await
        .unwrap();
    assert!(view.has_password);

    let (tx, _rx) = channel();
    let err = registry
        .join_room(&view.room_id, player(2, "bina"), Some("wrong".into()), tx)
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::WrongPassword));
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    // The failed joiner must not appear in the reverse index.
    assert!(registry.room_of(PlayerId(2)).is_none());
}

#[tokio::test]
async fn test_join_duplicate_name_rejected() {
    let mut registry = registry();
    let (tx, _rx) = channel();
    let view = registry
        .create_room(player(1, "asha"), tx, None, 4)
        .await
        .unwrap();

    let (tx, _rx) = channel();
    let err = registry
        .join_room(&view.room_id, player(2, "Asha"), None, tx)
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::DuplicateName(_)));
    assert!(registry.room_of(PlayerId(2)).is_none());
}

#[tokio::test]
async fn test_join_full_room() {
    let mut registry = registry();
    let (tx, _rx) = channel();
    let view = registry
        .create_room(player(1, "p1"), tx, None, 4)
        .await
        .unwrap();
    for id in 2..=4 {
        let (tx, _rx) = channel();
        registry
            .join_room(&view.room_id, player(id, &format!("p{id}")), None, tx)
            .await
            .unwrap();
    }

    let (tx, _rx) = channel();
    let err = registry
        .join_room(&view.room_id, player(5, "p5"), None, tx)
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::RoomFull));
    assert_eq!(err.kind(), ErrorKind::Capacity);
}

#[tokio::test]
async fn test_leave_promotes_and_notifies() {
    let mut registry = registry();
    let (tx1, _rx1) = channel();
    let view = registry
        .create_room(player(1, "asha"), tx1, None, 4)
        .await
        .unwrap();
    let (tx2, mut rx2) = channel();
    registry
        .join_room(&view.room_id, player(2, "bina"), None, tx2)
        .await
        .unwrap();

    let (room_id, deleted) = registry.leave(PlayerId(1)).await.unwrap();
    assert_eq!(room_id, view.room_id);
    assert!(!deleted);

    let ServerEvent::PlayerLeft {
        player_id,
        room,
        was_creator,
    } = rx2.recv().await.unwrap()
    else {
        panic!("expected playerLeft");
    };
    assert_eq!(player_id, PlayerId(1));
    assert!(was_creator);
    assert!(room.players[0].is_creator, "bina inherits the room");
    assert!(registry.room_of(PlayerId(1)).is_none());
}

#[tokio::test]
async fn test_last_leave_deletes_the_room() {
    let mut registry = registry();
    let (tx, _rx) = channel();
    let view = registry
        .create_room(player(1, "asha"), tx, None, 4)
        .await
        .unwrap();

    let (room_id, deleted) = registry.leave(PlayerId(1)).await.unwrap();
    assert_eq!(room_id, view.room_id);
    assert!(deleted);
    assert!(registry.get(&view.room_id).is_none());

    // The code is free again.
    let err = registry.leave(PlayerId(1)).await.unwrap_err();
    assert!(matches!(err, RoomError::NotInAnyRoom(PlayerId(1))));
}

// ===========================================================================
// Listing and stats
// ===========================================================================

#[tokio::test]
async fn test_list_rooms_joinable_filter() {
    let mut registry = registry();
    let (tx, _rx) = channel();
    let open = registry
        .create_room(player(1, "p1"), tx, None, 4)
        .await
        .unwrap();

    // A second room, filled to capacity.
    let (tx, _rx) = channel();
    let full = registry
        .create_room(player(10, "q1"), tx, None, 4)
        .await
        .unwrap();
    for id in 11..=13 {
        let (tx, _rx) = channel();
        registry
            .join_room(&full.room_id, player(id, &format!("q{id}")), None, tx)
            .await
            .unwrap();
    }

    let all = registry.list_rooms(RoomFilter::default()).await;
    assert_eq!(all.len(), 2);

    let joinable = registry
        .list_rooms(RoomFilter { joinable_only: true })
        .await;
    assert_eq!(joinable.len(), 1);
    assert_eq!(joinable[0].room_id, open.room_id);
}

#[tokio::test]
async fn test_stats_counts_rooms_and_players() {
    let mut registry = registry();
    let (tx, _rx) = channel();
    let view = registry
        .create_room(player(1, "p1"), tx, None, 4)
        .await
        .unwrap();
    let (tx, _rx) = channel();
    registry
        .join_room(&view.room_id, player(2, "p2"), None, tx)
        .await
        .unwrap();

    let stats = registry.stats().await;
    assert_eq!(stats.rooms, 1);
    assert_eq!(stats.players, 2);
    assert_eq!(stats.rooms_waiting, 1);
    assert_eq!(stats.rooms_playing, 0);
}

// ===========================================================================
// Housekeeping
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn test_sweep_deletes_idle_rooms() {
    let config = RegistryConfig {
        stale_after: Duration::from_secs(60),
        ..RegistryConfig::default()
    };
    let mut registry = Registry::new(config, GameConfig::default());
    let (tx, _rx) = channel();
    let view = registry
        .create_room(player(1, "asha"), tx, None, 4)
        .await
        .unwrap();

    // Fresh room survives a sweep.
    assert!(registry.sweep_stale().await.is_empty());

    tokio::time::advance(Duration::from_secs(61)).await;
    let swept = registry.sweep_stale().await;
    assert_eq!(swept, vec![view.room_id.clone()]);
    assert!(registry.get(&view.room_id).is_none());
    assert!(
        registry.room_of(PlayerId(1)).is_none(),
        "reverse index cleaned with the room"
    );
}
