//! Gateway scenarios: the full intent surface, lobby broadcasts, failure
//! acks, and the background sweep. Paused-clock tests auto-advance
//! through every countdown.

use std::sync::Arc;
use std::time::Duration;

use durbar::protocol::{
    Ack, ClientIntent, PlayerId, Role, RoomFilter, RoomId, ServerEvent,
};
use durbar::{GameConfig, Gateway, RegistryConfig};
use tokio::sync::mpsc;

type EventRx = mpsc::UnboundedReceiver<ServerEvent>;

fn gateway() -> Arc<Gateway> {
    Gateway::new(RegistryConfig::default(), GameConfig::default())
}

/// One-round games keep the end-to-end tests short.
fn quick_gateway() -> Arc<Gateway> {
    Gateway::new(
        RegistryConfig::default(),
        GameConfig {
            max_rounds: 1,
            start_countdown_secs: 1,
            next_round_countdown_secs: 1,
            round_secs: 5,
        },
    )
}

async fn connect(gateway: &Arc<Gateway>, id: u64, name: &str) -> EventRx {
    let (tx, rx) = mpsc::unbounded_channel();
    gateway.connect(PlayerId(id), name, tx).await.unwrap();
    rx
}

async fn wait_for<T>(rx: &mut EventRx, mut pick: impl FnMut(&ServerEvent) -> Option<T>) -> T {
    loop {
        let event = rx.recv().await.expect("event channel closed");
        if let Some(value) = pick(&event) {
            return value;
        }
    }
}

fn ack_json(ack: &Ack) -> serde_json::Value {
    serde_json::to_value(ack).unwrap()
}

/// Creates a room as player 1 and returns its id from the ack payload.
async fn create_room(gateway: &Arc<Gateway>) -> RoomId {
    let ack = gateway
        .handle_intent(
            PlayerId(1),
            ClientIntent::CreateRoom {
                password: None,
                max_players: 4,
            },
        )
        .await;
    assert!(ack.success, "create failed: {:?}", ack.error);
    let json = ack_json(&ack);
    RoomId(json["room"]["roomId"].as_str().unwrap().to_owned())
}

// ===========================================================================
// Connection and failure acks
// ===========================================================================

#[tokio::test]
async fn test_intent_without_connection_fails() {
    let gateway = gateway();
    let ack = gateway
        .handle_intent(PlayerId(9), ClientIntent::GetRoomState)
        .await;
    assert!(!ack.success);
    assert_eq!(ack.error.as_deref(), Some("not connected"));
    assert_eq!(ack_json(&ack)["kind"], "forbidden");
}

#[tokio::test]
async fn test_failure_ack_carries_error_kind() {
    let gateway = gateway();
    let _rx = connect(&gateway, 1, "asha").await;

    let ack = gateway
        .handle_intent(PlayerId(1), ClientIntent::StartGame)
        .await;
    assert!(!ack.success);
    assert_eq!(ack_json(&ack)["kind"], "notFound");

    let ack = gateway
        .handle_intent(
            PlayerId(1),
            ClientIntent::JoinRoom {
                room_id: RoomId("ZZZZZZ".into()),
                password: None,
            },
        )
        .await;
    assert!(!ack.success);
    assert_eq!(ack_json(&ack)["kind"], "notFound");
}

#[tokio::test]
async fn test_rejected_name_at_connect() {
    let gateway = gateway();
    let (tx, _rx) = mpsc::unbounded_channel();
    let err = gateway.connect(PlayerId(1), "   ", tx).await.unwrap_err();
    assert_eq!(err.kind(), durbar::protocol::ErrorKind::Validation);
}

// ===========================================================================
// Lobby flow
// ===========================================================================

#[tokio::test]
async fn test_create_room_acks_and_updates_the_lobby() {
    let gateway = gateway();
    let _rx1 = connect(&gateway, 1, "asha").await;
    let mut rx2 = connect(&gateway, 2, "bina").await;

    let room_id = create_room(&gateway).await;
    assert_eq!(room_id.as_str().len(), 6);

    let rooms = wait_for(&mut rx2, |e| match e {
        ServerEvent::RoomListUpdated { rooms } => Some(rooms.clone()),
        _ => None,
    })
    .await;
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].room_id, room_id);
    assert_eq!(rooms[0].player_count, 1);
}

#[tokio::test]
async fn test_last_leave_broadcasts_room_deleted() {
    let gateway = gateway();
    let _rx1 = connect(&gateway, 1, "asha").await;
    let mut rx2 = connect(&gateway, 2, "bina").await;
    let room_id = create_room(&gateway).await;

    let ack = gateway
        .handle_intent(PlayerId(1), ClientIntent::LeaveRoom)
        .await;
    assert!(ack.success);

    let deleted = wait_for(&mut rx2, |e| match e {
        ServerEvent::RoomDeleted { room_id } => Some(room_id.clone()),
        _ => None,
    })
    .await;
    assert_eq!(deleted, room_id);

    let ack = gateway
        .handle_intent(PlayerId(2), ClientIntent::GetRooms {
            filters: RoomFilter::default(),
        })
        .await;
    assert_eq!(ack_json(&ack)["rooms"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_disconnect_leaves_the_room() {
    let gateway = gateway();
    let _rx1 = connect(&gateway, 1, "asha").await;
    let mut rx2 = connect(&gateway, 2, "bina").await;
    let room_id = create_room(&gateway).await;

    let ack = gateway
        .handle_intent(
            PlayerId(2),
            ClientIntent::JoinRoom {
                room_id: room_id.clone(),
                password: None,
            },
        )
        .await;
    assert!(ack.success);

    gateway.disconnect(PlayerId(1)).await;
    let (left, was_creator) = wait_for(&mut rx2, |e| match e {
        ServerEvent::PlayerLeft {
            player_id,
            was_creator,
            ..
        } => Some((*player_id, *was_creator)),
        _ => None,
    })
    .await;
    assert_eq!(left, PlayerId(1));
    assert!(was_creator);

    // The survivor keeps their seat and the room stays queryable.
    let ack = gateway
        .handle_intent(PlayerId(2), ClientIntent::GetRoomState)
        .await;
    assert!(ack.success);
}

#[tokio::test]
async fn test_server_stats_payload() {
    let gateway = gateway();
    let _rx1 = connect(&gateway, 1, "asha").await;
    create_room(&gateway).await;

    let ack = gateway
        .handle_intent(PlayerId(1), ClientIntent::GetServerStats)
        .await;
    let json = ack_json(&ack);
    assert_eq!(json["stats"]["rooms"], 1);
    assert_eq!(json["stats"]["players"], 1);
    assert_eq!(json["stats"]["roomsWaiting"], 1);
}

// ===========================================================================
// A whole game through the intent surface
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn test_one_round_game_end_to_end() {
    let gateway = quick_gateway();
    let mut receivers = Vec::new();
    for (id, name) in [(1, "asha"), (2, "bina"), (3, "chand"), (4, "dev")] {
        receivers.push((PlayerId(id), connect(&gateway, id, name).await));
    }
    let room_id = create_room(&gateway).await;
    for (id, _) in receivers.iter().skip(1) {
        let ack = gateway
            .handle_intent(
                *id,
                ClientIntent::JoinRoom {
                    room_id: room_id.clone(),
                    password: None,
                },
            )
            .await;
        assert!(ack.success);
    }

    let ack = gateway
        .handle_intent(PlayerId(1), ClientIntent::StartGame)
        .await;
    assert!(ack.success, "start failed: {:?}", ack.error);

    // Each player learns only their own card.
    let mut mantri = None;
    let mut chor = None;
    for (id, rx) in receivers.iter_mut() {
        let card = wait_for(rx, |e| match e {
            ServerEvent::YourCard { card, .. } => Some(*card),
            _ => None,
        })
        .await;
        match card {
            Role::Mantri => mantri = Some(*id),
            Role::Chor => chor = Some(*id),
            _ => {}
        }
    }
    let (mantri, chor) = (mantri.unwrap(), chor.unwrap());

    let ack = gateway
        .handle_intent(
            mantri,
            ClientIntent::MakeGuess {
                guessed_player_id: chor,
            },
        )
        .await;
    assert!(ack.success, "guess failed: {:?}", ack.error);

    // One round, so the game finishes immediately after the reveal.
    let results = wait_for(&mut receivers[0].1, |e| match e {
        ServerEvent::GameFinished { results } => Some(results.clone()),
        _ => None,
    })
    .await;
    assert_eq!(results.rounds_played, 1);
    // Correct guess: Raja 1000, Mantri 800, Sipahi 500, Chor 0.
    assert_eq!(results.winner.as_ref().unwrap().score, 1000);

    let ack = gateway
        .handle_intent(PlayerId(1), ClientIntent::GetResults)
        .await;
    assert!(ack.success);
    assert_eq!(ack_json(&ack)["results"]["roundsPlayed"], 1);

    // Unanimous rematch resets the room.
    for id in 1..=4 {
        let ack = gateway
            .handle_intent(PlayerId(id), ClientIntent::PlayAgainResponse { accepted: true })
            .await;
        assert!(ack.success);
    }
    let players = wait_for(&mut receivers[1].1, |e| match e {
        ServerEvent::GameReset { players } => Some(players.clone()),
        _ => None,
    })
    .await;
    assert!(players.iter().all(|p| p.games_played == 1));

    let ack = gateway
        .handle_intent(PlayerId(1), ClientIntent::GetRoomState)
        .await;
    assert_eq!(ack_json(&ack)["state"]["phase"], "waiting");
}

#[tokio::test(start_paused = true)]
async fn test_round_deadline_through_the_gateway() {
    let gateway = quick_gateway();
    let mut rx1 = connect(&gateway, 1, "asha").await;
    for (id, name) in [(2, "bina"), (3, "chand"), (4, "dev")] {
        let _rx = connect(&gateway, id, name).await;
        // Receivers dropped: these seats just idle through the round.
    }
    let room_id = create_room(&gateway).await;
    for id in 2..=4 {
        gateway
            .handle_intent(
                PlayerId(id),
                ClientIntent::JoinRoom {
                    room_id: room_id.clone(),
                    password: None,
                },
            )
            .await;
    }
    gateway
        .handle_intent(PlayerId(1), ClientIntent::StartGame)
        .await;

    // Nobody guesses; the deadline ends round 1 and the game.
    let mut timed_out = false;
    let results = wait_for(&mut rx1, |e| match e {
        ServerEvent::RoundTimeout { .. } => {
            timed_out = true;
            None
        }
        ServerEvent::GameFinished { results } => Some(results.clone()),
        _ => None,
    })
    .await;
    assert!(timed_out, "the reveal precedes the finish");
    assert_eq!(results.rounds_played, 1);
}

// ===========================================================================
// Housekeeping
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn test_sweeper_deletes_idle_rooms() {
    let gateway = Gateway::new(
        RegistryConfig {
            stale_after: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(30),
            ..RegistryConfig::default()
        },
        GameConfig::default(),
    );
    let _rx1 = connect(&gateway, 1, "asha").await;
    let mut rx2 = connect(&gateway, 2, "bina").await;
    let room_id = create_room(&gateway).await;
    let _sweeper = gateway.spawn_sweeper();

    let deleted = wait_for(&mut rx2, |e| match e {
        ServerEvent::RoomDeleted { room_id } => Some(room_id.clone()),
        _ => None,
    })
    .await;
    assert_eq!(deleted, room_id);

    let ack = gateway
        .handle_intent(PlayerId(2), ClientIntent::GetRooms {
            filters: RoomFilter::default(),
        })
        .await;
    assert!(ack_json(&ack)["rooms"].as_array().unwrap().is_empty());
}
