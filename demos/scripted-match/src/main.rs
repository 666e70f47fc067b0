//! A scripted four-bot match against the gateway, printed to stdout.
//!
//! No network transport: each bot is just an event channel plus intents.
//! The Mantri bot guesses at random, so expect a mix of catches and
//! escapes across the rounds.

use durbar::protocol::{ClientIntent, PlayerId, Role, RoomId, ServerEvent};
use durbar::{GameConfig, Gateway, RegistryConfig};
use rand::prelude::IndexedRandom;
use tokio::sync::mpsc;

type EventRx = mpsc::UnboundedReceiver<ServerEvent>;

const BOTS: [(u64, &str); 4] = [(1, "asha"), (2, "bina"), (3, "chand"), (4, "dev")];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    durbar::telemetry::init();

    let gateway = Gateway::new(
        RegistryConfig::default(),
        GameConfig {
            max_rounds: 3,
            start_countdown_secs: 2,
            next_round_countdown_secs: 1,
            round_secs: 10,
        },
    );

    // Connect the bots and seat them in one room.
    let mut receivers: Vec<(PlayerId, EventRx)> = Vec::new();
    for (id, name) in BOTS {
        let (tx, rx) = mpsc::unbounded_channel();
        gateway.connect(PlayerId(id), name, tx).await?;
        receivers.push((PlayerId(id), rx));
    }

    let ack = gateway
        .handle_intent(
            PlayerId(1),
            ClientIntent::CreateRoom {
                password: None,
                max_players: 4,
            },
        )
        .await;
    let code = ack.data["room"]["roomId"].as_str().unwrap_or_default();
    let room_id = RoomId(code.to_owned());
    println!("room {room_id} created");

    for (id, _) in &receivers[1..] {
        gateway
            .handle_intent(
                *id,
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

    // Each round: learn the cards, let the Mantri guess someone at random.
    println!("--- round 1 ---");
    loop {
        let mut mantri = None;
        for (id, rx) in receivers.iter_mut() {
            let card = next_card(rx).await;
            println!("  {id} holds {card}");
            if card == Role::Mantri {
                mantri = Some(*id);
            }
        }
        let mantri = mantri.expect("every round deals a Mantri");
        let others: Vec<PlayerId> = receivers
            .iter()
            .map(|(id, _)| *id)
            .filter(|id| *id != mantri)
            .collect();
        let target = *others.choose(&mut rand::rng()).expect("three suspects");
        println!("{mantri} (Mantri) accuses {target}");

        gateway
            .handle_intent(
                mantri,
                ClientIntent::MakeGuess {
                    guessed_player_id: target,
                },
            )
            .await;

        if report_round(&mut receivers[0].1).await {
            break;
        }
    }
    Ok(())
}

async fn next_card(rx: &mut EventRx) -> Role {
    loop {
        if let Some(ServerEvent::YourCard { card, .. }) = rx.recv().await {
            return card;
        }
    }
}

/// Prints the round outcome; returns `true` once the game is over.
async fn report_round(rx: &mut EventRx) -> bool {
    loop {
        match rx.recv().await {
            Some(ServerEvent::GuessResult {
                is_correct,
                chor_player,
                ..
            }) => {
                if is_correct {
                    println!("caught! {} was the Chor", chor_player.name);
                } else {
                    println!("wrong, {} walks free with 800", chor_player.name);
                }
            }
            Some(ServerEvent::GameFinished { results }) => {
                println!("--- final standings ---");
                for ranked in &results.rankings {
                    println!("  #{} {} with {}", ranked.rank + 1, ranked.name, ranked.score);
                }
                return true;
            }
            Some(ServerEvent::NextRoundActuallyStarted { current_round, .. }) => {
                println!("--- round {current_round} ---");
                return false;
            }
            Some(_) => {}
            None => return true,
        }
    }
}
