//! Seated players and the display-name rules they must satisfy.

use std::time::{SystemTime, UNIX_EPOCH};

use durbar_protocol::{PlayerId, PlayerView};

use crate::error::RoomError;

const NAME_MAX_LEN: usize = 20;

/// A player seated in a room.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub is_creator: bool,
    pub games_played: u32,
    /// Epoch milliseconds at the moment of joining.
    pub joined_at: u64,
}

impl Player {
    pub fn new(id: PlayerId, name: &str, is_creator: bool) -> Result<Self, RoomError> {
        Ok(Self {
            id,
            name: validate_name(name)?,
            is_creator,
            games_played: 0,
            joined_at: epoch_ms(),
        })
    }

    pub fn to_view(&self) -> PlayerView {
        PlayerView {
            id: self.id,
            name: self.name.clone(),
            is_creator: self.is_creator,
            games_played: self.games_played,
            joined_at: self.joined_at,
        }
    }
}

/// Normalises a display name: trimmed, markup stripped, 1 to 20 characters.
pub fn validate_name(raw: &str) -> Result<String, RoomError> {
    let name: String = raw.trim().chars().filter(|c| !matches!(c, '<' | '>')).collect();
    if name.is_empty() {
        return Err(RoomError::InvalidName("name is empty".into()));
    }
    if name.chars().count() > NAME_MAX_LEN {
        return Err(RoomError::InvalidName(format!(
            "name exceeds {NAME_MAX_LEN} characters"
        )));
    }
    Ok(name)
}

/// Milliseconds since the Unix epoch, for wire timestamps.
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
