use crate::error::EngineError;
use core::fmt;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 10;

/// Fixed clockwise index of a chair at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seat(u8);

impl Seat {
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    pub fn from_index(index: usize) -> Option<Self> {
        (index < MAX_PLAYERS).then(|| Self(index as u8))
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seat {}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub seat: Seat,
    pub active: bool,
    /// Round in which the player was eliminated, if any.
    pub eliminated_in: Option<u32>,
}

/// The table for a whole game. Seats never move; elimination only clears the active bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seating {
    players: Vec<Player>,
}

impl Seating {
    pub fn from_roster(roster: Vec<PlayerId>) -> Result<Self, EngineError> {
        let count = roster.len();
        let invalid = |reason: &str| EngineError::InvalidRoster {
            count,
            reason: reason.to_string(),
        };

        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&count) {
            return Err(invalid("a table seats between 2 and 10 players"));
        }
        if roster.iter().any(|id| id.as_str().trim().is_empty()) {
            return Err(invalid("player ids must not be empty"));
        }
        let mut seen = HashSet::new();
        if !roster.iter().all(|id| seen.insert(id.clone())) {
            return Err(invalid("player ids must be unique"));
        }

        let players = roster
            .into_iter()
            .enumerate()
            .map(|(index, id)| Player {
                id,
                seat: Seat::new(index as u8),
                active: true,
                eliminated_in: None,
            })
            .collect();
        Ok(Self { players })
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn player(&self, seat: Seat) -> Option<&Player> {
        self.players.get(seat.index())
    }

    pub fn seat_of(&self, id: &PlayerId) -> Option<Seat> {
        self.players
            .iter()
            .find(|player| &player.id == id)
            .map(|player| player.seat)
    }

    pub fn is_active(&self, seat: Seat) -> bool {
        self.player(seat).is_some_and(|player| player.active)
    }

    pub fn active_flags(&self) -> Vec<bool> {
        self.players.iter().map(|player| player.active).collect()
    }

    pub fn active_count(&self) -> usize {
        self.players.iter().filter(|player| player.active).count()
    }

    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|player| player.active)
    }

    /// Active seats clockwise, beginning with the first active seat after `dealer` and
    /// ending with `dealer` itself when it is active.
    pub fn rotation_after(&self, dealer: Seat) -> Vec<Seat> {
        let flags = self.active_flags();
        let seats = flags.len();
        (1..=seats)
            .map(|offset| (dealer.index() + offset) % seats)
            .filter(|&index| flags[index])
            .map(|index| Seat::new(index as u8))
            .collect()
    }

    pub fn next_active_after(&self, seat: Seat) -> Option<Seat> {
        next_active_clockwise(seat, &self.active_flags())
    }

    pub fn eliminate(&mut self, seat: Seat, round_index: u32) {
        if let Some(player) = self.players.get_mut(seat.index()) {
            if player.active {
                player.active = false;
                player.eliminated_in = Some(round_index);
            }
        }
    }
}

/// First active seat strictly clockwise of `from`, wrapping back to `from` itself last.
pub fn next_active_clockwise(from: Seat, active: &[bool]) -> Option<Seat> {
    let seats = active.len();
    if seats == 0 {
        return None;
    }
    (1..=seats)
        .map(|offset| (from.index() + offset) % seats)
        .find(|&index| active[index])
        .map(|index| Seat::new(index as u8))
}
