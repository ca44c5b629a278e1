//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket. Every
//! message is a JSON object with a snake_case `type` tag; payload keys
//! stay camelCase for compatibility with existing clients.

use std::fmt;

use serde::{Serialize, Deserialize};

use crate::ErrorKind;

// =============================================================================
// IDENTIFIERS AND BLOCKS
// =============================================================================

/// Client-chosen match identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub String);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client-chosen player identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind tag targets are rolled with; the only kind that can win.
pub const BLOCK_KIND_TILE: &str = "block";

/// A block as clients report it: kind tag plus power-of-two level.
///
/// A level-11 block is the 2048 tile. Winning requires exact equality
/// with the match target, kind and level both. The kind stays a free
/// string so unrecognized reports relay verbatim instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Kind tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// Power-of-two level.
    pub level: u32,
}

impl Block {
    /// A plain tile block of the given level.
    pub fn tile(level: u32) -> Self {
        Self { kind: BLOCK_KIND_TILE.to_string(), level }
    }
}

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join a match; the match is created on first join.
    JoinMatch(JoinMatch),

    /// Ask the coordinator to assign a target and start the match.
    StartMatch(StartMatch),

    /// Report a block produced by a local merge.
    CreatedBlock(CreatedBlock),
}

/// Join request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinMatch {
    /// Match to join.
    pub match_id: MatchId,
    /// Joining player.
    pub user_id: PlayerId,
}

/// Start request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartMatch {
    /// Match to start.
    pub match_id: MatchId,
}

/// Block report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBlock {
    /// Match the block belongs to.
    pub match_id: MatchId,
    /// Reporting player.
    pub user_id: PlayerId,
    /// The block a merge produced.
    pub block: Block,
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Roster snapshot, broadcast after every join.
    PlayerList(PlayerList),

    /// Target assigned; the race is on.
    MatchStarted(MatchStarted),

    /// Another participant produced a block.
    StateUpdate(StateUpdate),

    /// A participant reached the target; the match is over.
    MatchEnd(MatchEnd),

    /// Request-scoped failure.
    Error(WireError),
}

/// Current roster of a match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerList {
    /// Every registered player, connected or not.
    pub players: Vec<PlayerId>,
}

/// Start notification with the rolled target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchStarted {
    /// The block every participant races toward.
    pub target_block: Block,
}

/// Relay of another participant's action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateUpdate {
    /// Player the action originated from.
    pub from: PlayerId,
    /// What they did.
    pub action: StateAction,
}

/// Actions carried inside a state update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateAction {
    /// The sender merged a new block.
    CreatedBlock {
        /// The block they produced.
        block: Block,
    },
}

/// Match-over notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchEnd {
    /// Player who reached the target.
    pub winner: PlayerId,
    /// Why the match ended.
    pub reason: EndReason,
    /// The target that was reached.
    pub target: Block,
}

/// Why a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The winner produced the target block.
    TargetBlock,
}

/// Error event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireError {
    /// Error classification.
    pub code: ErrorKind,
    /// Human-readable message.
    pub message: String,
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
