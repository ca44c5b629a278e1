//! Network Layer
//!
//! WebSocket server for real-time PvP matches.
//! This layer is **non-deterministic** - all board logic runs through `game/`.

pub mod coordinator;
pub mod protocol;
pub mod server;

pub use coordinator::{MatchCommand, MatchError, MatchRegistry, PvpMatch, RegistryConfig};
pub use protocol::{
    Block, ClientMessage, MatchId, PlayerId, ServerMessage, StateAction, WireError,
};
pub use server::{ConnectionId, PvpServer, PvpServerError, ServerConfig};
