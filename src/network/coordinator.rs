//! Match Coordination
//!
//! PvP match lifecycle: join, target assignment, block relays, and win
//! declaration. Every live match is owned by exactly one task that
//! consumes typed commands from a bounded queue, so processing for a
//! given match id is strictly serialized while separate matches run
//! concurrently. No lock is ever held across match processing.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, RwLock};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::{ErrorKind, MAX_TARGET_LEVEL};
use crate::core::rng::{derive_match_seed, DeterministicRng};
use crate::network::protocol::{
    Block, EndReason, MatchEnd, MatchId, MatchStarted, PlayerId, PlayerList,
    ServerMessage, StateAction, StateUpdate,
};

/// Commands a match task consumes; one per client event.
#[derive(Debug)]
pub enum MatchCommand {
    /// Register (or re-register) a player with their outbound channel.
    Join {
        /// Joining player.
        player: PlayerId,
        /// Queue to the player's connection.
        sender: mpsc::Sender<ServerMessage>,
    },
    /// Assign a target if none is set yet and announce it.
    Start,
    /// A player reports a freshly merged block.
    ReportBlock {
        /// Reporting player.
        player: PlayerId,
        /// The block they produced.
        block: Block,
    },
    /// Transport-level disconnect; bookkeeping only.
    Disconnect {
        /// The player whose connection dropped.
        player: PlayerId,
    },
}

/// Coordinator errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    /// Start requested for an id nothing ever joined.
    #[error("match {0} does not exist")]
    MatchNotFound(MatchId),

    /// Block report before any target was assigned.
    #[error("match has no active target")]
    NoActiveTarget,
}

impl MatchError {
    /// Classify the error for callers and the wire.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MatchError::MatchNotFound(_) => ErrorKind::NotFound,
            MatchError::NoActiveTarget => ErrorKind::IllegalState,
        }
    }
}

/// A player registered in a match.
#[derive(Debug)]
struct MatchPlayer {
    /// Outbound queue to this player's connection.
    sender: mpsc::Sender<ServerMessage>,
    /// Whether the transport is currently up.
    connected: bool,
}

/// What a valid block report amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The block equals the target; the reporter wins.
    Winner,
    /// An ordinary block; relay it to the other participants.
    Relay,
}

/// State of one PvP match, owned by its task.
///
/// Synchronous by itself; all concurrency lives in the owning task and
/// the registry around it.
pub struct PvpMatch {
    /// Match identifier.
    pub id: MatchId,
    /// Registered players in id order. Disconnected players stay
    /// registered; a re-join replaces the outbound channel.
    players: BTreeMap<PlayerId, MatchPlayer>,
    /// Rolled target; `None` until the match is started.
    target: Option<Block>,
    /// Randomness for target selection.
    rng: DeterministicRng,
    /// When the record was created.
    created_at: DateTime<Utc>,
    /// When the target was assigned.
    started_at: Option<DateTime<Utc>>,
}

impl PvpMatch {
    /// Create a match record, seeding target selection from the match id
    /// and creation time.
    pub fn new(id: MatchId) -> Self {
        let entropy = Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64;
        let seed = derive_match_seed(&id.0, entropy);
        debug!("match {} rng seed {}", id, hex::encode(seed.to_le_bytes()));
        Self::with_seed(id, seed)
    }

    /// Create a match record with an explicit seed.
    pub fn with_seed(id: MatchId, seed: u64) -> Self {
        Self {
            id,
            players: BTreeMap::new(),
            target: None,
            rng: DeterministicRng::new(seed),
            created_at: Utc::now(),
            started_at: None,
        }
    }

    /// Register a player, replacing any previous registration under the
    /// same id (a re-join swaps in the new channel). Returns the full
    /// roster for the `player_list` broadcast.
    pub fn join(&mut self, player: PlayerId, sender: mpsc::Sender<ServerMessage>) -> PlayerList {
        self.players.insert(player, MatchPlayer { sender, connected: true });
        PlayerList { players: self.players.keys().cloned().collect() }
    }

    /// Roll the target if none is assigned yet.
    ///
    /// Returns the fresh target, or `None` when the match was already
    /// started (starting is idempotent).
    pub fn start(&mut self) -> Option<Block> {
        if self.target.is_some() {
            return None;
        }
        let level = self.rng.next_int_range(1, MAX_TARGET_LEVEL as i32) as u32;
        let target = Block::tile(level);
        self.target = Some(target.clone());
        self.started_at = Some(Utc::now());
        Some(target)
    }

    /// Judge a block report against the target.
    ///
    /// Winning requires exact kind-and-level equality. Without an active
    /// target the report is invalid and the caller drops it silently.
    pub fn report_block(&self, block: &Block) -> Result<ReportOutcome, MatchError> {
        let target = self.target.as_ref().ok_or(MatchError::NoActiveTarget)?;
        if block == target {
            Ok(ReportOutcome::Winner)
        } else {
            Ok(ReportOutcome::Relay)
        }
    }

    /// Mark a player's transport as down. The registration stays; no
    /// forfeit, no broadcast. Returns whether the player was known.
    pub fn mark_disconnected(&mut self, player: &PlayerId) -> bool {
        match self.players.get_mut(player) {
            Some(p) => {
                p.connected = false;
                true
            }
            None => false,
        }
    }

    /// Send a message to every connected participant.
    ///
    /// Fire and forget: a full or closed queue drops that participant's
    /// copy instead of blocking the match.
    pub fn broadcast(&self, message: ServerMessage) {
        for (id, player) in &self.players {
            if !player.connected {
                continue;
            }
            if let Err(err) = player.sender.try_send(message.clone()) {
                debug!("match {}: dropping message for {}: {}", self.id, id, err);
            }
        }
    }

    /// Send a message to every connected participant except one.
    pub fn broadcast_except(&self, skip: &PlayerId, message: ServerMessage) {
        for (id, player) in &self.players {
            if id == skip || !player.connected {
                continue;
            }
            if let Err(err) = player.sender.try_send(message.clone()) {
                debug!("match {}: dropping message for {}: {}", self.id, id, err);
            }
        }
    }

    /// Number of registered players, connected or not.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Whether a registered player currently has a live transport.
    pub fn is_connected(&self, player: &PlayerId) -> bool {
        self.players.get(player).map_or(false, |p| p.connected)
    }

    /// The active target, if the match was started.
    pub fn target(&self) -> Option<&Block> {
        self.target.as_ref()
    }
}

// =============================================================================
// MATCH TASK
// =============================================================================

/// Own a match until it ends: consume commands in arrival order, then
/// evict the registry entry.
///
/// Eviction happens before the final broadcast, so events referencing
/// this match id after a win land on a fresh, unstarted match.
async fn run_match(
    mut pvp: PvpMatch,
    mut commands: mpsc::Receiver<MatchCommand>,
    registry: Arc<MatchRegistry>,
) {
    let idle_limit = registry.config.idle_timeout;
    debug!("match {} task running", pvp.id);

    loop {
        let command = match idle_limit {
            Some(limit) => match timeout(limit, commands.recv()).await {
                Ok(cmd) => cmd,
                Err(_) => {
                    info!("match {} idle for {:?}, evicting", pvp.id, limit);
                    break;
                }
            },
            None => commands.recv().await,
        };
        let Some(command) = command else {
            // Registry handle dropped; shut down.
            break;
        };

        match command {
            MatchCommand::Join { player, sender } => {
                debug!("player {} joined match {}", player, pvp.id);
                let roster = pvp.join(player, sender);
                pvp.broadcast(ServerMessage::PlayerList(roster));
            }
            MatchCommand::Start => match pvp.start() {
                Some(target) => {
                    info!("match {} started, target level {}", pvp.id, target.level);
                    pvp.broadcast(ServerMessage::MatchStarted(MatchStarted {
                        target_block: target,
                    }));
                }
                None => debug!("match {} already started", pvp.id),
            },
            MatchCommand::ReportBlock { player, block } => match pvp.report_block(&block) {
                Ok(ReportOutcome::Winner) => {
                    let race_secs = pvp
                        .started_at
                        .map(|t| (Utc::now() - t).num_seconds())
                        .unwrap_or_default();
                    info!("match {} won by {} after {}s", pvp.id, player, race_secs);
                    // Evict first; late events then see a fresh match.
                    registry.remove(&pvp.id).await;
                    pvp.broadcast(ServerMessage::MatchEnd(MatchEnd {
                        winner: player,
                        reason: EndReason::TargetBlock,
                        // The winning block equals the target by definition.
                        target: block,
                    }));
                    break;
                }
                Ok(ReportOutcome::Relay) => {
                    let update = ServerMessage::StateUpdate(StateUpdate {
                        from: player.clone(),
                        action: StateAction::CreatedBlock { block },
                    });
                    pvp.broadcast_except(&player, update);
                }
                Err(err) => {
                    debug!("match {}: dropping report from {}: {}", pvp.id, player, err);
                }
            },
            MatchCommand::Disconnect { player } => {
                if pvp.mark_disconnected(&player) {
                    debug!("player {} disconnected from match {}", player, pvp.id);
                }
            }
        }
    }

    // Idempotent; the winning path already removed the entry.
    registry.remove(&pvp.id).await;
    let lifetime = (Utc::now() - pvp.created_at).num_seconds();
    debug!("match {} gone after {}s", pvp.id, lifetime);
}

// =============================================================================
// MATCH REGISTRY
// =============================================================================

/// Registry tunables.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Command queue depth per match task.
    pub command_buffer: usize,
    /// Evict a match after this long without any command; `None` keeps
    /// abandoned matches alive until their last handle drops.
    pub idle_timeout: Option<Duration>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            command_buffer: 64,
            idle_timeout: None,
        }
    }
}

/// Owner of all live matches, keyed by match id.
///
/// The map is locked only for lookup, insert, and remove; commands are
/// processed by the per-match tasks.
pub struct MatchRegistry {
    matches: RwLock<BTreeMap<MatchId, MatchHandle>>,
    config: RegistryConfig,
}

/// Command queue into one running match task.
struct MatchHandle {
    commands: mpsc::Sender<MatchCommand>,
}

impl MatchRegistry {
    /// Create an empty registry.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            matches: RwLock::new(BTreeMap::new()),
            config,
        }
    }

    /// Join a player to a match, creating the match on first join.
    pub async fn join(
        self: &Arc<Self>,
        id: MatchId,
        player: PlayerId,
        sender: mpsc::Sender<ServerMessage>,
    ) {
        self.dispatch_or_create(id, MatchCommand::Join { player, sender }).await;
    }

    /// Start a match. Unknown ids are an error; join creates, start
    /// never does.
    pub async fn start(&self, id: &MatchId) -> Result<(), MatchError> {
        let Some(sender) = self.sender_for(id).await else {
            return Err(MatchError::MatchNotFound(id.clone()));
        };
        if sender.send(MatchCommand::Start).await.is_err() {
            // The task ended between lookup and send; same as unknown.
            self.remove(id).await;
            return Err(MatchError::MatchNotFound(id.clone()));
        }
        Ok(())
    }

    /// Route a block report to its match.
    ///
    /// An unknown id behaves like a fresh, unstarted match: no target,
    /// so the report is dropped without a reply.
    pub async fn report_block(&self, id: &MatchId, player: PlayerId, block: Block) {
        match self.sender_for(id).await {
            Some(sender) => {
                let _ = sender.send(MatchCommand::ReportBlock { player, block }).await;
            }
            None => debug!("block report for unknown match {}", id),
        }
    }

    /// Record a transport-level disconnect in the player's match.
    pub async fn disconnect(&self, id: &MatchId, player: PlayerId) {
        if let Some(sender) = self.sender_for(id).await {
            let _ = sender.send(MatchCommand::Disconnect { player }).await;
        }
    }

    /// Number of live matches.
    pub async fn match_count(&self) -> usize {
        self.matches.read().await.len()
    }

    /// Drop a match entry. Idempotent; invoked by the owning task on
    /// terminal state or idle timeout.
    async fn remove(&self, id: &MatchId) {
        self.matches.write().await.remove(id);
    }

    /// Queue into a live match, if one exists.
    async fn sender_for(&self, id: &MatchId) -> Option<mpsc::Sender<MatchCommand>> {
        self.matches.read().await.get(id).map(|h| h.commands.clone())
    }

    /// Send a creating command, spawning the match task if needed.
    ///
    /// A looked-up task may have just won and evicted itself; in that
    /// case the stale entry is dropped and a fresh match is spawned.
    async fn dispatch_or_create(self: &Arc<Self>, id: MatchId, command: MatchCommand) {
        let mut command = command;
        for _ in 0..2 {
            let sender = match self.sender_for(&id).await {
                Some(sender) => sender,
                None => self.spawn_match(&id).await,
            };
            match sender.send(command).await {
                Ok(()) => return,
                Err(mpsc::error::SendError(returned)) => {
                    command = returned;
                    self.remove(&id).await;
                }
            }
        }
        warn!("match {}: command dropped after task restart", id);
    }

    /// Spawn a task owning a fresh match and register its queue.
    async fn spawn_match(self: &Arc<Self>, id: &MatchId) -> mpsc::Sender<MatchCommand> {
        let mut matches = self.matches.write().await;
        // Re-check under the write lock; a concurrent join may have won.
        if let Some(handle) = matches.get(id) {
            return handle.commands.clone();
        }

        let (tx, rx) = mpsc::channel(self.config.command_buffer);
        let pvp = PvpMatch::new(id.clone());
        info!("match {} created", id);
        tokio::spawn(run_match(pvp, rx, Arc::clone(self)));
        matches.insert(id.clone(), MatchHandle { commands: tx.clone() });
        tx
    }
}

impl Default for MatchRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn match_id(s: &str) -> MatchId {
        MatchId(s.to_string())
    }

    fn player(s: &str) -> PlayerId {
        PlayerId(s.to_string())
    }

    #[test]
    fn test_match_start_is_idempotent() {
        let mut pvp = PvpMatch::with_seed(match_id("m"), 42);

        let target = pvp.start().unwrap();
        assert!((1..=MAX_TARGET_LEVEL).contains(&target.level));
        assert_eq!(pvp.target(), Some(&target));

        // Second start keeps the rolled target.
        assert_eq!(pvp.start(), None);
        assert_eq!(pvp.target(), Some(&target));
    }

    #[test]
    fn test_same_seed_rolls_same_target() {
        let mut a = PvpMatch::with_seed(match_id("m"), 7);
        let mut b = PvpMatch::with_seed(match_id("m"), 7);
        assert_eq!(a.start(), b.start());
    }

    #[test]
    fn test_target_levels_stay_in_range() {
        for seed in 0..200 {
            let mut pvp = PvpMatch::with_seed(match_id("m"), seed);
            let target = pvp.start().unwrap();
            assert!((1..=MAX_TARGET_LEVEL).contains(&target.level));
            assert_eq!(target.kind, "block");
        }
    }

    #[test]
    fn test_report_requires_target() {
        let pvp = PvpMatch::with_seed(match_id("m"), 1);
        let err = pvp.report_block(&Block::tile(3)).unwrap_err();
        assert_eq!(err, MatchError::NoActiveTarget);
        assert_eq!(err.kind(), ErrorKind::IllegalState);
    }

    #[test]
    fn test_report_judges_exact_match() {
        let mut pvp = PvpMatch::with_seed(match_id("m"), 1);
        let target = pvp.start().unwrap();

        assert_eq!(pvp.report_block(&target), Ok(ReportOutcome::Winner));

        let near_miss = Block::tile(target.level % MAX_TARGET_LEVEL + 1);
        assert_ne!(near_miss, target);
        assert_eq!(pvp.report_block(&near_miss), Ok(ReportOutcome::Relay));

        // Same level, different kind: no win.
        let wrong_kind = Block { kind: "bomb".to_string(), level: target.level };
        assert_eq!(pvp.report_block(&wrong_kind), Ok(ReportOutcome::Relay));
    }

    #[tokio::test]
    async fn test_rejoin_replaces_channel() {
        let mut pvp = PvpMatch::with_seed(match_id("m"), 1);
        let (tx1, mut rx1) = mpsc::channel(10);
        let (tx2, mut rx2) = mpsc::channel(10);

        pvp.join(player("alice"), tx1);
        assert_eq!(pvp.player_count(), 1);

        let roster = pvp.join(player("alice"), tx2);
        assert_eq!(pvp.player_count(), 1);
        assert_eq!(roster.players, vec![player("alice")]);

        pvp.broadcast(ServerMessage::PlayerList(roster));
        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_broadcast_skips_disconnected() {
        let mut pvp = PvpMatch::with_seed(match_id("m"), 1);
        let (tx_a, mut rx_a) = mpsc::channel(10);
        let (tx_b, mut rx_b) = mpsc::channel(10);

        pvp.join(player("alice"), tx_a);
        pvp.join(player("bob"), tx_b);
        assert!(pvp.mark_disconnected(&player("alice")));
        assert!(!pvp.mark_disconnected(&player("ghost")));

        pvp.broadcast(ServerMessage::PlayerList(PlayerList { players: vec![] }));

        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
        // Disconnected players stay registered.
        assert_eq!(pvp.player_count(), 2);
        assert!(!pvp.is_connected(&player("alice")));
    }

    #[tokio::test]
    async fn test_join_broadcasts_roster() {
        let registry = Arc::new(MatchRegistry::default());
        let (tx_a, mut rx_a) = mpsc::channel(10);
        let (tx_b, mut rx_b) = mpsc::channel(10);

        registry.join(match_id("m"), player("alice"), tx_a).await;
        let first = rx_a.recv().await.unwrap();
        if let ServerMessage::PlayerList(list) = first {
            assert_eq!(list.players, vec![player("alice")]);
        } else {
            panic!("Wrong message type");
        }

        registry.join(match_id("m"), player("bob"), tx_b).await;
        let second = rx_b.recv().await.unwrap();
        if let ServerMessage::PlayerList(list) = second {
            assert_eq!(list.players, vec![player("alice"), player("bob")]);
        } else {
            panic!("Wrong message type");
        }
        assert_eq!(registry.match_count().await, 1);
    }

    #[tokio::test]
    async fn test_start_unknown_match_is_not_found() {
        let registry = Arc::new(MatchRegistry::default());

        let err = registry.start(&match_id("ghost")).await.unwrap_err();
        assert_eq!(err, MatchError::MatchNotFound(match_id("ghost")));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        // Start never creates matches.
        assert_eq!(registry.match_count().await, 0);
    }

    #[tokio::test]
    async fn test_start_broadcasts_target_once() {
        let registry = Arc::new(MatchRegistry::default());
        let (tx_a, mut rx_a) = mpsc::channel(10);

        registry.join(match_id("m"), player("alice"), tx_a).await;
        assert!(matches!(rx_a.recv().await, Some(ServerMessage::PlayerList(_))));

        registry.start(&match_id("m")).await.unwrap();
        let started = rx_a.recv().await.unwrap();
        if let ServerMessage::MatchStarted(info) = started {
            assert!((1..=MAX_TARGET_LEVEL).contains(&info.target_block.level));
        } else {
            panic!("Wrong message type");
        }

        // A second start is a silent no-op; the next message a player
        // sees is the roster from a later join, not another start.
        registry.start(&match_id("m")).await.unwrap();
        let (tx_b, _rx_b) = mpsc::channel(10);
        registry.join(match_id("m"), player("bob"), tx_b).await;
        assert!(matches!(rx_a.recv().await, Some(ServerMessage::PlayerList(_))));
    }

    #[tokio::test]
    async fn test_relay_reaches_others_only() {
        let registry = Arc::new(MatchRegistry::default());
        let (tx_a, mut rx_a) = mpsc::channel(10);
        let (tx_b, mut rx_b) = mpsc::channel(10);

        registry.join(match_id("m"), player("alice"), tx_a).await;
        registry.join(match_id("m"), player("bob"), tx_b).await;
        registry.start(&match_id("m")).await.unwrap();

        // Drain alice: own roster, bob's roster, match_started.
        let mut target = None;
        for _ in 0..3 {
            if let ServerMessage::MatchStarted(info) = rx_a.recv().await.unwrap() {
                target = Some(info.target_block);
            }
        }
        let target = target.unwrap();

        // A block that cannot be the target.
        let block = Block::tile(target.level % MAX_TARGET_LEVEL + 1);
        registry.report_block(&match_id("m"), player("alice"), block.clone()).await;

        // Bob: roster, match_started, then the relay.
        let mut relay = None;
        for _ in 0..3 {
            if let ServerMessage::StateUpdate(update) = rx_b.recv().await.unwrap() {
                relay = Some(update);
            }
        }
        let relay = relay.unwrap();
        assert_eq!(relay.from, player("alice"));
        let StateAction::CreatedBlock { block: relayed } = relay.action;
        assert_eq!(relayed, block);

        // The reporter hears nothing back.
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_winning_report_ends_and_evicts() {
        let registry = Arc::new(MatchRegistry::default());
        let (tx_a, mut rx_a) = mpsc::channel(10);
        let (tx_b, mut rx_b) = mpsc::channel(10);

        registry.join(match_id("m"), player("alice"), tx_a).await;
        registry.join(match_id("m"), player("bob"), tx_b).await;
        registry.start(&match_id("m")).await.unwrap();

        let mut target = None;
        for _ in 0..3 {
            if let ServerMessage::MatchStarted(info) = rx_a.recv().await.unwrap() {
                target = Some(info.target_block);
            }
        }
        let target = target.unwrap();

        registry.report_block(&match_id("m"), player("bob"), target.clone()).await;

        // Both participants get the end event, reporter included.
        for rx in [&mut rx_a, &mut rx_b] {
            let end = loop {
                match rx.recv().await.unwrap() {
                    ServerMessage::MatchEnd(end) => break end,
                    _ => continue,
                }
            };
            assert_eq!(end.winner, player("bob"));
            assert_eq!(end.reason, EndReason::TargetBlock);
            assert_eq!(end.target, target);
        }

        // The record is evicted; the id is free for a fresh match.
        for _ in 0..100 {
            if registry.match_count().await == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(registry.match_count().await, 0);

        let (tx_c, mut rx_c) = mpsc::channel(10);
        registry.join(match_id("m"), player("carol"), tx_c).await;
        if let Some(ServerMessage::PlayerList(list)) = rx_c.recv().await {
            assert_eq!(list.players, vec![player("carol")]);
        } else {
            panic!("Wrong message type");
        }
    }

    #[tokio::test]
    async fn test_report_before_start_is_ignored() {
        let registry = Arc::new(MatchRegistry::default());
        let (tx_a, mut rx_a) = mpsc::channel(10);
        let (tx_b, mut rx_b) = mpsc::channel(10);

        registry.join(match_id("m"), player("alice"), tx_a).await;
        registry.join(match_id("m"), player("bob"), tx_b).await;
        registry.report_block(&match_id("m"), player("alice"), Block::tile(3)).await;

        // Bob sees only rosters; the report produced nothing.
        let (tx_c, _rx_c) = mpsc::channel(10);
        registry.join(match_id("m"), player("carol"), tx_c).await;
        assert!(matches!(rx_b.recv().await, Some(ServerMessage::PlayerList(_))));
        assert!(matches!(rx_b.recv().await, Some(ServerMessage::PlayerList(_))));
        assert!(rx_b.try_recv().is_err());

        // The reporter got the rosters too, nothing else.
        assert!(matches!(rx_a.recv().await, Some(ServerMessage::PlayerList(_))));
        assert!(matches!(rx_a.recv().await, Some(ServerMessage::PlayerList(_))));
        assert!(matches!(rx_a.recv().await, Some(ServerMessage::PlayerList(_))));
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_report_for_unknown_match_is_ignored() {
        let registry = Arc::new(MatchRegistry::default());

        registry.report_block(&match_id("ghost"), player("alice"), Block::tile(3)).await;
        assert_eq!(registry.match_count().await, 0);
    }

    #[tokio::test]
    async fn test_disconnect_keeps_registration() {
        let registry = Arc::new(MatchRegistry::default());
        let (tx_a, mut rx_a) = mpsc::channel(10);
        let (tx_b, mut rx_b) = mpsc::channel(10);

        registry.join(match_id("m"), player("alice"), tx_a).await;
        registry.join(match_id("m"), player("bob"), tx_b).await;
        registry.disconnect(&match_id("m"), player("alice")).await;

        // A later join still lists alice in the roster, but only live
        // channels receive the broadcast.
        let (tx_c, mut rx_c) = mpsc::channel(10);
        registry.join(match_id("m"), player("carol"), tx_c).await;

        let roster = loop {
            match rx_c.recv().await.unwrap() {
                ServerMessage::PlayerList(list) => break list,
                _ => continue,
            }
        };
        assert_eq!(
            roster.players,
            vec![player("alice"), player("bob"), player("carol")]
        );

        // Drain bob up to the same broadcast: his own join and carol's.
        assert!(matches!(rx_b.recv().await, Some(ServerMessage::PlayerList(_))));
        assert!(matches!(rx_b.recv().await, Some(ServerMessage::PlayerList(_))));

        // Alice heard the two broadcasts from before her disconnect only.
        assert!(matches!(rx_a.recv().await, Some(ServerMessage::PlayerList(_))));
        assert!(matches!(rx_a.recv().await, Some(ServerMessage::PlayerList(_))));
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_idle_timeout_evicts_match() {
        let registry = Arc::new(MatchRegistry::new(RegistryConfig {
            idle_timeout: Some(Duration::from_millis(50)),
            ..Default::default()
        }));
        let (tx_a, mut rx_a) = mpsc::channel(10);

        registry.join(match_id("m"), player("alice"), tx_a).await;
        assert!(matches!(rx_a.recv().await, Some(ServerMessage::PlayerList(_))));
        assert_eq!(registry.match_count().await, 1);

        for _ in 0..100 {
            if registry.match_count().await == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(registry.match_count().await, 0);
    }
}
