//! Save/restore codec for a whole game.
//!
//! A [`Snapshot`] is a plain serde value holding everything needed to
//! continue a game: the tile list (the node graph is rederived, never
//! stored), both sides of every ledger, ownership, and the turn machinery.
//! The injected capabilities - randomness and trading rule - are not part of
//! the state and are supplied again on import.

use crate::board::{Board, BoardError, NodeId, PlayerId, Tile, TileId, TILE_COUNT};
use crate::game::{GamePhase, GameState, Player};
use crate::ledger::ResourceLedger;
use crate::random::RandomSource;
use crate::trade::{FixedRatioTrade, TradingRule};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Format version written into every snapshot.
pub const SNAPSHOT_VERSION: u32 = 1;

/// One player's stored state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub resources: ResourceLedger,
    pub settlements: Vec<NodeId>,
    pub victory_points: u32,
}

/// The complete stored game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub tiles: Vec<Tile>,
    pub bank: ResourceLedger,
    pub players: Vec<PlayerSnapshot>,
    pub turn_order: Vec<PlayerId>,
    pub current_index: usize,
    pub turn_number: u32,
    pub phase: GamePhase,
    pub robber_tile: TileId,
    /// Node-to-owner pairs, sorted by node id for stable output
    pub ownership: Vec<(NodeId, PlayerId)>,
}

/// Problems detected while restoring a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error("robber tile {0} does not exist")]
    BadRobberTile(TileId),
    #[error("ownership references unknown node {0}")]
    UnknownNode(NodeId),
    #[error("node {0} is claimed by unknown player {1}")]
    UnknownOwner(NodeId, PlayerId),
    #[error("turn order is not a permutation of the player ids")]
    BadTurnOrder,
    #[error("phase {0:?} requires at least two players")]
    NotEnoughPlayers(GamePhase),
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Snapshot {
    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a snapshot back out of JSON. Structural only; game-level
    /// validation happens in [`GameState::import`].
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl GameState {
    /// Capture the full game state. Pure read; the running game is unaffected.
    pub fn export(&self) -> Snapshot {
        let mut ownership: Vec<(NodeId, PlayerId)> =
            self.ownership.iter().map(|(&n, &p)| (n, p)).collect();
        ownership.sort_unstable();
        Snapshot {
            version: SNAPSHOT_VERSION,
            tiles: self.board.tiles().to_vec(),
            bank: self.bank.clone(),
            players: self
                .players
                .iter()
                .map(|p| PlayerSnapshot {
                    id: p.id,
                    name: p.name.clone(),
                    resources: p.resources.clone(),
                    settlements: p.settlements.clone(),
                    victory_points: p.victory_points,
                })
                .collect(),
            turn_order: self.turn_order.clone(),
            current_index: self.current_index,
            turn_number: self.turn_number,
            phase: self.phase,
            robber_tile: self.robber_tile,
            ownership,
        }
    }

    /// Restore a game with the standard 4:1 trading rule.
    pub fn import(
        snapshot: Snapshot,
        random: Box<dyn RandomSource>,
    ) -> Result<Self, SnapshotError> {
        Self::import_with_rules(snapshot, random, Box::new(FixedRatioTrade::default()))
    }

    /// Restore a game, re-injecting both capabilities. The node graph is
    /// rebuilt from the stored tiles and the snapshot is validated against
    /// it before any state is adopted.
    pub fn import_with_rules(
        snapshot: Snapshot,
        random: Box<dyn RandomSource>,
        trade_rule: Box<dyn TradingRule>,
    ) -> Result<Self, SnapshotError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(snapshot.version));
        }
        // Every phase past the lobby implies a started game, which requires
        // at least two players; without this a crafted save could restore a
        // playing state with an empty turn order.
        if snapshot.phase != GamePhase::Lobby && snapshot.players.len() < 2 {
            return Err(SnapshotError::NotEnoughPlayers(snapshot.phase));
        }
        let board = Board::from_tiles(snapshot.tiles)?;
        if snapshot.robber_tile as usize >= TILE_COUNT {
            return Err(SnapshotError::BadRobberTile(snapshot.robber_tile));
        }

        let mut ids: Vec<PlayerId> = snapshot.players.iter().map(|p| p.id).collect();
        let mut order = snapshot.turn_order.clone();
        ids.sort_unstable();
        order.sort_unstable();
        if ids != order || ids.windows(2).any(|w| w[0] == w[1]) {
            return Err(SnapshotError::BadTurnOrder);
        }
        if !snapshot.turn_order.is_empty() && snapshot.current_index >= snapshot.turn_order.len() {
            return Err(SnapshotError::BadTurnOrder);
        }

        let mut ownership = HashMap::with_capacity(snapshot.ownership.len());
        for (node, owner) in snapshot.ownership {
            if board.node(node).is_none() {
                return Err(SnapshotError::UnknownNode(node));
            }
            if !snapshot.players.iter().any(|p| p.id == owner) {
                return Err(SnapshotError::UnknownOwner(node, owner));
            }
            ownership.insert(node, owner);
        }

        let players = snapshot
            .players
            .into_iter()
            .map(|p| Player {
                id: p.id,
                name: p.name,
                resources: p.resources,
                settlements: p.settlements,
                victory_points: p.victory_points,
            })
            .collect();

        let mut game = GameState::with_rules(board, random, trade_rule);
        game.bank = snapshot.bank;
        game.players = players;
        game.turn_order = snapshot.turn_order;
        game.current_index = snapshot.current_index;
        game.turn_number = snapshot.turn_number;
        game.phase = snapshot.phase;
        game.robber_tile = snapshot.robber_tile;
        game.ownership = ownership;
        debug!(
            players = game.players.len(),
            turn = game.turn_number,
            "snapshot restored"
        );
        Ok(game)
    }
}
