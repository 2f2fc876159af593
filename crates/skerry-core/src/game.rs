//! Core game state machine.
//!
//! A [`GameState`] is an explicitly constructed, caller-owned engine
//! instance. It owns every mutable piece of game state - bank, hands, node
//! ownership, turn order - and only ever hands out copies, never live
//! references. The sole external dependency is the injected
//! [`RandomSource`]; everything else is pure bookkeeping.

use crate::board::{Board, NodeId, PlayerId, Resource, Tile, TileId};
use crate::ledger::ResourceLedger;
use crate::random::{DiceRoll, LocalRandom, RandomSource, RollSource};
use crate::trade::{FixedRatioTrade, TradingRule};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// A player discards half their hand (rounded down) when a 7 is rolled and
/// they hold at least this many cards.
pub const DISCARD_THRESHOLD: u32 = 8;

/// Cost of a settlement built during normal play (setup placements are free):
/// 1 Brick, 1 Lumber, 1 Grain, 1 Wool.
pub fn settlement_cost() -> ResourceLedger {
    ResourceLedger::with_amounts(1, 1, 0, 1, 1)
}

/// Game phase. Mutating calls are guarded on the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Before `start_game`; players may still join
    Lobby,
    /// Initial snake-order placement (round 1 forward, round 2 backward)
    SetupPlacement { round: u8 },
    /// Start of a turn; the current player must roll
    AwaitingRoll,
    /// Main phase: build, trade, end turn
    AwaitingActions,
    /// A 7 was rolled; the current player must move the robber
    AwaitingRobberMove,
}

/// Errors from state-changing setup and placement calls.
///
/// Paid actions (`build_settlement_at`, `maritime_trade`) report a plain
/// `false` instead, so callers can tell "rejected, try something else" apart
/// from "game is broken".
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("game has already started")]
    AlreadyStarted,
    #[error("at least two players are required")]
    NotEnoughPlayers,
    #[error("unknown player id {0}")]
    UnknownPlayer(PlayerId),
    #[error("player id {0} is already taken")]
    DuplicatePlayer(PlayerId),
    #[error("no free player ids remain")]
    PlayerIdsExhausted,
    #[error("unknown tile id {0}")]
    UnknownTile(TileId),
    #[error("unknown node id {0}")]
    UnknownNode(NodeId),
    #[error("not this player's turn")]
    NotYourTurn,
    #[error("invalid action for current phase")]
    InvalidPhase,
    #[error("node is already settled")]
    NodeOccupied,
    #[error("placement violates the distance rule")]
    TooCloseToSettlement,
}

/// A single player's state. Created by `add_player`, never destroyed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub resources: ResourceLedger,
    /// Owned nodes in placement order; ownership is never revoked
    pub settlements: Vec<NodeId>,
    pub victory_points: u32,
}

impl Player {
    fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            resources: ResourceLedger::new(),
            settlements: Vec::new(),
            victory_points: 0,
        }
    }
}

/// One stolen card, reported to the caller (who decides what to disclose).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theft {
    pub from: PlayerId,
    pub to: PlayerId,
    pub resource: Resource,
}

/// What a call to `roll_and_distribute` did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollOutcome {
    pub roll: DiceRoll,
    /// Per-player production granted this roll (empty on a 7)
    pub gains: HashMap<PlayerId, ResourceLedger>,
    /// Per-player cards returned to the bank (empty unless a 7 was rolled)
    pub discards: HashMap<PlayerId, ResourceLedger>,
}

/// Read-only projection of one player for the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicPlayer {
    pub id: PlayerId,
    pub name: String,
    pub victory_points: u32,
}

/// Read-only projection of one node for the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: NodeId,
    pub owner: Option<PlayerId>,
    /// Adjacent tile ids (coordinate derivation and highlighting)
    pub tiles: Vec<TileId>,
    /// Anchor tile id + corner index for pixel placement
    pub anchor_tile: TileId,
    pub anchor_corner: u8,
}

/// The complete public view. Always a copy; mutating it affects nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicState {
    pub players: Vec<PublicPlayer>,
    pub robber_tile: TileId,
    pub bank: ResourceLedger,
    pub tiles: Vec<Tile>,
    pub current_player: Option<PlayerId>,
    pub turn_number: u32,
    pub phase: GamePhase,
    pub nodes: Vec<NodeView>,
}

/// The game engine.
pub struct GameState {
    pub(crate) board: Board,
    pub(crate) bank: ResourceLedger,
    pub(crate) players: Vec<Player>,
    pub(crate) turn_order: Vec<PlayerId>,
    pub(crate) current_index: usize,
    pub(crate) turn_number: u32,
    pub(crate) phase: GamePhase,
    pub(crate) robber_tile: TileId,
    pub(crate) ownership: HashMap<NodeId, PlayerId>,
    trade_rule: Box<dyn TradingRule>,
    random: Box<dyn RandomSource>,
    /// Local fallback so a roll can never fail on the external dependency
    fallback: LocalRandom,
}

impl GameState {
    /// Create an engine over `board` with the standard 4:1 trading rule.
    pub fn new(board: Board, random: Box<dyn RandomSource>) -> Self {
        Self::with_rules(board, random, Box::new(FixedRatioTrade::default()))
    }

    /// Create an engine with a custom trading rule.
    pub fn with_rules(
        board: Board,
        random: Box<dyn RandomSource>,
        trade_rule: Box<dyn TradingRule>,
    ) -> Self {
        let robber_tile = board.desert_tile();
        Self {
            board,
            bank: ResourceLedger::bank(),
            players: Vec::new(),
            turn_order: Vec::new(),
            current_index: 0,
            turn_number: 0,
            phase: GamePhase::Lobby,
            robber_tile,
            ownership: HashMap::new(),
            trade_rule,
            random,
            fallback: LocalRandom::new(),
        }
    }

    // ==================== Queries ====================

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn bank(&self) -> &ResourceLedger {
        &self.bank
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    pub fn robber_tile(&self) -> TileId {
        self.robber_tile
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// The player whose turn (or placement) it is. None in an empty lobby.
    pub fn current_player(&self) -> Option<PlayerId> {
        self.turn_order.get(self.current_index).copied()
    }

    /// Who owns a node, if anyone
    pub fn owner_of(&self, node: NodeId) -> Option<PlayerId> {
        self.ownership.get(&node).copied()
    }

    /// Whether a node can legally take a settlement right now: it exists, is
    /// unowned, and no direct neighbor is owned. This single predicate backs
    /// both the advisory spot query and every enforced placement.
    pub fn is_legal_settlement_spot(&self, node: NodeId) -> bool {
        match self.board.node(node) {
            Some(node) => {
                !self.ownership.contains_key(&node.id)
                    && node
                        .neighbors
                        .iter()
                        .all(|n| !self.ownership.contains_key(n))
            }
            None => false,
        }
    }

    /// Every node a settlement could legally be placed on right now.
    pub fn available_settlement_spots(&self) -> Vec<NodeId> {
        self.board
            .nodes()
            .iter()
            .filter(|n| self.is_legal_settlement_spot(n.id))
            .map(|n| n.id)
            .collect()
    }

    // ==================== Lobby ====================

    /// Register a player; the engine mints the id. Lobby only.
    pub fn add_player(&mut self, name: impl Into<String>) -> Result<PlayerId, GameError> {
        let id = (0..=PlayerId::MAX)
            .find(|id| self.player(*id).is_none())
            .ok_or(GameError::PlayerIdsExhausted)?;
        self.add_player_with_id(id, name)?;
        Ok(id)
    }

    /// Register a player under a caller-supplied id. Lobby only; duplicate
    /// ids are rejected.
    pub fn add_player_with_id(
        &mut self,
        id: PlayerId,
        name: impl Into<String>,
    ) -> Result<(), GameError> {
        if self.phase != GamePhase::Lobby {
            return Err(GameError::AlreadyStarted);
        }
        if self.player(id).is_some() {
            return Err(GameError::DuplicatePlayer(id));
        }
        let name = name.into();
        debug!(player = id, name = %name, "player joined");
        self.players.push(Player::new(id, name));
        self.turn_order.push(id);
        Ok(())
    }

    /// Leave the lobby and enter setup placement, round 1, forward.
    /// Rotates the turn order so `first` goes first, if given.
    pub fn start_game(&mut self, first: Option<PlayerId>) -> Result<(), GameError> {
        if self.phase != GamePhase::Lobby {
            return Err(GameError::AlreadyStarted);
        }
        if self.players.len() < 2 {
            return Err(GameError::NotEnoughPlayers);
        }
        if let Some(first) = first {
            let pos = self
                .turn_order
                .iter()
                .position(|&p| p == first)
                .ok_or(GameError::UnknownPlayer(first))?;
            self.turn_order.rotate_left(pos);
        }
        self.current_index = 0;
        self.phase = GamePhase::SetupPlacement { round: 1 };
        debug!(players = self.players.len(), "game started");
        Ok(())
    }

    // ==================== Setup placement ====================

    /// Place a free settlement during setup. Advances the snake pointer;
    /// completing round 2 at index 0 enters `AwaitingRoll`.
    pub fn place_initial_settlement(
        &mut self,
        player: PlayerId,
        node: NodeId,
    ) -> Result<(), GameError> {
        let round = match self.phase {
            GamePhase::SetupPlacement { round } => round,
            _ => return Err(GameError::InvalidPhase),
        };
        let idx = self.player_index(player)?;
        if self.current_player() != Some(player) {
            return Err(GameError::NotYourTurn);
        }
        if self.board.node(node).is_none() {
            return Err(GameError::UnknownNode(node));
        }
        if self.ownership.contains_key(&node) {
            return Err(GameError::NodeOccupied);
        }
        if !self.is_legal_settlement_spot(node) {
            return Err(GameError::TooCloseToSettlement);
        }

        self.settle(idx, node);
        debug!(player, node, round, "initial settlement placed");

        let last = self.turn_order.len() - 1;
        match round {
            1 if self.current_index == last => {
                // Snake: the last placer of round 1 places first in round 2
                self.phase = GamePhase::SetupPlacement { round: 2 };
            }
            1 => self.current_index += 1,
            _ if self.current_index == 0 => {
                self.phase = GamePhase::AwaitingRoll;
                self.turn_number = 1;
                debug!("setup complete");
            }
            _ => self.current_index -= 1,
        }
        Ok(())
    }

    // ==================== Dice & production ====================

    /// Roll the dice and resolve the result: production on 2-6 and 8-12,
    /// discard-and-robber on 7. Never fails because of the randomness
    /// service; a failed or malformed response degrades to a local roll.
    pub fn roll_and_distribute(&mut self) -> Result<RollOutcome, GameError> {
        if self.phase != GamePhase::AwaitingRoll {
            return Err(GameError::InvalidPhase);
        }

        let roll = self.roll_dice();
        debug!(
            die1 = roll.die1,
            die2 = roll.die2,
            source = ?roll.source,
            "dice rolled"
        );

        let mut gains = HashMap::new();
        let mut discards = HashMap::new();
        if roll.total == 7 {
            discards = self.discard_over_limit();
            self.phase = GamePhase::AwaitingRobberMove;
        } else {
            gains = self.distribute_production(roll.total);
            self.phase = GamePhase::AwaitingActions;
        }

        Ok(RollOutcome {
            roll,
            gains,
            discards,
        })
    }

    fn roll_dice(&mut self) -> DiceRoll {
        let (die1, die2, source) = match self.random.roll_dice() {
            Ok((d1, d2)) if (1..=6).contains(&d1) && (1..=6).contains(&d2) => {
                (d1, d2, RollSource::External)
            }
            Ok((d1, d2)) => {
                debug!(die1 = d1, die2 = d2, "malformed external roll, using local fallback");
                let (d1, d2) = self.fallback.roll_pair();
                (d1, d2, RollSource::Local)
            }
            Err(err) => {
                debug!(error = %err, "randomness service failed, using local fallback");
                let (d1, d2) = self.fallback.roll_pair();
                (d1, d2, RollSource::Local)
            }
        };
        DiceRoll {
            die1,
            die2,
            total: die1 + die2,
            source,
        }
    }

    /// Every player at or over the threshold returns half their hand
    /// (rounded down) to the bank, removed round-robin over the fixed kind
    /// order.
    fn discard_over_limit(&mut self) -> HashMap<PlayerId, ResourceLedger> {
        let mut discards = HashMap::new();
        let order = self.turn_order.clone();
        for pid in order {
            let Ok(idx) = self.player_index(pid) else {
                continue;
            };
            let total = self.players[idx].resources.total();
            if total < DISCARD_THRESHOLD {
                continue;
            }
            let mut to_lose = total / 2;
            let mut lost = ResourceLedger::new();
            while to_lose > 0 {
                for kind in Resource::ALL {
                    if to_lose == 0 {
                        break;
                    }
                    if self.players[idx].resources.get(kind) > 0 {
                        self.players[idx]
                            .resources
                            .try_subtract(&ResourceLedger::single(kind, 1));
                        self.bank.add(kind, 1);
                        lost.add(kind, 1);
                        to_lose -= 1;
                    }
                }
            }
            debug!(player = pid, count = lost.total(), "discarded to bank");
            discards.insert(pid, lost);
        }
        discards
    }

    /// Pay every owned node touching a producing tile whose number matches
    /// the roll, skipping the robber's tile. Payment is bounded by bank
    /// availability: claimants are served in tile-id order, then ring-corner
    /// order, until the bank runs out of that kind.
    fn distribute_production(&mut self, total: u8) -> HashMap<PlayerId, ResourceLedger> {
        let robber = self.robber_tile;
        let hits: Vec<(Resource, [NodeId; 6])> = self
            .board
            .tiles()
            .iter()
            .filter(|t| t.id != robber && t.number == Some(total))
            .filter_map(|t| t.resource().map(|r| (r, *self.board.corner_nodes(t.id))))
            .collect();

        let mut gains: HashMap<PlayerId, ResourceLedger> = HashMap::new();
        for (resource, corners) in hits {
            for node_id in corners {
                let Some(&owner) = self.ownership.get(&node_id) else {
                    continue;
                };
                if !self
                    .bank
                    .try_subtract(&ResourceLedger::single(resource, 1))
                {
                    continue;
                }
                let Ok(idx) = self.player_index(owner) else {
                    continue;
                };
                self.players[idx].resources.add(resource, 1);
                gains.entry(owner).or_default().add(resource, 1);
            }
        }
        gains
    }

    // ==================== Robber ====================

    /// Move the robber and optionally steal one random card from `victim`
    /// (weighted by count across their whole hand). From
    /// `AwaitingRobberMove` this always transitions to `AwaitingActions`,
    /// theft or not.
    pub fn move_robber(
        &mut self,
        tile: TileId,
        victim: Option<PlayerId>,
    ) -> Result<Option<Theft>, GameError> {
        if !matches!(
            self.phase,
            GamePhase::AwaitingRobberMove | GamePhase::AwaitingActions
        ) {
            return Err(GameError::InvalidPhase);
        }
        if self.board.tile(tile).is_none() {
            return Err(GameError::UnknownTile(tile));
        }
        let thief = self.current_player().ok_or(GameError::InvalidPhase)?;
        // Resolve the victim up front so a rejected call has no side effect.
        let victim_idx = match victim {
            Some(victim) => Some(self.player_index(victim)?),
            None => None,
        };

        self.robber_tile = tile;
        debug!(tile, "robber moved");

        let mut theft = None;
        if let (Some(victim), Some(victim_idx)) = (victim, victim_idx) {
            let held = self.players[victim_idx].resources.total();
            if held > 0 {
                let pick = self.random.pick(held as usize) as u32;
                if let Some(kind) = self.players[victim_idx].resources.kind_at_index(pick) {
                    self.players[victim_idx]
                        .resources
                        .try_subtract(&ResourceLedger::single(kind, 1));
                    let thief_idx = self.player_index(thief)?;
                    self.players[thief_idx].resources.add(kind, 1);
                    debug!(from = victim, to = thief, "card stolen");
                    theft = Some(Theft {
                        from: victim,
                        to: thief,
                        resource: kind,
                    });
                }
            }
        }

        if self.phase == GamePhase::AwaitingRobberMove {
            self.phase = GamePhase::AwaitingActions;
        }
        Ok(theft)
    }

    // ==================== Paid actions ====================

    /// Build a settlement during the action phase. Returns false - never an
    /// error - when the phase, turn, node, or funds don't allow it; a
    /// rejection leaves every ledger untouched.
    pub fn build_settlement_at(&mut self, player: PlayerId, node: NodeId) -> bool {
        if self.phase != GamePhase::AwaitingActions {
            return false;
        }
        if self.current_player() != Some(player) {
            return false;
        }
        let Ok(idx) = self.player_index(player) else {
            return false;
        };
        if !self.is_legal_settlement_spot(node) {
            return false;
        }
        let cost = settlement_cost();
        if !self.players[idx].resources.try_subtract(&cost) {
            return false;
        }
        self.bank.add_all(&cost);
        self.settle(idx, node);
        debug!(player, node, "settlement built");
        true
    }

    /// Exchange with the bank under the engine's trading rule. Returns
    /// false, with no partial effect, on any malformed or unaffordable
    /// trade, or outside the action phase.
    pub fn maritime_trade(
        &mut self,
        player: PlayerId,
        give: &ResourceLedger,
        receive: &ResourceLedger,
    ) -> bool {
        if self.phase != GamePhase::AwaitingActions {
            return false;
        }
        if self.current_player() != Some(player) {
            return false;
        }
        let Ok(idx) = self.player_index(player) else {
            return false;
        };
        let done = self.trade_rule.trade_with_bank(
            &mut self.players[idx].resources,
            &mut self.bank,
            give,
            receive,
        );
        if done {
            debug!(player, "maritime trade executed");
        }
        done
    }

    // ==================== Turn management ====================

    /// Pass the turn: circular advance, turn counter up, back to
    /// `AwaitingRoll`.
    pub fn next_player(&mut self) -> Result<(), GameError> {
        if self.phase != GamePhase::AwaitingActions {
            return Err(GameError::InvalidPhase);
        }
        self.current_index = (self.current_index + 1) % self.turn_order.len();
        self.turn_number += 1;
        self.phase = GamePhase::AwaitingRoll;
        debug!(
            player = self.current_player(),
            turn = self.turn_number,
            "turn passed"
        );
        Ok(())
    }

    // ==================== Public view ====================

    /// Recompute the read-only projection the renderer consumes.
    pub fn public_state(&self) -> PublicState {
        PublicState {
            players: self
                .players
                .iter()
                .map(|p| PublicPlayer {
                    id: p.id,
                    name: p.name.clone(),
                    victory_points: p.victory_points,
                })
                .collect(),
            robber_tile: self.robber_tile,
            bank: self.bank.clone(),
            tiles: self.board.tiles().to_vec(),
            current_player: self.current_player(),
            turn_number: self.turn_number,
            phase: self.phase,
            nodes: self
                .board
                .nodes()
                .iter()
                .map(|n| NodeView {
                    id: n.id,
                    owner: self.owner_of(n.id),
                    tiles: n.tiles.clone(),
                    anchor_tile: n.anchor.tile,
                    anchor_corner: n.anchor.corner,
                })
                .collect(),
        }
    }

    // ==================== Helpers ====================

    fn player_index(&self, id: PlayerId) -> Result<usize, GameError> {
        self.players
            .iter()
            .position(|p| p.id == id)
            .ok_or(GameError::UnknownPlayer(id))
    }

    fn settle(&mut self, player_idx: usize, node: NodeId) {
        let id = self.players[player_idx].id;
        self.ownership.insert(node, id);
        self.players[player_idx].settlements.push(node);
        self.players[player_idx].victory_points += 1;
    }
}
