//! Skerry - a hex-board settlement trading game engine
//!
//! This crate provides the complete single-session game logic for Skerry:
//! - Hex coordinate system with exact corner identities
//! - Board generation: 19 tiles, 54 deduplicated corner nodes
//! - Seed-reproducible board randomization
//! - Resource economy: bank, production, discards, maritime trading
//! - Turn and phase state machine with full rule enforcement
//! - Snapshot codec for saving and restoring whole games
//!
//! # Architecture
//!
//! A game is one explicitly constructed [`GameState`] owned by the caller;
//! there are no globals and no interior threading. Randomness is injected
//! through the [`RandomSource`] trait with an always-available local
//! fallback, and the bank exchange rule through [`TradingRule`], so both can
//! be substituted in tests.
//!
//! # Modules
//!
//! - [`hex`]: Coordinate system for tiles and their corners
//! - [`board`]: Board representation and the node-graph builder
//! - [`shuffle`]: Seeded board randomizer
//! - [`ledger`]: Resource multisets for bank and hands
//! - [`trade`]: Bank trading rules
//! - [`random`]: The randomness service boundary
//! - [`game`]: Game state machine
//! - [`snapshot`]: Save/restore codec

pub mod board;
pub mod game;
pub mod hex;
pub mod ledger;
pub mod random;
pub mod shuffle;
pub mod snapshot;
pub mod trade;

// Re-export commonly used types
pub use board::{
    Board, BoardError, Node, NodeAnchor, NodeId, PlayerId, Resource, Tile, TileId, TileKind,
    NODE_COUNT, TILE_COUNT,
};
pub use game::{
    settlement_cost, GameError, GamePhase, GameState, NodeView, Player, PublicPlayer, PublicState,
    RollOutcome, Theft, DISCARD_THRESHOLD,
};
pub use hex::{CornerCoord, CornerDir, HexCoord};
pub use ledger::{ResourceLedger, BANK_RESERVE_PER_KIND};
pub use random::{
    DiceRoll, LocalRandom, RandomSource, RandomSourceError, RollSource, ScriptedRandom,
};
pub use shuffle::{randomize, randomized_board};
pub use snapshot::{PlayerSnapshot, Snapshot, SnapshotError, SNAPSHOT_VERSION};
pub use trade::{FixedRatioTrade, TradingRule, DEFAULT_BANK_RATIO};
