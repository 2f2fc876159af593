//! Board randomizer: seed-reproducible shuffling of tile kinds and numbers.
//!
//! Tile identities and positions stay fixed; only which kind sits where and
//! which number token it carries change. The same 32-bit seed always yields
//! the same board, so a seed fetched from a public randomness beacon (or
//! typed in by a friend) reproduces a board exactly.

use crate::board::{self, Board, Tile};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Produce the tile list for a randomized board.
///
/// Resource kinds (including the single desert) and number tokens are
/// shuffled independently with Fisher-Yates driven by a ChaCha8 stream
/// seeded from `seed`. Numbers are then dealt to producing tiles in
/// encounter order; the desert keeps no number. Pure function: same seed,
/// byte-identical output.
pub fn randomize(seed: u32) -> Vec<Tile> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed as u64);

    let mut kinds = board::default_kind_pool();
    kinds.shuffle(&mut rng);

    let mut numbers = board::number_pool();
    numbers.shuffle(&mut rng);

    board::tiles_from_pools(&kinds, &numbers)
}

/// Build a full board (tiles plus node graph) from a seed.
pub fn randomized_board(seed: u32) -> Board {
    Board::assemble(randomize(seed))
}
