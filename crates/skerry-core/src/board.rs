//! Game board representation: tiles, corner nodes, and the geometry builder.
//!
//! The builder produces the fixed 19-tile radius-2 layout (3/4/5/4/3 rows)
//! and derives the 54 unique corner nodes by walking every tile's corner ring
//! and deduplicating shared corners on their exact `CornerCoord` identity.
//! Tiles and nodes reference each other by id only; both are immutable once
//! the board is built.

use crate::hex::{CornerCoord, HexCoord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Tile identifier (0..19, encounter order of the layout)
pub type TileId = u8;

/// Node identifier (0..54, first-seen order during corner derivation)
pub type NodeId = u8;

/// Player identifier (minted by the engine, or supplied by the caller)
pub type PlayerId = u8;

/// Number of land tiles on the board
pub const TILE_COUNT: usize = 19;

/// Number of unique corner nodes on the board
pub const NODE_COUNT: usize = 54;

/// The five producing resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    Brick,
    Lumber,
    Ore,
    Grain,
    Wool,
}

impl Resource {
    /// All resource kinds, in the fixed order used for discard round-robin
    /// and weighted theft indexing.
    pub const ALL: [Resource; 5] = [
        Resource::Brick,
        Resource::Lumber,
        Resource::Ore,
        Resource::Grain,
        Resource::Wool,
    ];
}

/// What a tile yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    /// Produces a resource when its number is rolled
    Producing(Resource),
    /// The single barren tile - no production, the robber starts here
    Desert,
}

/// A single hex tile on the board. Immutable once the board is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Position in encounter order
    pub id: TileId,
    /// Position on the hex grid
    pub coord: HexCoord,
    /// Producing kind or desert
    pub kind: TileKind,
    /// Dice number that triggers production (2-12, never 7; None for desert)
    pub number: Option<u8>,
}

impl Tile {
    /// The resource this tile produces, if any
    pub fn resource(&self) -> Option<Resource> {
        match self.kind {
            TileKind::Producing(r) => Some(r),
            TileKind::Desert => None,
        }
    }

    /// Whether this is the barren tile
    pub fn is_desert(&self) -> bool {
        matches!(self.kind, TileKind::Desert)
    }
}

/// The anchor ties a node back to the tile corner that first minted it.
/// Used only for renderer coordinate derivation, never for gameplay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAnchor {
    /// Tile whose corner ring minted this node
    pub tile: TileId,
    /// Corner index on that tile's ring (0-5)
    pub corner: u8,
}

/// A settlement spot: a corner shared by 1-3 tiles.
/// Built once by the geometry builder; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Tiles touching this corner (1-3)
    pub tiles: Vec<TileId>,
    /// Nodes exactly one edge away (2-3); basis of the distance rule
    pub neighbors: Vec<NodeId>,
    /// First tile corner that produced this node
    pub anchor: NodeAnchor,
}

/// Problems detected when rebuilding a board from stored tiles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("expected {TILE_COUNT} tiles, got {0}")]
    WrongTileCount(usize),
    #[error("tile {0} does not match the fixed layout")]
    LayoutMismatch(TileId),
    #[error("expected exactly one desert tile, got {0}")]
    WrongDesertCount(usize),
    #[error("tile {0} carries an invalid production number")]
    BadNumber(TileId),
}

/// The complete, immutable board: tile list plus the deduplicated node graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    tiles: Vec<Tile>,
    nodes: Vec<Node>,
    /// Per-tile corner node ids in ring order; fixes production iteration order
    corner_nodes: Vec<[NodeId; 6]>,
}

/// The 19 tile positions in 3/4/5/4/3 row encounter order.
pub fn layout_coords() -> Vec<HexCoord> {
    let mut coords = Vec::with_capacity(TILE_COUNT);
    for r in -2..=2 {
        let q_min = (-2).max(-2 - r);
        let q_max = 2.min(2 - r);
        for q in q_min..=q_max {
            coords.push(HexCoord::new(q, r));
        }
    }
    coords
}

/// The fixed resource pool: 3 Brick, 4 Lumber, 3 Ore, 4 Grain, 4 Wool, 1 Desert.
pub fn default_kind_pool() -> Vec<TileKind> {
    let mut pool = Vec::with_capacity(TILE_COUNT);
    let counts = [
        (Resource::Brick, 3),
        (Resource::Lumber, 4),
        (Resource::Ore, 3),
        (Resource::Grain, 4),
        (Resource::Wool, 4),
    ];
    for (resource, count) in counts {
        pool.extend(std::iter::repeat(TileKind::Producing(resource)).take(count));
    }
    pool.push(TileKind::Desert);
    pool
}

/// The fixed 18-number pool. Sevens are reserved for the robber roll and are
/// never printed on a tile.
pub fn number_pool() -> [u8; 18] {
    [2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12]
}

impl Board {
    /// Build the default (non-randomized) board: kinds and numbers assigned
    /// in encounter order from the fixed pools. Cannot fail.
    pub fn generate() -> Self {
        Self::assemble(tiles_from_pools(&default_kind_pool(), &number_pool()))
    }

    /// Rebuild a board from a stored tile list, validating it against the
    /// fixed layout. Used by the snapshot codec.
    pub fn from_tiles(tiles: Vec<Tile>) -> Result<Self, BoardError> {
        if tiles.len() != TILE_COUNT {
            return Err(BoardError::WrongTileCount(tiles.len()));
        }
        let layout = layout_coords();
        let mut deserts = 0;
        for (i, tile) in tiles.iter().enumerate() {
            if tile.id as usize != i || tile.coord != layout[i] {
                return Err(BoardError::LayoutMismatch(tile.id));
            }
            match tile.kind {
                TileKind::Desert => {
                    deserts += 1;
                    if tile.number.is_some() {
                        return Err(BoardError::BadNumber(tile.id));
                    }
                }
                TileKind::Producing(_) => match tile.number {
                    Some(n) if (2..=12).contains(&n) && n != 7 => {}
                    _ => return Err(BoardError::BadNumber(tile.id)),
                },
            }
        }
        if deserts != 1 {
            return Err(BoardError::WrongDesertCount(deserts));
        }
        Ok(Self::assemble(tiles))
    }

    /// Derive the node graph for a tile list.
    pub(crate) fn assemble(tiles: Vec<Tile>) -> Self {
        let mut nodes: Vec<Node> = Vec::with_capacity(NODE_COUNT);
        let mut seen: HashMap<CornerCoord, NodeId> = HashMap::with_capacity(NODE_COUNT);
        let mut corner_nodes: Vec<[NodeId; 6]> = Vec::with_capacity(tiles.len());

        for tile in &tiles {
            let ring = tile.coord.corners();
            let mut ids = [0 as NodeId; 6];
            for (i, corner) in ring.iter().enumerate() {
                let id = *seen.entry(*corner).or_insert_with(|| {
                    let id = nodes.len() as NodeId;
                    nodes.push(Node {
                        id,
                        tiles: Vec::with_capacity(3),
                        neighbors: Vec::with_capacity(3),
                        anchor: NodeAnchor {
                            tile: tile.id,
                            corner: i as u8,
                        },
                    });
                    id
                });
                nodes[id as usize].tiles.push(tile.id);
                ids[i] = id;
            }
            // Walking the ring in both directions links each corner to the
            // two corners one edge away.
            for i in 0..6 {
                link(&mut nodes, ids[i], ids[(i + 1) % 6]);
            }
            corner_nodes.push(ids);
        }

        Self {
            tiles,
            nodes,
            corner_nodes,
        }
    }

    /// All tiles in encounter order
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// All nodes in first-seen order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Get a tile by id
    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id as usize)
    }

    /// Get a node by id
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    /// The corner node ids of a tile in ring order
    pub fn corner_nodes(&self, tile: TileId) -> &[NodeId; 6] {
        &self.corner_nodes[tile as usize]
    }

    /// The barren tile's id (robber start position)
    pub fn desert_tile(&self) -> TileId {
        // from_tiles/assemble guarantee exactly one desert
        self.tiles
            .iter()
            .find(|t| t.is_desert())
            .map(|t| t.id)
            .unwrap_or(0)
    }
}

/// Assign pool kinds and numbers to the fixed layout in encounter order.
pub(crate) fn tiles_from_pools(kinds: &[TileKind], numbers: &[u8]) -> Vec<Tile> {
    let mut next_number = numbers.iter().copied();
    layout_coords()
        .into_iter()
        .zip(kinds.iter().copied())
        .enumerate()
        .map(|(i, (coord, kind))| Tile {
            id: i as TileId,
            coord,
            kind,
            number: match kind {
                TileKind::Desert => None,
                TileKind::Producing(_) => next_number.next(),
            },
        })
        .collect()
}

fn link(nodes: &mut [Node], a: NodeId, b: NodeId) {
    if !nodes[a as usize].neighbors.contains(&b) {
        nodes[a as usize].neighbors.push(b);
    }
    if !nodes[b as usize].neighbors.contains(&a) {
        nodes[b as usize].neighbors.push(a);
    }
}
