//! Wave Function Collapse level generation
//!
//! Each cell starts with every tile type possible. The generator repeatedly
//! collapses the lowest-entropy cell to one tile and propagates the adjacency
//! rules outward with a depth-first stack.
//!
//! Contradictions are repaired by resetting the offending cell to the full
//! palette instead of backtracking. This can leave a visible seam at the
//! repair point but guarantees termination for any rule set.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

/// Number of tile types in the palette
pub const TILE_TYPE_COUNT: usize = 5;

/// Terrain palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TileType {
    Grass,
    Forest,
    Street,
    Pavement,
    Water,
}

impl TileType {
    pub const ALL: [TileType; TILE_TYPE_COUNT] = [
        TileType::Grass,
        TileType::Forest,
        TileType::Street,
        TileType::Pavement,
        TileType::Water,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    /// Flat RGB color used by renderers and the minimap
    pub fn color(self) -> [u8; 3] {
        match self {
            TileType::Grass => [154, 205, 50],
            TileType::Forest => [34, 139, 34],
            TileType::Street => [128, 128, 144],
            TileType::Pavement => [160, 82, 45],
            TileType::Water => [0, 0, 128],
        }
    }
}

/// Neighbor direction on the grid (screen coordinates, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// Small bitset of tile types (one bit per palette entry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct TileSet(u8);

impl TileSet {
    pub const EMPTY: TileSet = TileSet(0);

    pub fn single(tile: TileType) -> Self {
        TileSet(1 << tile.index())
    }

    pub fn all() -> Self {
        TileType::ALL.iter().copied().collect()
    }

    pub fn contains(self, tile: TileType) -> bool {
        self.0 & (1 << tile.index()) != 0
    }

    pub fn insert(&mut self, tile: TileType) {
        self.0 |= 1 << tile.index();
    }

    pub fn intersection(self, other: TileSet) -> TileSet {
        TileSet(self.0 & other.0)
    }

    pub fn union(self, other: TileSet) -> TileSet {
        TileSet(self.0 | other.0)
    }

    /// Entropy: number of remaining candidates
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = TileType> {
        TileType::ALL.into_iter().filter(move |t| self.contains(*t))
    }
}

impl FromIterator<TileType> for TileSet {
    fn from_iter<I: IntoIterator<Item = TileType>>(iter: I) -> Self {
        let mut set = TileSet::EMPTY;
        for tile in iter {
            set.insert(tile);
        }
        set
    }
}

/// Which tile types may sit next to a given tile in each direction
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdjacencyRules {
    allowed: [[TileSet; 4]; TILE_TYPE_COUNT],
}

impl AdjacencyRules {
    /// No adjacency allowed at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every listed tile may neighbor every listed tile in every direction
    pub fn permissive(tiles: &[TileType]) -> Self {
        let mut rules = Self::empty();
        for &tile in tiles {
            for dir in Direction::ALL {
                rules.set(tile, dir, tiles);
            }
        }
        rules
    }

    /// Same neighbor list in all four directions
    pub fn set_all_directions(&mut self, tile: TileType, neighbors: &[TileType]) {
        for dir in Direction::ALL {
            self.set(tile, dir, neighbors);
        }
    }

    pub fn set(&mut self, tile: TileType, dir: Direction, neighbors: &[TileType]) {
        self.allowed[tile.index()][dir.index()] = neighbors.iter().copied().collect();
    }

    /// Tiles permitted at `dir` of `tile`
    pub fn allowed(&self, tile: TileType, dir: Direction) -> TileSet {
        self.allowed[tile.index()][dir.index()]
    }

    pub fn permits(&self, tile: TileType, dir: Direction, neighbor: TileType) -> bool {
        self.allowed(tile, dir).contains(neighbor)
    }

    /// Union of the allowed sets of every tile still possible in `source`
    fn support(&self, source: TileSet, dir: Direction) -> TileSet {
        source
            .iter()
            .fold(TileSet::EMPTY, |acc, t| acc.union(self.allowed(t, dir)))
    }

    /// Count adjacent pairs in `grid` that break these rules
    pub fn count_violations(&self, grid: &TileGrid) -> usize {
        let mut violations = 0;
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let Some(tile) = grid.get(x, y) else { continue };
                for dir in [Direction::Right, Direction::Down] {
                    let (dx, dy) = dir.offset();
                    let (nx, ny) = (x as isize + dx, y as isize + dy);
                    if nx < 0 || ny < 0 {
                        continue;
                    }
                    let Some(neighbor) = grid.get(nx as usize, ny as usize) else {
                        continue;
                    };
                    if !self.permits(tile, dir, neighbor)
                        || !self.permits(neighbor, dir.opposite(), tile)
                    {
                        violations += 1;
                    }
                }
            }
        }
        violations
    }
}

impl AdjacencyRules {
    /// Town-and-countryside rules for the default palette
    pub fn default_palette() -> Self {
        use TileType::*;
        let mut rules = Self::empty();
        rules.set_all_directions(Grass, &[Grass, Forest, Water, Pavement]);
        rules.set_all_directions(Forest, &[Forest, Grass]);
        rules.set_all_directions(Street, &[Street, Pavement]);
        rules.set_all_directions(Pavement, &[Grass, Street, Pavement]);
        rules.set_all_directions(Water, &[Water, Grass]);
        rules
    }
}

/// Finished level terrain, row-major
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tiles: Vec<TileType>,
}

impl TileGrid {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> Option<TileType> {
        if x < self.width && y < self.height {
            Some(self.tiles[y * self.width + x])
        } else {
            None
        }
    }

    /// Tile under a world-space point
    pub fn tile_at(&self, world_x: f32, world_y: f32, tile_size: f32) -> Option<TileType> {
        if world_x < 0.0 || world_y < 0.0 || tile_size <= 0.0 {
            return None;
        }
        self.get(
            (world_x / tile_size) as usize,
            (world_y / tile_size) as usize,
        )
    }

    pub fn tiles(&self) -> &[TileType] {
        &self.tiles
    }

    pub fn count(&self, tile: TileType) -> usize {
        self.tiles.iter().filter(|t| **t == tile).count()
    }
}

/// Per-cell generation state
#[derive(Debug, Clone, Copy)]
pub struct WaveCell {
    pub possibilities: TileSet,
    pub collapsed: Option<TileType>,
}

/// Diagnostics from one generation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationStats {
    pub collapses: usize,
    /// Cells reset to the full palette after a contradiction
    pub repairs: usize,
}

struct Wave {
    width: usize,
    height: usize,
    cells: Vec<WaveCell>,
}

impl Wave {
    fn new(width: usize, height: usize, palette: TileSet) -> Self {
        Self {
            width,
            height,
            cells: vec![
                WaveCell {
                    possibilities: palette,
                    collapsed: None,
                };
                width * height
            ],
        }
    }

    fn neighbor(&self, idx: usize, dir: Direction) -> Option<usize> {
        let (x, y) = ((idx % self.width) as isize, (idx / self.width) as isize);
        let (dx, dy) = dir.offset();
        let (nx, ny) = (x + dx, y + dy);
        if nx < 0 || ny < 0 || nx >= self.width as isize || ny >= self.height as isize {
            return None;
        }
        Some(ny as usize * self.width + nx as usize)
    }

    /// Uncollapsed cell with the fewest candidates; ties broken at random
    fn min_entropy_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        let mut min_entropy = usize::MAX;
        let mut candidates = Vec::new();
        for (idx, cell) in self.cells.iter().enumerate() {
            if cell.collapsed.is_some() {
                continue;
            }
            let entropy = cell.possibilities.len();
            if entropy < min_entropy {
                min_entropy = entropy;
                candidates.clear();
                candidates.push(idx);
            } else if entropy == min_entropy {
                candidates.push(idx);
            }
        }
        candidates.choose(rng).copied()
    }
}

/// WFC generator bound to a palette and rule set
#[derive(Debug, Clone)]
pub struct WaveFunctionCollapse {
    palette: TileSet,
    fallback: TileType,
    rules: AdjacencyRules,
}

impl WaveFunctionCollapse {
    pub fn new(tile_types: &[TileType], rules: AdjacencyRules) -> Self {
        let mut palette: TileSet = tile_types.iter().copied().collect();
        if palette.is_empty() {
            log::warn!("Empty tile palette, using all tile types");
            palette = TileSet::all();
        }
        let fallback = palette.iter().next().unwrap_or(TileType::Grass);
        Self {
            palette,
            fallback,
            rules,
        }
    }

    /// Default palette with the town-and-countryside rules
    pub fn with_default_rules() -> Self {
        Self::new(&TileType::ALL, AdjacencyRules::default_palette())
    }

    pub fn rules(&self) -> &AdjacencyRules {
        &self.rules
    }

    pub fn generate<R: Rng + ?Sized>(&self, width: usize, height: usize, rng: &mut R) -> TileGrid {
        self.generate_with_stats(width, height, rng).0
    }

    pub fn generate_with_stats<R: Rng + ?Sized>(
        &self,
        width: usize,
        height: usize,
        rng: &mut R,
    ) -> (TileGrid, GenerationStats) {
        let mut wave = Wave::new(width, height, self.palette);
        let mut stats = GenerationStats::default();

        while let Some(idx) = wave.min_entropy_cell(rng) {
            if wave.cells[idx].possibilities.is_empty() {
                wave.cells[idx].possibilities = self.palette;
                stats.repairs += 1;
            }

            let choices: Vec<TileType> = wave.cells[idx].possibilities.iter().collect();
            let tile = choices.choose(rng).copied().unwrap_or(self.fallback);
            wave.cells[idx] = WaveCell {
                possibilities: TileSet::single(tile),
                collapsed: Some(tile),
            };
            stats.collapses += 1;
            stats.repairs += self.propagate(&mut wave, idx);
        }

        if stats.repairs > 0 {
            log::warn!(
                "WFC {}x{}: {} contradiction repairs",
                width,
                height,
                stats.repairs
            );
        }

        let tiles = wave
            .cells
            .iter()
            .map(|c| c.collapsed.unwrap_or(self.fallback))
            .collect();
        (
            TileGrid {
                width,
                height,
                tiles,
            },
            stats,
        )
    }

    /// Depth-first constraint propagation from a freshly collapsed cell.
    ///
    /// A cell reset during this pass is pinned until the pass ends, so every
    /// push is either a strict shrink or a first reset and the stack drains.
    fn propagate(&self, wave: &mut Wave, origin: usize) -> usize {
        let mut repairs = 0;
        let mut pinned = vec![false; wave.cells.len()];
        let mut stack = vec![origin];

        while let Some(idx) = stack.pop() {
            let source = wave.cells[idx].possibilities;
            for dir in Direction::ALL {
                let Some(n) = wave.neighbor(idx, dir) else {
                    continue;
                };
                if pinned[n] || wave.cells[n].collapsed.is_some() {
                    continue;
                }

                let current = wave.cells[n].possibilities;
                let narrowed = current.intersection(self.rules.support(source, dir));
                if narrowed.is_empty() {
                    wave.cells[n].possibilities = self.palette;
                    pinned[n] = true;
                    repairs += 1;
                    stack.push(n);
                } else if narrowed != current {
                    wave.cells[n].possibilities = narrowed;
                    stack.push(n);
                }
            }
        }

        repairs
    }
}
