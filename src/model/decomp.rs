use crate::error::{Error, Result};

// Neighbor enumeration order is fixed; message tags encode it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    East,
    South,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    pub fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
            Direction::NorthEast => 4,
            Direction::NorthWest => 5,
            Direction::SouthEast => 6,
            Direction::SouthWest => 7,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::NorthEast => Direction::SouthWest,
            Direction::NorthWest => Direction::SouthEast,
            Direction::SouthEast => Direction::NorthWest,
            Direction::SouthWest => Direction::NorthEast,
        }
    }

    pub fn tag(self) -> i32 {
        self.index() as i32
    }
}

// Geometry of one rank's tile: interior extent, global origin, and the
// ghost-padded storage dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileInfo {
    pub col: usize,
    pub row: usize,
    pub num_x: usize,
    pub num_y: usize,
    pub offset_x: usize,
    pub offset_y: usize,
    pub start_x: usize,
    pub start_y: usize,
    pub dim_x: usize,
    pub dim_y: usize,
}

impl TileInfo {
    pub fn cell_count(&self) -> usize {
        self.dim_x * self.dim_y
    }

    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.dim_x + x
    }
}

#[derive(Debug, Clone)]
pub struct Decomposition {
    total_x: usize,
    total_y: usize,
    ranks_x: usize,
    ranks_y: usize,
    num_ranks: usize,
}

impl Decomposition {
    pub fn new(width: usize, height: usize, num_ranks: usize) -> Result<Self> {
        if num_ranks == 0 {
            return Err(Error::invalid_parameters(
                "Number of ranks must be positive",
            ));
        }
        let (ranks_x, ranks_y) = closest_factors(num_ranks);
        if width < ranks_x || height < ranks_y {
            return Err(Error::invalid_decomposition(
                width,
                height,
                num_ranks,
                "Grid too small for the rank layout",
            ));
        }
        Ok(Self {
            total_x: width,
            total_y: height,
            ranks_x,
            ranks_y,
            num_ranks,
        })
    }

    pub fn total_x(&self) -> usize {
        self.total_x
    }

    pub fn total_y(&self) -> usize {
        self.total_y
    }

    pub fn ranks_x(&self) -> usize {
        self.ranks_x
    }

    pub fn ranks_y(&self) -> usize {
        self.ranks_y
    }

    pub fn num_ranks(&self) -> usize {
        self.num_ranks
    }

    pub fn tile(&self, rank: usize) -> TileInfo {
        let chunk_w = self.total_x / self.ranks_x;
        let chunk_h = self.total_y / self.ranks_y;
        let extra_w = self.total_x % self.ranks_x;
        let extra_h = self.total_y % self.ranks_y;
        let col = rank % self.ranks_x;
        let row = rank / self.ranks_x;
        let num_x = chunk_w + usize::from(col < extra_w);
        let num_y = chunk_h + usize::from(row < extra_h);
        let offset_x = col * chunk_w + col.min(extra_w);
        let offset_y = row * chunk_h + row.min(extra_h);
        let start_x = usize::from(col > 0);
        let start_y = usize::from(row > 0);
        let dim_x = num_x + start_x + usize::from(col < self.ranks_x - 1);
        let dim_y = num_y + start_y + usize::from(row < self.ranks_y - 1);
        TileInfo {
            col,
            row,
            num_x,
            num_y,
            offset_x,
            offset_y,
            start_x,
            start_y,
            dim_x,
            dim_y,
        }
    }

    pub fn tiles(&self) -> Vec<TileInfo> {
        (0..self.num_ranks).map(|rank| self.tile(rank)).collect()
    }

    // Neighbor ranks in Direction order; None where the grid edge is reached.
    pub fn neighbors(&self, rank: usize) -> [Option<usize>; 8] {
        let col = rank % self.ranks_x;
        let row = rank / self.ranks_x;
        let north = row < self.ranks_y - 1;
        let south = row > 0;
        let east = col < self.ranks_x - 1;
        let west = col > 0;
        [
            north.then(|| rank + self.ranks_x),
            east.then(|| rank + 1),
            south.then(|| rank - self.ranks_x),
            west.then(|| rank - 1),
            (north && east).then(|| rank + self.ranks_x + 1),
            (north && west).then(|| rank + self.ranks_x - 1),
            (south && east).then(|| rank - self.ranks_x + 1),
            (south && west).then(|| rank - self.ranks_x - 1),
        ]
    }
}

// Factor pair of `value` closest to square; the smaller factor is the
// largest divisor not exceeding sqrt(value).
fn closest_factors(value: usize) -> (usize, usize) {
    let mut small = value.isqrt();
    while value % small != 0 {
        small -= 1;
    }
    (value / small, small)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factors_are_near_square() {
        assert_eq!(closest_factors(1), (1, 1));
        assert_eq!(closest_factors(2), (2, 1));
        assert_eq!(closest_factors(4), (2, 2));
        assert_eq!(closest_factors(6), (3, 2));
        assert_eq!(closest_factors(7), (7, 1));
        assert_eq!(closest_factors(12), (4, 3));
        assert_eq!(closest_factors(16), (4, 4));
    }

    #[test]
    fn rejects_grid_smaller_than_rank_layout() {
        assert!(Decomposition::new(2, 8, 3).is_err());
        assert!(Decomposition::new(8, 1, 4).is_err());
        assert!(Decomposition::new(0, 0, 0).is_err());
        assert!(Decomposition::new(3, 1, 3).is_ok());
    }

    #[test]
    fn rank_layout_is_row_major_over_the_factor_pair() {
        let decomp = Decomposition::new(16, 8, 6).unwrap();
        assert_eq!(decomp.ranks_x(), 3);
        assert_eq!(decomp.ranks_y(), 2);
        assert_eq!(decomp.num_ranks(), 6);
        assert_eq!((decomp.total_x(), decomp.total_y()), (16, 8));
        let tile = decomp.tile(4);
        assert_eq!((tile.col, tile.row), (1, 1));
    }

    #[test]
    fn single_rank_has_no_ghosts_and_no_neighbors() {
        let decomp = Decomposition::new(8, 8, 1).unwrap();
        let tile = decomp.tile(0);
        assert_eq!((tile.num_x, tile.num_y), (8, 8));
        assert_eq!((tile.dim_x, tile.dim_y), (8, 8));
        assert_eq!((tile.start_x, tile.start_y), (0, 0));
        assert!(decomp.neighbors(0).iter().all(|n| n.is_none()));
    }

    #[test]
    fn tiles_cover_the_grid_exactly() {
        for &(width, height, num_ranks) in &[
            (8usize, 8usize, 1usize),
            (16, 8, 2),
            (16, 8, 4),
            (600, 240, 4),
            (7, 5, 6),
            (13, 11, 12),
        ] {
            let decomp = Decomposition::new(width, height, num_ranks).unwrap();
            let mut owners = vec![None; width * height];
            for (rank, tile) in decomp.tiles().into_iter().enumerate() {
                for y in tile.offset_y..tile.offset_y + tile.num_y {
                    for x in tile.offset_x..tile.offset_x + tile.num_x {
                        let cell = &mut owners[y * width + x];
                        assert!(cell.is_none(), "cell ({}, {}) owned twice", x, y);
                        *cell = Some(rank);
                    }
                }
            }
            assert!(owners.iter().all(|owner| owner.is_some()));
        }
    }

    #[test]
    fn tile_sizes_differ_by_at_most_one() {
        let decomp = Decomposition::new(13, 11, 12).unwrap();
        let tiles = decomp.tiles();
        let (min_x, max_x) = tiles
            .iter()
            .fold((usize::MAX, 0), |(lo, hi), t| (lo.min(t.num_x), hi.max(t.num_x)));
        let (min_y, max_y) = tiles
            .iter()
            .fold((usize::MAX, 0), |(lo, hi), t| (lo.min(t.num_y), hi.max(t.num_y)));
        assert!(max_x - min_x <= 1);
        assert!(max_y - min_y <= 1);
    }

    #[test]
    fn ghost_flags_follow_neighbor_existence() {
        let decomp = Decomposition::new(16, 8, 4).unwrap();
        for rank in 0..4 {
            let tile = decomp.tile(rank);
            let neighbors = decomp.neighbors(rank);
            assert_eq!(
                tile.start_x,
                usize::from(neighbors[Direction::West.index()].is_some())
            );
            assert_eq!(
                tile.start_y,
                usize::from(neighbors[Direction::South.index()].is_some())
            );
            let east_ghost = tile.dim_x - tile.start_x - tile.num_x;
            assert_eq!(
                east_ghost,
                usize::from(neighbors[Direction::East.index()].is_some())
            );
        }
    }

    #[test]
    fn neighbors_are_symmetric() {
        for &(width, height, num_ranks) in &[(16usize, 8usize, 2usize), (16, 16, 4), (13, 11, 12)] {
            let decomp = Decomposition::new(width, height, num_ranks).unwrap();
            for rank in 0..num_ranks {
                for dir in Direction::ALL {
                    if let Some(peer) = decomp.neighbors(rank)[dir.index()] {
                        assert_eq!(
                            decomp.neighbors(peer)[dir.opposite().index()],
                            Some(rank),
                            "rank {} dir {:?} peer {}",
                            rank,
                            dir,
                            peer
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn opposite_tags_pair_up() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_ne!(dir.tag(), dir.opposite().tag());
        }
    }
}
