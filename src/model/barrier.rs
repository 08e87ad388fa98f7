use super::decomp::TileInfo;

// Axis-aligned barrier segments in global grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Horizontal { x_start: usize, x_end: usize, y: usize },
    Vertical { y_start: usize, y_end: usize, x: usize },
}

impl Segment {
    pub fn horizontal(x_start: usize, x_end: usize, y: usize) -> Self {
        Segment::Horizontal { x_start, x_end, y }
    }

    pub fn vertical(y_start: usize, y_end: usize, x: usize) -> Self {
        Segment::Vertical { y_start, y_end, x }
    }

    // Classify a steering endpoint pair; diagonal pairs are rejected.
    pub fn from_endpoints(x1: usize, y1: usize, x2: usize, y2: usize) -> Option<Self> {
        if x1 == x2 {
            Some(Segment::vertical(y1.min(y2), y1.max(y2), x1))
        } else if y1 == y2 {
            Some(Segment::horizontal(x1.min(x2), x1.max(x2), y1))
        } else {
            None
        }
    }
}

// Rasterize the segment list into the tile's mask. Global coordinates are
// shifted by (offset - start) so ghost cells bordering a segment are marked
// on the neighboring tile as well.
pub fn apply(segments: &[Segment], tile: &TileInfo, barrier: &mut [bool]) {
    barrier.fill(false);
    let shift_x = tile.offset_x.saturating_sub(tile.start_x);
    let shift_y = tile.offset_y.saturating_sub(tile.start_y);
    for segment in segments {
        match *segment {
            Segment::Horizontal { x_start, x_end, y } => {
                if y < shift_y {
                    continue;
                }
                let local_y = y - shift_y;
                if local_y >= tile.dim_y {
                    continue;
                }
                for x in x_start..=x_end {
                    if x < shift_x {
                        continue;
                    }
                    let local_x = x - shift_x;
                    if local_x < tile.dim_x {
                        barrier[tile.index(local_x, local_y)] = true;
                    }
                }
            }
            Segment::Vertical { y_start, y_end, x } => {
                if x < shift_x {
                    continue;
                }
                let local_x = x - shift_x;
                if local_x >= tile.dim_x {
                    continue;
                }
                for y in y_start..=y_end {
                    if y < shift_y {
                        continue;
                    }
                    let local_y = y - shift_y;
                    if local_y < tile.dim_y {
                        barrier[tile.index(local_x, local_y)] = true;
                    }
                }
            }
        }
    }
}
