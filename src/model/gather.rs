use mpi::traits::*;

use super::decomp::{Decomposition, TileInfo};
use super::halo::paired_exchange;
use super::tile::{Field, TileStore};

const FIELD_TAG: i32 = 0;
const BARRIER_TAG: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FluidProperty {
    None,
    Density,
    Speed,
    Vorticity,
}

impl FluidProperty {
    fn field(self) -> Option<Field> {
        match self {
            FluidProperty::None => None,
            FluidProperty::Density => Some(Field::Density),
            FluidProperty::Speed => Some(Field::Speed),
            FluidProperty::Vorticity => Some(Field::Vorticity),
        }
    }
}

// Rank 0's view of the whole grid. The buffers exist on every rank but are
// only ever populated on rank 0.
pub struct GatherBuffers {
    total_x: usize,
    field: Vec<f64>,
    barrier: Vec<bool>,
    scratch: Vec<f64>,
    barrier_scratch: Vec<u8>,
    stored: FluidProperty,
}

impl GatherBuffers {
    pub fn new(decomp: &Decomposition) -> Self {
        let total = decomp.total_x() * decomp.total_y();
        let largest_interior = decomp
            .tiles()
            .iter()
            .map(|tile| tile.num_x * tile.num_y)
            .max()
            .unwrap_or(0);
        Self {
            total_x: decomp.total_x(),
            field: vec![0.0; total],
            barrier: vec![false; total],
            scratch: vec![0.0; largest_interior],
            barrier_scratch: vec![0; largest_interior],
            stored: FluidProperty::None,
        }
    }

    pub fn stored(&self) -> FluidProperty {
        self.stored
    }

    pub fn field(&self) -> &[f64] {
        &self.field
    }

    pub fn barrier(&self) -> &[bool] {
        &self.barrier
    }

    // Every rank contributes its owned interior rectangle; rank 0 places
    // each rectangle at its global origin. Rank 0 contributes through a
    // paired self send/receive so all ranks share one code path.
    pub fn gather<C: Communicator>(
        &mut self,
        comm: &C,
        rank: usize,
        tiles: &[TileInfo],
        store: &TileStore,
        property: FluidProperty,
    ) {
        let Some(field) = property.field() else {
            return;
        };
        let own = pack_interior(store.field(field), store.tile());
        let own_barrier = pack_interior_flags(store.barrier(), store.tile());

        if rank == 0 {
            let len = own.len();
            paired_exchange(
                comm,
                0,
                &own[..],
                FIELD_TAG,
                &mut self.scratch[..len],
                FIELD_TAG,
            );
            place(&self.scratch[..len], &tiles[0], self.total_x, &mut self.field);
            paired_exchange(
                comm,
                0,
                &own_barrier[..],
                BARRIER_TAG,
                &mut self.barrier_scratch[..len],
                BARRIER_TAG,
            );
            place_flags(
                &self.barrier_scratch[..len],
                &tiles[0],
                self.total_x,
                &mut self.barrier,
            );
            for (peer, tile) in tiles.iter().enumerate().skip(1) {
                let len = tile.num_x * tile.num_y;
                let process = comm.process_at_rank(peer as i32);
                process.receive_into_with_tag(&mut self.scratch[..len], FIELD_TAG);
                place(&self.scratch[..len], tile, self.total_x, &mut self.field);
                process.receive_into_with_tag(&mut self.barrier_scratch[..len], BARRIER_TAG);
                place_flags(
                    &self.barrier_scratch[..len],
                    tile,
                    self.total_x,
                    &mut self.barrier,
                );
            }
        } else {
            let root = comm.process_at_rank(0);
            root.send_with_tag(&own[..], FIELD_TAG);
            root.send_with_tag(&own_barrier[..], BARRIER_TAG);
        }

        self.stored = property;
    }
}

fn pack_interior(src: &[f64], tile: &TileInfo) -> Vec<f64> {
    let mut out = Vec::with_capacity(tile.num_x * tile.num_y);
    for y in tile.start_y..tile.start_y + tile.num_y {
        let row = y * tile.dim_x + tile.start_x;
        out.extend_from_slice(&src[row..row + tile.num_x]);
    }
    out
}

fn pack_interior_flags(src: &[bool], tile: &TileInfo) -> Vec<u8> {
    let mut out = Vec::with_capacity(tile.num_x * tile.num_y);
    for y in tile.start_y..tile.start_y + tile.num_y {
        let row = y * tile.dim_x + tile.start_x;
        out.extend(src[row..row + tile.num_x].iter().map(|&b| u8::from(b)));
    }
    out
}

fn place(src: &[f64], tile: &TileInfo, total_x: usize, dst: &mut [f64]) {
    for row in 0..tile.num_y {
        let to = (tile.offset_y + row) * total_x + tile.offset_x;
        let from = row * tile.num_x;
        dst[to..to + tile.num_x].copy_from_slice(&src[from..from + tile.num_x]);
    }
}

fn place_flags(src: &[u8], tile: &TileInfo, total_x: usize, dst: &mut [bool]) {
    for row in 0..tile.num_y {
        let to = (tile.offset_y + row) * total_x + tile.offset_x;
        let from = row * tile.num_x;
        for x in 0..tile.num_x {
            dst[to + x] = src[from + x] != 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Decomposition;

    // pack + place over every tile must reconstruct the global function.
    #[test]
    fn pack_and_place_reconstruct_the_grid() {
        let decomp = Decomposition::new(16, 8, 4).unwrap();
        let total_x = decomp.total_x();
        let mut global = vec![0.0; total_x * decomp.total_y()];

        for tile in decomp.tiles() {
            let mut store = TileStore::new(tile);
            let data = store.field_mut(Field::Density);
            for y in tile.start_y..tile.start_y + tile.num_y {
                for x in tile.start_x..tile.start_x + tile.num_x {
                    let gx = tile.offset_x - tile.start_x + x;
                    let gy = tile.offset_y - tile.start_y + y;
                    data[tile.index(x, y)] = (1000 * gx + gy) as f64;
                }
            }
            let packed = pack_interior(store.field(Field::Density), &tile);
            place(&packed, &tile, total_x, &mut global);
        }

        for gy in 0..decomp.total_y() {
            for gx in 0..total_x {
                assert_eq!(global[gy * total_x + gx], (1000 * gx + gy) as f64);
            }
        }
    }

    #[test]
    fn barrier_flags_survive_the_wire_encoding() {
        let decomp = Decomposition::new(8, 8, 1).unwrap();
        let tile = decomp.tile(0);
        let mut store = TileStore::new(tile);
        store.barrier_mut()[tile.index(3, 4)] = true;
        let packed = pack_interior_flags(store.barrier(), &tile);
        let mut global = vec![false; 64];
        place_flags(&packed, &tile, 8, &mut global);
        for gy in 0..8 {
            for gx in 0..8 {
                assert_eq!(global[gy * 8 + gx], gx == 3 && gy == 4);
            }
        }
    }

    #[test]
    fn none_selects_no_field() {
        assert_eq!(FluidProperty::None.field(), None);
        assert_eq!(FluidProperty::Speed.field(), Some(Field::Speed));
    }
}
