use mpi::traits::*;

use crate::error::{Error, Result};

use super::barrier;
use super::barrier::Segment;
use super::decomp::{Decomposition, TileInfo};
use super::gather::{FluidProperty, GatherBuffers};
use super::halo::HaloExchange;
use super::tile::{Field, FieldsMut, TileStore};

// D2Q9 lattice weights.
const FOUR_NINTHS: f64 = 4.0 / 9.0;
const ONE_NINTH: f64 = 1.0 / 9.0;
const ONE_THIRTYSIXTH: f64 = 1.0 / 36.0;

// One rank's share of the distributed D2Q9 simulation. Construction is
// communicator-free; only `exchange_boundaries` and `gather_on_root` touch
// the transport, so several engines can coexist in one process.
pub struct LbmD2Q9 {
    rank: usize,
    speed_scale: f64,
    total_x: usize,
    total_y: usize,
    tiles: Vec<TileInfo>,
    neighbors: [Option<usize>; 8],
    store: TileStore,
    halo: HaloExchange,
    gathered: GatherBuffers,
}

impl LbmD2Q9 {
    pub fn new(
        width: usize,
        height: usize,
        speed_scale: f64,
        rank: usize,
        num_ranks: usize,
    ) -> Result<Self> {
        let decomp = Decomposition::new(width, height, num_ranks)?;
        if rank >= num_ranks {
            return Err(Error::invalid_parameters("Rank outside the communicator"));
        }
        let tiles = decomp.tiles();
        let neighbors = decomp.neighbors(rank);
        let tile = tiles[rank];
        let store = TileStore::new(tile);
        let halo = HaloExchange::new(&tile);
        let gathered = GatherBuffers::new(&decomp);
        Ok(Self {
            rank,
            speed_scale,
            total_x: width,
            total_y: height,
            tiles,
            neighbors,
            store,
            halo,
            gathered,
        })
    }

    pub fn init_barrier(&mut self, segments: &[Segment]) {
        let tile = *self.store.tile();
        barrier::apply(segments, &tile, self.store.barrier_mut());
    }

    // Whole tile (ghosts included) to the inflow equilibrium.
    pub fn init_fluid(&mut self, physical_speed: f64) {
        let TileInfo { dim_x, dim_y, .. } = *self.store.tile();
        let speed = self.speed_scale * physical_speed;
        let mut f = self.store.fields_mut();
        for y in 0..dim_y {
            let row = y * dim_x;
            for x in 0..dim_x {
                set_equilibrium(&mut f, row + x, speed, 0.0, 1.0);
                f.vorticity[row + x] = 0.0;
            }
        }
    }

    // Re-impose the inflow reservoir on the outermost ring only; the
    // interior keeps evolving. Used by steering to change the flow speed.
    pub fn update_fluid(&mut self, physical_speed: f64) {
        let TileInfo { dim_x, dim_y, .. } = *self.store.tile();
        let speed = self.speed_scale * physical_speed;
        let mut f = self.store.fields_mut();
        let top = (dim_y - 1) * dim_x;
        for x in 0..dim_x {
            set_equilibrium(&mut f, x, speed, 0.0, 1.0);
            set_equilibrium(&mut f, top + x, speed, 0.0, 1.0);
        }
        for y in 1..dim_y - 1 {
            let row = y * dim_x;
            set_equilibrium(&mut f, row, speed, 0.0, 1.0);
            set_equilibrium(&mut f, row + dim_x - 1, speed, 0.0, 1.0);
        }
    }

    // BGK relaxation toward local equilibrium over the interior.
    pub fn collide(&mut self, viscosity: f64) {
        let TileInfo { dim_x, dim_y, .. } = *self.store.tile();
        let omega = 1.0 / (3.0 * viscosity + 0.5); // reciprocal of relaxation time
        let mut f = self.store.fields_mut();
        for y in 1..dim_y - 1 {
            let row = y * dim_x;
            for x in 1..dim_x - 1 {
                let idx = row + x;
                let density = f.f_0[idx]
                    + f.f_n[idx]
                    + f.f_s[idx]
                    + f.f_e[idx]
                    + f.f_w[idx]
                    + f.f_nw[idx]
                    + f.f_ne[idx]
                    + f.f_sw[idx]
                    + f.f_se[idx];
                let velocity_x = (f.f_e[idx] + f.f_ne[idx] + f.f_se[idx]
                    - f.f_w[idx]
                    - f.f_nw[idx]
                    - f.f_sw[idx])
                    / density;
                let velocity_y = (f.f_n[idx] + f.f_ne[idx] + f.f_nw[idx]
                    - f.f_s[idx]
                    - f.f_se[idx]
                    - f.f_sw[idx])
                    / density;
                f.density[idx] = density;
                f.velocity_x[idx] = velocity_x;
                f.velocity_y[idx] = velocity_y;
                let one_ninth_density = ONE_NINTH * density;
                let four_ninths_density = FOUR_NINTHS * density;
                let one_thirtysixth_density = ONE_THIRTYSIXTH * density;
                let vel_3x = 3.0 * velocity_x;
                let vel_3y = 3.0 * velocity_y;
                let vel_x2 = velocity_x * velocity_x;
                let vel_y2 = velocity_y * velocity_y;
                let vel_2xy = 2.0 * velocity_x * velocity_y;
                let vel_sq = vel_x2 + vel_y2;
                let vel_sq_15 = 1.5 * vel_sq;
                f.f_0[idx] += omega * (four_ninths_density * (1.0 - vel_sq_15) - f.f_0[idx]);
                f.f_e[idx] += omega
                    * (one_ninth_density * (1.0 + vel_3x + 4.5 * vel_x2 - vel_sq_15) - f.f_e[idx]);
                f.f_w[idx] += omega
                    * (one_ninth_density * (1.0 - vel_3x + 4.5 * vel_x2 - vel_sq_15) - f.f_w[idx]);
                f.f_n[idx] += omega
                    * (one_ninth_density * (1.0 + vel_3y + 4.5 * vel_y2 - vel_sq_15) - f.f_n[idx]);
                f.f_s[idx] += omega
                    * (one_ninth_density * (1.0 - vel_3y + 4.5 * vel_y2 - vel_sq_15) - f.f_s[idx]);
                f.f_ne[idx] += omega
                    * (one_thirtysixth_density
                        * (1.0 + vel_3x + vel_3y + 4.5 * (vel_sq + vel_2xy) - vel_sq_15)
                        - f.f_ne[idx]);
                f.f_se[idx] += omega
                    * (one_thirtysixth_density
                        * (1.0 + vel_3x - vel_3y + 4.5 * (vel_sq - vel_2xy) - vel_sq_15)
                        - f.f_se[idx]);
                f.f_nw[idx] += omega
                    * (one_thirtysixth_density
                        * (1.0 - vel_3x + vel_3y + 4.5 * (vel_sq - vel_2xy) - vel_sq_15)
                        - f.f_nw[idx]);
                f.f_sw[idx] += omega
                    * (one_thirtysixth_density
                        * (1.0 - vel_3x - vel_3y + 4.5 * (vel_sq + vel_2xy) - vel_sq_15)
                        - f.f_sw[idx]);
            }
        }
    }

    // In-place directional shifts. Each sweep starts in the corner the
    // channel moves toward so no cell is read after it was overwritten.
    pub fn stream(&mut self) {
        let TileInfo { dim_x, dim_y, .. } = *self.store.tile();
        let mut f = self.store.fields_mut();
        for y in (1..dim_y - 1).rev() {
            // N and NW from the NW corner
            let row = y * dim_x;
            let south = (y - 1) * dim_x;
            for x in 1..dim_x - 1 {
                f.f_n[row + x] = f.f_n[south + x];
                f.f_nw[row + x] = f.f_nw[south + x + 1];
            }
        }
        for y in (1..dim_y - 1).rev() {
            // E and NE from the NE corner
            let row = y * dim_x;
            let south = (y - 1) * dim_x;
            for x in (1..dim_x - 1).rev() {
                f.f_e[row + x] = f.f_e[row + x - 1];
                f.f_ne[row + x] = f.f_ne[south + x - 1];
            }
        }
        for y in 1..dim_y - 1 {
            // S and SE from the SE corner
            let row = y * dim_x;
            let north = (y + 1) * dim_x;
            for x in (1..dim_x - 1).rev() {
                f.f_s[row + x] = f.f_s[north + x];
                f.f_se[row + x] = f.f_se[north + x - 1];
            }
        }
        for y in 1..dim_y - 1 {
            // W and SW from the SW corner
            let row = y * dim_x;
            let north = (y + 1) * dim_x;
            for x in 1..dim_x - 1 {
                f.f_w[row + x] = f.f_w[row + x + 1];
                f.f_sw[row + x] = f.f_sw[north + x + 1];
            }
        }
    }

    // No-slip walls: a channel that would have streamed out of a barrier
    // cell is replaced by the reversed channel stored at that cell.
    pub fn bounce_back_stream(&mut self) {
        let TileInfo { dim_x, dim_y, .. } = *self.store.tile();
        let (mut f, barrier) = self.store.split_mut();
        for y in 1..dim_y - 1 {
            let row = y * dim_x;
            let south = (y - 1) * dim_x;
            let north = (y + 1) * dim_x;
            for x in 1..dim_x - 1 {
                let idx = row + x;
                if barrier[row + x - 1] {
                    f.f_e[idx] = f.f_w[row + x - 1];
                }
                if barrier[row + x + 1] {
                    f.f_w[idx] = f.f_e[row + x + 1];
                }
                if barrier[south + x] {
                    f.f_n[idx] = f.f_s[south + x];
                }
                if barrier[north + x] {
                    f.f_s[idx] = f.f_n[north + x];
                }
                if barrier[south + x - 1] {
                    f.f_ne[idx] = f.f_sw[south + x - 1];
                }
                if barrier[south + x + 1] {
                    f.f_nw[idx] = f.f_se[south + x + 1];
                }
                if barrier[north + x - 1] {
                    f.f_se[idx] = f.f_nw[north + x - 1];
                }
                if barrier[north + x + 1] {
                    f.f_sw[idx] = f.f_ne[north + x + 1];
                }
            }
        }
    }

    pub fn exchange_boundaries<C: Communicator>(&mut self, comm: &C) {
        self.halo.exchange(comm, &self.neighbors, &mut self.store);
    }

    // Probe the mid-row (ghosts included) for a collapsed density.
    pub fn check_stability(&self) -> bool {
        let TileInfo { dim_x, dim_y, .. } = *self.store.tile();
        let density = self.store.field(Field::Density);
        let row = (dim_y / 2) * dim_x;
        !(0..dim_x).any(|x| density[row + x] <= 0.0)
    }

    pub fn compute_speed(&mut self) {
        let TileInfo { dim_x, dim_y, .. } = *self.store.tile();
        let mut f = self.store.fields_mut();
        for y in 1..dim_y - 1 {
            let row = y * dim_x;
            for x in 1..dim_x - 1 {
                let idx = row + x;
                f.speed[idx] = (f.velocity_x[idx] * f.velocity_x[idx]
                    + f.velocity_y[idx] * f.velocity_y[idx])
                    .sqrt();
            }
        }
    }

    // Discrete curl by central differences.
    pub fn compute_vorticity(&mut self) {
        let TileInfo { dim_x, dim_y, .. } = *self.store.tile();
        let mut f = self.store.fields_mut();
        for y in 1..dim_y - 1 {
            let row = y * dim_x;
            let south = (y - 1) * dim_x;
            let north = (y + 1) * dim_x;
            for x in 1..dim_x - 1 {
                f.vorticity[row + x] = f.velocity_y[row + x + 1] - f.velocity_y[row + x - 1]
                    - f.velocity_x[north + x]
                    + f.velocity_x[south + x];
            }
        }
    }

    pub fn gather_on_root<C: Communicator>(&mut self, comm: &C, property: FluidProperty) {
        self.gathered
            .gather(comm, self.rank, &self.tiles, &self.store, property);
    }

    pub fn dim_x(&self) -> usize {
        self.store.tile().dim_x
    }

    pub fn dim_y(&self) -> usize {
        self.store.tile().dim_y
    }

    pub fn total_dim_x(&self) -> usize {
        self.total_x
    }

    pub fn total_dim_y(&self) -> usize {
        self.total_y
    }

    pub fn offset_x(&self) -> usize {
        self.store.tile().offset_x
    }

    pub fn offset_y(&self) -> usize {
        self.store.tile().offset_y
    }

    pub fn rank_local_size(&self, rank: usize) -> (usize, usize) {
        let tile = &self.tiles[rank];
        (tile.num_x, tile.num_y)
    }

    pub fn rank_local_start(&self, rank: usize) -> (usize, usize) {
        let tile = &self.tiles[rank];
        (tile.start_x, tile.start_y)
    }

    pub fn field(&self, field: Field) -> &[f64] {
        self.store.field(field)
    }

    pub fn field_mut(&mut self, field: Field) -> &mut [f64] {
        self.store.field_mut(field)
    }

    pub fn barrier(&self) -> &[bool] {
        self.store.barrier()
    }

    pub fn density(&self) -> &[f64] {
        self.store.field(Field::Density)
    }

    pub fn velocity_x(&self) -> &[f64] {
        self.store.field(Field::VelocityX)
    }

    pub fn velocity_y(&self) -> &[f64] {
        self.store.field(Field::VelocityY)
    }

    pub fn vorticity(&self) -> &[f64] {
        self.store.field(Field::Vorticity)
    }

    pub fn speed(&self) -> &[f64] {
        self.store.field(Field::Speed)
    }

    // Gathered views, valid on rank 0 only.
    pub fn gathered_field(&self) -> Option<&[f64]> {
        (self.rank == 0 && self.gathered.stored() != FluidProperty::None)
            .then(|| self.gathered.field())
    }

    pub fn gathered_barrier(&self) -> Option<&[bool]> {
        (self.rank == 0).then(|| self.gathered.barrier())
    }
}

fn set_equilibrium(
    f: &mut FieldsMut<'_>,
    idx: usize,
    velocity_x: f64,
    velocity_y: f64,
    density: f64,
) {
    let vel_3x = 3.0 * velocity_x;
    let vel_3y = 3.0 * velocity_y;
    let vel_x2 = velocity_x * velocity_x;
    let vel_y2 = velocity_y * velocity_y;
    let vel_2xy = 2.0 * velocity_x * velocity_y;
    let vel_sq = vel_x2 + vel_y2;
    let vel_sq_15 = 1.5 * vel_sq;
    f.f_0[idx] = FOUR_NINTHS * density * (1.0 - vel_sq_15);
    f.f_e[idx] = ONE_NINTH * density * (1.0 + vel_3x + 4.5 * vel_x2 - vel_sq_15);
    f.f_w[idx] = ONE_NINTH * density * (1.0 - vel_3x + 4.5 * vel_x2 - vel_sq_15);
    f.f_n[idx] = ONE_NINTH * density * (1.0 + vel_3y + 4.5 * vel_y2 - vel_sq_15);
    f.f_s[idx] = ONE_NINTH * density * (1.0 - vel_3y + 4.5 * vel_y2 - vel_sq_15);
    f.f_ne[idx] =
        ONE_THIRTYSIXTH * density * (1.0 + vel_3x + vel_3y + 4.5 * (vel_sq + vel_2xy) - vel_sq_15);
    f.f_se[idx] =
        ONE_THIRTYSIXTH * density * (1.0 + vel_3x - vel_3y + 4.5 * (vel_sq - vel_2xy) - vel_sq_15);
    f.f_nw[idx] =
        ONE_THIRTYSIXTH * density * (1.0 - vel_3x + vel_3y + 4.5 * (vel_sq - vel_2xy) - vel_sq_15);
    f.f_sw[idx] =
        ONE_THIRTYSIXTH * density * (1.0 - vel_3x - vel_3y + 4.5 * (vel_sq + vel_2xy) - vel_sq_15);
    f.density[idx] = density;
    f.velocity_x[idx] = velocity_x;
    f.velocity_y[idx] = velocity_y;
}
