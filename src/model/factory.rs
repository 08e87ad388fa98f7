use mpi::environment::Universe;
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;

use super::{LbmD2Q9, Parameters};
use crate::cli::Cli;
use crate::error::Result;

pub struct Simulation {
    pub world: SimpleCommunicator,
    pub lbm: LbmD2Q9,
    pub params: Parameters,
}

impl Simulation {
    // One full time step. The two exchanges are what keep the ranks in
    // lockstep; there is no other barrier between steps.
    pub fn step(&mut self) {
        let viscosity = self.params.simulation_viscosity();
        self.lbm.collide(viscosity);
        self.lbm.exchange_boundaries(&self.world);
        self.lbm.stream();
        self.lbm.exchange_boundaries(&self.world);
        self.lbm.bounce_back_stream();
    }
}

pub struct LbmFactory;

impl LbmFactory {
    pub fn create(universe: &Universe, args: &Cli) -> Result<Simulation> {
        let world = universe.world();
        let params = Parameters {
            width: args.width,
            height: args.height,
            time_steps: args.steps,
            fluid_density: args.fluid_density,
            flow_speed: args.flow_speed,
            pipe_length: args.pipe_length,
            fluid_viscosity: args.fluid_viscosity,
            physical_time: args.sim_time,
            output_interval: args.output_interval,
        };
        params.validate()?;
        let lbm = LbmD2Q9::new(
            params.width,
            params.height,
            params.speed_scale(),
            world.rank() as usize,
            world.size() as usize,
        )?;
        Ok(Simulation { world, lbm, params })
    }
}
