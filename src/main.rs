use mpi::collective::SystemOperation;
use mpi::traits::*;

use lbmcfd::cli::{BarrierLayout, Cli};
use lbmcfd::model::{FluidProperty, LbmFactory, Segment, Simulation};

fn main() {
    let universe = mpi::initialize().expect("failed to initialize MPI");
    let args = Cli::from_args();
    if let Err(msg) = args.validate_parameters() {
        eprintln!("lbmcfd: {}", msg);
        std::process::exit(1);
    }

    let mut sim = match LbmFactory::create(&universe, &args) {
        Ok(sim) => sim,
        Err(err) => {
            eprintln!("lbmcfd: {}", err);
            std::process::exit(1);
        }
    };
    let rank = sim.world.rank();

    if rank == 0 {
        println!("lbmcfd: running with {} processes", sim.world.size());
        println!(
            "lbmcfd: resolution={}x{}, time steps={}",
            sim.params.width, sim.params.height, sim.params.time_steps
        );
        println!(
            "lbmcfd: speed={:.6}, viscosity={:.6}, reynolds={:.6}",
            sim.params.simulation_speed(),
            sim.params.simulation_viscosity(),
            sim.params.reynolds_number()
        );
        sim.params.warn();
    }

    let barriers = barrier_layout(args.barrier_layout, sim.params.width, sim.params.height);
    sim.lbm.init_barrier(&barriers);
    sim.lbm.init_fluid(sim.params.flow_speed);

    if args.verbose {
        for i in 0..sim.world.size() {
            sim.world.barrier();
            if i == rank {
                let (num_x, num_y) = sim.lbm.rank_local_size(rank as usize);
                println!(
                    "lbmcfd: rank {}: tile {}x{} (stored {}x{}) at offset ({}, {})",
                    rank,
                    num_x,
                    num_y,
                    sim.lbm.dim_x(),
                    sim.lbm.dim_y(),
                    sim.lbm.offset_x(),
                    sim.lbm.offset_y()
                );
            }
        }
    }
    sim.world.barrier();

    let property = args.output_field.property();
    let dt = sim.params.dt();
    let mut output_count = 0u32;
    let mut next_output_time = 0.0;
    for t in 0..sim.params.time_steps {
        let time = t as f64 * dt;
        if time >= next_output_time {
            if rank == 0 {
                println!(
                    "lbmcfd: time: {:.3} / {:.3}, time step: {} / {}",
                    time, sim.params.physical_time, t, sim.params.time_steps
                );
            }
            report_stability(&sim, rank);
            report_field(&mut sim, rank, property);
            output_count += 1;
            next_output_time = f64::from(output_count) * sim.params.output_interval;
        }

        sim.step();
    }
}

// The per-rank flag is max-reduced to rank 0: the warning fires once the
// whole collective reports a collapsed density.
fn report_stability(sim: &Simulation, rank: i32) {
    let stable = u8::from(sim.lbm.check_stability());
    let mut all_stable = 0u8;
    let root = sim.world.process_at_rank(0);
    if rank == 0 {
        root.reduce_into_root(&stable, &mut all_stable, SystemOperation::max());
        if all_stable == 0 {
            eprintln!("lbmcfd: warning: simulation has become unstable (more time steps needed)");
        }
    } else {
        root.reduce_into(&stable, SystemOperation::max());
    }
}

fn report_field(sim: &mut Simulation, rank: i32, property: FluidProperty) {
    if property == FluidProperty::None {
        return;
    }
    match property {
        FluidProperty::Speed => sim.lbm.compute_speed(),
        FluidProperty::Vorticity => sim.lbm.compute_vorticity(),
        _ => {}
    }
    let Simulation { world, lbm, .. } = sim;
    lbm.gather_on_root(&*world, property);
    if rank == 0 {
        if let Some(field) = lbm.gathered_field() {
            let (min, max) = field
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                });
            println!("lbmcfd:   field range: [{:.6}, {:.6}]", min, max);
        }
    }
}

// Wall geometry of the demo: two short vertical walls with a gap between
// them, or the taller offset wall, an eighth of the way into the channel.
fn barrier_layout(layout: BarrierLayout, width: usize, height: usize) -> Vec<Segment> {
    let lower_start = 8 * height / 27 + 1;
    let lower_end = (12 * height / 27).saturating_sub(1);
    let upper_start = 13 * height / 27 + 1;
    let upper_end = (17 * height / 27).saturating_sub(1);
    let wall_x = width / 8;
    match layout {
        BarrierLayout::CenterGap => vec![
            Segment::vertical(lower_start, lower_end, wall_x),
            Segment::vertical(lower_start, lower_end, wall_x + 1),
            Segment::vertical(upper_start, upper_end, wall_x),
            Segment::vertical(upper_start, upper_end, wall_x + 1),
        ],
        BarrierLayout::OffsetMid => vec![
            Segment::vertical(lower_start, upper_end, wall_x),
            Segment::vertical(lower_start, upper_end, wall_x + 1),
        ],
        BarrierLayout::Open => Vec::new(),
    }
}
