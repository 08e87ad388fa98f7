use approx::assert_relative_eq;
use mpi::traits::*;

use lbmcfd::model::{Field, FluidProperty, LbmD2Q9, Segment};

// Every MPI-backed scenario shares this one test so the runtime is
// initialized exactly once per test process.
#[test]
fn single_rank_end_to_end() {
    let universe = mpi::initialize().expect("MPI runtime unavailable");
    let world = universe.world();
    assert_eq!(world.size(), 1);

    quiescent_step_keeps_unit_density(&world);
    gather_reconstructs_the_global_field(&world);
    steering_reimposes_the_inflow_ring(&world);
}

fn quiescent_step_keeps_unit_density<C: Communicator>(world: &C) {
    let mut lbm = LbmD2Q9::new(8, 8, 1.0, 0, 1).unwrap();
    lbm.init_fluid(0.1);
    lbm.collide(0.02);
    lbm.exchange_boundaries(world);
    lbm.stream();
    lbm.exchange_boundaries(world);
    lbm.bounce_back_stream();
    for y in 1..7 {
        for x in 1..7 {
            assert_relative_eq!(lbm.density()[y * 8 + x], 1.0, epsilon = 1e-12);
        }
    }
    assert!(lbm.check_stability());
}

fn gather_reconstructs_the_global_field<C: Communicator>(world: &C) {
    let mut lbm = LbmD2Q9::new(6, 4, 1.0, 0, 1).unwrap();
    lbm.init_barrier(&[Segment::vertical(1, 2, 3)]);
    for y in 0..4 {
        for x in 0..6 {
            lbm.field_mut(Field::Density)[y * 6 + x] = (100 * x + y) as f64;
        }
    }

    lbm.gather_on_root(world, FluidProperty::None);
    assert!(lbm.gathered_field().is_none());

    lbm.gather_on_root(world, FluidProperty::Density);
    let gathered = lbm.gathered_field().unwrap();
    for y in 0..4 {
        for x in 0..6 {
            assert_eq!(gathered[y * 6 + x], (100 * x + y) as f64);
        }
    }
    let mask = lbm.gathered_barrier().unwrap();
    for y in 0..4 {
        for x in 0..6 {
            assert_eq!(mask[y * 6 + x], x == 3 && (1..=2).contains(&y));
        }
    }
}

fn steering_reimposes_the_inflow_ring<C: Communicator>(world: &C) {
    let mut lbm = LbmD2Q9::new(8, 8, 1.0, 0, 1).unwrap();
    lbm.init_barrier(&[Segment::horizontal(2, 5, 4)]);
    lbm.init_fluid(0.1);
    lbm.collide(0.02);
    lbm.exchange_boundaries(world);
    lbm.stream();
    lbm.exchange_boundaries(world);
    lbm.bounce_back_stream();

    // steering swaps the wall and raises the inflow speed
    lbm.init_barrier(&[Segment::vertical(2, 5, 3)]);
    lbm.update_fluid(0.2);

    let mut reference = LbmD2Q9::new(8, 8, 1.0, 0, 1).unwrap();
    reference.init_fluid(0.2);
    let channels = [
        Field::F0,
        Field::FN,
        Field::FE,
        Field::FS,
        Field::FW,
        Field::FNE,
        Field::FNW,
        Field::FSE,
        Field::FSW,
    ];
    for x in 0..8 {
        for y in [0usize, 7] {
            let idx = y * 8 + x;
            for channel in channels {
                assert_eq!(lbm.field(channel)[idx], reference.field(channel)[idx]);
            }
            assert_eq!(lbm.density()[idx], 1.0);
            assert_eq!(lbm.velocity_x()[idx], 0.2);
        }
    }
    for y in 1..7 {
        for x in [0usize, 7] {
            let idx = y * 8 + x;
            for channel in channels {
                assert_eq!(lbm.field(channel)[idx], reference.field(channel)[idx]);
            }
        }
    }
    assert!(lbm.barrier()[4 * 8 + 3]);
    assert!(!lbm.barrier()[4 * 8 + 2]);
}
