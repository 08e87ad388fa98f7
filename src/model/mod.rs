mod barrier;
mod decomp;
mod factory;
mod gather;
mod halo;
mod lbm;
mod parameters;
mod tile;

pub use barrier::Segment;
pub use decomp::{Decomposition, Direction, TileInfo};
pub use factory::{LbmFactory, Simulation};
pub use gather::FluidProperty;
pub use lbm::LbmD2Q9;
pub use parameters::Parameters;
pub use tile::{Field, FieldsMut, TileStore};
