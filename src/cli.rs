use clap::Parser;
use clap::ValueEnum;

use crate::model::FluidProperty;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Distributed lattice-Boltzmann (D2Q9) fluid solver over MPI"
)]
pub struct Cli {
    // Grid settings
    #[arg(long, default_value = "600")]
    pub width: usize,
    #[arg(long, default_value = "240")]
    pub height: usize,

    // Simulation settings
    #[arg(long, default_value = "20000")]
    pub steps: usize,
    #[arg(long, default_value = "0.25")]
    pub output_interval: f64,
    #[arg(long, value_enum, default_value = "center-gap")]
    pub barrier_layout: BarrierLayout,
    #[arg(long)]
    pub verbose: bool,

    // Physical properties (defaults: corn syrup at 25 C in a 2 m pipe)
    #[arg(long, default_value = "1380.0")]
    pub fluid_density: f64,
    #[arg(long, default_value = "0.75")]
    pub flow_speed: f64,
    #[arg(long, default_value = "2.0")]
    pub pipe_length: f64,
    #[arg(long, default_value = "1.3806")]
    pub fluid_viscosity: f64,
    #[arg(long, default_value = "8.0")]
    pub sim_time: f64,

    // Output settings
    #[arg(long, value_enum, default_value = "vorticity")]
    pub output_field: OutputField,
}

impl Cli {
    pub fn from_args() -> Self {
        Self::parse()
    }

    pub fn validate_parameters(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err("Grid dimensions must be positive".to_string());
        }
        if self.steps == 0 {
            return Err("Step count must be positive".to_string());
        }
        if self.fluid_density <= 0.0
            || self.flow_speed <= 0.0
            || self.pipe_length <= 0.0
            || self.fluid_viscosity <= 0.0
            || self.sim_time <= 0.0
        {
            return Err("Physical properties must be positive".to_string());
        }
        if self.output_interval < 0.0 {
            return Err("Output interval must not be negative".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BarrierLayout {
    CenterGap,
    OffsetMid,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputField {
    Density,
    Speed,
    Vorticity,
    None,
}

impl OutputField {
    pub fn property(&self) -> FluidProperty {
        match self {
            OutputField::Density => FluidProperty::Density,
            OutputField::Speed => FluidProperty::Speed,
            OutputField::Vorticity => FluidProperty::Vorticity,
            OutputField::None => FluidProperty::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Cli {
        Cli::parse_from(["lbmcfd"])
    }

    #[test]
    fn defaults_are_valid() {
        assert!(base_args().validate_parameters().is_ok());
    }

    #[test]
    fn rejects_zero_grid() {
        let args = Cli::parse_from(["lbmcfd", "--width", "0"]);
        assert!(args.validate_parameters().is_err());
    }

    #[test]
    fn rejects_nonpositive_physicals() {
        let args = Cli::parse_from(["lbmcfd", "--fluid-viscosity", "-1.0"]);
        assert!(args.validate_parameters().is_err());
    }

    #[test]
    fn output_field_maps_to_property() {
        assert_eq!(OutputField::Density.property(), FluidProperty::Density);
        assert_eq!(OutputField::None.property(), FluidProperty::None);
    }
}
