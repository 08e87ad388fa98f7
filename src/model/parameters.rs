use crate::error::{Error, Result};

// Physical description of the flow plus the discretization; everything the
// solver needs is derived from these. Grid spacing follows from the pipe
// length and the vertical resolution.
#[derive(Debug, Clone, Copy)]
pub struct Parameters {
    pub width: usize,
    pub height: usize,
    pub time_steps: usize,
    pub fluid_density: f64,   // kg/m^3
    pub flow_speed: f64,      // m/s
    pub pipe_length: f64,     // m
    pub fluid_viscosity: f64, // Pa s
    pub physical_time: f64,   // s
    pub output_interval: f64, // s
}

impl Parameters {
    // Corn syrup at 25 C in a 2 m pipe, moving 0.75 m/s for 8 s.
    pub fn default() -> Self {
        Self {
            width: 600,
            height: 240,
            time_steps: 20000,
            fluid_density: 1380.0,
            flow_speed: 0.75,
            pipe_length: 2.0,
            fluid_viscosity: 1.3806,
            physical_time: 8.0,
            output_interval: 0.25,
        }
    }

    pub fn reynolds_number(&self) -> f64 {
        (self.fluid_density * self.flow_speed * self.pipe_length) / self.fluid_viscosity
    }

    pub fn dx(&self) -> f64 {
        self.pipe_length / self.height as f64
    }

    pub fn dt(&self) -> f64 {
        self.physical_time / self.time_steps as f64
    }

    pub fn speed_scale(&self) -> f64 {
        self.dt() / self.dx()
    }

    pub fn simulation_speed(&self) -> f64 {
        self.speed_scale() * self.flow_speed
    }

    pub fn simulation_viscosity(&self) -> f64 {
        self.dt() / (self.dx() * self.dx() * self.reynolds_number())
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::invalid_parameters("Grid dimensions must be > 0"));
        }
        if self.time_steps == 0 {
            return Err(Error::invalid_parameters("Step count must be > 0"));
        }
        if self.fluid_density <= 0.0 {
            return Err(Error::invalid_parameters("Fluid density must be > 0"));
        }
        if self.flow_speed <= 0.0 {
            return Err(Error::invalid_parameters("Flow speed must be > 0"));
        }
        if self.pipe_length <= 0.0 {
            return Err(Error::invalid_parameters("Pipe length must be > 0"));
        }
        if self.fluid_viscosity <= 0.0 {
            return Err(Error::invalid_parameters("Fluid viscosity must be > 0"));
        }
        if self.physical_time <= 0.0 {
            return Err(Error::invalid_parameters("Physical time must be > 0"));
        }
        if self.output_interval < 0.0 {
            return Err(Error::invalid_parameters(
                "Output interval must not be negative",
            ));
        }
        Ok(())
    }

    pub fn warn(&self) {
        if self.simulation_speed() > 0.1 {
            eprintln!(
                "Warning: lattice speed {:.4} is outside the low-Mach range; expect compressibility artifacts",
                self.simulation_speed()
            );
        }

        let omega = 1.0 / (3.0 * self.simulation_viscosity() + 0.5);
        if omega >= 1.98 {
            eprintln!(
                "Warning: relaxation rate {:.4} is close to the stability limit of 2; consider more time steps",
                omega
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn derived_quantities_match_the_demo_setup() {
        let params = Parameters::default();
        assert_relative_eq!(params.reynolds_number(), 2070.0 / 1.3806, epsilon = 1e-12);
        assert_relative_eq!(params.dx(), 2.0 / 240.0, epsilon = 1e-15);
        assert_relative_eq!(params.dt(), 4.0e-4, epsilon = 1e-15);
        assert_relative_eq!(params.speed_scale(), 0.048, epsilon = 1e-12);
        assert_relative_eq!(params.simulation_speed(), 0.036, epsilon = 1e-12);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn validate_rejects_nonphysical_input() {
        let mut params = Parameters::default();
        params.time_steps = 0;
        assert!(params.validate().is_err());

        let mut params = Parameters::default();
        params.fluid_viscosity = 0.0;
        assert!(params.validate().is_err());

        let mut params = Parameters::default();
        params.output_interval = -1.0;
        assert!(params.validate().is_err());
    }
}
