use super::error::Error;
use super::{DerivedQuantities, EquationOfState};
use crate::state::SimulationState;




// ============================================================================
pub struct Conserved(f64, f64, f64, f64, f64);
pub struct Primitive(f64, f64, f64, f64, f64);

/**
 * A calorically perfect single-species gas. Pressure follows the gamma-law,
 * temperature the ideal gas law. Unused momentum components of lower
 * dimensional states are zero and drop out of the recovery.
 */
pub struct IdealGas {
    gamma_law_index: f64,
    gas_constant: f64,
}




// ============================================================================
impl Conserved {

    pub fn new(mass: f64, momentum: [f64; 3], energy: f64) -> Self {
        Self(mass, momentum[0], momentum[1], momentum[2], energy)
    }

    pub fn mass_density(&self) -> f64 {
        self.0
    }

    pub fn momentum_1(&self) -> f64 {
        self.1
    }

    pub fn momentum_2(&self) -> f64 {
        self.2
    }

    pub fn momentum_3(&self) -> f64 {
        self.3
    }

    pub fn energy_density(&self) -> f64 {
        self.4
    }

    pub fn momentum_squared(&self) -> f64 {
        self.1 * self.1 + self.2 * self.2 + self.3 * self.3
    }

    pub fn to_primitive(&self, gamma_law_index: f64) -> Result<Primitive, Error> {
        let ek = 0.5 * self.momentum_squared() / self.mass_density();
        let et = self.energy_density() - ek;
        let pg = et * (gamma_law_index - 1.0);
        let v1 = self.momentum_1() / self.mass_density();
        let v2 = self.momentum_2() / self.mass_density();
        let v3 = self.momentum_3() / self.mass_density();

        if self.mass_density() < 0.0 {
            Err(Error::NegativeMassDensity(self.mass_density()))
        } else if pg < 0.0 {
            Err(Error::NegativeGasPressure(pg))
        } else {
            Ok(Primitive(self.mass_density(), v1, v2, v3, pg))
        }
    }
}




// ============================================================================
impl Primitive {

    pub fn new(mass: f64, velocity: [f64; 3], pressure: f64) -> Self {
        Self(mass, velocity[0], velocity[1], velocity[2], pressure)
    }

    pub fn mass_density(&self) -> f64 {
        self.0
    }

    pub fn velocity_1(&self) -> f64 {
        self.1
    }

    pub fn velocity_2(&self) -> f64 {
        self.2
    }

    pub fn velocity_3(&self) -> f64 {
        self.3
    }

    pub fn gas_pressure(&self) -> f64 {
        self.4
    }

    pub fn velocity_squared(&self) -> f64 {
        self.1 * self.1 + self.2 * self.2 + self.3 * self.3
    }

    pub fn sound_speed_squared(&self, gamma_law_index: f64) -> f64 {
        gamma_law_index * self.gas_pressure() / self.mass_density()
    }

    pub fn max_signal_speed(&self, gamma_law_index: f64) -> f64 {
        f64::sqrt(self.velocity_squared()) + f64::sqrt(self.sound_speed_squared(gamma_law_index))
    }

    pub fn temperature(&self, gas_constant: f64) -> f64 {
        self.gas_pressure() / (self.mass_density() * gas_constant)
    }

    pub fn to_conserved(&self, gamma_law_index: f64) -> Conserved {
        let d   = self.mass_density();
        let p   = self.gas_pressure();
        let vsq = self.velocity_squared();

        Conserved(
            d,
            d * self.velocity_1(),
            d * self.velocity_2(),
            d * self.velocity_3(),
            d * vsq * 0.5 + p / (gamma_law_index - 1.0),
        )
    }
}




/**
 * Read the conserved values of a single zone out of a state's field arrays.
 * Momentum components above the state's dimensionality are zero.
 */
pub fn conserved_at(state: &SimulationState, zone: usize) -> Conserved {
    let mut momentum = [0.0; 3];

    for (axis, m) in momentum.iter_mut().enumerate().take(state.dim()) {
        *m = state.momentum(axis)[zone]
    }
    Conserved::new(state.mass()[zone], momentum, state.energy()[zone])
}




// ============================================================================
impl IdealGas {

    pub fn new(gamma_law_index: f64, gas_constant: f64) -> Self {
        Self { gamma_law_index, gas_constant }
    }

    pub fn gamma_law_index(&self) -> f64 {
        self.gamma_law_index
    }

    pub fn gas_constant(&self) -> f64 {
        self.gas_constant
    }
}

impl EquationOfState for IdealGas {

    fn name(&self) -> &'static str {
        "IdealGas"
    }

    fn derived(&self, state: &SimulationState) -> Result<DerivedQuantities, Error> {
        let mut pressure = Vec::with_capacity(state.num_zones());
        let mut temperature = Vec::with_capacity(state.num_zones());

        for zone in 0..state.num_zones() {
            let prim = conserved_at(state, zone).to_primitive(self.gamma_law_index)?;
            pressure.push(prim.gas_pressure());
            temperature.push(prim.temperature(self.gas_constant));
        }
        Ok(DerivedQuantities { pressure, temperature })
    }
}
