pub mod error;
pub mod euler;

use crate::state::SimulationState;
pub use error::Error;




/**
 * Physical quantities derived from the conserved fields via an equation of
 * state: gas pressure and temperature, one array per quantity on the same
 * discretization as the state. These are transient buffers, computed per
 * checkpoint and dropped at the end of the call.
 */
pub struct DerivedQuantities {
    pub pressure: Vec<f64>,
    pub temperature: Vec<f64>,
}




// ============================================================================
impl DerivedQuantities {

    pub fn pressure_range(&self) -> (f64, f64) {
        Self::range(&self.pressure)
    }

    pub fn temperature_range(&self) -> (f64, f64) {
        Self::range(&self.temperature)
    }

    /**
     * The derived arrays with their labels, as consumed by dump writers.
     */
    pub fn fields(&self) -> Vec<(String, &[f64])> {
        vec![
            ("pressure".to_string(), self.pressure.as_slice()),
            ("temperature".to_string(), self.temperature.as_slice()),
        ]
    }

    fn range(data: &[f64]) -> (f64, f64) {
        data.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        })
    }
}




/// Equation-of-state collaborator: maps a conserved-field state to the
/// derived physical quantities needed for status reporting and dump output.
/// Implementations must not retain references to the state.
///
pub trait EquationOfState {
    /// A human-readable name for status banners.
    fn name(&self) -> &'static str;

    /// Compute the derived quantities for every zone of the given state.
    /// Fails if the state holds invalid hydrodynamic data.
    fn derived(&self, state: &SimulationState) -> Result<DerivedQuantities, Error>;
}
