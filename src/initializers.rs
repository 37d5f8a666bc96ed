use crate::hydro::euler::Primitive;
use crate::state::{Coordinates, SimulationState};

/// Generator for flow states with a closed form in space and time. Serves
/// two roles: evaluated at the start time it provides the initial condition,
/// and evaluated at any later time it is the reference ("exact") solution
/// the checkpoint reporter measures divergence against.
///
pub trait Initializer {
    /// A human-readable name for status banners.
    fn name(&self) -> &'static str;

    /// The state this model takes at time `t` on the given coordinates.
    fn evaluate(&self, t: f64, coords: &Coordinates) -> SimulationState;
}

/// A Gaussian density bump riding on a uniform background at constant
/// velocity and uniform pressure. The pressure never varies, so the bump
/// advects rigidly and the profile at time `t` is the initial profile
/// translated by `velocity * t`.
///
pub struct Lump {
    center: Vec<f64>,
    velocity: Vec<f64>,
    rho0: f64,
    rho_amp: f64,
    width: f64,
    pressure: f64,
    gamma_law_index: f64,
}

impl Lump {
    pub fn new(
        center: Vec<f64>,
        velocity: Vec<f64>,
        rho0: f64,
        rho_amp: f64,
        width: f64,
        pressure: f64,
        gamma_law_index: f64,
    ) -> Self {
        if center.len() != velocity.len() {
            panic!(
                "lump center ({}d) and velocity ({}d) must agree",
                center.len(),
                velocity.len()
            )
        }
        Self {
            center,
            velocity,
            rho0,
            rho_amp,
            width,
            pressure,
            gamma_law_index,
        }
    }

    fn density_at(&self, t: f64, coords: &Coordinates, zone: usize) -> f64 {
        let r2: f64 = (0..coords.dim())
            .map(|axis| {
                let dx = coords.axis(axis)[zone] - self.center[axis] - self.velocity[axis] * t;
                dx * dx
            })
            .sum();
        self.rho0 + self.rho_amp * f64::exp(-r2 / (self.width * self.width))
    }
}

impl Initializer for Lump {
    fn name(&self) -> &'static str {
        "Lump"
    }

    fn evaluate(&self, t: f64, coords: &Coordinates) -> SimulationState {
        let dim = coords.dim();
        let num_zones = coords.num_zones();

        assert_eq!(dim, self.center.len(), "lump dimensionality must match the mesh");

        let mut mass = Vec::with_capacity(num_zones);
        let mut energy = Vec::with_capacity(num_zones);
        let mut momentum = vec![Vec::with_capacity(num_zones); dim];

        let mut velocity = [0.0; 3];
        velocity[..dim].copy_from_slice(&self.velocity);

        for zone in 0..num_zones {
            let prim = Primitive::new(self.density_at(t, coords, zone), velocity, self.pressure);
            let cons = prim.to_conserved(self.gamma_law_index);

            mass.push(cons.mass_density());
            energy.push(cons.energy_density());
            for (axis, m) in momentum.iter_mut().enumerate() {
                m.push(match axis {
                    0 => cons.momentum_1(),
                    1 => cons.momentum_2(),
                    _ => cons.momentum_3(),
                });
            }
        }
        SimulationState::from_fields(mass, energy, momentum)
    }
}
