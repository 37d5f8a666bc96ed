use crate::hydro::Error;
use crate::state::SimulationState;

/// The time derivative of the solution: `d(state)/dt` at a given time. The
/// implementor owns the discretization, boundary conditions, and equation of
/// state; the integrator treats it as opaque. Evaluation is fail-fast:
/// invalid hydrodynamic data aborts the stage with no local recovery.
///
pub trait RightHandSide {
    fn evaluate(&self, t: f64, state: &SimulationState) -> Result<SimulationState, Error>;
}

/// A single-step explicit update scheme. Implementations never mutate the
/// input state and are deterministic: identical inputs yield bit-identical
/// output states.
///
pub trait Integrator {
    fn advance(
        &self,
        state: &SimulationState,
        t: f64,
        dt: f64,
        rhs: &dyn RightHandSide,
    ) -> Result<SimulationState, Error>;
}

/// The classical fourth-order four-stage Runge-Kutta method.
///
pub struct RungeKutta4;

impl Integrator for RungeKutta4 {
    fn advance(
        &self,
        state: &SimulationState,
        t: f64,
        dt: f64,
        rhs: &dyn RightHandSide,
    ) -> Result<SimulationState, Error> {
        let k1 = rhs.evaluate(t, state)?;
        let s1 = state.clone() + k1.clone() * (0.5 * dt);
        let k2 = rhs.evaluate(t + 0.5 * dt, &s1)?;
        let s2 = state.clone() + k2.clone() * (0.5 * dt);
        let k3 = rhs.evaluate(t + 0.5 * dt, &s2)?;
        let s3 = state.clone() + k3.clone() * dt;
        let k4 = rhs.evaluate(t + dt, &s3)?;

        Ok(state.clone() + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0))
    }
}

/// First-order forward Euler. Mostly useful as a reference scheme and for
/// quick shakedown runs.
///
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn advance(
        &self,
        state: &SimulationState,
        t: f64,
        dt: f64,
        rhs: &dyn RightHandSide,
    ) -> Result<SimulationState, Error> {
        Ok(state.clone() + rhs.evaluate(t, state)? * dt)
    }
}
