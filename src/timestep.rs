use crate::config::RunConfig;
use crate::state::SimulationState;

/// Stability collaborator: computes the largest stable time step for a state
/// at a target CFL number. Owned by the discretization; consulted only when
/// the run is in constant-CFL mode.
///
pub trait StableTimestep {
    fn stable_dt(&self, state: &SimulationState, cfl: f64) -> f64;
}

/// Relative slack applied when deciding whether a candidate step reaches the
/// final time. Keeps accumulated roundoff near `t_final` from producing a
/// trailing micro-step instead of landing on the end exactly.
const END_TIME_SLACK: f64 = 1e-10;

/// Selects the size of the next time step: either the fixed `dt`, or a
/// CFL-stable step from the discretization, clipped so the run never
/// overshoots the final time.
///
pub struct TimestepPolicy {
    pub dt: f64,
    pub cfl: f64,
    pub t_final: f64,
    pub constant_cfl: bool,
}

impl TimestepPolicy {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            dt: config.dt,
            cfl: config.cfl,
            t_final: config.t_final,
            constant_cfl: config.constant_cfl,
        }
    }

    /// The step size to use from time `t`. Non-positive when `t` has already
    /// reached the final time; callers treat that as nothing left to do.
    ///
    pub fn next_dt(
        &self,
        t: f64,
        state: &SimulationState,
        stability: Option<&dyn StableTimestep>,
    ) -> f64 {
        let mut dt = match (self.constant_cfl, stability) {
            (true, Some(s)) => s.stable_dt(state, self.cfl),
            _ => self.dt,
        };
        if t + dt * (1.0 + END_TIME_SLACK) >= self.t_final {
            dt = self.t_final - t
        }
        dt
    }

    /// Whether `t` has reached the final time, under the same slack used for
    /// end clipping.
    ///
    pub fn finished(&self, t: f64) -> bool {
        self.t_final - t <= END_TIME_SLACK * self.t_final.abs().max(1.0)
    }
}
