use std::error;
use std::fmt;

use log::info;

use crate::checkpoint::{CheckpointStatus, Reporter};
use crate::config::{ConfigError, RunConfig};
use crate::hydro;
use crate::integrate::{Integrator, RightHandSide};
use crate::state::SimulationState;
use crate::timestep::{StableTimestep, TimestepPolicy};

/// The simulation clock: current time and step index. The driver advances
/// the step by exactly one, and the time by the step size used, per loop
/// iteration.
///
#[derive(Clone, Copy, Debug)]
pub struct Clock {
    pub t: f64,
    pub step: u64,
}

impl Clock {
    fn advance(&mut self, dt: f64) {
        self.t += dt;
        self.step += 1;
    }
}

/// How a run ended. `Diverged` carries the last state recorded before the
/// failed comparison, so the caller can salvage it.
///
#[derive(Debug)]
pub enum Outcome {
    Completed {
        step: u64,
        t: f64,
        state: SimulationState,
    },
    Diverged {
        step: u64,
        t: f64,
        state: SimulationState,
        max_error: f64,
    },
}

#[derive(Debug)]
pub enum DriverError {
    /// The loop exited without reaching the final time.
    AbnormalExit { t: f64, t_final: f64 },

    /// Invalid hydrodynamic data surfaced by a collaborator; passed through
    /// without recovery.
    Upstream(hydro::Error),
}

impl fmt::Display for DriverError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            DriverError::AbnormalExit { t, t_final } => {
                write!(fmt, "simulation exited abnormally at t={} of {}", t, t_final)
            }
            DriverError::Upstream(e) => write!(fmt, "{}", e),
        }
    }
}

impl error::Error for DriverError {}

impl From<hydro::Error> for DriverError {
    fn from(e: hydro::Error) -> Self {
        DriverError::Upstream(e)
    }
}

/// The stepping loop. Owns the clock and the state for the duration of a
/// run; drives the timestep policy, the integrator, and the reporter each
/// iteration; decides termination.
///
/// Checkpoint ordering is step-then-report: each iteration advances the
/// state first, then hands the new state to the reporter. When the reporter
/// flags divergence, the loop stops and the outcome carries the snapshot
/// taken just before the diverging step. One forced checkpoint always runs
/// after the loop, whatever the exit path, so the terminal state is
/// recorded.
///
pub struct Driver<'a> {
    config: &'a RunConfig,
    integrator: &'a dyn Integrator,
    rhs: &'a dyn RightHandSide,
    stability: Option<&'a dyn StableTimestep>,
    reporter: Reporter<'a>,
}

impl<'a> Driver<'a> {
    pub fn new(
        config: &'a RunConfig,
        integrator: &'a dyn Integrator,
        rhs: &'a dyn RightHandSide,
        stability: Option<&'a dyn StableTimestep>,
        reporter: Reporter<'a>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        if config.constant_cfl && stability.is_none() {
            return Err(ConfigError::MissingStabilityProvider);
        }
        Ok(Self {
            config,
            integrator,
            rhs,
            stability,
            reporter,
        })
    }

    /// Advance `state` from `t_start` until the configured final time, or
    /// until the solution diverges from the reference, whichever comes
    /// first.
    ///
    pub fn run(
        &mut self,
        state: SimulationState,
        t_start: f64,
    ) -> Result<Outcome, DriverError> {
        let policy = TimestepPolicy::from_config(self.config);
        let mut clock = Clock { t: t_start, step: 0 };
        let mut state = state;
        let mut dt = 0.0;

        self.reporter.init_banner(&state);

        while !policy.finished(clock.t) {
            dt = policy.next_dt(clock.t, &state, self.stability);

            if dt <= 0.0 {
                break;
            }

            // Divergence can only be flagged on steps where a status
            // comparison runs, so the rollback snapshot is only needed then.
            let rollback = if self.reporter.divergence_check_due(clock.step + 1) {
                Some((clock, state.clone()))
            } else {
                None
            };

            state = match self.integrator.advance(&state, clock.t, dt, self.rhs) {
                Ok(next) => next,
                Err(e) => {
                    let _ = self.reporter.final_checkpoint(clock.step, clock.t, dt, &state);
                    return Err(DriverError::Upstream(e));
                }
            };
            clock.advance(dt);

            let result = self.reporter.checkpoint(clock.step, clock.t, dt, &state)?;

            if result.status == CheckpointStatus::Diverged {
                let max_error = result.worst_error().unwrap_or(f64::INFINITY);
                let (last, last_state) = match rollback {
                    Some(snapshot) => snapshot,
                    None => (clock, state),
                };
                let _ = self.reporter.final_checkpoint(last.step, last.t, dt, &last_state);
                return Ok(Outcome::Diverged {
                    step: last.step,
                    t: last.t,
                    state: last_state,
                    max_error,
                });
            }
        }

        if self.reporter.is_root() {
            info!("Writing final dump.");
        }
        self.reporter.final_checkpoint(clock.step, clock.t, dt, &state)?;

        if !policy.finished(clock.t) {
            return Err(DriverError::AbnormalExit {
                t: clock.t,
                t_final: self.config.t_final,
            });
        }
        Ok(Outcome::Completed {
            step: clock.step,
            t: clock.t,
            state,
        })
    }
}

#[cfg(test)]
mod test {

    use super::{Driver, DriverError, Outcome};
    use crate::checkpoint::Reporter;
    use crate::config::{ConfigError, RunConfig};
    use crate::hydro::euler::IdealGas;
    use crate::hydro::Error;
    use crate::initializers::Initializer;
    use crate::integrate::{RightHandSide, RungeKutta4};
    use crate::message::comm::NullCommunicator;
    use crate::state::{Coordinates, SimulationState};
    use crate::timestep::StableTimestep;

    const GAMMA: f64 = 1.4;

    /// rhs(t, y) = -y, applied to every field
    struct Decay;

    impl RightHandSide for Decay {
        fn evaluate(&self, _t: f64, state: &SimulationState) -> Result<SimulationState, Error> {
            Ok(state.clone() * -1.0)
        }
    }

    struct AlwaysFails;

    impl RightHandSide for AlwaysFails {
        fn evaluate(&self, _t: f64, _state: &SimulationState) -> Result<SimulationState, Error> {
            Err(Error::NegativeGasPressure(-1.0))
        }
    }

    struct StalledStability;

    impl StableTimestep for StalledStability {
        fn stable_dt(&self, _state: &SimulationState, _cfl: f64) -> f64 {
            0.0
        }
    }

    /// Far-off reference solution; any comparison against it diverges.
    struct FarTruth;

    impl Initializer for FarTruth {
        fn name(&self) -> &'static str {
            "FarTruth"
        }

        fn evaluate(&self, _t: f64, coords: &Coordinates) -> SimulationState {
            let n = coords.num_zones();
            SimulationState::from_fields(vec![100.0; n], vec![100.0; n], vec![vec![0.0; n]])
        }
    }

    fn config(dt: f64, t_final: f64, nstatus: i64) -> RunConfig {
        RunConfig {
            casename: "test".to_string(),
            t_final,
            dt,
            cfl: 1.0,
            constant_cfl: false,
            nstatus,
            nviz: -1,
            exittol: 1e-2,
        }
    }

    fn scalar_state(y: f64) -> SimulationState {
        SimulationState::from_fields(vec![y], vec![y], vec![vec![y]])
    }

    fn point_mesh() -> Coordinates {
        Coordinates::from_axes(vec![vec![0.0]])
    }

    #[test]
    fn rk4_decay_reaches_the_final_time_in_ten_steps() {
        let config = config(0.01, 0.1, -1);
        let eos = IdealGas::new(GAMMA, 287.1);
        let coords = point_mesh();
        let comm = NullCommunicator::new();
        let reporter = Reporter::new(&config, &eos, None, &coords, None, &comm);
        let mut driver = Driver::new(&config, &RungeKutta4, &Decay, None, reporter).unwrap();

        match driver.run(scalar_state(1.0), 0.0).unwrap() {
            Outcome::Completed { step, t, state } => {
                assert_eq!(step, 10);
                assert!((t - 0.1).abs() < 1e-9);
                assert!((state.mass()[0] - f64::exp(-0.1)).abs() < 1e-8);
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn a_non_dividing_timestep_is_clipped_on_the_last_step() {
        let config = config(0.1, 0.25, -1);
        let eos = IdealGas::new(GAMMA, 287.1);
        let coords = point_mesh();
        let comm = NullCommunicator::new();
        let reporter = Reporter::new(&config, &eos, None, &coords, None, &comm);
        let mut driver = Driver::new(&config, &RungeKutta4, &Decay, None, reporter).unwrap();

        match driver.run(scalar_state(1.0), 0.0).unwrap() {
            Outcome::Completed { step, t, .. } => {
                // ceil(0.25 / 0.1) iterations, the last one shortened
                assert_eq!(step, 3);
                assert!((t - 0.25).abs() < 1e-9);
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn a_finished_run_completes_without_stepping() {
        let config = config(0.01, 0.0, -1);
        let eos = IdealGas::new(GAMMA, 287.1);
        let coords = point_mesh();
        let comm = NullCommunicator::new();
        let reporter = Reporter::new(&config, &eos, None, &coords, None, &comm);
        let mut driver = Driver::new(&config, &RungeKutta4, &Decay, None, reporter).unwrap();

        match driver.run(scalar_state(1.0), 0.0).unwrap() {
            Outcome::Completed { step, t, .. } => {
                assert_eq!(step, 0);
                assert_eq!(t, 0.0);
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn divergence_stops_the_run_and_preserves_the_rollback_state() {
        let config = config(0.01, 1.0, 1);
        let eos = IdealGas::new(GAMMA, 287.1);
        let coords = point_mesh();
        let comm = NullCommunicator::new();
        let reporter = Reporter::new(&config, &eos, Some(&FarTruth), &coords, None, &comm);
        let mut driver = Driver::new(&config, &RungeKutta4, &Decay, None, reporter).unwrap();

        match driver.run(scalar_state(1.0), 0.0).unwrap() {
            Outcome::Diverged {
                step,
                t,
                state,
                max_error,
            } => {
                // the first comparison, at step 1, diverges; the snapshot is
                // the initial state
                assert_eq!(step, 0);
                assert_eq!(t, 0.0);
                assert_eq!(state.mass()[0], 1.0);
                assert!(max_error > 1e-2);
            }
            other => panic!("expected divergence, got {:?}", other),
        }
    }

    #[test]
    fn upstream_failures_surface_unmodified() {
        let config = config(0.01, 1.0, -1);
        let eos = IdealGas::new(GAMMA, 287.1);
        let coords = point_mesh();
        let comm = NullCommunicator::new();
        let reporter = Reporter::new(&config, &eos, None, &coords, None, &comm);
        let mut driver = Driver::new(&config, &RungeKutta4, &AlwaysFails, None, reporter).unwrap();

        match driver.run(scalar_state(1.0), 0.0) {
            Err(DriverError::Upstream(Error::NegativeGasPressure(_))) => (),
            other => panic!("expected an upstream failure, got {:?}", other),
        }
    }

    #[test]
    fn a_stalled_timestep_is_an_abnormal_exit() {
        let mut config = config(0.01, 1.0, -1);
        config.constant_cfl = true;
        let eos = IdealGas::new(GAMMA, 287.1);
        let coords = point_mesh();
        let comm = NullCommunicator::new();
        let reporter = Reporter::new(&config, &eos, None, &coords, None, &comm);
        let mut driver =
            Driver::new(&config, &RungeKutta4, &Decay, Some(&StalledStability), reporter).unwrap();

        match driver.run(scalar_state(1.0), 0.0) {
            Err(DriverError::AbnormalExit { t, t_final }) => {
                assert_eq!(t, 0.0);
                assert_eq!(t_final, 1.0);
            }
            other => panic!("expected an abnormal exit, got {:?}", other),
        }
    }

    #[test]
    fn constant_cfl_without_a_provider_is_a_config_error() {
        let mut config = config(0.01, 1.0, -1);
        config.constant_cfl = true;
        let eos = IdealGas::new(GAMMA, 287.1);
        let coords = point_mesh();
        let comm = NullCommunicator::new();
        let reporter = Reporter::new(&config, &eos, None, &coords, None, &comm);

        match Driver::new(&config, &RungeKutta4, &Decay, None, reporter) {
            Err(ConfigError::MissingStabilityProvider) => (),
            other => panic!("expected a config error, got {:?}", other.err()),
        }
    }
}
