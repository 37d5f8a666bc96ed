use log::{error, info};

use crate::config::RunConfig;
use crate::hydro::{EquationOfState, Error};
use crate::initializers::Initializer;
use crate::message::comm::{all_reduce_max, Communicator};
use crate::schedule::is_due;
use crate::state::{Coordinates, SimulationState};
use crate::viz::Visualization;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CheckpointStatus {
    Ok,
    Diverged,
}

/// The outcome of one checkpoint call. `max_errors` holds the per-field
/// maximum absolute errors against the reference solution, reduced across
/// ranks, when a comparison ran.
///
#[derive(Clone, Debug)]
pub struct CheckpointResult {
    pub status: CheckpointStatus,
    pub max_errors: Option<Vec<f64>>,
}

impl CheckpointResult {
    fn ok() -> Self {
        Self {
            status: CheckpointStatus::Ok,
            max_errors: None,
        }
    }

    /// The worst per-field error, if a comparison ran.
    pub fn worst_error(&self) -> Option<f64> {
        self.max_errors
            .as_ref()
            .map(|errors| errors.iter().cloned().fold(0.0, f64::max))
    }
}

/// Periodic status and visualization reporting for a run. Built once with
/// its collaborators bound: the equation of state for derived quantities, an
/// optional reference-solution generator for divergence monitoring, an
/// optional visualization sink, and the communicator that designates the
/// reporting rank. Divergence is returned as a status, never raised; the
/// driver decides the control-flow consequences.
///
pub struct Reporter<'a> {
    config: &'a RunConfig,
    eos: &'a dyn EquationOfState,
    exact: Option<&'a dyn Initializer>,
    coords: &'a Coordinates,
    viz: Option<&'a mut dyn Visualization>,
    comm: &'a dyn Communicator,
}

impl<'a> Reporter<'a> {
    pub fn new(
        config: &'a RunConfig,
        eos: &'a dyn EquationOfState,
        exact: Option<&'a dyn Initializer>,
        coords: &'a Coordinates,
        viz: Option<&'a mut dyn Visualization>,
        comm: &'a dyn Communicator,
    ) -> Self {
        Self {
            config,
            eos,
            exact,
            coords,
            viz,
            comm,
        }
    }

    /// Whether this process is the designated reporting rank.
    pub fn is_root(&self) -> bool {
        self.comm.rank() == 0
    }

    /// Whether a reference-solution comparison (the only source of a
    /// `Diverged` status) will run at the given step.
    pub fn divergence_check_due(&self, step: u64) -> bool {
        self.exact.is_some() && is_due(step, self.config.nstatus)
    }

    /// Log the run banner on the designated rank.
    pub fn init_banner(&self, state: &SimulationState) {
        if self.is_root() {
            let initname = self.exact.map(|e| e.name()).unwrap_or("none");
            info!(
                "Case:            {}\n\
                 Dimensions:      {}\n\
                 Zones:           {}\n\
                 Timestep:        {}\n\
                 Final time:      {}\n\
                 Status freq:     {}\n\
                 Viz freq:        {}\n\
                 Initialization:  {}\n\
                 EOS:             {}",
                self.config.casename,
                state.dim(),
                state.num_zones(),
                self.config.dt,
                self.config.t_final,
                self.config.nstatus,
                self.config.nviz,
                initname,
                self.eos.name(),
            );
        }
    }

    /// Interval-gated checkpoint: report status and/or write a dump when the
    /// step falls on the configured cadences, otherwise do nothing.
    pub fn checkpoint(
        &mut self,
        step: u64,
        t: f64,
        dt: f64,
        state: &SimulationState,
    ) -> Result<CheckpointResult, Error> {
        let do_status = is_due(step, self.config.nstatus);
        let do_viz = is_due(step, self.config.nviz);
        self.report(step, t, dt, state, do_status, do_viz)
    }

    /// Unconditional checkpoint, ignoring interval gating. Used by the
    /// driver to guarantee the terminal state is always recorded.
    pub fn final_checkpoint(
        &mut self,
        step: u64,
        t: f64,
        dt: f64,
        state: &SimulationState,
    ) -> Result<CheckpointResult, Error> {
        self.report(step, t, dt, state, true, true)
    }

    fn report(
        &mut self,
        step: u64,
        t: f64,
        dt: f64,
        state: &SimulationState,
        do_status: bool,
        do_viz: bool,
    ) -> Result<CheckpointResult, Error> {
        if !do_status && !do_viz {
            return Ok(CheckpointResult::ok());
        }

        let dv = self.eos.derived(state)?;
        let expected = self.exact.map(|exact| exact.evaluate(t, self.coords));
        let mut result = CheckpointResult::ok();

        if do_status {
            let (pmin, pmax) = dv.pressure_range();
            let (tmin, tmax) = dv.temperature_range();
            let mut message = format!(
                "Status: Step({}) Time({:.6e})\n\
                 ------   P({:.6e}, {:.6e})\n\
                 ------   T({:.6e}, {:.6e})\n\
                 ------   dt,cfl = ({:.6e}, {})",
                step, t, pmin, pmax, tmin, tmax, dt, self.config.cfl,
            );

            if let Some(expected) = &expected {
                let max_errors = all_reduce_max(self.comm, &state.max_abs_diff(expected));
                let formatted: Vec<_> = max_errors.iter().map(|e| format!("{:.6e}", e)).collect();
                message += &format!("\n------   Err({})", formatted.join(", "));

                if self.is_root() {
                    info!("{}", message);
                }
                if max_errors.iter().cloned().fold(0.0, f64::max) > self.config.exittol {
                    if self.is_root() {
                        error!("Solution failed to follow the expected result.");
                    }
                    result.status = CheckpointStatus::Diverged;
                }
                result.max_errors = Some(max_errors);
            } else if self.is_root() {
                info!("{}", message);
            }
        }

        if do_viz {
            if let Some(viz) = self.viz.as_mut() {
                let residual = expected.as_ref().map(|e| state.clone() - e.clone());

                let mut fields = state.fields();
                fields.extend(dv.fields());
                if let Some(expected) = &expected {
                    for (name, data) in expected.fields() {
                        fields.push((format!("exact_{}", name), data));
                    }
                }
                if let Some(residual) = &residual {
                    for (name, data) in residual.fields() {
                        fields.push((format!("residual_{}", name), data));
                    }
                }

                let basename = format!(
                    "{}-{:04}-{:04}",
                    self.config.casename,
                    self.comm.rank(),
                    step
                );
                if let Err(e) = viz.write_dump(&basename, step, t, &fields) {
                    error!("Failed to write dump {}: {}", basename, e);
                }
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod test {

    use std::cell::Cell;
    use std::io;

    use super::{CheckpointStatus, Reporter};
    use crate::config::RunConfig;
    use crate::hydro::euler::IdealGas;
    use crate::initializers::Initializer;
    use crate::message::comm::NullCommunicator;
    use crate::state::{Coordinates, SimulationState};
    use crate::viz::Visualization;

    const GAMMA: f64 = 1.4;

    fn config(nstatus: i64, nviz: i64, exittol: f64) -> RunConfig {
        RunConfig {
            casename: "case".to_string(),
            t_final: 1.0,
            dt: 0.01,
            cfl: 1.0,
            constant_cfl: false,
            nstatus,
            nviz,
            exittol,
        }
    }

    fn uniform_state(num_zones: usize) -> SimulationState {
        // rho = 1, v = 0, p = 1
        SimulationState::from_fields(
            vec![1.0; num_zones],
            vec![1.0 / (GAMMA - 1.0); num_zones],
            vec![vec![0.0; num_zones]],
        )
    }

    fn line_mesh(num_zones: usize) -> Coordinates {
        Coordinates::from_axes(vec![(0..num_zones).map(|i| i as f64).collect()])
    }

    /// Reference solution that is the uniform state with the density offset
    /// everywhere, and counts how often it is evaluated.
    struct OffsetTruth {
        offset: f64,
        evaluations: Cell<usize>,
    }

    impl Initializer for OffsetTruth {
        fn name(&self) -> &'static str {
            "OffsetTruth"
        }

        fn evaluate(&self, _t: f64, coords: &Coordinates) -> SimulationState {
            self.evaluations.set(self.evaluations.get() + 1);
            let n = coords.num_zones();
            SimulationState::from_fields(
                vec![1.0 + self.offset; n],
                vec![1.0 / (GAMMA - 1.0); n],
                vec![vec![0.0; n]],
            )
        }
    }

    /// Records the dumps it is asked to write.
    #[derive(Default)]
    struct RecordingViz {
        dumps: Vec<(String, Vec<String>)>,
    }

    impl Visualization for RecordingViz {
        fn write_dump(
            &mut self,
            basename: &str,
            _step: u64,
            _t: f64,
            fields: &[(String, &[f64])],
        ) -> io::Result<()> {
            let labels = fields.iter().map(|(name, _)| name.clone()).collect();
            self.dumps.push((basename.to_string(), labels));
            Ok(())
        }
    }

    #[test]
    fn off_interval_steps_are_a_no_op() {
        let config = config(10, 10, 1e-6);
        let eos = IdealGas::new(GAMMA, 287.1);
        let coords = line_mesh(4);
        let truth = OffsetTruth {
            offset: 1.0,
            evaluations: Cell::new(0),
        };
        let comm = NullCommunicator::new();
        let mut reporter = Reporter::new(&config, &eos, Some(&truth), &coords, None, &comm);

        let result = reporter.checkpoint(7, 0.07, 0.01, &uniform_state(4)).unwrap();

        assert_eq!(result.status, CheckpointStatus::Ok);
        assert_eq!(truth.evaluations.get(), 0);
    }

    #[test]
    fn a_small_departure_from_the_reference_is_ok() {
        let config = config(1, -1, 1e-2);
        let eos = IdealGas::new(GAMMA, 287.1);
        let coords = line_mesh(4);
        let truth = OffsetTruth {
            offset: 1e-4,
            evaluations: Cell::new(0),
        };
        let comm = NullCommunicator::new();
        let mut reporter = Reporter::new(&config, &eos, Some(&truth), &coords, None, &comm);

        let result = reporter.checkpoint(1, 0.01, 0.01, &uniform_state(4)).unwrap();

        assert_eq!(result.status, CheckpointStatus::Ok);
        assert!((result.worst_error().unwrap() - 1e-4).abs() < 1e-12);
    }

    #[test]
    fn exceeding_the_tolerance_flags_divergence() {
        let config = config(1, -1, 1e-2);
        let eos = IdealGas::new(GAMMA, 287.1);
        let coords = line_mesh(4);
        let truth = OffsetTruth {
            offset: 0.5,
            evaluations: Cell::new(0),
        };
        let comm = NullCommunicator::new();
        let mut reporter = Reporter::new(&config, &eos, Some(&truth), &coords, None, &comm);

        let result = reporter.checkpoint(1, 0.01, 0.01, &uniform_state(4)).unwrap();

        assert_eq!(result.status, CheckpointStatus::Diverged);
        assert!(result.worst_error().unwrap() > 1e-2);
    }

    #[test]
    fn dumps_carry_conserved_derived_exact_and_residual_fields() {
        let config = config(-1, 1, 1e-2);
        let eos = IdealGas::new(GAMMA, 287.1);
        let coords = line_mesh(4);
        let truth = OffsetTruth {
            offset: 0.0,
            evaluations: Cell::new(0),
        };
        let comm = NullCommunicator::new();
        let mut viz = RecordingViz::default();
        let mut reporter =
            Reporter::new(&config, &eos, Some(&truth), &coords, Some(&mut viz), &comm);

        reporter.checkpoint(3, 0.03, 0.01, &uniform_state(4)).unwrap();

        let (basename, labels) = &viz.dumps[0];
        assert_eq!(basename, "case-0000-0003");
        assert!(labels.contains(&"density".to_string()));
        assert!(labels.contains(&"pressure".to_string()));
        assert!(labels.contains(&"temperature".to_string()));
        assert!(labels.contains(&"exact_density".to_string()));
        assert!(labels.contains(&"residual_density".to_string()));
    }

    #[test]
    fn final_checkpoint_ignores_the_interval_gating() {
        let config = config(-1, -1, 1e-2);
        let eos = IdealGas::new(GAMMA, 287.1);
        let coords = line_mesh(4);
        let comm = NullCommunicator::new();
        let mut viz = RecordingViz::default();
        let mut reporter = Reporter::new(&config, &eos, None, &coords, Some(&mut viz), &comm);

        let result = reporter
            .final_checkpoint(11, 0.11, 0.01, &uniform_state(4))
            .unwrap();

        assert_eq!(result.status, CheckpointStatus::Ok);
        assert_eq!(viz.dumps.len(), 1);
        assert_eq!(viz.dumps[0].0, "case-0000-0011");
    }

    #[test]
    fn divergence_checks_only_run_on_status_steps() {
        let config = config(5, -1, 1e-2);
        let eos = IdealGas::new(GAMMA, 287.1);
        let coords = line_mesh(4);
        let truth = OffsetTruth {
            offset: 0.5,
            evaluations: Cell::new(0),
        };
        let comm = NullCommunicator::new();
        let reporter = Reporter::new(&config, &eos, Some(&truth), &coords, None, &comm);

        assert!(reporter.divergence_check_due(5));
        assert!(!reporter.divergence_check_due(6));

        let without_truth = Reporter::new(&config, &eos, None, &coords, None, &comm);
        assert!(!without_truth.divergence_check_due(5));
    }
}
