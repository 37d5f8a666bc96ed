use std::net::SocketAddr;

use clap::{AppSettings, Clap};
use log::{error, info};

use flowmarch::checkpoint::Reporter;
use flowmarch::config::RunConfig;
use flowmarch::driver::{Driver, Outcome};
use flowmarch::hydro::euler::{self, IdealGas};
use flowmarch::hydro::Error;
use flowmarch::initializers::{Initializer, Lump};
use flowmarch::integrate::{ForwardEuler, Integrator, RightHandSide, RungeKutta4};
use flowmarch::message::comm::{Communicator, NullCommunicator};
use flowmarch::message::tcp::TcpCommunicator;
use flowmarch::state::{Coordinates, SimulationState};
use flowmarch::timestep::StableTimestep;
use flowmarch::viz::CborWriter;

const GAMMA_LAW_INDEX: f64 = 1.4;
const GAS_CONSTANT: f64 = 287.1;

#[derive(Debug, Clap)]
#[clap(version = "0.1.0")]
#[clap(setting = AppSettings::ColoredHelp)]
struct Opts {
    #[clap(short = 'n', long, default_value = "200")]
    num_zones: usize,

    #[clap(long, default_value = "0.1")]
    t_final: f64,

    #[clap(long, default_value = "0.0005")]
    dt: f64,

    #[clap(long, default_value = "0.3")]
    cfl: f64,

    #[clap(long)]
    constant_cfl: bool,

    #[clap(long, default_value = "20")]
    nstatus: i64,

    #[clap(long, default_value = "20")]
    nviz: i64,

    #[clap(long, default_value = "0.02")]
    exittol: f64,

    #[clap(long, default_value = "lump")]
    casename: String,

    #[clap(long, default_value = ".")]
    outdir: String,

    #[clap(long, default_value = "rk4")]
    integrator: String,

    /// Rank of this process in a distributed run
    #[clap(long, default_value = "0")]
    rank: usize,

    /// Comma-separated host:port list, one per rank, for a distributed run
    #[clap(long)]
    peers: Option<String>,
}




/**
 * A uniform periodic mesh on the unit interval.
 */
struct Mesh {
    num_zones: usize,
}




// ============================================================================
impl Mesh {

    fn cell_spacing(&self) -> f64 {
        1.0 / self.num_zones as f64
    }

    fn cell_center(&self, i: usize) -> f64 {
        (i as f64 + 0.5) * self.cell_spacing()
    }

    fn coordinates(&self) -> Coordinates {
        Coordinates::from_axes(vec![(0..self.num_zones)
            .map(|i| self.cell_center(i))
            .collect()])
    }
}




/**
 * Linear advection of the conserved fields at a fixed velocity on the
 * periodic mesh, discretized with second-order central differences. Stands
 * in for the full inviscid flux divergence; the rigidly advecting lump is an
 * exact solution of this operator, so the run can be compared against the
 * initializer at any time.
 */
struct Advection {
    velocity: f64,
    dx: f64,
}




// ============================================================================
impl Advection {

    fn ddt(&self, u: &[f64]) -> Vec<f64> {
        let n = u.len();
        (0..n)
            .map(|i| {
                let ul = u[(i + n - 1) % n];
                let ur = u[(i + 1) % n];
                -self.velocity * (ur - ul) / (2.0 * self.dx)
            })
            .collect()
    }
}

impl RightHandSide for Advection {
    fn evaluate(&self, _t: f64, state: &SimulationState) -> Result<SimulationState, Error> {
        Ok(SimulationState::from_fields(
            self.ddt(state.mass()),
            self.ddt(state.energy()),
            (0..state.dim()).map(|axis| self.ddt(state.momentum(axis))).collect(),
        ))
    }
}

impl StableTimestep for Advection {
    fn stable_dt(&self, state: &SimulationState, cfl: f64) -> f64 {
        let mut max_signal = 0.0_f64;

        for zone in 0..state.num_zones() {
            let prim = euler::conserved_at(state, zone)
                .to_primitive(GAMMA_LAW_INDEX)
                .unwrap();
            max_signal = max_signal.max(prim.max_signal_speed(GAMMA_LAW_INDEX));
        }
        cfl * self.dx / max_signal
    }
}




// ============================================================================
fn write_final_state(casename: &str, state: &SimulationState) {
    let file = std::fs::File::create(format!("{}-final.cbor", casename)).unwrap();
    let mut buffer = std::io::BufWriter::new(file);
    ciborium::ser::into_writer(state, &mut buffer).unwrap();
}




// ============================================================================
fn main() {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()
        .unwrap();

    let opts = Opts::parse();

    let config = RunConfig {
        casename: opts.casename.clone(),
        t_final: opts.t_final,
        dt: opts.dt,
        cfl: opts.cfl,
        constant_cfl: opts.constant_cfl,
        nstatus: opts.nstatus,
        nviz: opts.nviz,
        exittol: opts.exittol,
    };

    let mesh = Mesh { num_zones: opts.num_zones };
    let coords = mesh.coordinates();

    let eos = IdealGas::new(GAMMA_LAW_INDEX, GAS_CONSTANT);
    let lump = Lump::new(vec![0.25], vec![1.0], 1.0, 0.5, 0.05, 1.0, GAMMA_LAW_INDEX);
    let scheme = Advection {
        velocity: 1.0,
        dx: mesh.cell_spacing(),
    };

    let comm: Box<dyn Communicator> = match &opts.peers {
        Some(peers) => {
            let peers: Vec<SocketAddr> = peers
                .split(',')
                .map(|addr| addr.parse().unwrap())
                .collect();
            Box::new(TcpCommunicator::new(opts.rank, peers))
        }
        None => Box::new(NullCommunicator::new()),
    };

    let integrator: Box<dyn Integrator> = match opts.integrator.as_str() {
        "euler" => Box::new(ForwardEuler),
        "rk4" => Box::new(RungeKutta4),
        other => panic!("unknown integrator: {}", other),
    };

    let mut viz = CborWriter::new(&opts.outdir);
    let reporter = Reporter::new(
        &config,
        &eos,
        Some(&lump),
        &coords,
        Some(&mut viz),
        comm.as_ref(),
    );

    let state = lump.evaluate(0.0, &coords);

    let mut driver = Driver::new(
        &config,
        integrator.as_ref(),
        &scheme,
        Some(&scheme),
        reporter,
    )
    .unwrap();

    match driver.run(state, 0.0) {
        Ok(Outcome::Completed { step, t, state }) => {
            info!("Finished: {} steps to t = {}", step, t);
            write_final_state(&opts.casename, &state);
        }
        Ok(Outcome::Diverged { step, t, state, max_error }) => {
            error!(
                "Diverged (max error {:.6e}); last good state at step {} t = {}",
                max_error, step, t
            );
            write_final_state(&opts.casename, &state);
            std::process::exit(1);
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    }
}
