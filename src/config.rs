use std::error;
use std::fmt;

/// Immutable configuration for one simulation run, fixed before the stepping
/// loop starts. Step intervals follow the usual convention: zero means every
/// step, negative means never.
///
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct RunConfig {
    /// Base name for status banners and dump files.
    pub casename: String,

    /// The time the run integrates to.
    pub t_final: f64,

    /// Fixed step size, used whenever `constant_cfl` is off.
    pub dt: f64,

    /// Target CFL number for constant-CFL runs; reported in status text
    /// either way.
    pub cfl: f64,

    /// Derive the step size from a CFL stability computation instead of the
    /// fixed `dt`.
    pub constant_cfl: bool,

    /// Step interval for status reporting.
    pub nstatus: i64,

    /// Step interval for visualization dumps.
    pub nviz: i64,

    /// Worst-case per-field error against the reference solution above which
    /// the run counts as diverged.
    pub exittol: f64,
}

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    NonFiniteFinalTime(f64),
    NonPositiveTimestep(f64),
    NonPositiveCfl(f64),
    NonPositiveTolerance(f64),
    MissingStabilityProvider,
}

impl RunConfig {
    /// Check the configuration for values that cannot drive a run. Called by
    /// the driver on construction; standalone callers may use it directly.
    ///
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.t_final.is_finite() {
            return Err(ConfigError::NonFiniteFinalTime(self.t_final));
        }
        if !self.constant_cfl && !(self.dt > 0.0) {
            return Err(ConfigError::NonPositiveTimestep(self.dt));
        }
        if self.constant_cfl && !(self.cfl > 0.0) {
            return Err(ConfigError::NonPositiveCfl(self.cfl));
        }
        if !(self.exittol > 0.0) {
            return Err(ConfigError::NonPositiveTolerance(self.exittol));
        }
        Ok(())
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        use ConfigError::*;

        match self {
            NonFiniteFinalTime(t) => write!(fmt, "final time must be finite, got {}", t),
            NonPositiveTimestep(dt) => write!(fmt, "fixed timestep must be positive, got {}", dt),
            NonPositiveCfl(cfl) => write!(fmt, "CFL number must be positive, got {}", cfl),
            NonPositiveTolerance(tol) => {
                write!(fmt, "divergence tolerance must be positive, got {}", tol)
            }
            MissingStabilityProvider => {
                write!(fmt, "constant-CFL mode requires a stability provider")
            }
        }
    }
}

impl error::Error for ConfigError {}
