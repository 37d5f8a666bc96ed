use std::error;
use std::fmt;

#[derive(Clone, Debug, PartialEq)]

/**
 * Error to represent invalid hydrodynamics data encountered during primitive
 * variable recovery or derived-quantity evaluation. These are upstream
 * computational failures: the driver does not attempt numerical recovery,
 * they propagate unmodified to the caller.
 */
pub enum Error {
    NegativeMassDensity(f64),
    NegativeGasPressure(f64),
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        use Error::*;

        match self {
            NegativeMassDensity(d) => write!(fmt, "negative mass density: {}", d),
            NegativeGasPressure(p) => write!(fmt, "negative gas pressure: {}", p),
        }
    }
}

impl error::Error for Error {}
