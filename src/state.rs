use std::ops::{Add, Mul, Sub};




/**
 * The conserved fields of a compressible inviscid flow: one array per field,
 * all sharing a common spatial discretization. The mass and energy densities
 * are scalars; the momentum density has one array per spatial axis. States
 * are immutable by convention: each advance of the solution produces a new
 * state rather than mutating in place.
 */
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SimulationState {
    mass: Vec<f64>,
    energy: Vec<f64>,
    momentum: Vec<Vec<f64>>,
}

pub const AXIS_NAMES: [&str; 3] = ["x", "y", "z"];




// ============================================================================
impl SimulationState {

    /**
     * Build a state from its field arrays. All arrays must have the same
     * length and the momentum must carry between one and three axes.
     */
    pub fn from_fields(mass: Vec<f64>, energy: Vec<f64>, momentum: Vec<Vec<f64>>) -> Self {
        if momentum.is_empty() || momentum.len() > AXIS_NAMES.len() {
            panic!("momentum must have 1-3 axes, got {}", momentum.len())
        }
        if energy.len() != mass.len() || momentum.iter().any(|m| m.len() != mass.len()) {
            panic!("conserved field arrays must all have the same length")
        }
        Self { mass, energy, momentum }
    }

    pub fn zeros(dim: usize, num_zones: usize) -> Self {
        Self::from_fields(
            vec![0.0; num_zones],
            vec![0.0; num_zones],
            vec![vec![0.0; num_zones]; dim],
        )
    }

    pub fn dim(&self) -> usize {
        self.momentum.len()
    }

    pub fn num_zones(&self) -> usize {
        self.mass.len()
    }

    pub fn num_fields(&self) -> usize {
        self.dim() + 2
    }

    pub fn mass(&self) -> &[f64] {
        &self.mass
    }

    pub fn energy(&self) -> &[f64] {
        &self.energy
    }

    pub fn momentum(&self, axis: usize) -> &[f64] {
        &self.momentum[axis]
    }




    /**
     * Return the field arrays with their conventional labels, in field order
     * (density, energy, one momentum per axis), as consumed by dump writers.
     */
    pub fn fields(&self) -> Vec<(String, &[f64])> {
        let mut fields: Vec<(String, &[f64])> = vec![
            ("density".to_string(), self.mass.as_slice()),
            ("energy".to_string(), self.energy.as_slice()),
        ];
        for (axis, m) in self.momentum.iter().enumerate() {
            fields.push((format!("momentum_{}", AXIS_NAMES[axis]), m.as_slice()));
        }
        fields
    }




    /**
     * The maximum absolute pointwise difference between this state and
     * another, per field, in field order. Used to measure departure from a
     * reference solution.
     */
    pub fn max_abs_diff(&self, other: &Self) -> Vec<f64> {
        fn max_diff(a: &[f64], b: &[f64]) -> f64 {
            a.iter()
                .zip(b)
                .map(|(x, y)| (x - y).abs())
                .fold(0.0, f64::max)
        }

        let mut errors = vec![
            max_diff(&self.mass, &other.mass),
            max_diff(&self.energy, &other.energy),
        ];
        for (m, n) in self.momentum.iter().zip(&other.momentum) {
            errors.push(max_diff(m, n));
        }
        errors
    }

    fn zip_with<F>(mut self, other: &Self, f: F) -> Self
    where
        F: Fn(f64, f64) -> f64,
    {
        assert_eq!(self.dim(), other.dim());
        assert_eq!(self.num_zones(), other.num_zones());

        for (x, y) in self.mass.iter_mut().zip(&other.mass) {
            *x = f(*x, *y)
        }
        for (x, y) in self.energy.iter_mut().zip(&other.energy) {
            *x = f(*x, *y)
        }
        for (m, n) in self.momentum.iter_mut().zip(&other.momentum) {
            for (x, y) in m.iter_mut().zip(n) {
                *x = f(*x, *y)
            }
        }
        self
    }

    fn map<F>(mut self, f: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        for x in self.mass.iter_mut() {
            *x = f(*x)
        }
        for x in self.energy.iter_mut() {
            *x = f(*x)
        }
        for m in self.momentum.iter_mut() {
            for x in m.iter_mut() {
                *x = f(*x)
            }
        }
        self
    }
}




// ============================================================================
impl Add<SimulationState> for SimulationState {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        self.zip_with(&other, |x, y| x + y)
    }
}

impl Sub<SimulationState> for SimulationState {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        self.zip_with(&other, |x, y| x - y)
    }
}

impl Mul<f64> for SimulationState {
    type Output = Self;
    fn mul(self, a: f64) -> Self {
        self.map(|x| x * a)
    }
}




/**
 * The node positions of the spatial discretization: one coordinate array per
 * axis, all of equal length. Exposed by the mesh and consumed by the
 * initializers and the checkpoint reporter.
 */
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Coordinates {
    axes: Vec<Vec<f64>>,
}




// ============================================================================
impl Coordinates {

    pub fn from_axes(axes: Vec<Vec<f64>>) -> Self {
        if axes.is_empty() || axes.len() > AXIS_NAMES.len() {
            panic!("coordinates must have 1-3 axes, got {}", axes.len())
        }
        if axes.iter().any(|a| a.len() != axes[0].len()) {
            panic!("coordinate arrays must all have the same length")
        }
        Self { axes }
    }

    pub fn dim(&self) -> usize {
        self.axes.len()
    }

    pub fn num_zones(&self) -> usize {
        self.axes[0].len()
    }

    pub fn axis(&self, axis: usize) -> &[f64] {
        &self.axes[axis]
    }
}
