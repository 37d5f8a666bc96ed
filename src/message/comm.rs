use std::cell::RefCell;
use std::collections::VecDeque;

/// Compute the log-base-two of the next power of two: 8 -> 3, 9 -> 4.
///
fn ceil_log2(x: usize) -> usize {
    let mut n = 0;
    while 1 << n < x {
        n += 1
    }
    n
}

/// Interface for a group of cooperating simulation processes, one per mesh
/// partition, that can exchange messages over a network. The underlying
/// transport can in principle be TCP, UDP, or a higher level abstraction
/// like MPI.
///
pub trait Communicator {
    /// Must be implemented to return the rank of this process within the
    /// communicator.
    fn rank(&self) -> usize;

    /// Must be implemented to return the number of peer processes in this
    /// communicator.
    fn size(&self) -> usize;

    /// Must be implemented to send a message to a peer. This method must
    /// return immediately, in other words it is not allowed to block until a
    /// matching receive is posted.
    fn send(&self, rank: usize, message: Vec<u8>);

    /// Must be implemented to receive a message from any of the peers. This
    /// method is allowed to block until a message is ready to be received.
    fn recv(&self) -> Vec<u8>;

    /// Implements a binomial tree broadcast from the root rank. The message
    /// buffer must be `Some` on the root rank, and it must be `None`
    /// otherwise.
    ///
    fn broadcast(&self, value: Option<Vec<u8>>) -> Vec<u8> {
        let r = self.rank();
        let p = self.size();

        let value = match value {
            Some(value) => value,
            None => self.recv(),
        };
        for level in (0..ceil_log2(p)).rev() {
            let one = 1 << level;
            let two = 1 << (level + 1);

            if r % two == 0 && r + one < p {
                self.send(r + one, value.clone())
            }
        }
        value
    }

    /// Implements a binomial tree reduce over a commutative binary operator.
    /// All ranks return `None` except for the root.
    ///
    fn reduce(&self, f: &dyn Fn(Vec<u8>, Vec<u8>) -> Vec<u8>, mut value: Vec<u8>) -> Option<Vec<u8>> {
        let r = self.rank();
        let p = self.size();

        for level in 0..ceil_log2(p) {
            let one = 1 << level;
            let two = 1 << (level + 1);

            if r % two == one {
                self.send(r - one, value);
                return None;
            } else if r + one < p {
                value = f(value, self.recv())
            }
        }
        Some(value)
    }

    /// Implements an all-reduce (symmetric fold) operation over a
    /// commutative binary operator.
    ///
    fn all_reduce(&self, f: &dyn Fn(Vec<u8>, Vec<u8>) -> Vec<u8>, value: Vec<u8>) -> Vec<u8> {
        self.broadcast(self.reduce(f, value))
    }
}

/// Combine per-rank vectors of values into their elementwise maximum, known
/// on every rank. Payloads travel MessagePack-encoded. The vectors must have
/// the same length on every rank.
///
pub fn all_reduce_max(comm: &dyn Communicator, values: &[f64]) -> Vec<f64> {
    let combine = |a: Vec<u8>, b: Vec<u8>| -> Vec<u8> {
        let x: Vec<f64> = rmp_serde::decode::from_slice(&a).unwrap();
        let y: Vec<f64> = rmp_serde::decode::from_slice(&b).unwrap();
        let max: Vec<f64> = x.iter().zip(&y).map(|(a, b)| a.max(*b)).collect();
        rmp_serde::encode::to_vec(&max).unwrap()
    };
    let value = rmp_serde::encode::to_vec(values).unwrap();
    rmp_serde::decode::from_slice(&comm.all_reduce(&combine, value)).unwrap()
}

/// The trivial communicator for single-process runs: rank 0 of a group of
/// one. Sends loop back to the process itself so the collectives degenerate
/// to the identity.
///
pub struct NullCommunicator {
    loopback: RefCell<VecDeque<Vec<u8>>>,
}

impl NullCommunicator {
    pub fn new() -> Self {
        Self {
            loopback: RefCell::new(VecDeque::new()),
        }
    }
}

impl Default for NullCommunicator {
    fn default() -> Self {
        Self::new()
    }
}

impl Communicator for NullCommunicator {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn send(&self, rank: usize, message: Vec<u8>) {
        assert_eq!(rank, 0, "a single-process group has no peer {}", rank);
        self.loopback.borrow_mut().push_back(message)
    }

    fn recv(&self) -> Vec<u8> {
        self.loopback
            .borrow_mut()
            .pop_front()
            .expect("recv on an empty loopback queue")
    }
}
