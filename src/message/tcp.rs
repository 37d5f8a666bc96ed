use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::io::prelude::*;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use log::{debug, error, info};

use super::comm::Communicator;

const CONNECT_RETRY_WAIT: Duration = Duration::from_millis(250);
const CONNECT_RETRY_MAX_WAIT: Duration = Duration::from_millis(5000);

/// A `Communicator` over plain TCP streams, for runs with one process per
/// mesh partition. A listener thread accepts connections from the peers and
/// queues incoming frames; sends open one stream per peer lazily on the
/// caller's thread, retrying with exponential backoff while the rest of the
/// group is still starting up. Frames are length-prefixed byte buffers; the
/// payload encoding belongs to the caller.
///
pub struct TcpCommunicator {
    rank: usize,
    peers: Vec<SocketAddr>,
    streams: RefCell<HashMap<usize, TcpStream>>,
    recv_source: crossbeam_channel::Receiver<Vec<u8>>,
}

impl TcpCommunicator {
    /// Start a communicator for the process at position `rank` of the peer
    /// list, binding a listener on that peer address.
    ///
    pub fn new(rank: usize, peers: Vec<SocketAddr>) -> Self {
        let (recv_sink, recv_source) = crossbeam_channel::unbounded();
        let addr = peers[rank];

        thread::spawn(move || listen(addr, recv_sink));

        Self {
            rank,
            peers,
            streams: RefCell::new(HashMap::new()),
            recv_source,
        }
    }
}

impl Communicator for TcpCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.peers.len()
    }

    fn send(&self, rank: usize, message: Vec<u8>) {
        let mut streams = self.streams.borrow_mut();
        let stream = streams
            .entry(rank)
            .or_insert_with(|| connect_with_retry(self.peers[rank]));

        if let Err(e) = write_frame(stream, &message) {
            panic!("send to rank {} ({}) failed: {}", rank, self.peers[rank], e)
        }
    }

    fn recv(&self) -> Vec<u8> {
        self.recv_source.recv().unwrap()
    }
}

fn listen(addr: SocketAddr, recv_sink: crossbeam_channel::Sender<Vec<u8>>) {
    info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).unwrap();

    for stream in listener.incoming() {
        let mut stream = stream.unwrap();
        let sink = recv_sink.clone();

        debug!("Receiving connection from {:?}", stream.peer_addr());
        thread::spawn(move || loop {
            match read_frame(&mut stream) {
                Ok(frame) => {
                    if sink.send(frame).is_err() {
                        break;
                    }
                }
                // the peer hung up; normal at the end of a run
                Err(_) => break,
            }
        });
    }
}

fn read_frame(stream: &mut TcpStream) -> io::Result<Vec<u8>> {
    let mut header = [0; 8];
    stream.read_exact(&mut header)?;

    let mut frame = vec![0; u64::from_le_bytes(header) as usize];
    stream.read_exact(&mut frame)?;
    Ok(frame)
}

fn write_frame(stream: &mut TcpStream, frame: &[u8]) -> io::Result<()> {
    stream.write_all(&(frame.len() as u64).to_le_bytes())?;
    stream.write_all(frame)
}

fn connect_with_retry(addr: SocketAddr) -> TcpStream {
    let mut wait = CONNECT_RETRY_WAIT;

    loop {
        match TcpStream::connect(&addr) {
            Ok(stream) => {
                info!("Connected to {}", addr);
                return stream;
            }
            Err(e) => {
                error!("Connect to {} failed ({}), retrying in {:?}", addr, e, wait);
                thread::sleep(wait);
                wait = (wait * 2).min(CONNECT_RETRY_MAX_WAIT);
            }
        }
    }
}
