//! Thin façade over in-process (threads) or inter-process (MPI) message passing.
//!
//! Messages are *contiguous byte slices* (no zero-copy guarantees).
//! Handles returned by `isend`/`irecv` are **waitable**; nothing is trusted
//! until `.wait()` has returned. The two primitives the solver depends on,
//! the paired [`Communicator::sendrecv`] and the logical-AND reduction
//! [`Communicator::all_and`], have default implementations in terms of
//! `isend`/`irecv` so a backend only has to override them when it has a
//! native version.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::time::Duration;

use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};

use crate::algs::wire::{WireFlag, cast_slice, cast_slice_mut, copy_into};
use crate::stencil_error::StencilError;

/// Rank that owns the global field and roots the default reduction.
pub const COORDINATOR: usize = 0;

/// A typed message tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommTag(pub u16);

impl CommTag {
    pub const fn new(base: u16) -> Self {
        Self(base)
    }
    pub const fn base(self) -> u16 {
        self.0
    }
    pub const fn as_u16(self) -> u16 {
        self.0
    }
    /// Tag `n` slots above this one.
    pub const fn offset(self, n: u16) -> Self {
        Self(self.0.wrapping_add(n))
    }
}

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
}

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

/// Message-passing interface shared by every backend.
pub trait Communicator {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    /// Posts a receive for a message of `len` bytes from `peer`.
    fn irecv(&self, peer: usize, tag: u16, len: usize) -> Self::RecvHandle;

    /// Tears down the whole process group. Every pending and future receive
    /// in the group fails.
    fn abort(&self, code: i32);

    /// Abort code if this group has been torn down.
    fn aborted(&self) -> Option<i32> {
        None
    }

    /// Blocking send.
    fn send(&self, peer: usize, tag: u16, buf: &[u8]) -> Result<(), StencilError> {
        self.isend(peer, tag, buf).wait();
        match self.aborted() {
            Some(code) => Err(StencilError::Aborted(code)),
            None => Ok(()),
        }
    }

    /// Blocking receive of exactly `buf.len()` bytes.
    fn recv_into(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Result<(), StencilError> {
        let data = self
            .irecv(peer, tag, buf.len())
            .wait()
            .ok_or_else(|| self.recv_failure(peer))?;
        copy_into(peer, &data, buf)
    }

    /// Sends `sendbuf` to `dest` while receiving `recvbuf` from `source`.
    ///
    /// Either side may be `None` (no neighbor), in which case that half is
    /// skipped. The receive is posted before the send, so the exchange does
    /// not rely on the peer buffering.
    fn sendrecv(
        &self,
        dest: Option<usize>,
        sendbuf: &[u8],
        source: Option<usize>,
        recvbuf: &mut [u8],
        tag: u16,
    ) -> Result<(), StencilError> {
        let rx = source.map(|src| (src, self.irecv(src, tag, recvbuf.len())));
        let tx = dest.map(|dst| self.isend(dst, tag, sendbuf));
        let mut result = Ok(());
        if let Some((src, h)) = rx {
            result = match h.wait() {
                Some(data) => copy_into(src, &data, recvbuf),
                None => Err(self.recv_failure(src)),
            };
        }
        // always drain the send before returning
        if let Some(h) = tx {
            let _ = h.wait();
        }
        result
    }

    /// Logical AND of `local` across the whole group; every rank gets the
    /// same answer.
    ///
    /// Default: every rank votes to the coordinator on `tag`, which combines
    /// all votes and broadcasts the result on `tag + 1`.
    fn all_and(&self, local: bool, tag: u16) -> Result<bool, StencilError> {
        let size = self.size();
        if size <= 1 {
            return Ok(local);
        }
        let gather = tag;
        let bcast = tag.wrapping_add(1);
        if self.rank() == COORDINATOR {
            let mut all = local;
            // receive every vote, no short-circuit, to keep queues aligned
            for peer in (0..size).filter(|&p| p != COORDINATOR) {
                let mut vote = WireFlag::default();
                self.recv_into(peer, gather, cast_slice_mut(std::slice::from_mut(&mut vote)))?;
                all &= vote.get();
            }
            let out = [WireFlag::new(all)];
            let pending: Vec<_> = (0..size)
                .filter(|&p| p != COORDINATOR)
                .map(|peer| self.isend(peer, bcast, cast_slice(&out)))
                .collect();
            for h in pending {
                let _ = h.wait();
            }
            Ok(all)
        } else {
            self.send(COORDINATOR, gather, cast_slice(&[WireFlag::new(local)]))?;
            let mut result = WireFlag::default();
            self.recv_into(
                COORDINATOR,
                bcast,
                cast_slice_mut(std::slice::from_mut(&mut result)),
            )?;
            Ok(result.get())
        }
    }

    /// Blocks until every rank has reached the barrier.
    fn barrier(&self, tag: u16) -> Result<(), StencilError> {
        self.all_and(true, tag).map(|_| ())
    }

    #[doc(hidden)]
    fn recv_failure(&self, peer: usize) -> StencilError {
        match self.aborted() {
            Some(code) => StencilError::Aborted(code),
            None => StencilError::comm(peer, format!("failed to receive from rank {peer}")),
        }
    }
}

/// Compile-time no-op comm for a single process.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: u16, _len: usize) {}
    fn abort(&self, code: i32) {
        log::error!("abort({code}) on a single-process communicator");
    }
}

// --- ThreadComm: several simulated processes inside one OS process ---
type Key = (usize, usize, u16); // (src, dst, tag)

const ABORT_POLL: Duration = Duration::from_millis(20);

#[derive(Default)]
struct Slot {
    queue: Mutex<VecDeque<Bytes>>,
    ready: Condvar,
}

/// Mailboxes shared by one group of simulated processes.
struct Fabric {
    size: usize,
    slots: DashMap<Key, Arc<Slot>>,
    aborted: AtomicBool,
    abort_code: AtomicI32,
}

impl Fabric {
    fn slot(&self, key: Key) -> Arc<Slot> {
        Arc::clone(&self.slots.entry(key).or_default())
    }

    fn aborted(&self) -> Option<i32> {
        self.aborted
            .load(Ordering::Acquire)
            .then(|| self.abort_code.load(Ordering::Acquire))
    }
}

/// Pending receive on a [`ThreadComm`] mailbox.
pub struct LocalHandle {
    fabric: Arc<Fabric>,
    key: Key,
}

impl Wait for LocalHandle {
    fn wait(self) -> Option<Vec<u8>> {
        let slot = self.fabric.slot(self.key);
        let mut queue = slot.queue.lock();
        loop {
            if let Some(bytes) = queue.pop_front() {
                // full payload; the caller checks the length
                return Some(bytes.to_vec());
            }
            if self.fabric.aborted().is_some() {
                return None;
            }
            // timed so an abort that races with slot creation is still seen
            let _ = slot.ready.wait_for(&mut queue, ABORT_POLL);
        }
    }
}

/// Thread-backed communicator: each rank is a thread, messages are
/// FIFO-queued per `(src, dst, tag)`.
///
/// Sends are buffered and never block, so any exchange pattern in which
/// every receive has a matching send completes.
#[derive(Clone)]
pub struct ThreadComm {
    rank: usize,
    fabric: Arc<Fabric>,
}

impl ThreadComm {
    /// One communicator per rank of a fresh group of `size` processes.
    pub fn universe(size: usize) -> Vec<Self> {
        let fabric = Arc::new(Fabric {
            size,
            slots: DashMap::new(),
            aborted: AtomicBool::new(false),
            abort_code: AtomicI32::new(0),
        });
        (0..size)
            .map(|rank| Self {
                rank,
                fabric: Arc::clone(&fabric),
            })
            .collect()
    }
}

impl std::fmt::Debug for ThreadComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadComm")
            .field("rank", &self.rank)
            .field("size", &self.fabric.size)
            .finish()
    }
}

impl Communicator for ThreadComm {
    type SendHandle = ();
    type RecvHandle = LocalHandle;

    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.fabric.size
    }

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle {
        let slot = self.fabric.slot((self.rank, peer, tag));
        slot.queue.lock().push_back(Bytes::copy_from_slice(buf));
        slot.ready.notify_all();
    }

    fn irecv(&self, peer: usize, tag: u16, _len: usize) -> Self::RecvHandle {
        LocalHandle {
            fabric: Arc::clone(&self.fabric),
            key: (peer, self.rank, tag),
        }
    }

    fn abort(&self, code: i32) {
        log::error!("rank {} aborting process group with code {code}", self.rank);
        self.fabric.abort_code.store(code, Ordering::Release);
        self.fabric.aborted.store(true, Ordering::Release);
        for entry in self.fabric.slots.iter() {
            entry.value().ready.notify_all();
        }
    }

    fn aborted(&self) -> Option<i32> {
        self.fabric.aborted()
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::*;
    use mpi::collective::SystemOperation;
    use mpi::environment::Universe;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::*;

    /// Handle for an operation that completed when it was posted.
    ///
    /// MPI sends and receives here are blocking; the paired exchange and the
    /// reduction use native MPI calls instead of the trait defaults.
    pub struct Ready(Option<Vec<u8>>);

    impl Wait for Ready {
        fn wait(self) -> Option<Vec<u8>> {
            self.0
        }
    }

    pub struct MpiComm {
        world: SimpleCommunicator,
        rank: usize,
        size: usize,
        // dropping the universe finalizes MPI, so it must outlive `world`
        _universe: Universe,
    }

    impl MpiComm {
        pub fn new() -> Result<Self, StencilError> {
            let universe = mpi::initialize()
                .ok_or_else(|| StencilError::comm(0, "MPI initialization failed"))?;
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Ok(Self {
                world,
                rank,
                size,
                _universe: universe,
            })
        }
    }

    impl Communicator for MpiComm {
        type SendHandle = Ready;
        type RecvHandle = Ready;

        fn rank(&self) -> usize {
            self.rank
        }

        fn size(&self) -> usize {
            self.size
        }

        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Ready {
            self.world
                .process_at_rank(peer as i32)
                .send_with_tag(buf, i32::from(tag));
            Ready(None)
        }

        fn irecv(&self, peer: usize, tag: u16, len: usize) -> Ready {
            let mut buf = vec![0u8; len];
            self.world
                .process_at_rank(peer as i32)
                .receive_into_with_tag(&mut buf[..], i32::from(tag));
            Ready(Some(buf))
        }

        fn abort(&self, code: i32) {
            log::error!("rank {} calling MPI_Abort({code})", self.rank);
            self.world.abort(code)
        }

        fn sendrecv(
            &self,
            dest: Option<usize>,
            sendbuf: &[u8],
            source: Option<usize>,
            recvbuf: &mut [u8],
            tag: u16,
        ) -> Result<(), StencilError> {
            let tag = i32::from(tag);
            match (dest, source) {
                (Some(d), Some(s)) => {
                    mpi::point_to_point::send_receive_into_with_tags(
                        sendbuf,
                        &self.world.process_at_rank(d as i32),
                        tag,
                        recvbuf,
                        &self.world.process_at_rank(s as i32),
                        tag,
                    );
                }
                (Some(d), None) => {
                    self.world.process_at_rank(d as i32).send_with_tag(sendbuf, tag);
                }
                (None, Some(s)) => {
                    self.world
                        .process_at_rank(s as i32)
                        .receive_into_with_tag(recvbuf, tag);
                }
                (None, None) => {}
            }
            Ok(())
        }

        fn all_and(&self, local: bool, _tag: u16) -> Result<bool, StencilError> {
            let mine = i32::from(local);
            let mut all = 0i32;
            self.world
                .all_reduce_into(&mine, &mut all, SystemOperation::logical_and());
            Ok(all != 0)
        }

        fn barrier(&self, _tag: u16) -> Result<(), StencilError> {
            self.world.barrier();
            Ok(())
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_roundtrip_two_ranks() {
        let comms = ThreadComm::universe(2);
        let (comm0, comm1) = (&comms[0], &comms[1]);

        // post the receive on "rank 1" before anything was sent
        let recv_handle = comm1.irecv(0, 7, 4);
        comm0.isend(1, 7, &[1, 2, 3, 4]).wait();

        let data = recv_handle
            .wait()
            .expect("Expected to receive data from rank 0");
        assert_eq!(&data, &[1, 2, 3, 4]);
    }

    #[test]
    fn universes_do_not_share_mailboxes() {
        let a = ThreadComm::universe(2);
        let b = ThreadComm::universe(2);
        a[0].isend(1, 1, &[9]);
        b[0].isend(1, 1, &[5]);
        assert_eq!(b[1].irecv(0, 1, 1).wait(), Some(vec![5]));
        assert_eq!(a[1].irecv(0, 1, 1).wait(), Some(vec![9]));
    }

    #[test]
    fn abort_wakes_blocked_receiver() {
        let comms = ThreadComm::universe(2);
        let waiter = comms[1].clone();
        let t = std::thread::spawn(move || waiter.recv_into(0, 3, &mut [0u8; 8]));
        std::thread::sleep(Duration::from_millis(30));
        comms[0].abort(17);
        let res = t.join().unwrap();
        assert_eq!(res, Err(StencilError::Aborted(17)));
    }

    #[test]
    fn no_comm_reduction_is_identity() {
        let comm = NoComm;
        assert!(comm.all_and(true, 0).unwrap());
        assert!(!comm.all_and(false, 0).unwrap());
        let mut buf = [0u8; 4];
        comm.sendrecv(None, &[1, 2, 3, 4], None, &mut buf, 0).unwrap();
        assert_eq!(buf, [0; 4]);
    }
}
