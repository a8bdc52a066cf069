//! Distributed stop decision.

use crate::algs::communicator::{CommTag, Communicator};
use crate::stencil_error::StencilError;

/// Combines this rank's local convergence flag with every other rank's.
///
/// Collective: every rank must call it once per step, and every rank gets
/// the same answer, so no process can leave the loop while others continue.
pub fn global_convergence<C: Communicator>(
    comm: &C,
    local: bool,
    tag: CommTag,
) -> Result<bool, StencilError> {
    let global = comm.all_and(local, tag.as_u16())?;
    log::trace!("rank {}: local {local}, global {global}", comm.rank());
    Ok(global)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::ThreadComm;

    fn vote(flags: &[bool]) -> Vec<bool> {
        let comms = ThreadComm::universe(flags.len());
        std::thread::scope(|s| {
            let handles: Vec<_> = comms
                .iter()
                .zip(flags)
                .map(|(comm, &f)| s.spawn(move || global_convergence(comm, f, CommTag::new(0x30))))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap().unwrap())
                .collect()
        })
    }

    #[test]
    fn all_true_is_true_everywhere() {
        assert_eq!(vote(&[true, true, true]), vec![true; 3]);
    }

    #[test]
    fn one_false_is_false_everywhere() {
        assert_eq!(vote(&[true, false, true, true]), vec![false; 4]);
        assert_eq!(vote(&[true, true, true, false]), vec![false; 4]);
    }

    #[test]
    fn repeated_rounds_stay_in_step() {
        let comms = ThreadComm::universe(3);
        let rounds = [[true, true, false], [true, true, true], [false, true, true]];
        let out: Vec<Vec<bool>> = std::thread::scope(|s| {
            let handles: Vec<_> = comms
                .iter()
                .enumerate()
                .map(|(r, comm)| {
                    s.spawn(move || {
                        rounds
                            .iter()
                            .map(|round| global_convergence(comm, round[r], CommTag::new(0x40)).unwrap())
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for per_rank in out {
            assert_eq!(per_rank, vec![false, true, false]);
        }
    }
}
