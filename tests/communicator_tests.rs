use heat_stencil::algs::communicator::{CommTag, Communicator, NoComm, ThreadComm, Wait};
use heat_stencil::stencil_error::StencilError;

#[test]
fn thread_round_trip() {
    let tag = CommTag(0x1000);
    let comms = ThreadComm::universe(2);
    comms[0].isend(1, tag.base(), b"hello");
    let got = comms[1].irecv(0, tag.base(), 5).wait().unwrap();
    assert_eq!(&got, b"hello");
}

#[test]
fn thread_fifo_order_per_tag() {
    let tag = CommTag(0x1001);
    let comms = ThreadComm::universe(2);
    for i in 0..10u8 {
        comms[0].send(1, tag.base(), &[i]).unwrap();
    }
    let mut out = Vec::new();
    for _ in 0..10 {
        let mut b = [0u8; 1];
        comms[1].recv_into(0, tag.base(), &mut b).unwrap();
        out.push(b[0]);
    }
    assert_eq!(out, (0u8..10).collect::<Vec<_>>());
}

#[test]
fn tags_are_isolated() {
    const TAG_A: u16 = 0xA100;
    const TAG_B: u16 = 0xB200;
    let comms = ThreadComm::universe(2);
    comms[0].send(1, TAG_A, &[1, 1]).unwrap();
    comms[0].send(1, TAG_B, &[2, 2]).unwrap();
    let mut b = [0u8; 2];
    comms[1].recv_into(0, TAG_B, &mut b).unwrap();
    assert_eq!(b, [2, 2]);
    comms[1].recv_into(0, TAG_A, &mut b).unwrap();
    assert_eq!(b, [1, 1]);
}

#[test]
fn short_message_is_a_comm_error() {
    let comms = ThreadComm::universe(2);
    comms[0].send(1, 7, &[1, 2]).unwrap();
    let mut b = [0u8; 4];
    let err = comms[1].recv_into(0, 7, &mut b).unwrap_err();
    assert!(matches!(err, StencilError::CommError { neighbor: 0, .. }));
}

#[test]
fn long_message_is_a_comm_error() {
    let comms = ThreadComm::universe(2);
    comms[0].send(1, 7, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
    let mut b = [0u8; 4];
    let err = comms[1].recv_into(0, 7, &mut b).unwrap_err();
    assert!(matches!(err, StencilError::CommError { neighbor: 0, .. }));
    assert_eq!(b, [0; 4]);
}

#[test]
fn oversized_halo_line_fails_sendrecv() {
    let comms = ThreadComm::universe(2);
    comms[0].send(1, 0x70, &[9; 12]).unwrap();
    let mut recv = [0u8; 8];
    let err = comms[1].sendrecv(None, &[], Some(0), &mut recv, 0x70).unwrap_err();
    assert!(matches!(err, StencilError::CommError { neighbor: 0, .. }));
}

#[test]
fn sendrecv_shifts_a_chain() {
    // every rank sends its id to the right and receives from the left
    let n = 5;
    let comms = ThreadComm::universe(n);
    let got: Vec<Option<u8>> = std::thread::scope(|s| {
        let handles: Vec<_> = comms
            .iter()
            .map(|c| {
                s.spawn(move || {
                    let r = c.rank();
                    let dest = (r + 1 < n).then_some(r + 1);
                    let source = r.checked_sub(1);
                    let mut recv = [0xFFu8];
                    c.sendrecv(dest, &[r as u8], source, &mut recv, 0x33).unwrap();
                    source.map(|_| recv[0])
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(got, vec![None, Some(0), Some(1), Some(2), Some(3)]);
}

#[test]
fn all_and_and_barrier_agree_everywhere() {
    let comms = ThreadComm::universe(4);
    let out: Vec<(bool, bool)> = std::thread::scope(|s| {
        let handles: Vec<_> = comms
            .iter()
            .map(|c| {
                s.spawn(move || {
                    c.barrier(0x50).unwrap();
                    let all = c.all_and(true, 0x52).unwrap();
                    let some = c.all_and(c.rank() != 3, 0x52).unwrap();
                    (all, some)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(out, vec![(true, false); 4]);
}

#[test]
fn abort_fails_every_rank() {
    let comms = ThreadComm::universe(3);
    let errs: Vec<StencilError> = std::thread::scope(|s| {
        let waiters: Vec<_> = comms[..2]
            .iter()
            .map(|c| s.spawn(move || c.all_and(true, 0x60).unwrap_err()))
            .collect();
        comms[2].abort(42);
        waiters.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(errs.iter().all(|e| *e == StencilError::Aborted(42)));
    assert_eq!(comms[0].aborted(), Some(42));
}

#[test]
fn no_comm_is_a_single_process() {
    let comm = NoComm;
    assert_eq!((comm.rank(), comm.size()), (0, 1));
    assert!(comm.all_and(false, 0).is_ok_and(|v| !v));
    let mut recv = [7u8; 2];
    comm.sendrecv(None, &[1, 2], None, &mut recv, 0).unwrap();
    assert_eq!(recv, [7, 7]);
}
