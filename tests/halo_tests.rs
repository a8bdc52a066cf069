use heat_stencil::algs::HaloExchange;
use heat_stencil::prelude::*;
use serial_test::serial;

fn tagged(x: usize, y: usize) -> f32 {
    (100 * x + y) as f32
}

/// Every rank writes `tagged(global x, global y)` into its interior, runs
/// one exchange and checks each halo cell.
fn check_exchange(nprocs: usize, size_x: usize, size_y: usize) {
    let results = run_local_ranks(nprocs, |comm| {
        let topo = CartesianTopology::new(comm.rank(), comm.size(), size_x, size_y)?;
        let e = topo.local_extent();
        let [x0, y0] = topo.origin();
        let mut buffers = DoubleBuffer::<f32>::new(e);
        let cur = buffers.current_mut();
        for y in 1..=e.ny {
            for x in 1..=e.nx {
                cur[e.idx(x, y)] = tagged(x0 + x, y0 + y);
            }
        }
        let mut halo = HaloExchange::new(e, topo.neighbors(), CommTag(0x4000));
        halo.exchange(comm, buffers.current_mut())?;

        let cur = buffers.current();
        let sides = [
            (Direction::Up, (1..=e.nx).map(|x| (x, 0)).collect::<Vec<_>>()),
            (Direction::Down, (1..=e.nx).map(|x| (x, e.ny + 1)).collect()),
            (Direction::Left, (1..=e.ny).map(|y| (0, y)).collect()),
            (Direction::Right, (1..=e.ny).map(|y| (e.nx + 1, y)).collect()),
        ];
        for (dir, cells) in sides {
            for (x, y) in cells {
                let want = match topo.neighbor(dir) {
                    Some(_) => tagged(x0 + x, y0 + y),
                    None => 0.0,
                };
                assert_eq!(cur[e.idx(x, y)], want, "rank {} {dir:?} ({x}, {y})", comm.rank());
            }
        }
        // corners are never exchanged
        for (x, y) in [(0, 0), (e.nx + 1, 0), (0, e.ny + 1), (e.nx + 1, e.ny + 1)] {
            assert_eq!(cur[e.idx(x, y)], 0.0);
        }
        Ok(())
    })
    .unwrap();
    assert!(results.iter().all(Result::is_ok));
}

#[test]
#[serial]
fn two_by_two_exchange() {
    check_exchange(4, 6, 6);
}

#[test]
#[serial]
fn three_by_two_exchange_on_rectangle() {
    check_exchange(6, 11, 8);
}

#[test]
#[serial]
fn single_row_of_ranks() {
    check_exchange(5, 12, 5);
}
