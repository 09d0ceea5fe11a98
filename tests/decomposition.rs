//! Tests for the 1-D slab decomposition.
//!
//! These tests check, over random grid sizes and group sizes, that the slabs
//! partition the x axis exactly (no gaps, no overlap, contiguous in rank order),
//! that slab sizes differ by at most one plane, and that the neighbor links form an
//! open chain.

use rand::Rng;
use slabstencil::grid::{decompose_all, Decomposition, HaloSides};
use slabstencil::StencilError;

/// Draw `(nx, ranks)` pairs with `nx >= ranks >= 1`.
fn random_cases(count: usize) -> Vec<(usize, usize)> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            let ranks = rng.gen_range(1..=64);
            let nx = rng.gen_range(ranks..=ranks * 9 + 7);
            (nx, ranks)
        })
        .collect()
}

/// Sum of `local_nx` equals `nx`, and offsets tile `[0, nx)` in rank order.
#[test]
fn slabs_partition_the_x_axis() {
    for (nx, ranks) in random_cases(200) {
        let slabs = decompose_all(nx, ranks).unwrap();
        assert_eq!(slabs.iter().map(|d| d.local_nx).sum::<usize>(), nx, "nx={nx} P={ranks}");
        let mut expected_offset = 0;
        for d in &slabs {
            assert!(d.local_nx >= 1);
            assert_eq!(d.x_offset, expected_offset, "nx={nx} P={ranks} rank={}", d.rank);
            expected_offset = d.owned_range().end;
        }
        assert_eq!(expected_offset, nx);
    }
}

/// Slab sizes differ by at most one, larger slabs first.
#[test]
fn slabs_are_near_equal() {
    for (nx, ranks) in random_cases(200) {
        let slabs = decompose_all(nx, ranks).unwrap();
        let sizes: Vec<usize> = slabs.iter().map(|d| d.local_nx).collect();
        let (min, max) = (sizes.iter().min().unwrap(), sizes.iter().max().unwrap());
        assert!(max - min <= 1);
        assert!(sizes.windows(2).all(|w| w[0] >= w[1]));
    }
}

/// Right neighbor of r is r+1, left neighbor of r is r-1, and both ends are open.
#[test]
fn neighbor_links_form_an_open_chain() {
    for ranks in 2..=17 {
        let slabs = decompose_all(64, ranks).unwrap();
        for (r, d) in slabs.iter().enumerate() {
            assert_eq!(d.rank, r);
            if r + 1 < ranks {
                assert_eq!(d.right, Some(slabs[r + 1].rank));
                assert_eq!(slabs[r + 1].left, Some(r));
            }
        }
        assert_eq!(slabs[0].left, None);
        assert_eq!(slabs[ranks - 1].right, None);
        assert_eq!(slabs[0].open_sides(), HaloSides::LEFT);
        assert_eq!(slabs[ranks - 1].open_sides(), HaloSides::RIGHT);
        assert!(slabs[1..ranks - 1].iter().all(|d| d.linked_sides() == HaloSides::BOTH));
    }
}

/// Every rank computes the same answer independently.
#[test]
fn decomposition_is_deterministic() {
    for (nx, ranks) in random_cases(50) {
        for rank in 0..ranks {
            let first = Decomposition::new(nx, ranks, rank).unwrap();
            assert_eq!(first, Decomposition::new(nx, ranks, rank).unwrap());
        }
    }
}

/// More ranks than planes is a configuration error on every rank.
#[test]
fn more_ranks_than_planes_is_rejected() {
    for rank in 0..5 {
        assert!(matches!(
            Decomposition::new(4, 5, rank),
            Err(StencilError::Decomposition { nx: 4, ranks: 5 })
        ));
    }
    assert!(decompose_all(4, 5).is_err());
}

/// The worked example: nx = 4 over two ranks.
#[test]
fn four_planes_over_two_ranks() {
    let slabs = decompose_all(4, 2).unwrap();
    assert_eq!((slabs[0].local_nx, slabs[0].x_offset), (2, 0));
    assert_eq!((slabs[1].local_nx, slabs[1].x_offset), (2, 2));
    assert_eq!((slabs[0].left, slabs[0].right), (None, Some(1)));
    assert_eq!((slabs[1].left, slabs[1].right), (Some(0), None));
}
