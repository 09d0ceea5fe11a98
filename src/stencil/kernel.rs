//! 6-point Jacobi smoothing kernel.
//!
//! `next(i,j,k) = (xm + xp + ym + yp + zm + zp) / 6` over owned planes `1..=local_nx`
//! and the interior `1..ny-1`, `1..nz-1` of the non-decomposed axes. Cells on the
//! j/k faces are never written, so they keep whatever the buffer already holds
//! (the initial condition, since both buffers start identical).
//!
//! The collapsed iteration space is the set of `(i, j)` pencils of length `nz`; rayon
//! hands disjoint pencils of `next` to its workers, so no locking is needed and the
//! end of `for_each` is the join barrier.

use rayon::prelude::*;

use crate::grid::LocalField;

/// One Jacobi sweep from `current` into `next`.
///
/// # Panics
/// Panics if the two fields do not have the same shape.
pub fn jacobi_step(current: &LocalField, next: &mut LocalField) {
    assert!(current.same_shape(next), "jacobi_step: current and next differ in shape");
    let (local_nx, ny, nz) = (current.local_nx(), current.ny(), current.nz());
    if ny < 3 || nz < 3 {
        return;
    }
    let plane = ny * nz;
    let cur = current.as_slice();
    let owned = &mut next.as_mut_slice()[plane..(local_nx + 1) * plane];

    owned.par_chunks_mut(nz).enumerate().for_each(|(pencil, out)| {
        let i = pencil / ny + 1;
        let j = pencil % ny;
        if j == 0 || j == ny - 1 {
            return;
        }
        let base = (i * ny + j) * nz;
        for k in 1..nz - 1 {
            let c = base + k;
            let xm = cur[c - plane];
            let xp = cur[c + plane];
            let ym = cur[c - nz];
            let yp = cur[c + nz];
            let zm = cur[c - 1];
            let zp = cur[c + 1];
            out[k] = (xm + xp + ym + yp + zm + zp) / 6.0;
        }
    });
}

/// Number of cells a sweep updates on a slab of this shape.
pub fn interior_cells(field: &LocalField) -> usize {
    field.local_nx() * field.ny().saturating_sub(2) * field.nz().saturating_sub(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    // straightforward triple loop used as the reference
    fn naive_step(cur: &LocalField, next: &mut LocalField) {
        for i in 1..=cur.local_nx() {
            for j in 1..cur.ny() - 1 {
                for k in 1..cur.nz() - 1 {
                    let v = (cur.get(i - 1, j, k)
                        + cur.get(i + 1, j, k)
                        + cur.get(i, j - 1, k)
                        + cur.get(i, j + 1, k)
                        + cur.get(i, j, k - 1)
                        + cur.get(i, j, k + 1))
                        / 6.0;
                    next.set(i, j, k, v);
                }
            }
        }
    }

    fn filled(local_nx: usize, ny: usize, nz: usize) -> LocalField {
        let mut f = LocalField::zeros(local_nx, ny, nz);
        for (n, v) in f.as_mut_slice().iter_mut().enumerate() {
            *v = ((n * 37) % 101) as f64 * 0.25;
        }
        f
    }

    #[test]
    fn matches_naive_loop() {
        let cur = filled(3, 5, 6);
        let mut fast = LocalField::zeros(3, 5, 6);
        let mut slow = LocalField::zeros(3, 5, 6);
        jacobi_step(&cur, &mut fast);
        naive_step(&cur, &mut slow);
        assert_eq!(fast, slow);
    }

    #[test]
    fn faces_and_ghosts_are_not_written() {
        let cur = filled(2, 4, 4);
        let mut next = LocalField::zeros(2, 4, 4);
        next.as_mut_slice().fill(f64::NAN);
        jacobi_step(&cur, &mut next);
        for i in 0..4 {
            for j in 0..4 {
                for k in 0..4 {
                    let interior =
                        (1..=2).contains(&i) && (1..3).contains(&j) && (1..3).contains(&k);
                    assert_eq!(next.get(i, j, k).is_nan(), !interior, "({i},{j},{k})");
                }
            }
        }
        assert_eq!(interior_cells(&next), 2 * 2 * 2);
    }

    #[test]
    fn thin_grid_has_no_interior() {
        let cur = filled(2, 2, 5);
        let mut next = LocalField::zeros(2, 2, 5);
        jacobi_step(&cur, &mut next);
        assert!(next.as_slice().iter().all(|&v| v == 0.0));
        assert_eq!(interior_cells(&next), 0);
    }

    #[test]
    #[should_panic(expected = "differ in shape")]
    fn shape_mismatch_panics() {
        let cur = LocalField::zeros(2, 3, 3);
        let mut next = LocalField::zeros(3, 3, 3);
        jacobi_step(&cur, &mut next);
    }
}
