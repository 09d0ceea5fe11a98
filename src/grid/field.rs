//! Flattened 3-D field with one ghost plane on each side of the decomposed axis.
//!
//! Layout: `index(i, j, k) = (i * ny + j) * nz + k`, with `i` in `[0, local_nx + 1]`.
//! Planes `0` and `local_nx + 1` are ghosts; owned planes `1..=local_nx` are stored
//! contiguously, which keeps halo messages and the checksum on plain slices.

use rayon::prelude::*;

use crate::config::{BoundaryPolicy, GlobalGrid};
use crate::error::{Result, StencilError};
use crate::grid::decomposition::{Decomposition, HaloSides};

/// Deterministic field value as a function of global coordinates.
pub trait InitialCondition: Sync {
    fn value(&self, gx: i64, gy: usize, gz: usize) -> f64;
}

/// `1.0 + 0.01·gx + 0.02·gy + 0.03·gz`, the benchmark's synthetic field.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearRamp;

impl InitialCondition for LinearRamp {
    #[inline]
    fn value(&self, gx: i64, gy: usize, gz: usize) -> f64 {
        1.0 + 0.01 * gx as f64 + 0.02 * gy as f64 + 0.03 * gz as f64
    }
}

/// Same value everywhere; a fixed point of the averaging kernel.
#[derive(Debug, Clone, Copy)]
pub struct Constant(pub f64);

impl InitialCondition for Constant {
    #[inline]
    fn value(&self, _gx: i64, _gy: usize, _gz: usize) -> f64 {
        self.0
    }
}

/// One rank's slab plus its two ghost planes.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalField {
    data: Vec<f64>,
    local_nx: usize,
    ny: usize,
    nz: usize,
}

impl LocalField {
    /// Zero-filled field of the given shape.
    #[cfg(test)]
    pub(crate) fn zeros(local_nx: usize, ny: usize, nz: usize) -> Self {
        let len = (local_nx + 2) * ny * nz;
        Self { data: vec![0.0; len], local_nx, ny, nz }
    }

    /// Allocate the slab described by `decomp`, reporting allocation failure
    /// instead of aborting.
    ///
    /// A slab whose element count does not fit in `usize` is reported as an
    /// allocation failure with `elems = usize::MAX`.
    pub fn allocate(decomp: &Decomposition, grid: &GlobalGrid) -> Result<Self> {
        let elems = grid
            .plane_len()
            .and_then(|p| (decomp.local_nx + 2).checked_mul(p))
            .ok_or(StencilError::Allocation { rank: decomp.rank, elems: usize::MAX })?;
        let mut data = Vec::new();
        data.try_reserve_exact(elems)
            .map_err(|_| StencilError::Allocation { rank: decomp.rank, elems })?;
        data.resize(elems, 0.0);
        Ok(Self { data, local_nx: decomp.local_nx, ny: grid.ny, nz: grid.nz })
    }

    #[inline(always)]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        (i * self.ny + j) * self.nz + k
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> f64 {
        self.data[self.index(i, j, k)]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, k: usize, v: f64) {
        let idx = self.index(i, j, k);
        self.data[idx] = v;
    }

    pub fn local_nx(&self) -> usize { self.local_nx }
    pub fn ny(&self) -> usize { self.ny }
    pub fn nz(&self) -> usize { self.nz }
    pub fn plane_len(&self) -> usize { self.ny * self.nz }

    pub fn as_slice(&self) -> &[f64] { &self.data }
    pub fn as_mut_slice(&mut self) -> &mut [f64] { &mut self.data }

    /// Plane `i` (ghosts included).
    pub fn plane(&self, i: usize) -> &[f64] {
        let p = self.plane_len();
        &self.data[i * p..(i + 1) * p]
    }

    pub fn plane_mut(&mut self, i: usize) -> &mut [f64] {
        let p = self.plane_len();
        &mut self.data[i * p..(i + 1) * p]
    }

    /// Owned planes `1..=local_nx`, ghosts excluded.
    pub fn owned(&self) -> &[f64] {
        let p = self.plane_len();
        &self.data[p..(self.local_nx + 1) * p]
    }

    pub fn same_shape(&self, other: &LocalField) -> bool {
        (self.local_nx, self.ny, self.nz) == (other.local_nx, other.ny, other.nz)
    }

    /// Fill owned planes from `ic` and the end-of-chain ghosts from `policy`.
    ///
    /// Ghosts facing a real neighbor are zeroed; the first halo exchange overwrites
    /// them. Each rayon task writes one whole plane, so writes never overlap.
    pub fn initialize(
        &mut self,
        decomp: &Decomposition,
        ic: &dyn InitialCondition,
        policy: BoundaryPolicy,
    ) {
        assert_eq!(decomp.local_nx, self.local_nx, "field does not match decomposition");
        let (local_nx, nz) = (self.local_nx, self.nz);
        let open = decomp.open_sides();
        let plane_len = self.plane_len();
        self.data
            .par_chunks_mut(plane_len)
            .enumerate()
            .for_each(|(i, plane)| {
                let owned = (1..=local_nx).contains(&i);
                let open_end = (i == 0 && open.contains(HaloSides::LEFT))
                    || (i == local_nx + 1 && open.contains(HaloSides::RIGHT));
                if owned || (open_end && policy == BoundaryPolicy::Dirichlet) {
                    let gx = decomp.global_x(i);
                    for (jk, v) in plane.iter_mut().enumerate() {
                        *v = ic.value(gx, jk / nz, jk % nz);
                    }
                } else {
                    plane.fill(0.0);
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_is_row_major_over_ijk() {
        let f = LocalField::zeros(2, 3, 4);
        assert_eq!(f.as_slice().len(), 4 * 3 * 4);
        assert_eq!(f.index(0, 0, 1), 1);
        assert_eq!(f.index(0, 1, 0), 4);
        assert_eq!(f.index(1, 0, 0), 12);
        assert_eq!(f.index(3, 2, 3), f.as_slice().len() - 1);
    }

    #[test]
    fn owned_excludes_ghost_planes() {
        let mut f = LocalField::zeros(2, 2, 2);
        f.plane_mut(0).fill(-1.0);
        f.plane_mut(3).fill(-1.0);
        f.plane_mut(1).fill(1.0);
        f.plane_mut(2).fill(2.0);
        assert_eq!(f.owned(), &[1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn initialize_uses_global_coordinates() {
        let grid = GlobalGrid::new(6, 3, 3).unwrap();
        let d = Decomposition::new(6, 2, 1).unwrap();
        let mut f = LocalField::allocate(&d, &grid).unwrap();
        f.initialize(&d, &LinearRamp, BoundaryPolicy::Dirichlet);
        // local i = 1 on rank 1 is global x = 3
        assert_eq!(f.get(1, 2, 1), LinearRamp.value(3, 2, 1));
        // left ghost faces rank 0 and stays zero until exchanged
        assert!(f.plane(0).iter().all(|&v| v == 0.0));
        // right ghost is the open end: Dirichlet value at gx = nx
        assert_eq!(f.get(4, 0, 0), LinearRamp.value(6, 0, 0));
    }

    #[test]
    fn zero_policy_leaves_end_ghosts_empty() {
        let grid = GlobalGrid::new(3, 3, 3).unwrap();
        let d = Decomposition::new(3, 1, 0).unwrap();
        let mut f = LocalField::allocate(&d, &grid).unwrap();
        f.initialize(&d, &Constant(5.0), BoundaryPolicy::Zero);
        assert!(f.plane(0).iter().chain(f.plane(4)).all(|&v| v == 0.0));
        assert!(f.owned().iter().all(|&v| v == 5.0));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn unreservable_slab_is_an_allocation_error() {
        // 3 * 2^62 doubles: representable as a count, far beyond any address space
        let grid = GlobalGrid::new(1, 1 << 31, 1 << 31).unwrap();
        let d = Decomposition::new(1, 1, 0).unwrap();
        let err = LocalField::allocate(&d, &grid).unwrap_err();
        assert!(matches!(err, StencilError::Allocation { rank: 0, elems } if elems == 3 << 62));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn overflowing_slab_size_is_an_allocation_error() {
        let grid = GlobalGrid::new(1, 1 << 32, 1 << 32).unwrap();
        let d = Decomposition::new(1, 1, 0).unwrap();
        let err = LocalField::allocate(&d, &grid).unwrap_err();
        assert!(matches!(err, StencilError::Allocation { rank: 0, elems: usize::MAX }));
        assert_eq!(err.exit_code(), 3);

        // the overflow is in (local_nx + 2) * plane, not in the plane itself
        let grid = GlobalGrid::new(1, 1 << 31, 1 << 32).unwrap();
        let err = LocalField::allocate(&d, &grid).unwrap_err();
        assert!(matches!(err, StencilError::Allocation { elems: usize::MAX, .. }));
    }
}
