//! Slab geometry: the 1-D decomposition of the global grid and the ghosted local field.

pub mod decomposition;
pub mod field;

pub use decomposition::{decompose_all, Decomposition, HaloSides};
pub use field::{Constant, InitialCondition, LinearRamp, LocalField};
