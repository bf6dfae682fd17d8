//! Compute backend abstraction layer.
//!
//! The hierarchy and the Krylov solvers never touch vector or matrix
//! storage directly; they go through the `Backend` capability trait. One
//! concrete backend ships here:
//!
//! - **Native**: host vectors (`nalgebra::DVector`) and host CRS matrices,
//!   with rayon-parallel SpMV.
//!
//! # Architecture
//!
//! ```text
//! Assembly (SparseTriplets / nalgebra-sparse COO -> CrsMatrix)
//!         |
//!         v
//! Backend trait (create_vector, spmv, BLAS-1, inner product)
//!         |
//!         v
//! Hierarchy setup + cycles, Krylov solvers  (generic over Backend)
//! ```

pub mod native;
pub mod traits;

pub use native::{NativeBackend, crs_from_csr};
pub use traits::{Backend, VectorAccess};
