//! Sparse matrix structures (CSR format)
//!
//! The assembler emits triplets, [`CsrMatrix::from_triplets`] turns them into
//! compressed rows for the solvers.

mod csr;

pub use csr::CsrMatrix;
