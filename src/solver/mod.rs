pub mod bitset;
mod gtsp;
mod pool;

pub use bitset::ClassSet;
pub use gtsp::{SolveError, TourSolver};
pub use pool::SolverPool;
