pub mod matrix;

pub use matrix::Matrix2;
pub use matrix::Matrix3;
