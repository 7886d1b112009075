pub mod bitmatrix;
pub mod bitstream;
pub mod encoder;
pub mod error;
pub mod gf256;
pub mod render;
pub mod tables;

pub use encoder::{encode, EccLevel, Symbol};
pub use error::{Error, Result};
