pub use borm_core::*;
pub use borm_macros::*;
