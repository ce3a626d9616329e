pub mod booking;
pub mod payment;
pub mod pricing;

pub use booking::*;
pub use payment::*;
pub use pricing::*;
