pub mod initialization;
pub mod linear;

pub use initialization::WeightInit;
pub use linear::LinearLayer;
