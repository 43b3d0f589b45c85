pub mod detection;
pub mod errors;
pub mod inventory;
pub mod model;
