pub mod config;
pub mod error;
pub mod geojson;
pub mod hazard;
pub mod region;
pub mod score;


pub use config::*;
pub use error::*;
pub use hazard::*;
pub use region::*;
pub use score::*;
