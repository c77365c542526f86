pub mod params;
pub mod request;
pub mod response;
pub mod secret;

pub use params::*;
pub use request::*;
pub use response::*;
pub use secret::*;
