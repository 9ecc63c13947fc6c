pub mod request;
pub mod response;
pub mod status;

pub use request::*;
pub use response::*;
pub use status::*;
