pub mod errors;
pub mod todo;
pub mod user;

pub use errors::*;
pub use todo::*;
pub use user::*;
