pub mod category;
pub mod comment;
pub mod post;
pub mod user;

pub use category::*;
pub use comment::*;
pub use post::*;
pub use user::*;
