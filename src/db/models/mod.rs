//! Database models split into domain-specific modules.

pub mod activity;
pub mod course;
pub mod enrollment;
pub mod semester;
pub mod user;

pub use activity::*;
pub use course::*;
pub use enrollment::*;
pub use semester::*;
pub use user::*;
