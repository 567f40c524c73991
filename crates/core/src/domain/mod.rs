pub mod assignment;
pub mod role;
pub mod single;
pub mod vacation;
