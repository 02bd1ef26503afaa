pub mod classify;
pub mod extract;
