pub mod admission;
pub mod repository;
pub mod scheduling;
