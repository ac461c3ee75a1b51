pub mod account;
pub mod assignment;
pub mod document;
pub mod question_generation;
pub mod shared;
pub mod submission;
pub mod team;
