#![forbid(unsafe_code)]

pub mod question_bank;
pub mod repository;
