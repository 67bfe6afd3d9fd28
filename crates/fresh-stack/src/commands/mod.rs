//! Command implementations

pub mod doctor;

pub mod list;

pub mod new;
