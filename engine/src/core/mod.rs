//! Pure decision model: coordinates, conditions, rules, tables.

pub mod condition;
pub mod coordinate;
pub mod fragment;
pub mod rule;
pub mod table;
