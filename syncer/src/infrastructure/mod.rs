pub mod node;
pub mod persistence;
pub mod web;
