//! Database query functions organized by domain.

pub mod contracts;
