//! Domain model: entities, value objects, rules and events. Nothing in here
//! touches I/O.
pub mod aggregates;
pub mod events;
pub mod reports;
pub mod value_objects;
