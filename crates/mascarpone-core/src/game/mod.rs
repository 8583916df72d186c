pub mod controller;
pub mod events;
pub mod participant;
pub mod plan;
pub mod serialization;
pub mod state;
pub mod view;
