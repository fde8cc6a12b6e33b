pub mod battery;
pub mod controller;
pub mod curve;
pub mod drivetrain;
pub mod environment;
pub mod motor;
pub mod specs;
pub mod wire;

pub use battery::*;
pub use controller::*;
pub use drivetrain::*;
pub use environment::*;
pub use motor::*;
pub use specs::*;
pub use wire::*;
