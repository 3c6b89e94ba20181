pub mod check;
pub mod compile;
pub mod instance_model;
