//! JSON view models returned by the public routes.

pub mod views;
