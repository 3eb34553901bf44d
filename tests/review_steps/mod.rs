//! Step definitions shared by the review behaviour scenarios.

pub mod then;
