// #![warn(clippy::pedantic)]

// #![warn(clippy::nursery)]
// #![warn(clippy::cargo)]
#![warn(clippy::complexity)]
#![warn(clippy::correctness)]
#![warn(clippy::perf)]
#![warn(clippy::style)]
#![warn(clippy::suspicious)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]

// #![warn(clippy::unwrap_used)]
// #![warn(clippy::expect_used)]

pub mod chart;
pub mod common;
pub mod dataset;
pub mod formats;
