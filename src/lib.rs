pub mod config;
pub mod gallery;
pub mod network;
pub mod ops;
pub mod testimonials;
