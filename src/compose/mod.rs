//! Canvas compositor: canvas-size inference, centered drawing, and frame ordering.

pub mod batch;
pub mod canvas;
pub mod composite;
