//! Types shared between the window manager core and its display backends.

pub mod geometry;

pub use geometry::Geometry;
