//! Paired dental-arch STL viewer with tooth landmark markers.
//!
//! The landmark core turns an analysis payload into colored display
//! markers: [`notation`] maps positional tooth indices to FDI numbers,
//! [`color`] picks a color per tooth type, and [`markers`] filters and
//! merges both meshes. [`server`] and [`watcher`] host the browser viewer.

pub mod color;
pub mod error;
pub mod legend;
pub mod markers;
pub mod notation;
pub mod payload;
pub mod server;
pub mod viewer_html;
pub mod watcher;
