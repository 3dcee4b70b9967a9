//! # riverflow-types
//!
//! Plain data types shared by the riverflow engine and its collaborators:
//!
//! - **Viewport**: map extent plus pixel size, with map/screen projection
//! - **Month**: the 1-12 time-slice selector
//! - **Color**: RGBA stroke colors
//!
//! All types are serializable with Serde and built on top of the `geo` crate's
//! geometric primitives.
//!
//! ## Examples
//!
//! ```rust
//! use riverflow_types::month::Month;
//! use riverflow_types::viewport::Viewport;
//! use geo::Point;
//!
//! let viewport = Viewport::new(0.0, 0.0, 1000.0, 500.0, 200, 100);
//! let screen = viewport.to_screen(&Point::new(500.0, 250.0));
//! assert_eq!((screen.x(), screen.y()), (100.0, 50.0));
//!
//! let march = Month::new(3).unwrap();
//! assert_eq!(march.name(), "March");
//! ```

pub mod color;
pub mod month;
pub mod viewport;
