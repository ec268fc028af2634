//! Loading gridded products from flat binary workspaces.
//!
//! A workspace is a directory of flat binary files named
//! `stem.type.cols.rows` (for example `ch13.real4.2500.1500`). A scene
//! document (JSON) describes grids and which stems make up each product.

pub mod error;
pub mod fbf;
pub mod scene;

pub use error::{Result, SceneError};
pub use fbf::{FbfName, FbfType, Workspace};
pub use scene::{ProductEntry, Scene, SceneDocument};
