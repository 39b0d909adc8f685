//! Core logic for the PyInstaller front-end.
//!
//! Everything here is UI-free: the GUI and headless CLI in `pyfreeze-gui`
//! are thin adapters over these modules.
//!
//! - [`imports`] - static scan of a script's `import` statements
//! - [`icon`] - raster image to ICO normalization
//! - [`command`] - selection model and argv assembly
//! - [`runner`] - single-flight subprocess execution with streamed output

pub mod command;
pub mod icon;
pub mod imports;
pub mod runner;
