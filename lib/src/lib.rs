#![doc = svgbobdoc::transform!(
//! Building blocks for generators that turn a code host's repository
//! listing into a static showcase site.
//!
//! # Overview
//!
//! Perch does not know about any particular code host or page design. It
//! provides the pieces such a generator is assembled from:
//!
//! ```svgbob
//!  +--------------+    +---------------+    +-----------------+
//!  |    format    |    |    markup     |    |     command     |
//!  | Json/Toml    |    | parse, build, |    | external tools  |
//!  | Grass (SCSS) |    | rewrite       |    | (stdout bytes)  |
//!  +------+-------+    +-------+-------+    +--------+--------+
//!         |                    |                     |
//!         |  CSS               | HTML/SVG            | PNG
//!         |                    v                     |
//!         |            +---------------+             |
//!         +----------->|     Site      |<------------+
//!                      | (boxcar, many |
//!  +--------------+    |   writers)    |
//!  |    fstree    |--->|               |
//!  | resources    |    +-------+-------+
//!  +--------------+            | write_to (rayon)
//!                              v
//!                      +---------------+
//!                      |  output dir   |
//!                      +---------------+
//! ```
//!
//!   * [`format`] reads and writes serialized data, and compiles
//!     stylesheets.
//!   * [`markup`] holds HTML and SVG as owned trees that can be parsed,
//!     rewritten and serialized.
//!   * [`command`] runs external programs such as vector graphics tools or
//!     version control.
//!   * [`fstree`] snapshots a directory of static files to copy.
//!   * [`site::Site`] collects output files from many threads, then writes
//!     them in parallel.
//!
//! Every fallible operation returns an [`error::Error`], a chain of
//! messages with context that renders as an indented tree.
)]

#[macro_use]
pub mod error;
pub mod util;
pub mod fstree;
pub mod url;
pub mod format;
pub mod markup;
pub mod site;
pub mod command;

pub use site::{Body, Resource, Site};

pub use rayon;
pub use tracing;
