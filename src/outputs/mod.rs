//! Output files produced by the two subcommands.
//!
//! # Submodules
//!
//! - [`links_file`]: writes and reads the newline-delimited links file
//! - [`json`]: writes one JSON document per crawled article
//!
//! # Output Structure
//!
//! ```text
//! data/
//! ├── links/
//! │   └── links_bong_da.txt     # collect --output links_bong_da.txt
//! └── articles/
//!     └── bong_da/              # crawl --category bong_da
//!         ├── 0.json
//!         └── 1.json
//! ```

pub mod json;
pub mod links_file;
