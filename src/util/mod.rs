//! Text helpers shared by the filter layer and the CLI output.
//!
//! ```
//! use magipaper::util::{display_width, truncate_to_width};
//!
//! let width = display_width("Hello 世界"); // 5 + 1 + 2*2
//! assert_eq!(width, 10);
//! let cut = truncate_to_width("Long article title", 15);
//! assert_eq!(cut, "Long article...");
//! ```

mod text;

pub use text::{contains_ignore_case, display_width, truncate_to_width};
