//! Test report helpers: coverage emission and mock lists

pub mod coverage;
pub mod mock_list;

pub use coverage::{coverage_lines, emit_coverage};
pub use mock_list::{load_mock_list, parse_mock_list};
