//! Terminal styling helpers for the execbox binaries.

use std::sync::LazyLock;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// A green checkmark used to report success on the terminal
pub static CHECKMARK: LazyLock<String> =
    LazyLock::new(|| format!("{}", console::style("✓").green()));

/// A red cross used to report failure on the terminal
pub static CROSS: LazyLock<String> = LazyLock::new(|| format!("{}", console::style("✗").red()));
