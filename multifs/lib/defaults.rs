//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The integer priority that registers a source ahead of every other source.
pub const FIRST_PRIORITY: i64 = 0;

/// The integer priority that registers a source behind every other source.
///
/// Any negative priority is treated the same way.
pub const LAST_PRIORITY: i64 = -1;
