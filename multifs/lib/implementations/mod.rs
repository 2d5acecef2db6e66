mod embeddedfs;
mod memoryfs;
mod nativefs;
mod subfs;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use embeddedfs::*;
pub use memoryfs::*;
pub use nativefs::*;
pub use subfs::*;
