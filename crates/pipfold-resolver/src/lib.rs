mod closure;
mod index;
mod lock;

pub use closure::{resolve_closure, ResolvedSet, Whitelist, PACKAGE_WHITELIST};
pub use index::InstalledPackageIndex;
pub use lock::{lock_directory, lock_project, LockPlan, LockReport};
