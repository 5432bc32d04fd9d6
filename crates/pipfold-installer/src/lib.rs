mod freeze;
mod locate;
mod pip;
mod show;

pub use freeze::{list_installed, parse_freeze_output, FreezeEntry};
pub use locate::{locate_or_create_pip, PipLocator};
pub use pip::{PackageQuery, Pip};
pub use show::{parse_show_output, show_packages, verify_alignment, PackageMetadata};
