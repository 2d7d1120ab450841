mod caller;
mod catalog;
mod status;

pub use caller::{matches_prime_edit, EditCaller};
pub use catalog::{edit_names, CatalogEntry, ContigOffsets, EditCatalog, EditKind, PrimeEdit};
pub use status::{EditStatus, EditTally, Evidence};
