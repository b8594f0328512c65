//! End-to-end library tests: real files on disk, recipes, and properties
//! that must hold for arbitrary input.

mod backup_writes;
mod delimited_list;
mod properties;
mod recipes;
