pub use db::*;
pub use leads::*;
pub use store::*;

mod db;
mod leads;
mod store;
