pub(crate) mod prune;
pub mod util;
