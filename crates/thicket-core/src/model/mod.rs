pub mod id_set;
pub mod input;
pub mod record;

pub use id_set::IdSet;
pub use input::{AddInput, Resolved, Target};
pub use record::{Draft, RESERVED_FIELDS, Record};
