//! Entity to model mappers
//!
//! - `From<Model> for Entity` / `TryFrom`: convert database rows to domain objects
//! - `*Columns` structs: column-oriented arrays for `UNNEST` bulk inserts

mod member;
mod role;
mod settings;
mod task;

pub use member::{member_role_links, MemberColumns};
pub use role::RoleColumns;
pub use task::snowflakes_to_i64;
