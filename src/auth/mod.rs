/// Authorization layer
///
/// The permission gate (role x action -> allow/deny) and the caller identity
/// extracted from headers set by the upstream authentication service.

pub mod identity;
pub mod permissions;

pub use identity::Caller;
pub use permissions::{Action, PermissionTable, Role};
