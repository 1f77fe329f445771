//! Test utilities for GeoSecure integration tests
//!
//! - SecurityFixture: a small catalog (topp and nurc workspaces) guarded by
//!   data rules given as property text
//! - users: authentications for the roles the rule sets refer to
//!
//! Every fixture owns its own catalog and rule store, so tests stay
//! independent.

pub mod security_fixture;
pub mod users;
