//! Discord interaction handlers
//!
//! This module provides the pieces shared by all commands: autocomplete for
//! entity names, and the permission guard and reply helpers every handler uses.

/// Autocomplete handlers for entity names
pub mod autocomplete;
/// Permission guard, error replies and activity logging
pub mod guard;
