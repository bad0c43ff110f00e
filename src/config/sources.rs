//! Configuration sources, lowest precedence first: global file, workspace files, environment.

pub(super) mod env;
pub(super) mod global_file;
pub(super) mod workspace_file;
