//! Non-zero exit codes for fatal configuration failures (spec §6).

/// Startup configuration is unusable (e.g. an empty `--name`, or TLS
/// material that can't be loaded when TLS was requested).
pub const CONFIG_ERROR: i32 = 78;
/// A peer reported our name as already taken on the mesh.
pub const NAME_COLLISION: i32 = 65;
