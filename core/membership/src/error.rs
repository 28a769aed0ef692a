#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Spec §4.4.1 step 3: a peer reported our name as already taken. This
    /// is fatal — the agent must be reconfigured with a different name.
    #[error("name collision reported by peer: this agent's name is already in use on the mesh")]
    NameCollision,
}
