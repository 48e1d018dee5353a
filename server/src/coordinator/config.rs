/// Configuration for the [`Engine`](super::Engine).
pub struct Config<S, H> {
    /// Configuration of the controller the engine owns.
    pub controller: crate::Config<S, H>,

    /// The maximum size of the mailbox backlog.
    pub mailbox_size: usize,
}
