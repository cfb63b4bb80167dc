/// Defaults applied to the sessions created by an engine.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Call the registered lifecycle hooks around record operations.
    pub enable_hook: bool,
    /// Keep the text of every executed statement.
    pub enable_history: bool,
}

impl SessionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hook(mut self, enable: bool) -> Self {
        self.enable_hook = enable;
        self
    }

    pub fn history(mut self, enable: bool) -> Self {
        self.enable_history = enable;
        self
    }
}
