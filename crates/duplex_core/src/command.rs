//! # Render Commands
//!
//! A command is one deferred, one-shot unit of work. The framework thread
//! builds it (capturing whatever it needs by move) and the renderer thread
//! executes it exactly once.
//!
//! Any `FnOnce() + Send + 'static` closure is a command. Wrap it in
//! [`NamedCommand`] to give it a name that shows up in fault logs.

/// One deferred unit of work.
///
/// `execute` consumes the command, so the type system guarantees it runs at
/// most once. The queue owns the command from enqueue until execution.
pub trait Command: Send + 'static {
    /// Runs the command on the consuming thread.
    fn execute(self: Box<Self>);

    /// Name used in diagnostics.
    fn name(&self) -> &'static str {
        "anonymous"
    }
}

impl<F> Command for F
where
    F: FnOnce() + Send + 'static,
{
    fn execute(self: Box<Self>) {
        (*self)();
    }
}

/// Closure command carrying a static name.
pub struct NamedCommand<F> {
    name: &'static str,
    action: F,
}

impl<F> NamedCommand<F>
where
    F: FnOnce() + Send + 'static,
{
    /// Wraps `action` under `name`.
    pub fn new(name: &'static str, action: F) -> Self {
        Self { name, action }
    }
}

impl<F> Command for NamedCommand<F>
where
    F: FnOnce() + Send + 'static,
{
    fn execute(self: Box<Self>) {
        (self.action)();
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

impl<F> std::fmt::Debug for NamedCommand<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedCommand").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_closure_command() {
        let hits = Arc::new(AtomicU32::new(0));
        let captured = Arc::clone(&hits);
        let cmd: Box<dyn Command> = Box::new(move || {
            captured.fetch_add(1, Ordering::Relaxed);
        });

        assert_eq!(cmd.name(), "anonymous");
        cmd.execute();
        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_named_command() {
        let hits = Arc::new(AtomicU32::new(0));
        let captured = Arc::clone(&hits);
        let cmd: Box<dyn Command> = Box::new(NamedCommand::new("AddPrimitive", move || {
            captured.fetch_add(5, Ordering::Relaxed);
        }));

        assert_eq!(cmd.name(), "AddPrimitive");
        cmd.execute();
        assert_eq!(hits.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn test_command_moves_owned_payload() {
        let payload = vec![1u32, 2, 3];
        let sum = Arc::new(AtomicU32::new(0));
        let out = Arc::clone(&sum);
        let cmd: Box<dyn Command> = Box::new(move || {
            out.store(payload.iter().sum(), Ordering::Relaxed);
        });

        cmd.execute();
        assert_eq!(sum.load(Ordering::Relaxed), 6);
    }
}
