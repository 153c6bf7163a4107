use crate::error::Provider;
use tokio::sync::mpsc::UnboundedSender;

/// Updates a running flow emits for whoever is watching.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    Status(String),
    Log(String),
    /// Completed share of the work, `0.0..=1.0`.
    Fraction(f64),
    /// Index of the key a pool is currently using.
    KeyIndex { provider: Provider, index: usize },
}

/// Optional progress channel. Sends never fail the flow.
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    tx: Option<UnboundedSender<Progress>>,
}

impl Reporter {
    pub fn new(tx: UnboundedSender<Progress>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn silent() -> Self {
        Self::default()
    }

    fn send(&self, update: Progress) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(update);
        }
    }

    pub fn status(&self, message: impl Into<String>) {
        self.send(Progress::Status(message.into()));
    }

    pub fn log(&self, message: impl Into<String>) {
        self.send(Progress::Log(message.into()));
    }

    pub fn fraction(&self, done: usize, total: usize) {
        let value = if total == 0 {
            1.0
        } else {
            (done as f64 / total as f64).clamp(0.0, 1.0)
        };
        self.send(Progress::Fraction(value));
    }

    pub fn key_index(&self, provider: Provider, index: usize) {
        self.send(Progress::KeyIndex { provider, index });
    }
}
