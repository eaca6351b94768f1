//! Patience-based early stopping on a held-out loss.

/// Tracks the best held-out loss and reports when `patience` rounds have
/// passed without improving on it.
#[derive(Debug, Clone)]
pub(crate) struct EarlyStopping {
    patience: usize,
    best_loss: Option<f64>,
    best_round: usize,
    rounds_seen: usize,
}

impl EarlyStopping {
    pub(crate) fn new(patience: usize) -> Self {
        Self {
            patience,
            best_loss: None,
            best_round: 0,
            rounds_seen: 0,
        }
    }

    /// Record the loss of the next round; `true` means stop now.
    pub(crate) fn should_stop(&mut self, loss: f64) -> bool {
        if self.best_loss.is_none_or(|best| loss < best) {
            self.best_loss = Some(loss);
            self.best_round = self.rounds_seen;
        }
        self.rounds_seen += 1;

        self.rounds_seen - self.best_round > self.patience
    }

    /// Zero-based round with the lowest loss so far.
    pub(crate) fn best_round(&self) -> usize {
        self.best_round
    }

    pub(crate) fn best_loss(&self) -> Option<f64> {
        self.best_loss
    }
}
