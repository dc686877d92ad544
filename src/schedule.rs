//! Control flow of the training loop, kept free of tensors.

/// When a checkpoint is written, given a period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cadence {
    /// Epoch 1 and every multiple of the period.
    EveryN(i64),
    /// Every non-multiple of the period, plus epoch 1: the truthy
    /// `epoch % period || epoch == 1` check of the legacy trainer.
    NonMultiples(i64),
}

impl Cadence {
    pub fn fires(&self, epoch: i64) -> bool {
        match *self {
            Cadence::EveryN(period) => epoch == 1 || epoch % period == 0,
            Cadence::NonMultiples(period) => epoch == 1 || epoch % period != 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    EpochRunning(i64),
    Checkpointing(i64),
    Converged(i64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schedule {
    /// Last epoch that does not stop the loop.
    pub threshold: i64,
    pub cadence: Cadence,
}

impl Schedule {
    pub fn is_done(&self, epoch: i64) -> bool {
        epoch > self.threshold
    }

    pub fn next(&self, phase: Phase) -> Phase {
        match phase {
            Phase::Initializing => Phase::EpochRunning(1),
            Phase::EpochRunning(epoch) if self.cadence.fires(epoch) => Phase::Checkpointing(epoch),
            Phase::EpochRunning(epoch) | Phase::Checkpointing(epoch) => {
                if self.is_done(epoch) {
                    Phase::Converged(epoch)
                } else {
                    Phase::EpochRunning(epoch + 1)
                }
            }
            Phase::Converged(epoch) => Phase::Converged(epoch),
        }
    }
}
