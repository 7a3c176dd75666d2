/// One transfer progress tick: bytes moved so far and the expected total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub transferred: u64,
    pub total: Option<u64>,
}

impl Progress {
    pub fn new(transferred: u64, total: Option<u64>) -> Self {
        Self { transferred, total }
    }

    /// Fraction done in `[0, 1]`, or `None` when the total is unknown or zero.
    pub fn ratio(&self) -> Option<f64> {
        match self.total {
            Some(total) if total > 0 => {
                Some((self.transferred as f64 / total as f64).clamp(0.0, 1.0))
            }
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.total, Some(total) if self.transferred >= total)
    }
}
