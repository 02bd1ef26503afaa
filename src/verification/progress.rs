//! Observer interface for run progress.

/// Receives advisory progress updates. Implementations must not assume any
/// particular call frequency.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, done: usize, total: usize, message: &str);
}

/// Discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _done: usize, _total: usize, _message: &str) {}
}

impl<F> ProgressObserver for F
where
    F: Fn(usize, usize, &str) + Send + Sync,
{
    fn on_progress(&self, done: usize, total: usize, message: &str) {
        self(done, total, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn closures_are_observers() {
        let seen = Mutex::new(Vec::new());
        let observer = |done: usize, total: usize, message: &str| {
            seen.lock().push((done, total, message.to_string()));
        };
        observer.on_progress(1, 4, "batch 1/4");
        assert_eq!(seen.lock().as_slice(), &[(1, 4, "batch 1/4".to_string())]);
    }
}
