use std::time::Duration;

/// Fixed delay between consecutive provider calls. The first call is free.
pub struct Pacer {
    delay: Duration,
    started: bool,
}

impl Pacer {
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            started: false,
        }
    }

    pub async fn wait(&mut self) {
        if self.started && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.started = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_call_does_not_wait() {
        let delay = Duration::from_millis(50);
        let mut pacer = Pacer::new(delay);
        let start = std::time::Instant::now();
        pacer.wait().await;
        assert!(start.elapsed() < delay);
        pacer.wait().await;
        assert!(start.elapsed() >= delay);
    }
}
