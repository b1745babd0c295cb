//! Session token keeper
//!
//! Keeps the sudo grant warm while the pipeline runs so user-scoped steps
//! (`sudo -u $SUDO_USER ...`) never stop on a password prompt. The task is
//! owned by `main`: stopped and joined when the pipeline finishes, aborted if
//! the handle is dropped.

use std::future::Future;
use std::process::Stdio;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

pub struct TokenKeeper {
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TokenKeeper {
    /// Refresh the sudo timestamp every `interval`
    pub fn spawn(interval: Duration) -> Self {
        Self::spawn_with(interval, refresh_sudo_grant)
    }

    /// Run `refresh` immediately and then every `interval` until stopped
    pub fn spawn_with<F, Fut>(interval: Duration, mut refresh: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (shutdown, mut stopped) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = &mut stopped => break,
                    _ = ticker.tick() => refresh().await,
                }
            }
        });

        Self {
            shutdown: Some(shutdown),
            handle: Some(handle),
        }
    }

    /// Signal the task and wait for it to finish
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TokenKeeper {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// `sudo -n -v`, fully silenced
async fn refresh_sudo_grant() {
    let status = tokio::process::Command::new("sudo")
        .args(["-n", "-v"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match status {
        Ok(status) if status.success() => {}
        Ok(status) => debug!("sudo grant refresh exited with {}", status),
        Err(e) => debug!("sudo grant refresh failed to start: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_keeper(interval: Duration) -> (TokenKeeper, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let keeper = TokenKeeper::spawn_with(interval, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        (keeper, count)
    }

    #[tokio::test(start_paused = true)]
    async fn test_refreshes_every_interval() {
        let (keeper, count) = counting_keeper(Duration::from_secs(60));

        // ticks at 0s, 60s and 120s
        tokio::time::sleep(Duration::from_secs(150)).await;
        keeper.stop().await;

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_refresh_after_stop() {
        let (keeper, count) = counting_keeper(Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(30)).await;
        keeper.stop().await;
        let after_stop = count.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(count.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_task() {
        let (keeper, count) = counting_keeper(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(keeper);

        let before = count.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(count.load(Ordering::SeqCst), before);
    }
}
