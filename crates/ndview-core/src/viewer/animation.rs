use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::Result;

/// Next position when stepping an axis spanning `min..=max`, wrapping to
/// `min` after `max`.
pub fn next_position(position: i64, min: i64, max: i64) -> i64 {
    if max <= min {
        return min;
    }
    let span = max - min + 1;
    min + (position - min + 1).rem_euclid(span)
}

/// Ticker thread that calls `tick` at a fixed rate until stopped or until
/// `tick` returns `false`.
pub(crate) struct Animator {
    stop: mpsc::Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Animator {
    pub fn start<F>(axis: &str, fps: f64, mut tick: F) -> Result<Self>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let period = Duration::from_secs_f64(1.0 / fps.max(0.001));
        let (stop, stop_rx) = mpsc::channel::<()>();
        let name = format!("ndview-animate-{axis}");
        let handle = thread::Builder::new().name(name).spawn(move || loop {
            match stop_rx.recv_timeout(period) {
                Err(RecvTimeoutError::Timeout) => {
                    if !tick() {
                        debug!("Animation tick rejected; stopping");
                        break;
                    }
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        })?;
        info!(axis, fps, "Animation started");
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    pub fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        let _ = self.stop.send(());
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for Animator {
    fn drop(&mut self) {
        self.halt();
    }
}
