use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// A request to reload from the server. Carries no payload; consumers decide
/// what to fetch.
#[derive(Debug)]
pub struct Refresh;

/// Single source of reload ticks for one view. Push notifications call
/// [`schedule_refresh`](Self::schedule_refresh) and are coalesced behind a
/// quiet window; [`start_polling`](Self::start_polling) adds a fixed-interval
/// safety net for missed pushes. Both feed the same receiver, so the consumer
/// sees one uniform stream of ticks.
pub struct RefreshScheduler {
    trigger: mpsc::UnboundedSender<()>,
    ticks: mpsc::UnboundedSender<Refresh>,
    tasks: Vec<JoinHandle<()>>,
}

impl RefreshScheduler {
    pub fn new(quiet_window: Duration) -> (Self, mpsc::UnboundedReceiver<Refresh>) {
        let (ticks, tick_rx) = mpsc::unbounded_channel();
        let (trigger, trigger_rx) = mpsc::unbounded_channel();

        let debounce = tokio::spawn(debounce_loop(quiet_window, trigger_rx, ticks.clone()));

        let scheduler = Self {
            trigger,
            ticks,
            tasks: vec![debounce],
        };

        (scheduler, tick_rx)
    }

    /// Requests a reload. Bursts collapse: a tick fires once the quiet window
    /// elapses with no further request, at most one tick per burst.
    pub fn schedule_refresh(&self) {
        let _ = self.trigger.send(());
    }

    /// Emits a silent tick every `interval`, independent of the debounced
    /// requests. The first tick fires one full interval after the call.
    pub fn start_polling(&mut self, interval: Duration) {
        let ticks = self.ticks.clone();

        self.tasks.push(tokio::spawn(async move {
            let mut timer = time::interval(interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            timer.tick().await; // the immediate first tick

            loop {
                timer.tick().await;
                if ticks.send(Refresh).is_err() {
                    break;
                }
            }
        }));
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Trailing-edge debounce: every request pushes the deadline out by the full
/// quiet window; the tick fires when the window finally elapses untouched.
async fn debounce_loop(
    quiet_window: Duration,
    mut trigger: mpsc::UnboundedReceiver<()>,
    ticks: mpsc::UnboundedSender<Refresh>,
) {
    let mut deadline: Option<Instant> = None;

    loop {
        match deadline {
            None => match trigger.recv().await {
                Some(()) => deadline = Some(Instant::now() + quiet_window),
                None => break,
            },
            Some(at) => tokio::select! {
                () = time::sleep_until(at) => {
                    deadline = None;
                    if ticks.send(Refresh).is_err() {
                        break;
                    }
                },
                request = trigger.recv() => match request {
                    Some(()) => deadline = Some(Instant::now() + quiet_window),
                    None => break,
                },
            },
        }
    }
}
