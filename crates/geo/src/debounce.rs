use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::chain::GeocoderChain;
use crate::types::Coordinates;

/// Cancel-on-rerun timer.
///
/// Scheduling a new job aborts the previous one if it is still waiting out
/// its delay. Once the delay has elapsed the job is detached and runs to
/// completion; only the timer is cancellable.
pub struct Debouncer {
    delay: Duration,
    timer: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, timer: None }
    }

    pub fn schedule<F>(&mut self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(job);
        }));
    }

    /// Abort a pending timer. Returns true if one was still waiting.
    pub fn cancel(&mut self) -> bool {
        match self.timer.take() {
            Some(timer) => {
                let pending = !timer.is_finished();
                timer.abort();
                pending
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Latest forward-geocoding answer for a location query
#[derive(Debug, Clone, PartialEq)]
pub struct AutofillUpdate {
    /// The query this answer belongs to; compare before applying
    pub query: String,
    pub coordinates: Option<Coordinates>,
}

/// Debounced forward geocoding of manually entered location fields.
///
/// Every change of the fields calls [`CoordinateAutofill::on_query_changed`];
/// only a query that stays unchanged for the whole delay is sent out.
pub struct CoordinateAutofill {
    chain: Arc<GeocoderChain>,
    debouncer: Debouncer,
    tx: watch::Sender<Option<AutofillUpdate>>,
}

impl CoordinateAutofill {
    pub fn new(chain: Arc<GeocoderChain>, delay: Duration) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            chain,
            debouncer: Debouncer::new(delay),
            tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<AutofillUpdate>> {
        self.tx.subscribe()
    }

    /// `None` (some field still empty) cancels any pending lookup.
    pub fn on_query_changed(&mut self, query: Option<String>) {
        let Some(query) = query else {
            self.debouncer.cancel();
            return;
        };

        let chain = Arc::clone(&self.chain);
        let tx = self.tx.clone();
        self.debouncer.schedule(async move {
            let coordinates = match chain.search(&query).await {
                Ok(found) => found,
                Err(err) => {
                    log::warn!("Forward geocoding failed for '{query}': {err}");
                    None
                }
            };
            log::debug!("Autofill '{query}' -> {coordinates:?}");
            tx.send_replace(Some(AutofillUpdate { query, coordinates }));
        });
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}
