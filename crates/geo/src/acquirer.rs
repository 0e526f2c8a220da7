use std::time::Duration;

use async_trait::async_trait;

use crate::error::GeolocationError;
use crate::types::{Accuracy, Coordinates, PositionOptions};

/// A device or platform that can report the current position
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(
        &self,
        options: PositionOptions,
    ) -> std::result::Result<Coordinates, GeolocationError>;
}

#[async_trait]
impl<S: PositionSource + ?Sized> PositionSource for Box<S> {
    async fn current_position(
        &self,
        options: PositionOptions,
    ) -> std::result::Result<Coordinates, GeolocationError> {
        (**self).current_position(options).await
    }
}

/// Obtains a position: one high-accuracy attempt, then exactly one
/// low-accuracy attempt if the first fails for any reason.
///
/// The timeout is enforced here as well, so a source that ignores
/// [`PositionOptions::timeout`] still cannot stall the form.
pub struct GeolocationAcquirer<S> {
    source: S,
    timeout: Duration,
}

impl<S: PositionSource> GeolocationAcquirer<S> {
    pub fn new(source: S, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    pub async fn acquire(&self) -> std::result::Result<Coordinates, GeolocationError> {
        match self.attempt(Accuracy::High).await {
            Ok(position) => Ok(position),
            Err(err) => {
                log::info!("High-accuracy position failed ({err}); retrying with low accuracy");
                self.attempt(Accuracy::Low).await.inspect_err(|err| {
                    log::warn!("Low-accuracy position failed (code {}): {err}", err.code());
                })
            }
        }
    }

    async fn attempt(
        &self,
        accuracy: Accuracy,
    ) -> std::result::Result<Coordinates, GeolocationError> {
        let options = PositionOptions {
            accuracy,
            timeout: self.timeout,
        };
        match tokio::time::timeout(self.timeout, self.source.current_position(options)).await {
            Ok(result) => result,
            Err(_) => Err(GeolocationError::Timeout),
        }
    }
}
