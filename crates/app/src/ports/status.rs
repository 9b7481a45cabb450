//! Status port — hands appliance status changes to downstream observers.

use std::future::Future;

use remopi_domain::error::RemoPiError;
use remopi_domain::status::ApplianceStatus;

/// Publishes appliance status snapshots to interested observers.
pub trait StatusPublisher: Send + Sync + 'static {
    /// Publish a status to all current observers.
    fn publish(
        &self,
        status: ApplianceStatus,
    ) -> impl Future<Output = Result<(), RemoPiError>> + Send;
}

impl<T: StatusPublisher> StatusPublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        status: ApplianceStatus,
    ) -> impl Future<Output = Result<(), RemoPiError>> + Send {
        (**self).publish(status)
    }
}
