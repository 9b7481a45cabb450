//! Metrics port.

use remopi_domain::metrics::ApiCall;

/// Records measurements of outbound API calls.
pub trait MetricsRecorder: Send + Sync + 'static {
    fn record_api_call(&self, call: ApiCall);
}

impl<T: MetricsRecorder> MetricsRecorder for std::sync::Arc<T> {
    fn record_api_call(&self, call: ApiCall) {
        (**self).record_api_call(call);
    }
}
