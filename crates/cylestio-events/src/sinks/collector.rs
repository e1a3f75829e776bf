use std::time::Duration;

use cylestio_types::Event;

use crate::sink::{HttpMethod, Sink};
use crate::wire::WireEvent;
use crate::Result;

/// Default collector request timeout (§4.5, §6: "default timeout 5 s").
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP collector sink (§4.5). Failures are recorded at WARN and never
/// propagate: a collector outage must not interrupt the host application.
pub struct CollectorSink {
    endpoint: String,
    method: HttpMethod,
    client: reqwest::blocking::Client,
}

impl CollectorSink {
    pub fn new(endpoint: impl Into<String>, method: HttpMethod, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self { endpoint: endpoint.into(), method, client })
    }

    /// The resolved endpoint this sink posts to. Exposed so the socket
    /// interceptor (§4.7.4) can exclude it from interception and avoid a
    /// feedback loop (§4.5, §6 scenario 6).
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Sink for CollectorSink {
    fn send(&self, event: &Event) -> Result<()> {
        let wire = WireEvent::from(event);
        let request = match self.method {
            HttpMethod::Post => self.client.post(&self.endpoint),
            HttpMethod::Put => self.client.put(&self.endpoint),
        };

        match request.json(&wire).send() {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => {
                tracing::warn!(
                    endpoint = %self.endpoint,
                    status = %response.status(),
                    "collector sink received a non-2xx response"
                );
                Ok(())
            }
            Err(err) => {
                tracing::warn!(endpoint = %self.endpoint, error = %err, "collector sink request failed");
                Ok(())
            }
        }
    }
}
