//! Waiting for a freshly deployed endpoint.

use nimbus_sdk_core::{classify_response, ProbeAction, ReadinessProbe};
use nimbus_sdk_types::Method;
use tracing::warn;

use crate::client::Client;
use crate::error::{classify_transport, ClientError};
use crate::transport::Transport;

/// Poll `url` until it answers 2xx, retrying 503 with the default bounds.
pub async fn wait_until_ready<T: Transport>(
    client: &Client<T>,
    url: &str,
) -> Result<(), ClientError> {
    wait_until_ready_with(client, url, ReadinessProbe::new()).await
}

/// Poll `url` with a caller-supplied probe.
///
/// A transport failure or any status other than 503 ends the wait at once.
pub async fn wait_until_ready_with<T: Transport>(
    client: &Client<T>,
    url: &str,
    mut probe: ReadinessProbe,
) -> Result<(), ClientError> {
    loop {
        let response = client
            .request(Method::Get, url)
            .send(None)
            .await
            .map_err(|e| ClientError::remote(classify_transport(&e), None))?;
        match probe.on_status(response.status) {
            ProbeAction::Ready => return Ok(()),
            ProbeAction::RetryAfter(delay) => {
                warn!(url, attempt = probe.attempts(), "endpoint not ready, retrying");
                tokio::time::sleep(delay).await;
            }
            ProbeAction::GiveUp | ProbeAction::Fail => {
                let error = classify_response(response.status, &response.body);
                return Err(ClientError::remote(error, None));
            }
        }
    }
}
