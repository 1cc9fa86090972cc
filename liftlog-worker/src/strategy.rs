//! Network-race helper shared by the network-first strategies.

use std::time::Duration;

use log::debug;
use tokio::time::timeout;

use crate::fetch::{FetchRequest, FetchResponse, Network};

/// Try the network within `limit`. A response — any status — wins the race;
/// an error or a timeout yields `None` and the caller falls back.
pub(crate) async fn race_network(
    network: &dyn Network,
    request: &FetchRequest,
    limit: Duration,
) -> Option<FetchResponse> {
    match timeout(limit, network.fetch(request)).await {
        Ok(Ok(response)) => Some(response),
        Ok(Err(e)) => {
            debug!("network fetch of {} failed: {e}", request.path);
            None
        }
        Err(_) => {
            debug!("network fetch of {} timed out after {limit:?}", request.path);
            None
        }
    }
}
