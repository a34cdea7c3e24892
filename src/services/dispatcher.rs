use crate::errors::UpstreamError;
use crate::services::credential_pool::CredentialPool;
use crate::services::logger::Logger;
use crate::services::upstream::{UpstreamRequest, UpstreamTransport};
use serde_json::Value;
use std::sync::Arc;

/// Runs one upstream call, failing over to the next key on 429.
///
/// Each key is tried at most once per call, in round-robin order starting
/// from the pool's current index. The index moves only on a 429, and only to
/// the key about to be tried, so later calls start from the last key that was
/// not throttled.
#[derive(Clone)]
pub struct Dispatcher {
    logger: Logger,
    pool: Arc<CredentialPool>,
    transport: Arc<dyn UpstreamTransport>,
}

impl Dispatcher {
    pub fn new(
        logger: Logger,
        pool: Arc<CredentialPool>,
        transport: Arc<dyn UpstreamTransport>,
    ) -> Self {
        Self {
            logger: logger.child("dispatcher"),
            pool,
            transport,
        }
    }

    pub fn pool(&self) -> &Arc<CredentialPool> {
        &self.pool
    }

    pub async fn perform(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError> {
        let pool_size = self.pool.len();
        let start = self.pool.current_index();
        let mut last_error = None;

        for attempt in 0..pool_size {
            let key_index = (start + attempt) % pool_size;
            let credential = self.pool.get(key_index);

            match self.transport.send(credential, request).await {
                Ok(body) => return Ok(body),
                Err(err) if err.is_rate_limited() && attempt + 1 < pool_size => {
                    let next_index = (key_index + 1) % pool_size;
                    self.logger.warn(
                        &format!(
                            "Key {} rate-limited (429), trying key {}",
                            key_index + 1,
                            next_index + 1
                        ),
                        Some(&serde_json::json!({"path": request.path})),
                    );
                    self.pool.advance(next_index);
                    last_error = Some(err);
                }
                Err(err) => {
                    self.logger.debug(
                        "Upstream call failed",
                        Some(&serde_json::json!({
                            "path": request.path,
                            "key": key_index + 1,
                            "status": err.status(),
                        })),
                    );
                    return Err(err);
                }
            }
        }

        // Unreachable for a non-empty pool: the final attempt always returns.
        Err(last_error.unwrap_or_else(|| UpstreamError::Setup("No API keys available".to_string())))
    }
}
