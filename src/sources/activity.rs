//! Signature-count oracle backed by getSignaturesForAddress

use super::ActivityOracle;
use crate::analysis::types::AnalysisContext;
use crate::errors::AnalysisError;
use crate::rpc::types::MAX_SIGNATURES_PER_PAGE;
use crate::rpc::RpcClient;
use async_trait::async_trait;
use std::sync::Arc;

pub struct RpcActivityOracle {
    client: Arc<RpcClient>,
}

impl RpcActivityOracle {
    pub fn new(client: Arc<RpcClient>) -> Self {
        Self { client }
    }
}

/// Size of the next page, `None` once `limit` signatures were counted
pub fn next_page_limit(counted: usize, limit: usize) -> Option<usize> {
    if counted >= limit {
        None
    } else {
        Some((limit - counted).min(MAX_SIGNATURES_PER_PAGE))
    }
}

#[async_trait]
impl ActivityOracle for RpcActivityOracle {
    async fn get_signature_count(
        &self,
        address: &str,
        limit: usize,
        context: &AnalysisContext,
    ) -> Result<usize, AnalysisError> {
        let label = context.label();
        let mut counted = 0usize;
        let mut before: Option<String> = None;

        while let Some(page_limit) = next_page_limit(counted, limit) {
            let page = self
                .client
                .get_signatures_for_address(&label, address, page_limit, before.as_deref())
                .await?;

            counted += page.len();
            if page.len() < page_limit {
                break;
            }
            before = page.last().map(|s| s.signature.clone());
        }

        Ok(counted.min(limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_limits_for_excessive_check() {
        // 1001 cap → one full page, then a single extra signature
        assert_eq!(next_page_limit(0, 1001), Some(1000));
        assert_eq!(next_page_limit(1000, 1001), Some(1));
        assert_eq!(next_page_limit(1001, 1001), None);
    }

    #[test]
    fn test_page_limits_for_fresh_check() {
        assert_eq!(next_page_limit(0, 101), Some(101));
        assert_eq!(next_page_limit(101, 101), None);
        assert_eq!(next_page_limit(0, 0), None);
    }
}
