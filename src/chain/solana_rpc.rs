use crate::chain::{ChainRpc, SignatureState};
use crate::constants::{SEND_MAX_RETRIES, TOKEN_2022_PROGRAM_ADDR, TOKEN_PROGRAM_ADDR};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    pubkey::Pubkey,
    signature::Signature,
    transaction::VersionedTransaction,
};
use solana_transaction_status::UiTransactionEncoding;
use spl_token::solana_program::program_pack::Pack;
use spl_token::state::Mint;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct SolanaRpc {
    pub name: String,
    pub client: Arc<RpcClient>,
}

impl SolanaRpc {
    pub fn new(url: String) -> Self {
        Self {
            name: "solana-rpc".to_string(),
            client: Arc::new(RpcClient::new_with_commitment(url, CommitmentConfig::confirmed())),
        }
    }
}

#[async_trait]
impl ChainRpc for SolanaRpc {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn send_transaction(&self, tx: &VersionedTransaction) -> Result<Signature> {
        let config = RpcSendTransactionConfig {
            skip_preflight: false,
            preflight_commitment: Some(CommitmentLevel::Confirmed),
            encoding: Some(UiTransactionEncoding::Base64),
            max_retries: Some(SEND_MAX_RETRIES),
            min_context_slot: None,
        };

        debug!("Sending transaction to {}", self.client.url());
        let signature = self.client.send_transaction_with_config(tx, config).await?;
        Ok(signature)
    }

    async fn signature_state(&self, signature: &Signature) -> Result<SignatureState> {
        let statuses = self.client.get_signature_statuses(&[*signature]).await?.value;

        let state = match statuses.into_iter().next().flatten() {
            None => SignatureState::Pending,
            Some(status) => match status.err {
                Some(err) => SignatureState::Failed(err.to_string()),
                None if status.satisfies_commitment(CommitmentConfig::confirmed()) => {
                    SignatureState::Confirmed
                }
                None => SignatureState::Pending,
            },
        };
        Ok(state)
    }

    async fn token_decimals(&self, mint: &Pubkey) -> Result<u8> {
        let account = self.client.get_account(mint).await?;

        let owner = account.owner.to_string();
        if owner != TOKEN_PROGRAM_ADDR && owner != TOKEN_2022_PROGRAM_ADDR {
            return Err(anyhow!("{} is not a token mint (owner {})", mint, owner));
        }

        // Token-2022 mints append extensions after the base layout.
        let base = account
            .data
            .get(..Mint::LEN)
            .ok_or_else(|| anyhow!("{} has {} bytes of data, too short for a mint", mint, account.data.len()))?;
        let state = Mint::unpack_from_slice(base)?;

        debug!("Mint {} has {} decimals", mint, state.decimals);
        Ok(state.decimals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use hyper::service::{make_service_fn, service_fn};
    use hyper::{Body, Request, Response, Server};
    use serde_json::{json, Value};
    use std::convert::Infallible;
    use std::net::SocketAddr;

    fn mint_data(decimals: u8, extra: usize) -> Vec<u8> {
        let mut data = vec![0u8; Mint::LEN];
        let mint = Mint {
            mint_authority: Default::default(),
            supply: 1_000_000,
            decimals,
            is_initialized: true,
            freeze_authority: Default::default(),
        };
        Mint::pack(mint, &mut data).unwrap();
        data.extend(std::iter::repeat(0u8).take(extra));
        data
    }

    fn reply(id: &Value, result: Value) -> Value {
        json!({ "jsonrpc": "2.0", "id": id, "result": result })
    }

    /// Minimal JSON-RPC node: one mint account and one signature status.
    async fn stub_node(account_owner: &'static str, account_data: Vec<u8>, status: Value) -> SocketAddr {
        let make_svc = make_service_fn(move |_conn| {
            let account_data = account_data.clone();
            let status = status.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                    let account_data = account_data.clone();
                    let status = status.clone();
                    async move {
                        let bytes = hyper::body::to_bytes(req.into_body()).await.unwrap_or_default();
                        let call: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
                        let id = call["id"].clone();
                        let ctx = json!({ "slot": 1 });

                        let body = match call["method"].as_str().unwrap_or_default() {
                            "getAccountInfo" => reply(
                                &id,
                                json!({
                                    "context": ctx,
                                    "value": {
                                        "data": [STANDARD.encode(&account_data), "base64"],
                                        "executable": false,
                                        "lamports": 1_461_600,
                                        "owner": account_owner,
                                        "rentEpoch": 0,
                                        "space": account_data.len(),
                                    }
                                }),
                            ),
                            "getSignatureStatuses" => reply(&id, json!({ "context": ctx, "value": [status] })),
                            other => json!({
                                "jsonrpc": "2.0",
                                "id": id,
                                "error": { "code": -32601, "message": format!("Method not found: {}", other) }
                            }),
                        };
                        Ok::<_, Infallible>(Response::new(Body::from(body.to_string())))
                    }
                }))
            }
        });

        let server = Server::bind(&([127, 0, 0, 1], 0).into()).serve(make_svc);
        let addr = server.local_addr();
        tokio::spawn(server);
        addr
    }

    fn status(confirmation: &str, err: Value) -> Value {
        json!({
            "slot": 5,
            "confirmations": null,
            "err": err,
            "status": { "Ok": null },
            "confirmationStatus": confirmation,
        })
    }

    #[tokio::test]
    async fn test_token_decimals() {
        let addr = stub_node(TOKEN_PROGRAM_ADDR, mint_data(6, 0), Value::Null).await;
        let rpc = SolanaRpc::new(format!("http://{}", addr));
        assert_eq!(rpc.token_decimals(&Pubkey::new_unique()).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_token_2022_decimals_with_extensions() {
        let addr = stub_node(TOKEN_2022_PROGRAM_ADDR, mint_data(9, 83), Value::Null).await;
        let rpc = SolanaRpc::new(format!("http://{}", addr));
        assert_eq!(rpc.token_decimals(&Pubkey::new_unique()).await.unwrap(), 9);
    }

    #[tokio::test]
    async fn test_non_mint_account_rejected() {
        let addr = stub_node("11111111111111111111111111111111", vec![], Value::Null).await;
        let rpc = SolanaRpc::new(format!("http://{}", addr));
        let err = rpc.token_decimals(&Pubkey::new_unique()).await.unwrap_err();
        assert!(err.to_string().contains("is not a token mint"));
    }

    #[tokio::test]
    async fn test_signature_states() {
        let sig = Signature::default();

        let addr = stub_node(TOKEN_PROGRAM_ADDR, vec![], Value::Null).await;
        let rpc = SolanaRpc::new(format!("http://{}", addr));
        assert_eq!(rpc.signature_state(&sig).await.unwrap(), SignatureState::Pending);

        let addr = stub_node(TOKEN_PROGRAM_ADDR, vec![], status("processed", Value::Null)).await;
        let rpc = SolanaRpc::new(format!("http://{}", addr));
        assert_eq!(rpc.signature_state(&sig).await.unwrap(), SignatureState::Pending);

        let addr = stub_node(TOKEN_PROGRAM_ADDR, vec![], status("confirmed", Value::Null)).await;
        let rpc = SolanaRpc::new(format!("http://{}", addr));
        assert_eq!(rpc.signature_state(&sig).await.unwrap(), SignatureState::Confirmed);

        let addr = stub_node(
            TOKEN_PROGRAM_ADDR,
            vec![],
            status("confirmed", json!({ "InstructionError": [2, { "Custom": 6001 }] })),
        )
        .await;
        let rpc = SolanaRpc::new(format!("http://{}", addr));
        assert!(matches!(
            rpc.signature_state(&sig).await.unwrap(),
            SignatureState::Failed(_)
        ));
    }
}
