use std::{num::NonZeroUsize, sync::Arc};

use alloy::{
    network::{Ethereum, EthereumWallet},
    providers::{DynProvider, Provider, ProviderBuilder, WsConnect},
    rpc::client::RpcClient as AlloyRpcClient,
    transports::{
        BoxTransport, IntoBoxTransport,
        http::{Http, reqwest::Url},
        layers::FallbackLayer,
    },
};
use tower::ServiceBuilder;

use crate::BlockchainError;

pub(crate) type BlockchainProvider = Arc<DynProvider<Ethereum>>;

/// Connects a wallet-filling provider over every usable endpoint.
///
/// HTTP and WebSocket endpoints are combined behind a fallback transport that
/// queries one endpoint at a time. Returns the provider and the chain id the
/// endpoints report.
pub(crate) async fn initialize_provider_with_wallet(
    rpc_endpoints: &[String],
    wallet: EthereumWallet,
) -> Result<(BlockchainProvider, u64), BlockchainError> {
    let mut transports: Vec<BoxTransport> = Vec::new();
    let mut valid_endpoints = Vec::new();

    for endpoint in rpc_endpoints {
        if endpoint.starts_with("ws://") || endpoint.starts_with("wss://") {
            match AlloyRpcClient::connect_pubsub(WsConnect::new(endpoint)).await {
                Ok(client) => {
                    transports.push(client.transport().clone().into_box_transport());
                    valid_endpoints.push(endpoint.clone());
                    tracing::debug!("WebSocket RPC endpoint added: {}", endpoint);
                }
                Err(e) => {
                    tracing::warn!("Failed to connect to WebSocket RPC '{}': {}", endpoint, e);
                }
            }
        } else {
            match endpoint.parse::<Url>() {
                Ok(url) => {
                    transports.push(Http::new(url).into_box_transport());
                    valid_endpoints.push(endpoint.clone());
                    tracing::debug!("HTTP RPC endpoint added: {}", endpoint);
                }
                Err(e) => {
                    tracing::warn!("Invalid RPC URL '{}': {}", endpoint, e);
                }
            }
        }
    }

    if transports.is_empty() {
        return Err(BlockchainError::RpcConnectionFailed {
            attempts: rpc_endpoints.len(),
        });
    }

    let fallback_layer = FallbackLayer::default().with_active_transport_count(NonZeroUsize::MIN);
    let transport = ServiceBuilder::new()
        .layer(fallback_layer)
        .service(transports);
    let client = AlloyRpcClient::builder().transport(transport, false);
    let provider = ProviderBuilder::new().wallet(wallet).connect_client(client);

    match provider.get_chain_id().await {
        Ok(chain_id) => {
            tracing::info!(
                chain_id,
                "Blockchain provider initialized with {} RPC endpoints: {:?}",
                valid_endpoints.len(),
                valid_endpoints
            );
            Ok((Arc::new(provider.erased()), chain_id))
        }
        Err(e) => {
            tracing::error!("All RPC endpoints failed connectivity check: {}", e);
            Err(BlockchainError::RpcConnectionFailed {
                attempts: valid_endpoints.len(),
            })
        }
    }
}
