//! ERC-20 token-metadata sources.
//!
//! [`RpcTokenMetadataSource`] performs the real read: one `eth_call` per
//! accessor against a JSON-RPC endpoint, with just enough ABI decoding for
//! the three return types. [`StaticTokenMetadataSource`] serves a preloaded
//! table, for tests and for offline replays of historical event logs.

use std::collections::HashMap;

use serde_json::Value;

use crate::domain::TokenAddress;
use crate::port::token::{Erc20Metadata, TokenMetadataError, TokenMetadataSource};

const SELECTOR_NAME: &str = "06fdde03";
const SELECTOR_SYMBOL: &str = "95d89b41";
const SELECTOR_DECIMALS: &str = "313ce567";

/// Reads ERC-20 metadata over JSON-RPC.
#[derive(Debug)]
pub struct RpcTokenMetadataSource {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl RpcTokenMetadataSource {
    /// Create a source talking to `endpoint`.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::blocking::Client::new(),
        }
    }

    fn eth_call(
        &self,
        address: &TokenAddress,
        selector: &str,
    ) -> Result<Vec<u8>, TokenMetadataError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [
                {"to": address.as_str(), "data": format!("0x{selector}")},
                "latest",
            ],
        });

        let transport = |reason: String| TokenMetadataError::Transport {
            address: address.clone(),
            reason,
        };

        let response: Value = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .map_err(|e| transport(e.to_string()))?
            .json()
            .map_err(|e| transport(e.to_string()))?;

        if let Some(error) = response.get("error") {
            return Err(TokenMetadataError::Rpc {
                address: address.clone(),
                code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            });
        }

        let result = response
            .get("result")
            .and_then(Value::as_str)
            .ok_or_else(|| TokenMetadataError::Decode {
                address: address.clone(),
                reason: "missing result field".into(),
            })?;
        hex::decode(result.trim_start_matches("0x")).map_err(|e| TokenMetadataError::Decode {
            address: address.clone(),
            reason: e.to_string(),
        })
    }
}

impl TokenMetadataSource for RpcTokenMetadataSource {
    fn read(&self, address: &TokenAddress) -> Result<Erc20Metadata, TokenMetadataError> {
        let decode = |reason: String| TokenMetadataError::Decode {
            address: address.clone(),
            reason,
        };

        let name = decode_abi_string(&self.eth_call(address, SELECTOR_NAME)?).map_err(decode)?;
        let symbol =
            decode_abi_string(&self.eth_call(address, SELECTOR_SYMBOL)?).map_err(decode)?;
        let decimals =
            decode_abi_u32(&self.eth_call(address, SELECTOR_DECIMALS)?).map_err(decode)?;

        Ok(Erc20Metadata {
            name,
            symbol,
            decimals,
        })
    }
}

/// A preloaded metadata table.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenMetadataSource {
    tokens: HashMap<TokenAddress, Erc20Metadata>,
}

impl StaticTokenMetadataSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration.
    #[must_use]
    pub fn with_token(mut self, address: TokenAddress, metadata: Erc20Metadata) -> Self {
        self.tokens.insert(address, metadata);
        self
    }

    /// Register a token.
    pub fn insert(&mut self, address: TokenAddress, metadata: Erc20Metadata) {
        self.tokens.insert(address, metadata);
    }

    /// Load a table from a JSON object of `address -> metadata`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let tokens: HashMap<TokenAddress, Erc20Metadata> = serde_json::from_str(json)?;
        Ok(Self { tokens })
    }
}

impl TokenMetadataSource for StaticTokenMetadataSource {
    fn read(&self, address: &TokenAddress) -> Result<Erc20Metadata, TokenMetadataError> {
        self.tokens
            .get(address)
            .cloned()
            .ok_or_else(|| TokenMetadataError::Unknown {
                address: address.clone(),
            })
    }
}

fn word(data: &[u8], index: usize) -> Result<&[u8], String> {
    data.get(index * 32..(index + 1) * 32)
        .ok_or_else(|| format!("return data shorter than word {index}"))
}

fn word_to_usize(word: &[u8]) -> Result<usize, String> {
    let (high, low) = word.split_at(24);
    if high.iter().any(|b| *b != 0) {
        return Err("uint word out of usize range".into());
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(low);
    usize::try_from(u64::from_be_bytes(buf)).map_err(|e| e.to_string())
}

/// Decode a single static uint return value that fits in a u32.
fn decode_abi_u32(data: &[u8]) -> Result<u32, String> {
    let value = word_to_usize(word(data, 0)?)?;
    u32::try_from(value).map_err(|_| "uint return value out of u32 range".into())
}

/// Decode a single dynamic string return value: offset word, length word,
/// then the UTF-8 bytes.
fn decode_abi_string(data: &[u8]) -> Result<String, String> {
    let offset = word_to_usize(word(data, 0)?)?;
    let length_word = data
        .get(offset..offset + 32)
        .ok_or("string offset beyond return data")?;
    let length = word_to_usize(length_word)?;
    let bytes = data
        .get(offset + 32..offset + 32 + length)
        .ok_or("string bytes beyond return data")?;
    String::from_utf8(bytes.to_vec()).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abi_string(s: &str) -> Vec<u8> {
        let mut data = vec![0u8; 64];
        data[31] = 0x20; // offset
        data[63] = s.len() as u8; // length
        data.extend_from_slice(s.as_bytes());
        data.resize(64 + s.len().div_ceil(32) * 32, 0); // pad to a word
        data
    }

    #[test]
    fn decodes_abi_string_return() {
        assert_eq!(decode_abi_string(&abi_string("USD Coin")).unwrap(), "USD Coin");
        assert_eq!(decode_abi_string(&abi_string("")).unwrap(), "");
    }

    #[test]
    fn decodes_abi_uint_return() {
        let mut data = vec![0u8; 32];
        data[31] = 6;
        assert_eq!(decode_abi_u32(&data).unwrap(), 6);
    }

    #[test]
    fn rejects_truncated_return_data() {
        assert!(decode_abi_u32(&[0u8; 16]).is_err());
        assert!(decode_abi_string(&[0u8; 32]).is_err());
    }

    #[test]
    fn static_source_serves_registered_tokens() {
        let address = TokenAddress::from("0xusdc");
        let source = StaticTokenMetadataSource::new().with_token(
            address.clone(),
            Erc20Metadata {
                name: "USD Coin".into(),
                symbol: "USDC".into(),
                decimals: 6,
            },
        );
        assert_eq!(source.read(&address).unwrap().decimals, 6);
        assert!(matches!(
            source.read(&TokenAddress::from("0xother")),
            Err(TokenMetadataError::Unknown { .. })
        ));
    }

    #[test]
    fn static_source_loads_from_json() {
        let source = StaticTokenMetadataSource::from_json(
            r#"{"0xusdc": {"name": "USD Coin", "symbol": "USDC", "decimals": 6}}"#,
        )
        .unwrap();
        let metadata = source.read(&TokenAddress::from("0xusdc")).unwrap();
        assert_eq!(metadata.symbol, "USDC");
    }
}
