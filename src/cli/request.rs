//! CLI handler for `tokenward request`.

use reqwest::Method;

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::http::RequestDescriptor;

use super::RequestArgs;

/// Turn CLI arguments into a [`RequestDescriptor`].
pub fn build_request(args: &RequestArgs) -> Result<RequestDescriptor, ClientError> {
    let method = Method::from_bytes(args.method.to_ascii_uppercase().as_bytes())
        .map_err(|_| ClientError::InvalidArgument(format!("Invalid method: {}", args.method)))?;

    let body = args
        .body
        .as_deref()
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()?;

    let query = args
        .query
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .ok_or_else(|| {
                    ClientError::InvalidArgument(format!("Query must be key=value, got {pair}"))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RequestDescriptor::builder()
        .method(method)
        .path(args.path.clone())
        .query(query)
        .maybe_body(body)
        .build())
}

/// Handle `tokenward request <METHOD> <PATH>`: print the status to stderr
/// and the (pretty-printed, when JSON) body to stdout.
pub async fn handle_request(
    config: ClientConfig,
    args: &RequestArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = build_request(args)?;
    let client = ApiClient::from_config(config)?;

    let response = match client.request(&request).await {
        Ok(response) => response,
        Err(err) if err.requires_login() => {
            return Err(format!("{err}; run `tokenward login <email>`").into());
        }
        Err(err) => return Err(err.into()),
    };

    eprintln!("HTTP {}", response.status);
    match serde_json::from_str::<serde_json::Value>(&response.body) {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(_) if response.is_empty() => {}
        Err(_) => println!("{}", response.body),
    }
    Ok(())
}
