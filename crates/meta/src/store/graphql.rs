//! Metadata stored on the reader server, over its GraphQL API.

use crate::bag::MetaBag;
use crate::error::{ErrorKind, Result};
use crate::holder::{Holder, HolderKind};
use crate::store::MetaStore;
use async_trait::async_trait;
use exn::{OptionExt, ResultExt};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::instrument;

const ENDPOINT: &str = "/api/graphql";
const TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct Response<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<ResponseError>,
}

#[derive(Deserialize)]
struct ResponseError {
    message: String,
}

#[derive(Deserialize)]
struct MetaNode {
    key: String,
    value: String,
}

/// Talks to the server's GraphQL endpoint. Every mutation is followed by a
/// re-read so callers always get the server's view of the holder.
#[derive(Debug, Clone)]
pub struct GraphqlStore {
    client: reqwest::Client,
    endpoint: String,
}

impl GraphqlStore {
    /// `server` is the base URL, e.g. `http://127.0.0.1:4567`.
    pub fn new(server: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .build()
            .or_raise(|| ErrorKind::Network)?;
        Ok(Self {
            client,
            endpoint: format!("{}{ENDPOINT}", server.trim_end_matches('/')),
        })
    }

    async fn execute<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let response: Response<T> = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .or_raise(|| ErrorKind::Network)?
            .json()
            .await
            .or_raise(|| ErrorKind::InvalidData("graphql response"))?;
        if !response.errors.is_empty() {
            let messages: Vec<_> = response.errors.into_iter().map(|e| e.message).collect();
            exn::bail!(ErrorKind::Rejected(messages.join("; ")));
        }
        response.data.ok_or_raise(|| ErrorKind::InvalidData("graphql response without data"))
    }
}

/// GraphQL entity name and ID argument of a holder. `None` for the global scope.
fn entity(holder: &Holder) -> Option<(&'static str, &'static str, Value)> {
    match holder {
        Holder::Global => None,
        Holder::Manga(id) => Some(("manga", "mangaId", json!(id))),
        Holder::Chapter(id) => Some(("chapter", "chapterId", json!(id))),
        Holder::Category(id) => Some(("category", "categoryId", json!(id))),
        Holder::Source(id) => Some(("source", "sourceId", json!(id))),
    }
}

fn id_type(kind: HolderKind) -> &'static str {
    match kind {
        HolderKind::Source => "LongString!",
        _ => "Int!",
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    chars.next().map(|c| c.to_ascii_uppercase().to_string() + chars.as_str()).unwrap_or_default()
}

fn metas_query(holder: &Holder) -> String {
    match entity(holder) {
        None => "query { metas { nodes { key value } } }".to_string(),
        Some((name, _, _)) => format!(
            "query ($id: {}) {{ {name}(id: $id) {{ meta {{ key value }} }} }}",
            id_type(holder.kind())
        ),
    }
}

fn mutation(operation: &str, holder: &Holder) -> String {
    let name = entity(holder).map_or("global", |(name, _, _)| name);
    let field = format!("{operation}{}Meta", capitalize(name));
    format!(
        "mutation ($input: {}Input!) {{ {field}(input: $input) {{ clientMutationId }} }}",
        capitalize(&field)
    )
}

fn collect(nodes: Value) -> Result<MetaBag> {
    let nodes: Vec<MetaNode> = serde_json::from_value(nodes).or_raise(|| ErrorKind::InvalidData("meta nodes"))?;
    Ok(nodes.into_iter().map(|node| (node.key, node.value)).collect())
}

#[async_trait]
impl MetaStore for GraphqlStore {
    fn name(&self) -> &str {
        "graphql"
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn metas(&self, holder: &Holder) -> Result<MetaBag> {
        let (variables, path) = match entity(holder) {
            None => (json!({}), ["metas", "nodes"]),
            Some((name, _, id)) => (json!({ "id": id }), [name, "meta"]),
        };
        let mut data: Value = self.execute(&metas_query(holder), variables).await?;
        let nodes = path
            .iter()
            .try_fold(&mut data, |value, key| value.get_mut(*key))
            .map(Value::take)
            .ok_or_raise(|| ErrorKind::Rejected(format!("{holder} not found")))?;
        collect(nodes)
    }

    #[instrument(skip(self, value), fields(endpoint = %self.endpoint))]
    async fn set(&self, holder: &Holder, key: &str, value: &str) -> Result<MetaBag> {
        let mut meta = json!({ "key": key, "value": value });
        if let Some((_, field, id)) = entity(holder) {
            meta[field] = id;
        }
        let _: Value = self.execute(&mutation("set", holder), json!({ "input": { "meta": meta } })).await?;
        self.metas(holder).await
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn delete(&self, holder: &Holder, key: &str) -> Result<MetaBag> {
        let mut input = json!({ "key": key });
        if let Some((_, field, id)) = entity(holder) {
            input[field] = id;
        }
        let _: Value = self.execute(&mutation("delete", holder), json!({ "input": input })).await?;
        self.metas(holder).await
    }
}
