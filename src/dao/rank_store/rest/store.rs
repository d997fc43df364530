use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};

use crate::dao::{
    models::{
        NewScoreEntry, ProfileUpdateEntity, ScoreEntryEntity, SnapshotNodeEntity,
        UserProfileEntity,
    },
    rank_store::{RankStore, entry_from_child},
    storage::StorageResult,
};

use super::{
    config::RestConfig,
    error::{RestDaoError, RestResult},
    models::{
        PushResponse, RANKINGS_NS, SNAPSHOT_NS, entry_path, game_path, profile_path, snapshot_path,
    },
};

/// [`RankStore`] backend speaking the hosted realtime database's REST
/// dialect: every node is addressed as `<path>.json`, a POST appends a child
/// under a push key, and a PATCH is an atomic multi-field update.
#[derive(Clone)]
pub struct RestRankStore {
    client: Client,
    base_url: Arc<str>,
    auth_token: Option<Arc<str>>,
}

impl RestRankStore {
    /// Build a client and probe the database once.
    pub async fn connect(config: RestConfig) -> RestResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| RestDaoError::ClientBuilder { source })?;

        let store = Self {
            client,
            base_url: Arc::<str>::from(config.base_url.trim_end_matches('/')),
            auth_token: config.auth_token.map(Arc::<str>::from),
        };

        store.probe().await?;
        Ok(store)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}.json", self.base_url, path);
        let builder = self.client.request(method, url);
        if let Some(ref token) = self.auth_token {
            builder.query(&[("auth", token.as_ref())])
        } else {
            builder
        }
    }

    /// Shallow read of the snapshot namespace; cheap regardless of data size.
    async fn probe(&self) -> RestResult<()> {
        let response = self
            .request(Method::GET, SNAPSHOT_NS)
            .query(&[("shallow", "true")])
            .send()
            .await
            .map_err(|source| RestDaoError::RequestSend {
                path: SNAPSHOT_NS.to_string(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(RestDaoError::RequestStatus {
                path: SNAPSHOT_NS.to_string(),
                status: response.status(),
            })
        }
    }

    /// GET a node; the database answers `200 null` for an absent path.
    async fn get_node<T>(&self, path: &str, query: &[(&str, String)]) -> RestResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, path)
            .query(query)
            .send()
            .await
            .map_err(|source| RestDaoError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<Option<T>>()
                .await
                .map_err(|source| RestDaoError::DecodeResponse {
                    path: path.to_string(),
                    source,
                }),
            other => Err(RestDaoError::RequestStatus {
                path: path.to_string(),
                status: other,
            }),
        }
    }

    async fn send_body<T>(&self, method: Method, path: &str, body: &T) -> RestResult<reqwest::Response>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(method, path)
            .json(body)
            .send()
            .await
            .map_err(|source| RestDaoError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(RestDaoError::RequestStatus {
                path: path.to_string(),
                status: response.status(),
            })
        }
    }

    async fn delete_node(&self, path: &str) -> RestResult<()> {
        let response = self
            .request(Method::DELETE, path)
            .send()
            .await
            .map_err(|source| RestDaoError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        // Deleting an absent node is a success on the wire too.
        if response.status().is_success() || response.status() == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(RestDaoError::RequestStatus {
                path: path.to_string(),
                status: response.status(),
            })
        }
    }

    async fn collect_entries(
        &self,
        game_id: &str,
        query: &[(&str, String)],
    ) -> RestResult<Vec<ScoreEntryEntity>> {
        let path = game_path(game_id);
        let children = self
            .get_node::<BTreeMap<String, Value>>(&path, query)
            .await?
            .unwrap_or_default();

        Ok(children
            .iter()
            .filter_map(|(key, child)| entry_from_child(game_id, key, child))
            .collect())
    }
}

impl RankStore for RestRankStore {
    fn append_entry(&self, entry: NewScoreEntry) -> BoxFuture<'static, StorageResult<String>> {
        let store = self.clone();
        Box::pin(async move {
            let path = game_path(&entry.game_id);
            let response = store.send_body(Method::POST, &path, &entry).await?;
            let push = response
                .json::<PushResponse>()
                .await
                .map_err(|source| RestDaoError::DecodeResponse { path, source })?;
            Ok(push.name)
        })
    }

    fn query_top_by_score(
        &self,
        game_id: &str,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntryEntity>>> {
        let store = self.clone();
        let game_id = game_id.to_owned();
        Box::pin(async move {
            let query = [
                ("orderBy", "\"score\"".to_string()),
                ("limitToLast", limit.to_string()),
            ];
            Ok(store.collect_entries(&game_id, &query).await?)
        })
    }

    fn fetch_game_entries(
        &self,
        game_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntryEntity>>> {
        let store = self.clone();
        let game_id = game_id.to_owned();
        Box::pin(async move { Ok(store.collect_entries(&game_id, &[]).await?) })
    }

    fn entries_by_identity(
        &self,
        game_id: &str,
        uid: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntryEntity>>> {
        let store = self.clone();
        let game_id = game_id.to_owned();
        let uid = uid.to_owned();
        Box::pin(async move {
            let query = [
                ("orderBy", "\"uid\"".to_string()),
                ("equalTo", format!("\"{uid}\"")),
            ];
            Ok(store.collect_entries(&game_id, &query).await?)
        })
    }

    fn delete_entry(&self, game_id: &str, key: &str) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let path = entry_path(game_id, key);
        Box::pin(async move { Ok(store.delete_node(&path).await?) })
    }

    fn rename_entries(
        &self,
        game_id: &str,
        renames: Vec<(String, String)>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let path = game_path(game_id);
        Box::pin(async move {
            if renames.is_empty() {
                return Ok(());
            }
            // Multi-location patch: `<key>/name` fields applied atomically.
            let patch: serde_json::Map<String, Value> = renames
                .into_iter()
                .map(|(key, name)| (format!("{key}/name"), json!(name)))
                .collect();
            store.send_body(Method::PATCH, &path, &patch).await?;
            Ok(())
        })
    }

    fn write_snapshot(
        &self,
        game_id: &str,
        node: SnapshotNodeEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let path = snapshot_path(game_id);
        Box::pin(async move {
            store.send_body(Method::PUT, &path, &node).await?;
            Ok(())
        })
    }

    fn read_snapshot_bundle(&self) -> BoxFuture<'static, StorageResult<HashMap<String, Value>>> {
        let store = self.clone();
        Box::pin(async move {
            let bundle = store
                .get_node::<HashMap<String, Value>>(SNAPSHOT_NS, &[])
                .await?
                .unwrap_or_default();
            Ok(bundle)
        })
    }

    fn read_profile(&self, uid: &str) -> BoxFuture<'static, StorageResult<UserProfileEntity>> {
        let store = self.clone();
        let path = profile_path(uid);
        Box::pin(async move {
            let profile = store
                .get_node::<UserProfileEntity>(&path, &[])
                .await?
                .unwrap_or_default();
            Ok(profile)
        })
    }

    fn update_profile(
        &self,
        uid: &str,
        update: ProfileUpdateEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let path = profile_path(uid);
        Box::pin(async move {
            store.send_body(Method::PATCH, &path, &update).await?;
            Ok(())
        })
    }

    fn clear_rankings(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.delete_node(RANKINGS_NS).await?;
            store.delete_node(SNAPSHOT_NS).await?;
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.probe().await?) })
    }
}
