//! Shared handles every view needs, and the background loads built on them.

use std::sync::Arc;

use mediactl_proto::cache::Cache;
use mediactl_proto::protocol::Library;
use mediactl_proto::search::{IndexEntry, SearchIndex};
use tracing::{info, warn};

use crate::client::ServerClient;
use crate::command::Command;
use crate::message::Message;

#[derive(Clone)]
pub struct AppContext {
    pub client: ServerClient,
    pub cache: Arc<Cache>,
    pub index: Arc<SearchIndex>,
}

impl AppContext {
    pub fn new(client: ServerClient, cache: Arc<Cache>, index: Arc<SearchIndex>) -> Self {
        Self {
            client,
            cache,
            index,
        }
    }

    /// Library list, from the cache unless `fresh`.
    pub fn load_libraries(&self, fresh: bool) -> Command {
        let client = self.client.clone();
        Command::attempt(async move {
            let libraries = client.libraries(fresh).await?;
            info!("Loader: {} libraries", libraries.len());
            Ok(Message::DataReloaded(libraries))
        })
    }

    /// Rebuild the search index for `libraries` and persist it.
    pub fn refresh_index(&self, libraries: Vec<Library>) -> Command {
        let client = self.client.clone();
        let index = self.index.clone();
        Command::attempt(async move {
            let keep: Vec<String> = libraries.iter().map(|l| l.key.clone()).collect();
            index.retain_sections(&keep);
            for library in &libraries {
                match client.section_all(&library.key).await {
                    Ok(items) => {
                        let entries = items
                            .iter()
                            .map(|item| IndexEntry::from_metadata(&library.key, item))
                            .collect();
                        index.replace_section(&library.key, &library.title, entries);
                    }
                    Err(e) => warn!("Loader: indexing {} failed: {:#}", library.title, e),
                }
            }
            let index_for_save = index.clone();
            tokio::task::spawn_blocking(move || index_for_save.save()).await??;
            info!("Loader: search index holds {} items", index.len());
            Ok(Message::IndexUpdated)
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// A context whose client points at a closed port.
    pub fn context() -> AppContext {
        let cache = Arc::new(Cache::new(std::env::temp_dir().join("mediactl-test-cache"), false));
        let client = ServerClient::new("http://127.0.0.1:9", "srv", "token", "token", cache.clone())
            .unwrap();
        let index = Arc::new(SearchIndex::new(
            std::env::temp_dir().join("mediactl-test-index.json"),
        ));
        AppContext::new(client, cache, index)
    }
}
