//! Remote document tree index
//!
//! Best-effort, per-host cache of remote paths that have been observed
//! through directory listings or suggestion lookups. One task owns the
//! in-memory tree and serves every request in arrival order, so callers
//! never lock anything and a caller always reads its own writes.
//!
//! Nodes are mirrored into a [`PathStore`] by a second task that drains a
//! queue sequentially. The durable copy may lag behind the cache.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::path::{ancestors, normalize_path};
use super::PathStore;
use crate::{Error, HostKey, RemotePathNode, Result};

/// Upper bound on nodes loaded per host at bootstrap
pub const DEFAULT_MAX_LOADED_PATHS: usize = 5000;

const COMMAND_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy)]
struct NodeEntry {
    is_directory: bool,
    last_seen: DateTime<Utc>,
}

enum IndexCommand {
    Load {
        host: HostKey,
        reply: oneshot::Sender<()>,
    },
    Bootstrap {
        host: HostKey,
        current_directory: String,
        reply: oneshot::Sender<()>,
    },
    Upsert {
        host: HostKey,
        path: String,
        is_directory: bool,
        reply: oneshot::Sender<()>,
    },
    SuggestChildren {
        host: HostKey,
        directory: String,
        prefix: String,
        limit: usize,
        reply: oneshot::Sender<Vec<String>>,
    },
    Flush {
        reply: oneshot::Sender<()>,
    },
}

enum PersistOp {
    Save(RemotePathNode),
    Flush(oneshot::Sender<()>),
}

/// Handle to the index task
///
/// Cheap to clone. The task stops once every handle is dropped.
#[derive(Clone)]
pub struct DocumentTreeIndex {
    tx: mpsc::Sender<IndexCommand>,
}

impl DocumentTreeIndex {
    /// Spawn the index backed by `store`
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(store: Arc<dyn PathStore>) -> Self {
        Self::with_load_limit(store, DEFAULT_MAX_LOADED_PATHS)
    }

    /// Spawn the index, loading at most `max_loaded_paths` nodes per host
    pub fn with_load_limit(store: Arc<dyn PathStore>, max_loaded_paths: usize) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (persist_tx, persist_rx) = mpsc::unbounded_channel();

        tokio::spawn(run_persister(store.clone(), persist_rx));

        let actor = IndexActor {
            store,
            max_loaded_paths,
            trees: HashMap::new(),
            loaded: HashSet::new(),
            persist_tx,
        };
        tokio::spawn(actor.run(rx));

        Self { tx }
    }

    /// Load the host's cached paths (first call only) without recording
    /// anything beyond the root
    pub async fn load(&self, host: &HostKey) -> Result<()> {
        self.request(|reply| IndexCommand::Load {
            host: host.clone(),
            reply,
        })
        .await
    }

    /// Load the host's cached paths (first call only) and seed the root
    /// and `current_directory`
    pub async fn bootstrap(&self, host: &HostKey, current_directory: &str) -> Result<()> {
        self.request(|reply| IndexCommand::Bootstrap {
            host: host.clone(),
            current_directory: current_directory.to_string(),
            reply,
        })
        .await
    }

    /// Record an observed path; last write wins
    pub async fn upsert(&self, host: &HostKey, path: &str, is_directory: bool) -> Result<()> {
        self.request(|reply| IndexCommand::Upsert {
            host: host.clone(),
            path: path.to_string(),
            is_directory,
            reply,
        })
        .await
    }

    /// Known immediate children of `directory` whose name starts with
    /// `prefix`, sorted, at most `limit`; directories end with `/`
    pub async fn suggest_children(
        &self,
        host: &HostKey,
        directory: &str,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>> {
        self.request(|reply| IndexCommand::SuggestChildren {
            host: host.clone(),
            directory: directory.to_string(),
            prefix: prefix.to_string(),
            limit,
            reply,
        })
        .await
    }

    /// Wait until every write issued before this call reached the store
    pub async fn flush(&self) -> Result<()> {
        self.request(|reply| IndexCommand::Flush { reply }).await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> IndexCommand,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| Error::IndexError("index task has stopped".into()))?;
        rx.await
            .map_err(|_| Error::IndexError("index task dropped the request".into()))
    }
}

struct IndexActor {
    store: Arc<dyn PathStore>,
    max_loaded_paths: usize,
    trees: HashMap<HostKey, BTreeMap<String, NodeEntry>>,
    loaded: HashSet<HostKey>,
    persist_tx: mpsc::UnboundedSender<PersistOp>,
}

impl IndexActor {
    async fn run(mut self, mut rx: mpsc::Receiver<IndexCommand>) {
        while let Some(command) = rx.recv().await {
            match command {
                IndexCommand::Load { host, reply } => {
                    self.ensure_loaded(&host).await;
                    let _ = reply.send(());
                }
                IndexCommand::Bootstrap {
                    host,
                    current_directory,
                    reply,
                } => {
                    self.bootstrap(&host, &current_directory).await;
                    let _ = reply.send(());
                }
                IndexCommand::Upsert {
                    host,
                    path,
                    is_directory,
                    reply,
                } => {
                    self.upsert(&host, &path, is_directory);
                    let _ = reply.send(());
                }
                IndexCommand::SuggestChildren {
                    host,
                    directory,
                    prefix,
                    limit,
                    reply,
                } => {
                    let _ = reply.send(self.children(&host, &directory, &prefix, limit));
                }
                IndexCommand::Flush { reply } => {
                    // Persister answers once everything queued before is saved
                    if let Err(mpsc::error::SendError(PersistOp::Flush(reply))) =
                        self.persist_tx.send(PersistOp::Flush(reply))
                    {
                        let _ = reply.send(());
                    }
                }
            }
        }
        debug!("Document tree index stopped");
    }

    async fn bootstrap(&mut self, host: &HostKey, current_directory: &str) {
        self.ensure_loaded(host).await;
        self.seed_directory(host, current_directory);
    }

    async fn ensure_loaded(&mut self, host: &HostKey) {
        if self.loaded.insert(host.clone()) {
            let nodes = match self.store.load_paths(host, self.max_loaded_paths).await {
                Ok(nodes) => nodes,
                Err(e) => {
                    warn!(host = %host, error = %e, "Failed to load cached paths, starting empty");
                    Vec::new()
                }
            };

            info!(host = %host, count = nodes.len(), "Loaded cached remote paths");

            let tree = self.trees.entry(host.clone()).or_default();
            for node in nodes {
                let path = normalize_path(&node.path);
                for ancestor in ancestors(&path) {
                    tree.entry(ancestor.to_string()).or_insert(NodeEntry {
                        is_directory: true,
                        last_seen: node.last_seen,
                    });
                }
                match tree.get(&path) {
                    Some(existing) if existing.last_seen >= node.last_seen => {}
                    _ => {
                        tree.insert(
                            path,
                            NodeEntry {
                                is_directory: node.is_directory,
                                last_seen: node.last_seen,
                            },
                        );
                    }
                }
            }

            self.seed_directory(host, "/");
        }
    }

    /// Record `path` as a directory unless it is already cached as one
    fn seed_directory(&mut self, host: &HostKey, path: &str) {
        let path = normalize_path(path);
        let cached = self
            .trees
            .get(host)
            .and_then(|tree| tree.get(&path))
            .is_some_and(|entry| entry.is_directory);
        if !cached {
            self.upsert(host, &path, true);
        }
    }

    fn upsert(&mut self, host: &HostKey, raw_path: &str, is_directory: bool) {
        let path = normalize_path(raw_path);
        let is_directory = is_directory || path == "/";
        let now = Utc::now();
        let tree = self.trees.entry(host.clone()).or_default();

        let mut touched = vec![(path.clone(), is_directory)];
        for ancestor in ancestors(&path) {
            match tree.get(ancestor) {
                Some(entry) if entry.is_directory => {}
                _ => touched.push((ancestor.to_string(), true)),
            }
        }

        for (path, is_directory) in touched {
            tree.insert(
                path.clone(),
                NodeEntry {
                    is_directory,
                    last_seen: now,
                },
            );
            let node = RemotePathNode {
                host_key: host.clone(),
                path,
                is_directory,
                last_seen: now,
            };
            if self.persist_tx.send(PersistOp::Save(node)).is_err() {
                debug!(host = %host, "Path persister is gone, keeping node in memory only");
            }
        }
    }

    fn children(&self, host: &HostKey, directory: &str, prefix: &str, limit: usize) -> Vec<String> {
        let Some(tree) = self.trees.get(host) else {
            return Vec::new();
        };

        let directory = normalize_path(directory);
        let child_root = if directory == "/" {
            directory
        } else {
            format!("{}/", directory)
        };
        let start = format!("{}{}", child_root, prefix);

        tree.range(start.clone()..)
            .take_while(|(path, _)| path.starts_with(&start))
            .filter_map(|(path, entry)| {
                let name = &path[child_root.len()..];
                if name.is_empty() || name.contains('/') {
                    return None;
                }
                Some(if entry.is_directory {
                    format!("{}/", name)
                } else {
                    name.to_string()
                })
            })
            .take(limit)
            .collect()
    }
}

async fn run_persister(store: Arc<dyn PathStore>, mut rx: mpsc::UnboundedReceiver<PersistOp>) {
    while let Some(op) = rx.recv().await {
        match op {
            PersistOp::Save(node) => {
                if let Err(e) = store.save_path(&node).await {
                    warn!(host = %node.host_key, path = %node.path, error = %e, "Failed to persist remote path");
                }
            }
            PersistOp::Flush(reply) => {
                let _ = reply.send(());
            }
        }
    }
}
