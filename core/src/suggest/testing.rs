//! In-memory collaborators for suggestion tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{PathStore, SnippetSource};
use crate::{CommandRunner, Error, HostCredential, HostKey, RemotePathNode, Result};

#[derive(Default)]
pub struct MemoryPathStore {
    nodes: Mutex<HashMap<(HostKey, String), RemotePathNode>>,
    loads: AtomicUsize,
    saves: AtomicUsize,
}

impl MemoryPathStore {
    pub fn insert(&self, node: RemotePathNode) {
        self.nodes
            .lock()
            .unwrap()
            .insert((node.host_key.clone(), node.path.clone()), node);
    }

    pub fn get(&self, host: &HostKey, path: &str) -> Option<RemotePathNode> {
        self.nodes
            .lock()
            .unwrap()
            .get(&(host.clone(), path.to_string()))
            .cloned()
    }

    pub fn load_calls(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn save_calls(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PathStore for MemoryPathStore {
    async fn load_paths(&self, host: &HostKey, limit: usize) -> Result<Vec<RemotePathNode>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let mut nodes: Vec<RemotePathNode> = self
            .nodes
            .lock()
            .unwrap()
            .values()
            .filter(|n| &n.host_key == host)
            .cloned()
            .collect();
        nodes.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        nodes.truncate(limit);
        Ok(nodes)
    }

    async fn save_path(&self, node: &RemotePathNode) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.insert(node.clone());
        Ok(())
    }
}

pub struct FailingPathStore;

#[async_trait]
impl PathStore for FailingPathStore {
    async fn load_paths(&self, _host: &HostKey, _limit: usize) -> Result<Vec<RemotePathNode>> {
        Err(Error::DatabaseError("disk unavailable".into()))
    }

    async fn save_path(&self, _node: &RemotePathNode) -> Result<()> {
        Err(Error::DatabaseError("disk unavailable".into()))
    }
}

/// Snippets as (optional host scope, command)
#[derive(Default)]
pub struct StaticSnippets {
    pub snippets: Vec<(Option<HostKey>, String)>,
    pub fail: bool,
}

#[async_trait]
impl SnippetSource for StaticSnippets {
    async fn snippet_commands(&self, host: &HostKey) -> Result<Vec<String>> {
        if self.fail {
            return Err(Error::DatabaseError("snippets unavailable".into()));
        }
        Ok(self
            .snippets
            .iter()
            .filter(|(scope, _)| scope.as_ref().map_or(true, |s| s == host))
            .map(|(_, command)| command.clone())
            .collect())
    }
}

/// Runner that replays a canned listing and records every command
#[derive(Default)]
pub struct ScriptedRunner {
    pub output: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn with_output(output: &str) -> Self {
        Self {
            output: Some(output.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn execute(&self, _host: &HostCredential, command: &str) -> Result<String> {
        self.calls.lock().unwrap().push(command.to_string());
        self.output
            .clone()
            .ok_or_else(|| Error::RemoteExecutionError("connection refused".into()))
    }
}
