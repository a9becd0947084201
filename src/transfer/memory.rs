//! In-memory [`RemoteFs`] and [`Connector`] used by the test suite.

use super::{Connector, RemoteFileEntry, RemoteFs, RemoteKind};
use crate::error::{ConnectError, TransferError};
use crate::ssh::SshConfig;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug)]
enum Node {
    Dir,
    File(Vec<u8>),
}

#[derive(Default)]
struct State {
    nodes: BTreeMap<String, Node>,
    closes: usize,
    fail_writes: bool,
}

/// Shared in-memory tree. Clones observe the same files.
#[derive(Clone)]
pub struct MemoryFs {
    state: Arc<Mutex<State>>,
}

fn normalize(path: &str) -> String {
    if path == "/" {
        return path.to_string();
    }
    path.trim_end_matches('/').to_string()
}

fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(i) => &path[..i],
        None => "",
    }
}

impl MemoryFs {
    pub fn new() -> Self {
        let mut state = State::default();
        state.nodes.insert("/".to_string(), Node::Dir);
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn add_dir(&self, path: &str) {
        let mut state = self.state.lock().unwrap();
        let mut current = normalize(path);
        while !current.is_empty() && current != "/" {
            state.nodes.insert(current.clone(), Node::Dir);
            current = parent(&current).to_string();
        }
    }

    pub fn add_file(&self, path: &str, data: &[u8]) {
        let path = normalize(path);
        self.add_dir(parent(&path));
        self.state
            .lock()
            .unwrap()
            .nodes
            .insert(path, Node::File(data.to_vec()));
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        match self.state.lock().unwrap().nodes.get(&normalize(path)) {
            Some(Node::File(data)) => Some(data.clone()),
            _ => None,
        }
    }

    pub fn kind(&self, path: &str) -> Option<RemoteKind> {
        self.state
            .lock()
            .unwrap()
            .nodes
            .get(&normalize(path))
            .map(|node| match node {
                Node::Dir => RemoteKind::Dir,
                Node::File(_) => RemoteKind::File,
            })
    }

    pub fn dir_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .nodes
            .values()
            .filter(|n| matches!(n, Node::Dir))
            .count()
    }

    /// Number of times a session over this tree was closed.
    pub fn closes(&self) -> usize {
        self.state.lock().unwrap().closes
    }

    pub fn fail_writes(&self) {
        self.state.lock().unwrap().fail_writes = true;
    }

    fn dir_exists(state: &State, path: &str) -> bool {
        path.is_empty() || matches!(state.nodes.get(path), Some(Node::Dir))
    }
}

#[async_trait]
impl RemoteFs for MemoryFs {
    async fn list_dir(&self, path: &str) -> Result<Vec<RemoteFileEntry>, TransferError> {
        let path = normalize(path);
        let state = self.state.lock().unwrap();
        if !Self::dir_exists(&state, &path) {
            return Err(TransferError::NotFound(path));
        }

        Ok(state
            .nodes
            .iter()
            .filter(|(p, _)| p.as_str() != path && parent(p) == path)
            .map(|(p, node)| RemoteFileEntry {
                name: p.rsplit('/').next().unwrap_or_default().to_string(),
                is_dir: matches!(node, Node::Dir),
            })
            .collect())
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>, TransferError> {
        self.file(path)
            .ok_or_else(|| TransferError::NotFound(path.to_string()))
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<(), TransferError> {
        let path = normalize(path);
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(TransferError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "permission denied",
            )));
        }
        if !Self::dir_exists(&state, parent(&path)) {
            return Err(TransferError::NotFound(parent(&path).to_string()));
        }
        if matches!(state.nodes.get(&path), Some(Node::Dir)) {
            return Err(TransferError::AlreadyExists(path));
        }
        state.nodes.insert(path, Node::File(data.to_vec()));
        Ok(())
    }

    async fn stat(&self, path: &str) -> Result<Option<RemoteKind>, TransferError> {
        Ok(self.kind(path))
    }

    async fn create_dir(&self, path: &str) -> Result<(), TransferError> {
        let path = normalize(path);
        let mut state = self.state.lock().unwrap();
        if state.nodes.contains_key(&path) {
            return Err(TransferError::AlreadyExists(path));
        }
        if !Self::dir_exists(&state, parent(&path)) {
            return Err(TransferError::NotFound(parent(&path).to_string()));
        }
        state.nodes.insert(path, Node::Dir);
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), TransferError> {
        self.state.lock().unwrap().closes += 1;
        Ok(())
    }
}

/// Hands out sessions over registered in-memory hosts, keyed by `host:port`.
/// Unregistered hosts fail like an unreachable server.
#[derive(Default)]
pub struct MemoryConnector {
    hosts: HashMap<String, MemoryFs>,
    attempts: Mutex<Vec<String>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, endpoint: &str, fs: MemoryFs) -> Self {
        self.hosts.insert(endpoint.to_string(), fs);
        self
    }

    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, config: &SshConfig) -> Result<Box<dyn RemoteFs>, ConnectError> {
        let endpoint = config.endpoint();
        self.attempts.lock().unwrap().push(endpoint.clone());
        match self.hosts.get(&endpoint) {
            Some(fs) => Ok(Box::new(fs.clone())),
            None => Err(ConnectError::Transport {
                endpoint,
                reason: "connection refused".to_string(),
            }),
        }
    }
}
