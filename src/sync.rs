//! Manifest application
//!
//! The hosting side of the engine: a YAML manifest declares resources, a JSON
//! state file remembers which remote entity each one is bound to, and the
//! functions here walk the manifest one record at a time.

use crate::resource::dispatch::{self, ResourceKind};
use crate::resource::path::ResourceOperation;
use crate::resource::{CompositeId, CrudEngine, ResourceData, RUNTIME_GROUP_FIELD};
use crate::konnect::http::Transport;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

const STATE_VERSION: u32 = 1;

/// Route field naming a service by its manifest name
const SERVICE_NAME_FIELD: &str = "service";

/// Declared resources
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub runtime_group_id: Option<String>,
    #[serde(default)]
    pub resources: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    pub kind: ResourceKind,
    pub name: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl ManifestEntry {
    pub fn key(&self) -> String {
        state_key(self.kind, &self.name)
    }

    /// Local record for this entry, with the runtime group filled in
    fn record(&self, default_runtime_group: Option<&str>) -> Result<ResourceData> {
        let mut data = ResourceData::from_fields(self.fields.clone());
        if data.get_str(RUNTIME_GROUP_FIELD).is_none() {
            let Some(rg) = default_runtime_group else {
                bail!("{}: no runtime_group_id declared or configured", self.key());
            };
            data.set(RUNTIME_GROUP_FIELD, rg);
        }
        Ok(data)
    }
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {:?}", path))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid manifest {:?}", path))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let manifest: Manifest = serde_yaml::from_str(content)?;

        let mut seen = HashSet::new();
        for entry in &manifest.resources {
            if entry.name.trim().is_empty() {
                bail!("{} entry without a name", entry.kind);
            }
            if !seen.insert(entry.key()) {
                bail!("duplicate resource {}", entry.key());
            }
        }
        Ok(manifest)
    }

    /// Entries ordered so referenced kinds come first
    fn ordered(&self) -> Vec<&ManifestEntry> {
        let mut entries: Vec<&ManifestEntry> = self.resources.iter().collect();
        entries.sort_by_key(|e| e.kind);
        entries
    }
}

/// One persisted record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEntry {
    pub kind: ResourceKind,
    pub data: ResourceData,
    pub synced_at: DateTime<Utc>,
}

/// Persisted records keyed by `kind/name`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub version: u32,
    #[serde(default)]
    pub records: BTreeMap<String, StateEntry>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            records: BTreeMap::new(),
        }
    }
}

impl State {
    /// Load state; a missing file is an empty state
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read state {:?}", path))?;
        let state: State = serde_json::from_str(&content)
            .with_context(|| format!("Corrupt state file {:?}", path))?;
        if state.version != STATE_VERSION {
            bail!("unsupported state version {}", state.version);
        }
        Ok(state)
    }

    /// Write state through a temporary file so a crash never truncates it
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Failed to write {:?}", tmp))?;
        std::fs::rename(&tmp, path).with_context(|| format!("Failed to replace {:?}", path))?;
        Ok(())
    }

    pub fn get(&self, kind: ResourceKind, name: &str) -> Option<&StateEntry> {
        self.records.get(&state_key(kind, name))
    }

    fn record(&mut self, key: String, kind: ResourceKind, data: ResourceData) {
        self.records.insert(
            key,
            StateEntry {
                kind,
                data,
                synced_at: Utc::now(),
            },
        );
    }
}

/// Counts of what a run did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncSummary {
    pub created: usize,
    pub updated: usize,
    pub recreated: usize,
    pub deleted: usize,
    pub dropped: usize,
}

impl std::fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} recreated, {} deleted, {} dropped",
            self.created, self.updated, self.recreated, self.deleted, self.dropped
        )
    }
}

pub fn state_key(kind: ResourceKind, name: &str) -> String {
    format!("{}/{}", kind, name)
}

/// Bring the remote side in line with the manifest.
///
/// Bound records are read first: one that vanished remotely is created again,
/// otherwise it is updated. Records no longer declared are deleted. `state` is
/// updated after every successful step, so it is worth saving even on error.
pub async fn apply<T: Transport>(
    engine: &CrudEngine<T>,
    manifest: &Manifest,
    state: &mut State,
    default_runtime_group: Option<&str>,
) -> Result<SyncSummary> {
    let mut summary = SyncSummary::default();
    let default_rg = manifest.runtime_group_id.as_deref().or(default_runtime_group);

    for entry in manifest.ordered() {
        let key = entry.key();
        let mut input = entry.record(default_rg)?;
        resolve_service_reference(&mut input, state).with_context(|| key.clone())?;

        let existing = state
            .records
            .get(&key)
            .filter(|e| e.data.is_bound())
            .map(|e| e.data.clone());

        match existing {
            Some(mut probe) => {
                dispatch::execute(engine, entry.kind, ResourceOperation::Read, &mut probe)
                    .await
                    .with_context(|| format!("{}: refresh failed", key))?;

                let remote_id = probe.id().map(CompositeId::decode).transpose()?;
                match remote_id {
                    Some(id) if input.get_str(RUNTIME_GROUP_FIELD) == Some(id.scope_id()) => {
                        input.set_id(id.encode());
                        dispatch::execute(engine, entry.kind, ResourceOperation::Update, &mut input)
                            .await
                            .with_context(|| format!("{}: update failed", key))?;
                        summary.updated += 1;
                    }
                    Some(_) => {
                        // runtime group changed: the entity has to move
                        dispatch::execute(engine, entry.kind, ResourceOperation::Delete, &mut probe)
                            .await
                            .with_context(|| format!("{}: delete from old runtime group failed", key))?;
                        state.records.remove(&key);
                        create(engine, entry.kind, &key, &mut input).await?;
                        summary.recreated += 1;
                    }
                    None => {
                        tracing::warn!("{} was deleted outside of konnect-sync", key);
                        state.records.remove(&key);
                        create(engine, entry.kind, &key, &mut input).await?;
                        summary.recreated += 1;
                    }
                }
            }
            None => {
                create(engine, entry.kind, &key, &mut input).await?;
                summary.created += 1;
            }
        }

        state.record(key, entry.kind, input);
    }

    let declared: HashSet<String> = manifest.resources.iter().map(|e| e.key()).collect();
    let orphans: Vec<String> = state
        .records
        .keys()
        .filter(|k| !declared.contains(*k))
        .cloned()
        .collect();
    delete_records(engine, state, orphans, &mut summary).await?;

    Ok(summary)
}

/// Re-read every bound record; records whose entity vanished are dropped
pub async fn refresh<T: Transport>(engine: &CrudEngine<T>, state: &mut State) -> Result<SyncSummary> {
    let mut summary = SyncSummary::default();
    let keys: Vec<String> = state.records.keys().cloned().collect();

    for key in keys {
        let Some(entry) = state.records.get(&key).cloned() else {
            continue;
        };
        let mut data = entry.data;
        if data.is_bound() {
            dispatch::execute(engine, entry.kind, ResourceOperation::Read, &mut data)
                .await
                .with_context(|| format!("{}: refresh failed", key))?;
        }

        if data.is_bound() {
            state.record(key, entry.kind, data);
            summary.updated += 1;
        } else {
            tracing::warn!("{} no longer exists remotely, dropping it", key);
            state.records.remove(&key);
            summary.dropped += 1;
        }
    }
    Ok(summary)
}

/// Delete every bound record, dependents first
pub async fn destroy<T: Transport>(engine: &CrudEngine<T>, state: &mut State) -> Result<SyncSummary> {
    let mut summary = SyncSummary::default();
    let keys: Vec<String> = state.records.keys().cloned().collect();
    delete_records(engine, state, keys, &mut summary).await?;
    Ok(summary)
}

/// Adopt an existing remote entity under `kind/name`
pub async fn import<T: Transport>(
    engine: &CrudEngine<T>,
    state: &mut State,
    kind: ResourceKind,
    name: &str,
    token: &str,
) -> Result<()> {
    let key = state_key(kind, name);
    if state.records.contains_key(&key) {
        bail!("{} is already tracked", key);
    }

    let mut data = ResourceData::new();
    dispatch::import(engine, kind, &mut data, token)
        .await
        .with_context(|| format!("{}: import of {} failed", key, token))?;
    state.record(key, kind, data);
    Ok(())
}

async fn create<T: Transport>(
    engine: &CrudEngine<T>,
    kind: ResourceKind,
    key: &str,
    data: &mut ResourceData,
) -> Result<()> {
    dispatch::execute(engine, kind, ResourceOperation::Create, data)
        .await
        .with_context(|| format!("{}: create failed", key))
}

async fn delete_records<T: Transport>(
    engine: &CrudEngine<T>,
    state: &mut State,
    mut keys: Vec<String>,
    summary: &mut SyncSummary,
) -> Result<()> {
    // dependents (routes, consumers) before the services they point at
    keys.sort_by_key(|k| std::cmp::Reverse(state.records.get(k).map(|e| e.kind)));

    for key in keys {
        let Some(entry) = state.records.get(&key).cloned() else {
            continue;
        };
        let mut data = entry.data;
        if data.is_bound() {
            dispatch::execute(engine, entry.kind, ResourceOperation::Delete, &mut data)
                .await
                .with_context(|| format!("{}: delete failed", key))?;
            summary.deleted += 1;
        } else {
            summary.dropped += 1;
        }
        state.records.remove(&key);
    }
    Ok(())
}

/// Turn `service: <manifest name>` into the service's remote id
fn resolve_service_reference(data: &mut ResourceData, state: &State) -> Result<()> {
    let Some(name) = data.get_str(SERVICE_NAME_FIELD).map(String::from) else {
        return Ok(());
    };
    if data.get_str("service_id").is_some() {
        bail!("declare either service or service_id, not both");
    }

    let service_id = state
        .get(ResourceKind::Service, &name)
        .and_then(|e| e.data.get_str("service_id"))
        .map(String::from)
        .with_context(|| format!("service {} is not created yet", name))?;

    data.remove(SERVICE_NAME_FIELD);
    data.set("service_id", service_id);
    Ok(())
}
