use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    meshes: HashMap<String, String>,
    blendshapes: HashMap<String, String>,
    alignments: HashMap<String, String>,
    skeletons: HashMap<String, SkeletonEntry>,
}

#[derive(Debug, Deserialize)]
struct SkeletonEntry {
    skeleton: String,
    #[serde(default)]
    attachment: Option<String>,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

/// Triangle mesh as plain arrays; tests convert to their own point types.
#[derive(Clone, Debug, Deserialize)]
pub struct MeshFixture {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

pub mod meshes {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.meshes.keys().cloned().collect()
    }

    pub fn load(name: &str) -> Result<MeshFixture> {
        let rel = lookup(&MANIFEST.meshes, "mesh", name)?;
        super::load_json(rel)
    }
}

pub mod blendshapes {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.blendshapes.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        let rel = lookup(&MANIFEST.blendshapes, "blendshape", name)?;
        read_to_string(rel)
    }
}

pub mod alignments {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.alignments.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        let rel = lookup(&MANIFEST.alignments, "alignment", name)?;
        read_to_string(rel)
    }
}

pub mod skeletons {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.skeletons.keys().cloned().collect()
    }

    pub fn skeleton_text(name: &str) -> Result<String> {
        let entry = lookup(&MANIFEST.skeletons, "skeleton", name)?;
        read_to_string(&entry.skeleton)
    }

    pub fn attachment_text(name: &str) -> Result<Option<String>> {
        let entry = lookup(&MANIFEST.skeletons, "skeleton", name)?;
        match &entry.attachment {
            Some(rel) => read_to_string(rel).map(Some),
            None => Ok(None),
        }
    }
}
