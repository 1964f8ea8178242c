use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use tracing::{debug, info};

use crate::{
    composition::model::{ProjectDocument, Scene, SceneId},
    foundation::error::{EditorError, EditorResult},
};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// Narration script record attached to a scene.
pub struct SceneScript {
    /// Owning scene.
    pub scene_id: String,
    /// Script text.
    pub text: String,
}

/// Scene/script persistence contract consumed by the editor.
///
/// Failures are reported as [`EditorError::Persistence`] with a message fit for the user.
pub trait SceneBackend {
    /// Load a project and its scenes.
    fn fetch_project(&mut self, project_id: &str) -> EditorResult<ProjectDocument>;
    /// Load every scene script of a project, in timeline order.
    fn fetch_project_scripts(&mut self, project_id: &str) -> EditorResult<Vec<SceneScript>>;
    /// Replace the script text of one scene.
    fn update_scene_script(&mut self, scene_id: &str, text: &str) -> EditorResult<()>;
    /// Upsert a scene with its components.
    fn update_scene(&mut self, scene: &Scene) -> EditorResult<()>;
    /// Replace the project's scene list. Stored scenes not listed are removed.
    fn update_project_scenes(
        &mut self,
        project_id: &str,
        scene_ids: &[SceneId],
    ) -> EditorResult<()>;
}

/// Backend persisting one [`ProjectDocument`] as a pretty-printed JSON file.
///
/// Writes go to a sibling temp file that is then renamed over the target.
#[derive(Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
    doc: ProjectDocument,
}

impl JsonFileBackend {
    /// Open and validate an existing project file.
    pub fn open(path: impl Into<PathBuf>) -> EditorResult<Self> {
        let path = path.into();
        let doc = read_project_json(&path)?;
        doc.validate()?;
        Ok(Self { path, doc })
    }

    /// Create (or overwrite) a project file from `doc`.
    pub fn create(path: impl Into<PathBuf>, doc: ProjectDocument) -> EditorResult<Self> {
        doc.validate()?;
        let backend = Self {
            path: path.into(),
            doc,
        };
        backend.write()?;
        Ok(backend)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &ProjectDocument {
        &self.doc
    }

    fn write(&self) -> EditorResult<()> {
        let json = serde_json::to_string_pretty(&self.doc)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json.as_bytes())
            .with_context(|| format!("write '{}'", tmp.display()))?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(anyhow::Error::new(e)
                .context(format!("replace '{}'", self.path.display()))
                .into());
        }
        debug!(path = %self.path.display(), bytes = json.len(), "project file written");
        Ok(())
    }

    fn check_project(&self, project_id: &str) -> EditorResult<()> {
        if self.doc.project.id != project_id {
            return Err(EditorError::persistence(format!(
                "project '{project_id}' not found"
            )));
        }
        Ok(())
    }
}

impl SceneBackend for JsonFileBackend {
    fn fetch_project(&mut self, project_id: &str) -> EditorResult<ProjectDocument> {
        self.check_project(project_id)?;
        Ok(self.doc.clone())
    }

    fn fetch_project_scripts(&mut self, project_id: &str) -> EditorResult<Vec<SceneScript>> {
        self.check_project(project_id)?;
        Ok(self
            .doc
            .scenes
            .iter()
            .map(|s| SceneScript {
                scene_id: s.id.clone(),
                text: s.script.clone(),
            })
            .collect())
    }

    fn update_scene_script(&mut self, scene_id: &str, text: &str) -> EditorResult<()> {
        let scene = self
            .doc
            .scenes
            .iter_mut()
            .find(|s| s.id == scene_id)
            .ok_or_else(|| EditorError::persistence(format!("scene '{scene_id}' not found")))?;
        scene.script = text.to_string();
        self.write()
    }

    fn update_scene(&mut self, scene: &Scene) -> EditorResult<()> {
        scene.validate()?;
        match self.doc.scenes.iter_mut().find(|s| s.id == scene.id) {
            Some(existing) => *existing = scene.clone(),
            None => {
                self.doc.scenes.push(scene.clone());
                self.doc.project.scene_ids.push(scene.id.clone());
                info!(scene = %scene.id, "scene created in project file");
            }
        }
        self.write()
    }

    fn update_project_scenes(
        &mut self,
        project_id: &str,
        scene_ids: &[SceneId],
    ) -> EditorResult<()> {
        self.check_project(project_id)?;
        if let Some(missing) = scene_ids
            .iter()
            .find(|id| !self.doc.scenes.iter().any(|s| &s.id == *id))
        {
            return Err(EditorError::persistence(format!(
                "scene '{missing}' not found"
            )));
        }
        let mut stored = std::mem::take(&mut self.doc.scenes);
        let ordered: Vec<Scene> = scene_ids
            .iter()
            .filter_map(|id| {
                let idx = stored.iter().position(|s| &s.id == id)?;
                Some(stored.remove(idx))
            })
            .collect();
        if !stored.is_empty() {
            info!(removed = stored.len(), "scenes removed from project file");
        }
        self.doc.scenes = ordered;
        self.doc.project.scene_ids = scene_ids.to_vec();
        self.write()
    }
}

/// Read a project document from a JSON file (without validating it).
pub fn read_project_json(path: &Path) -> EditorResult<ProjectDocument> {
    let f = File::open(path).with_context(|| format!("open project '{}'", path.display()))?;
    let doc = serde_json::from_reader(BufReader::new(f))?;
    Ok(doc)
}

#[cfg(test)]
#[path = "../../tests/unit/persist/backend.rs"]
mod tests;
