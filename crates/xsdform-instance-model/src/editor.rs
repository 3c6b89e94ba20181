//! In-place edits of a generated instance model.

use tracing::{debug, info};

use crate::descriptor::{ElementKind, InstanceModel, is_descendant};
use crate::error::EditError;
use crate::generator::{InstanceModelGenerator, Traversal, has_members};

impl InstanceModelGenerator {
    /// Expand the definition of the group at `path` beneath it. The new
    /// descriptors are all optional.
    ///
    /// Bases the type extends are expanded even when the policy already
    /// used them elsewhere. The model and the generator state are left
    /// unchanged when the expansion adds nothing or any resulting path
    /// already exists.
    pub fn expand_path(&mut self, path: &str) -> Result<&InstanceModel, EditError> {
        let descriptor = self
            .model
            .get(path)
            .ok_or_else(|| EditError::PathNotFound {
                path: path.to_string(),
            })?;
        let not_expandable = |reason| EditError::PathNotExpandable {
            path: path.to_string(),
            reason,
        };
        let type_name = descriptor
            .type_name
            .clone()
            .ok_or_else(|| not_expandable("it has no type name"))?;
        if descriptor.kind != ElementKind::Group {
            return Err(not_expandable("it is not a group"));
        }
        let definition = self
            .definitions
            .get(&type_name)
            .filter(|definition| has_members(definition))
            .ok_or_else(|| not_expandable("its type has no properties"))?;

        let mut traversal = Traversal::new(&self.definitions, self.policy, self.visited.clone());
        traversal.expand(path, &type_name, definition, true)?;
        let (staged, visited) = traversal.finish();

        if staged.is_empty() {
            if self.model.descendants(path).next().is_some() {
                debug!(%path, "expansion adds nothing beneath an expanded path");
                return Err(EditError::PathAlreadyExpanded {
                    path: path.to_string(),
                });
            }
            return Err(not_expandable("its type has no members left to expand"));
        }
        if let Some(existing) = staged.keys().find(|key| self.model.contains(key)) {
            debug!(%path, %existing, "expansion collides with existing path");
            return Err(EditError::PathAlreadyExpanded {
                path: path.to_string(),
            });
        }

        info!(%path, definition = %type_name, added = staged.len(), "expanded path");
        self.model.elements.extend(staged);
        self.visited = visited;
        Ok(&self.model)
    }

    /// Remove every descriptor below `path`, keeping `path` itself.
    pub fn remove_path(&mut self, path: &str) -> Result<&InstanceModel, EditError> {
        if !self.model.contains(path) {
            return Err(EditError::PathNotFound {
                path: path.to_string(),
            });
        }
        let before = self.model.len();
        self.model.elements.retain(|key, _| !is_descendant(key, path));
        let removed = before - self.model.len();
        if removed == 0 {
            return Err(EditError::NothingToRemove {
                path: path.to_string(),
            });
        }

        info!(%path, removed, "removed path");
        Ok(&self.model)
    }
}
