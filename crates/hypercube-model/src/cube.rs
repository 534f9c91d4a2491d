//! Cube assembly and metadata lookups
//!
//! A [`Cube`] is built once via [`CubeBuilder`], then shared read-only by
//! every query execution. All lookup tables are dense vectors indexed by
//! the corresponding id, so the evaluation core pays no hashing on the
//! hot current-member path.

use crate::error::ModelError;
use crate::metadata::{
    Dimension, DimensionId, Hierarchy, HierarchyId, Level, LevelId, Member, MemberId,
};
use std::collections::HashMap;
use std::sync::Arc;

/// An immutable cube: ordered hierarchies, default members, member tree.
#[derive(Debug)]
pub struct Cube {
    name: String,
    dimensions: Vec<Arc<Dimension>>,
    hierarchies: Vec<Arc<Hierarchy>>,
    levels: Vec<Arc<Level>>,
    members: Vec<Arc<Member>>,
    /// Default member per hierarchy, indexed by `HierarchyId`
    default_members: Vec<MemberId>,
    /// Child members in insertion order
    children: HashMap<MemberId, Vec<MemberId>>,
    /// Members per level in insertion order
    level_members: HashMap<LevelId, Vec<MemberId>>,
}

impl Cube {
    /// Cube name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All dimensions in declaration order
    pub fn dimensions(&self) -> &[Arc<Dimension>] {
        &self.dimensions
    }

    /// All hierarchies in declaration order
    pub fn hierarchies(&self) -> &[Arc<Hierarchy>] {
        &self.hierarchies
    }

    /// Look up a hierarchy by id
    pub fn hierarchy(&self, id: HierarchyId) -> Result<&Arc<Hierarchy>, ModelError> {
        self.hierarchies
            .get(id.0 as usize)
            .ok_or(ModelError::UnknownHierarchy { id })
    }

    /// Look up the Nth hierarchy of the cube.
    ///
    /// Out-of-range indexes are reported with the offending index, never
    /// clamped.
    pub fn hierarchy_at(&self, index: usize) -> Result<&Arc<Hierarchy>, ModelError> {
        self.hierarchies
            .get(index)
            .ok_or(ModelError::HierarchyIndexOutOfRange {
                index,
                count: self.hierarchies.len(),
            })
    }

    /// Look up a level by id
    pub fn level(&self, id: LevelId) -> Result<&Arc<Level>, ModelError> {
        self.levels
            .get(id.0 as usize)
            .ok_or(ModelError::UnknownLevel { id })
    }

    /// Look up a member by id
    pub fn member(&self, id: MemberId) -> Result<&Arc<Member>, ModelError> {
        self.members
            .get(id.0 as usize)
            .ok_or(ModelError::UnknownMember { id })
    }

    /// The default member of a hierarchy (the "All" member when present).
    pub fn default_member(&self, id: HierarchyId) -> Result<&Arc<Member>, ModelError> {
        let member_id = self
            .default_members
            .get(id.0 as usize)
            .ok_or(ModelError::UnknownHierarchy { id })?;
        self.member(*member_id)
    }

    /// Find a member by its unique name
    pub fn member_by_unique_name(&self, unique_name: &str) -> Option<&Arc<Member>> {
        self.members.iter().find(|m| m.unique_name == unique_name)
    }

    pub(crate) fn child_ids(&self, member: MemberId) -> &[MemberId] {
        self.children.get(&member).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn level_member_ids(&self, level: LevelId) -> &[MemberId] {
        self.level_members
            .get(&level)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Builder assembling a [`Cube`] with validated metadata.
#[derive(Debug, Default)]
pub struct CubeBuilder {
    name: String,
    dimensions: Vec<Dimension>,
    hierarchies: Vec<Hierarchy>,
    levels: Vec<Level>,
    members: Vec<Member>,
    explicit_defaults: HashMap<HierarchyId, MemberId>,
}

impl CubeBuilder {
    /// Start a cube with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a dimension
    pub fn add_dimension(&mut self, name: impl Into<String>) -> Result<DimensionId, ModelError> {
        self.add_dimension_inner(name.into(), false)
    }

    /// Add the measures dimension
    pub fn add_measures_dimension(
        &mut self,
        name: impl Into<String>,
    ) -> Result<DimensionId, ModelError> {
        self.add_dimension_inner(name.into(), true)
    }

    fn add_dimension_inner(
        &mut self,
        name: String,
        measures: bool,
    ) -> Result<DimensionId, ModelError> {
        if self.dimensions.iter().any(|d| d.name == name) {
            return Err(ModelError::duplicate("dimension", name));
        }
        let id = DimensionId(self.dimensions.len() as u32);
        self.dimensions.push(Dimension { id, name, measures });
        Ok(id)
    }

    /// Add a hierarchy to a dimension.
    ///
    /// When `has_all` is true an `(All)` level with a single
    /// `All <name>s`-style member is created automatically and becomes the
    /// hierarchy's default member.
    pub fn add_hierarchy(
        &mut self,
        dimension: DimensionId,
        name: impl Into<String>,
        has_all: bool,
    ) -> Result<HierarchyId, ModelError> {
        let name = name.into();
        if self.hierarchies.iter().any(|h| h.name == name) {
            return Err(ModelError::duplicate("hierarchy", name));
        }
        let id = HierarchyId(self.hierarchies.len() as u32);
        self.hierarchies.push(Hierarchy {
            id,
            dimension,
            name: name.clone(),
            has_all,
        });
        if has_all {
            let level = self.add_level(id, "(All)")?;
            self.add_member_inner(level, None, format!("All {name}s"), true)?;
        }
        Ok(id)
    }

    /// Add a level below the existing levels of a hierarchy
    pub fn add_level(
        &mut self,
        hierarchy: HierarchyId,
        name: impl Into<String>,
    ) -> Result<LevelId, ModelError> {
        let name = name.into();
        let depth = self
            .levels
            .iter()
            .filter(|l| l.hierarchy == hierarchy)
            .count() as u32;
        if self
            .levels
            .iter()
            .any(|l| l.hierarchy == hierarchy && l.name == name)
        {
            return Err(ModelError::duplicate("level", name));
        }
        let id = LevelId(self.levels.len() as u32);
        self.levels.push(Level {
            id,
            hierarchy,
            name,
            depth,
        });
        Ok(id)
    }

    /// Add a member to a level, optionally under a parent member
    pub fn add_member(
        &mut self,
        level: LevelId,
        parent: Option<MemberId>,
        name: impl Into<String>,
    ) -> Result<MemberId, ModelError> {
        self.add_member_inner(level, parent, name.into(), false)
    }

    fn add_member_inner(
        &mut self,
        level: LevelId,
        parent: Option<MemberId>,
        name: String,
        all: bool,
    ) -> Result<MemberId, ModelError> {
        let level_meta = self
            .levels
            .get(level.0 as usize)
            .ok_or(ModelError::UnknownLevel { id: level })?;
        let hierarchy = level_meta.hierarchy;
        let unique_name = match parent {
            Some(parent_id) => {
                let parent_member = self
                    .members
                    .get(parent_id.0 as usize)
                    .ok_or(ModelError::UnknownMember { id: parent_id })?;
                if parent_member.hierarchy != hierarchy {
                    return Err(ModelError::ParentHierarchyMismatch {
                        parent: parent_id,
                        level,
                    });
                }
                format!("{}.[{}]", parent_member.unique_name, name)
            }
            None => {
                let hierarchy_name = &self.hierarchies[hierarchy.0 as usize].name;
                format!("[{hierarchy_name}].[{name}]")
            }
        };
        let id = MemberId(self.members.len() as u32);
        self.members.push(Member {
            id,
            hierarchy,
            level,
            name,
            unique_name,
            parent,
            all,
        });
        Ok(id)
    }

    /// Override the default member of a hierarchy
    pub fn set_default_member(&mut self, hierarchy: HierarchyId, member: MemberId) {
        self.explicit_defaults.insert(hierarchy, member);
    }

    /// Finish the cube, validating that every hierarchy has a default
    /// member.
    pub fn build(self) -> Result<Arc<Cube>, ModelError> {
        let mut default_members = Vec::with_capacity(self.hierarchies.len());
        for hierarchy in &self.hierarchies {
            let default = self
                .explicit_defaults
                .get(&hierarchy.id)
                .copied()
                .or_else(|| {
                    self.members
                        .iter()
                        .find(|m| m.hierarchy == hierarchy.id && m.all)
                        .map(|m| m.id)
                })
                .or_else(|| {
                    self.members
                        .iter()
                        .find(|m| m.hierarchy == hierarchy.id)
                        .map(|m| m.id)
                })
                .ok_or_else(|| ModelError::NoDefaultMember {
                    name: hierarchy.name.clone(),
                })?;
            default_members.push(default);
        }

        let mut children: HashMap<MemberId, Vec<MemberId>> = HashMap::new();
        let mut level_members: HashMap<LevelId, Vec<MemberId>> = HashMap::new();
        for member in &self.members {
            if let Some(parent) = member.parent {
                children.entry(parent).or_default().push(member.id);
            }
            level_members.entry(member.level).or_default().push(member.id);
        }

        Ok(Arc::new(Cube {
            name: self.name,
            dimensions: self.dimensions.into_iter().map(Arc::new).collect(),
            hierarchies: self.hierarchies.into_iter().map(Arc::new).collect(),
            levels: self.levels.into_iter().map(Arc::new).collect(),
            members: self.members.into_iter().map(Arc::new).collect(),
            default_members,
            children,
            level_members,
        }))
    }
}
