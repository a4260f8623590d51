//! Which file types a run processes, and when each parent can be judged.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use keyval_dictionary::{Branch, KeySchema};
use keyval_ingest::{LocatedFiles, Side};
use keyval_model::{DataType, FileType, ValidationError, ValidationMode};

use crate::error::{Result, ValidateError};

/// Work scheduled for one run.
#[derive(Debug)]
pub(crate) struct RunPlan<'a> {
    pub supplemental: Vec<&'a FileType>,
    pub branches: Vec<&'a Branch>,
    /// Missing mandatory files.
    pub missing: Vec<ValidationError>,
    /// Present surjective child file types, per parent.
    pub children: BTreeMap<FileType, usize>,
    /// Parents whose children were filtered out of this run; never judged.
    pub incomplete: BTreeSet<FileType>,
}

impl<'a> RunPlan<'a> {
    pub fn build(
        schema: &'a KeySchema,
        located: &LocatedFiles,
        mode: ValidationMode,
        requested: Option<&BTreeSet<DataType>>,
    ) -> Result<Self> {
        if let Some(requested) = requested {
            for data_type in requested {
                if schema.branch(data_type).is_none() {
                    return Err(ValidateError::UnknownDataType {
                        data_type: data_type.to_string(),
                    });
                }
            }
        }

        let present = |file_type: &FileType| {
            located.contains(file_type, Side::New) || located.contains(file_type, Side::Original)
        };
        let branch_present = |branch: &Branch| {
            located.has_data_type(branch, Side::New) || located.has_data_type(branch, Side::Original)
        };

        let mut plan = RunPlan {
            supplemental: schema
                .supplemental()
                .iter()
                .filter(|file_type| present(*file_type))
                .collect(),
            branches: Vec::new(),
            missing: Vec::new(),
            children: BTreeMap::new(),
            incomplete: BTreeSet::new(),
        };

        for branch in schema.branches() {
            let wanted = requested.is_none_or(|requested| requested.contains(&branch.data_type));
            match (branch_present(branch), wanted) {
                (true, true) => plan.branches.push(branch),
                (true, false) => {
                    debug!(data_type = %branch.data_type, "data type not requested");
                    for file_type in branch.file_types().filter(|file_type| present(*file_type)) {
                        if let Some(parent) = schema
                            .file_type(file_type)
                            .and_then(|file| file.surjective_parent())
                        {
                            plan.incomplete.insert(parent.clone());
                        }
                    }
                }
                (false, true) if requested.is_some() => {
                    warn!(data_type = %branch.data_type, "requested data type not in submission");
                }
                (false, _) => {}
            }
        }

        plan.check_mandatory(schema, located, mode);
        plan.count_children(schema, &present);
        Ok(plan)
    }

    fn check_mandatory(&mut self, schema: &KeySchema, located: &LocatedFiles, mode: ValidationMode) {
        let spine_side = match mode {
            ValidationMode::Full => Side::New,
            ValidationMode::Incremental => Side::Original,
        };
        for file_type in schema.spine() {
            if !located.contains(file_type, spine_side) {
                self.missing.push(missing_file(file_type, spine_side, "clinical spine file"));
            }
        }

        for branch in &self.branches {
            for side in [Side::Original, Side::New] {
                if !located.has_data_type(branch, side) {
                    continue;
                }
                for file in &branch.files {
                    // System files come with the platform and back new rows only.
                    if !file.required || (file.system && side == Side::Original) {
                        continue;
                    }
                    if !located.contains(&file.file_type, side) {
                        let what = format!("required {} file", branch.data_type);
                        self.missing.push(missing_file(&file.file_type, side, &what));
                    }
                }
            }
        }
    }

    fn count_children(&mut self, schema: &KeySchema, present: &impl Fn(&FileType) -> bool) {
        let scheduled = schema
            .spine()
            .iter()
            .chain(self.supplemental.iter().copied())
            .chain(self.branches.iter().flat_map(|branch| branch.file_types()));
        for file_type in scheduled.filter(|file_type| present(*file_type)) {
            if let Some(parent) = schema
                .file_type(file_type)
                .and_then(|file| file.surjective_parent())
            {
                *self.children.entry(parent.clone()).or_default() += 1;
            }
        }
    }

    pub fn children_of(&self, parent: &FileType) -> usize {
        self.children.get(parent).copied().unwrap_or_default()
    }

    pub fn is_fatal(&self) -> bool {
        !self.missing.is_empty()
    }
}

fn missing_file(file_type: &FileType, side: Side, what: &str) -> ValidationError {
    ValidationError::structural(
        file_type.clone(),
        "",
        None,
        format!("missing {what} {file_type} in {side} submission"),
    )
}
