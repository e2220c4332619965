//! Removes flagged features and renumbers the element feature ids.
//!
//! Feature 0 is the unassigned feature and is never removed. Elements that
//! belonged to a removed feature fall back to 0; the surviving features are
//! packed in their original order.

use super::{filter_common, INVALID_PARAMETER};
use crate::data::{AttributeMatrixType, DataArrayPath, DataContainerArray, DataError};
use crate::parallel::ParallelDataAlgorithm;
use crate::pipeline::parameter::{expect_path, ParameterDef, ParameterKind, ParameterValue};
use crate::pipeline::{Filter, FilterStatus};
use tracing::debug;

const NAME: &str = "RemoveFlaggedFeatures";
const LABEL: &str = "Remove Flagged Features";
const UUID: &str = "3bb7d6e1-0b5f-4f1c-8e3a-2d9c6a7f4e15";

static PARAMETERS: &[ParameterDef<RemoveFlaggedFeatures>] = &[
    ParameterDef {
        name: "feature_ids",
        label: "Feature Ids",
        kind: ParameterKind::Path,
        get: |f| ParameterValue::Path(f.feature_ids.clone()),
        set: |f, v| {
            f.feature_ids = expect_path(v)?;
            Ok(())
        },
    },
    ParameterDef {
        name: "flagged_features",
        label: "Flagged Features",
        kind: ParameterKind::Path,
        get: |f| ParameterValue::Path(f.flagged_features.clone()),
        set: |f, v| {
            f.flagged_features = expect_path(v)?;
            Ok(())
        },
    },
];

pub struct RemoveFlaggedFeatures {
    status: FilterStatus,
    pub feature_ids: DataArrayPath,
    /// Bool array in the feature matrix; `true` marks a feature for removal.
    pub flagged_features: DataArrayPath,
}

/// Old id → new id table. Removed features map to 0.
fn renumbering(flags: &[bool]) -> (Vec<i32>, Vec<usize>) {
    let mut map = Vec::with_capacity(flags.len());
    let mut removed = Vec::new();
    let mut next = 0;
    for (id, &flagged) in flags.iter().enumerate() {
        if flagged && id != 0 {
            map.push(0);
            removed.push(id);
        } else {
            map.push(next);
            next += 1;
        }
    }
    (map, removed)
}

impl RemoveFlaggedFeatures {
    pub fn new() -> Self {
        Self {
            status: FilterStatus::new(),
            feature_ids: DataArrayPath::default(),
            flagged_features: DataArrayPath::default(),
        }
    }
}

impl Default for RemoveFlaggedFeatures {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for RemoveFlaggedFeatures {
    filter_common!("Processing");

    fn data_check(&mut self, dca: &mut DataContainerArray) {
        let ids = dca.get_prereq_array::<i32>(&self.feature_ids, 1).map(|_| ());
        if self.status.check(ids).is_none() {
            return;
        }
        let flags = dca
            .get_prereq_array::<bool>(&self.flagged_features, 1)
            .map(|_| ());
        if self.status.check(flags).is_none() {
            return;
        }
        let matrix = dca.get_prereq_attribute_matrix(
            &self.flagged_features,
            Some(AttributeMatrixType::Feature),
        );
        self.status.check(matrix.map(|_| ()));
    }

    fn execute(&mut self, dca: &mut DataContainerArray) {
        let flags = match dca.get_prereq_array::<bool>(&self.flagged_features, 1) {
            Ok(flags) => flags.as_slice().to_vec(),
            Err(err) => return self.status.set_data_error(&err),
        };
        let features = flags.len();
        if features > 1 && flags.iter().skip(1).all(|&f| f) {
            self.status.set_parameter_error(
                INVALID_PARAMETER,
                "flagged_features",
                "All features were flagged and would all be removed",
            );
            return;
        }

        let ctx = self.status.parallel().clone();
        let ids = match dca.get_prereq_array::<i32>(&self.feature_ids, 1) {
            Ok(ids) => ids.as_slice(),
            Err(err) => return self.status.set_data_error(&err),
        };
        let checked = ParallelDataAlgorithm::with_context(0..ids.len(), ctx.clone())
            .try_execute(|range| {
                match ids[range.clone()]
                    .iter()
                    .position(|&id| id < 0 || id as usize >= features)
                {
                    Some(offset) => Err(range.start + offset),
                    None => Ok(()),
                }
            });
        if let Err(index) = checked {
            let id = ids[index];
            self.status.set_parameter_error(
                INVALID_PARAMETER - 1,
                "feature_ids",
                format!(
                    "Element {} has feature id {}, outside the {} features of '{}'",
                    index,
                    id,
                    features,
                    self.flagged_features.matrix_path()
                ),
            );
            return;
        }

        let (map, removed) = renumbering(&flags);
        if removed.is_empty() {
            self.status.notify_status("No features flagged");
            return;
        }
        debug!("Removing {} of {} features", removed.len(), features);

        let Some(matrix) = dca.attribute_matrix_mut(&self.flagged_features) else {
            let err = DataError::PathNotFound(self.flagged_features.matrix_path());
            return self.status.set_data_error(&err);
        };
        if self.status.check(matrix.remove_tuples(&removed)).is_none() {
            return;
        }

        let ids = match dca.get_prereq_array_mut::<i32>(&self.feature_ids, 1) {
            Ok(ids) => ids,
            Err(err) => return self.status.set_data_error(&err),
        };
        let tuples = ids.number_of_tuples();
        let renumbered = ParallelDataAlgorithm::with_context(0..tuples, ctx).execute_chunks(
            ids.as_mut_slice(),
            1,
            |_, chunk| {
                for id in chunk {
                    *id = map[*id as usize];
                }
            },
        );
        if self.status.check(renumbered).is_some() {
            self.status.notify_status(format!(
                "Removed {} features, {} remain",
                removed.len(),
                features - removed.len()
            ));
        }
    }
}
