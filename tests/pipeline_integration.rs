//! Integration tests for the filter pipeline
//!
//! These tests validate the complete pipeline workflow:
//! - Preflight halting and error aggregation
//! - Execution order, fatal errors and cancellation
//! - Rename broadcast between built-in filters
//! - Pipeline files built through the registry

mod common;

use common::builders::ImageBuilder;
use common::mock_filters::RecordingFilter;
use common::{call_log, calls};
use tempfile::TempDir;
use voxelpipe::data::DataArrayPath;
use voxelpipe::pipeline::{
    message, FilterPipeline, FilterRegistry, FilterState, MessageKind, ParameterValue,
    PipelineError, PipelineFile,
};

fn states(pipeline: &FilterPipeline) -> Vec<FilterState> {
    pipeline.filters().map(|f| f.status().state()).collect()
}

#[test]
fn test_preflight_halts_at_first_fatal_error() {
    let log = call_log();
    let mut pipeline = FilterPipeline::new();
    pipeline.push_back(RecordingFilter::new("A", &log).boxed());
    pipeline.push_back(RecordingFilter::new("B", &log).failing_check(-201).boxed());
    pipeline.push_back(RecordingFilter::new("C", &log).boxed());

    let err = pipeline.run().unwrap_err();
    match err {
        PipelineError::Fatal {
            label, index, code, ..
        } => {
            assert_eq!(label, "B");
            assert_eq!(index, 1);
            assert_eq!(code, -201);
        }
        other => panic!("unexpected error: {}", other),
    }

    // Execute never started.
    assert_eq!(calls(&log), vec!["check:A", "check:B"]);
    assert_eq!(
        states(&pipeline),
        vec![FilterState::Preflighted, FilterState::Faulted, FilterState::NotRun]
    );
    assert_eq!(pipeline.errors().len(), 1);
}

#[test]
fn test_preflight_without_stop_on_error_aggregates() {
    let log = call_log();
    let mut pipeline = FilterPipeline::new();
    pipeline.set_stop_on_error(false);
    pipeline.push_back(RecordingFilter::new("A", &log).failing_check(-1).boxed());
    pipeline.push_back(RecordingFilter::new("B", &log).boxed());
    pipeline.push_back(RecordingFilter::new("C", &log).failing_check(-2).boxed());

    match pipeline.preflight_pipeline().unwrap_err() {
        PipelineError::Multiple(errors) => assert_eq!(errors.len(), 2),
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(calls(&log), vec!["check:A", "check:B", "check:C"]);
    assert_eq!(pipeline.errors().len(), 2);
}

#[test]
fn test_execute_runs_filters_in_order() {
    let log = call_log();
    let mut pipeline = FilterPipeline::new();
    for label in ["A", "B", "C"] {
        pipeline.push_back(RecordingFilter::new(label, &log).boxed());
    }

    pipeline.run().unwrap();
    assert_eq!(
        calls(&log),
        vec![
            "check:A", "check:B", "check:C", // preflight
            "check:A", "exec:A", "check:B", "exec:B", "check:C", "exec:C",
        ]
    );
    assert!(states(&pipeline)
        .iter()
        .all(|s| *s == FilterState::Completed));
}

#[test]
fn test_warning_does_not_halt() {
    let log = call_log();
    let mut pipeline = FilterPipeline::new();
    pipeline.push_back(RecordingFilter::new("A", &log).warning(7).boxed());
    pipeline.push_back(RecordingFilter::new("B", &log).boxed());

    pipeline.run().unwrap();
    assert_eq!(pipeline.filter(0).unwrap().status().warning_code(), 7);
    assert_eq!(pipeline.filter(1).unwrap().status().state(), FilterState::Completed);
}

#[test]
fn test_execute_error_stops_remaining_filters() {
    let log = call_log();
    let mut pipeline = FilterPipeline::new();
    pipeline.push_back(RecordingFilter::new("A", &log).boxed());
    pipeline.push_back(RecordingFilter::new("B", &log).failing_execute(-300).boxed());
    pipeline.push_back(RecordingFilter::new("C", &log).boxed());

    let mut dca = voxelpipe::DataContainerArray::new();
    let err = pipeline.execute_on(&mut dca).unwrap_err();
    assert!(matches!(err, PipelineError::Fatal { index: 1, code: -300, .. }));
    assert!(!calls(&log).contains(&"exec:C".to_string()));
    assert_eq!(
        states(&pipeline),
        vec![FilterState::Completed, FilterState::Faulted, FilterState::NotRun]
    );
}

#[test]
fn test_cancel_between_filters() {
    let log = call_log();
    let mut pipeline = FilterPipeline::new();
    let cancel = pipeline.cancel_handle();
    pipeline.push_back(RecordingFilter::new("A", &log).boxed());
    pipeline.push_back(RecordingFilter::new("B", &log).cancelling(cancel).boxed());
    pipeline.push_back(RecordingFilter::new("C", &log).boxed());

    let err = pipeline.run().unwrap_err();
    assert!(matches!(err, PipelineError::Cancelled(2)));
    assert_eq!(
        states(&pipeline),
        vec![FilterState::Completed, FilterState::Completed, FilterState::NotRun]
    );
    assert!(!calls(&log).contains(&"exec:C".to_string()));

    // The flag stays raised until reset.
    assert!(pipeline.is_cancelled());
    pipeline.reset_cancel();
    assert!(!pipeline.is_cancelled());
}

#[test]
fn test_observer_receives_filter_errors() {
    let log = call_log();
    let mut pipeline = FilterPipeline::new();
    let (tx, rx) = message::channel();
    pipeline.set_observer(Some(tx));
    pipeline.push_back(RecordingFilter::new("A", &log).boxed());
    pipeline.push_back(RecordingFilter::new("B", &log).failing_check(-5).boxed());

    assert!(pipeline.preflight_pipeline().is_err());
    let errors: Vec<_> = message::drain(&rx)
        .into_iter()
        .filter(|m| m.kind == MessageKind::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].human_label, "B");
    assert_eq!(errors[0].pipeline_index, Some(1));
    assert_eq!(errors[0].code, -5);
}

#[test]
fn test_missing_input_reports_path_not_found() {
    let log = call_log();
    let mut pipeline = FilterPipeline::new();
    pipeline.push_back(
        RecordingFilter::new("A", &log)
            .with_input(DataArrayPath::new("Image", "Cells", "Missing"))
            .boxed(),
    );
    match pipeline.preflight_pipeline().unwrap_err() {
        PipelineError::Fatal { code, .. } => assert_eq!(code, -106),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_structure_operations_keep_indices() {
    let log = call_log();
    let mut pipeline = FilterPipeline::new();
    pipeline.push_back(RecordingFilter::new("B", &log).boxed());
    pipeline.push_front(RecordingFilter::new("A", &log).boxed());
    pipeline.insert(2, RecordingFilter::new("C", &log).boxed()).unwrap();
    assert!(matches!(
        pipeline.insert(9, RecordingFilter::new("X", &log).boxed()),
        Err(PipelineError::IndexOutOfRange { index: 9, len: 3 })
    ));

    let labels: Vec<_> = pipeline.filters().map(|f| f.human_label()).collect();
    assert_eq!(labels, vec!["A", "B", "C"]);
    for (i, filter) in pipeline.filters().enumerate() {
        assert_eq!(filter.status().pipeline_index(), Some(i));
    }
    assert_eq!(pipeline.previous(1).unwrap().human_label(), "A");
    assert_eq!(pipeline.next(1).unwrap().human_label(), "C");

    let removed = pipeline.erase(0).unwrap();
    assert_eq!(removed.status().pipeline_index(), None);
    assert_eq!(pipeline.filter(0).unwrap().status().pipeline_index(), Some(0));

    assert_eq!(pipeline.pop_back().unwrap().human_label(), "C");
    pipeline.clear();
    assert!(pipeline.is_empty());
}

/// CreateImageGeometry → CreateDataArray → RenameAttributeArray →
/// ThresholdArray, where the threshold still names the pre-rename array.
fn rename_pipeline_json() -> &'static str {
    r#"{
        "name": "rename broadcast",
        "filters": [
            { "filter": "CreateImageGeometry",
              "parameters": { "data_container": "Image", "cell_matrix": "Cells",
                              "dimensions": [4, 2, 1] } },
            { "filter": "CreateDataArray",
              "parameters": { "created_array": "Image|Cells|Phases",
                              "element_type": "i32", "initial_value": "2" } },
            { "filter": "RenameAttributeArray",
              "parameters": { "selected_array": "Image|Cells|Phases",
                              "new_array_name": "Ids" } },
            { "filter": "ThresholdArray",
              "parameters": { "input_array": "Image|Cells|Phases",
                              "comparison": ">=", "value": 2 } }
        ]
    }"#
}

#[test]
fn test_rename_is_broadcast_downstream() {
    let registry = FilterRegistry::with_builtin();
    let mut pipeline = PipelineFile::from_json(rename_pipeline_json())
        .unwrap()
        .build(&registry)
        .unwrap();

    pipeline.preflight_pipeline().unwrap();
    assert_eq!(
        pipeline.filter(3).unwrap().parameter("input_array"),
        Some(ParameterValue::Path(DataArrayPath::new("Image", "Cells", "Ids")))
    );
    // The renaming filter keeps pointing at its source.
    assert_eq!(
        pipeline.filter(2).unwrap().parameter("selected_array"),
        Some(ParameterValue::Path(DataArrayPath::new("Image", "Cells", "Phases")))
    );

    let dca = pipeline.execute().unwrap();
    let mask = dca
        .get_prereq_array::<bool>(&DataArrayPath::new("Image", "Cells", "Mask"), 1)
        .unwrap();
    assert_eq!(mask.number_of_tuples(), 8);
    assert!(mask.as_slice().iter().all(|&m| m));
}

#[test]
fn test_manual_rename_path() {
    let registry = FilterRegistry::with_builtin();
    let mut pipeline = PipelineFile::from_json(rename_pipeline_json())
        .unwrap()
        .build(&registry)
        .unwrap();

    let rename = voxelpipe::data::PathRename::new(
        DataArrayPath::container("Image"),
        DataArrayPath::container("Volume"),
    );
    // RenameAttributeArray and ThresholdArray read paths; CreateDataArray
    // only creates one.
    assert_eq!(pipeline.rename_path(&rename), 2);
    assert_eq!(
        pipeline.filter(3).unwrap().parameter("input_array"),
        Some(ParameterValue::Path(DataArrayPath::new("Volume", "Cells", "Phases")))
    );
    assert_eq!(
        pipeline.filter(1).unwrap().parameter("created_array"),
        Some(ParameterValue::Path(DataArrayPath::new("Image", "Cells", "Phases")))
    );
}

#[test]
fn test_preflight_error_names_parameter() {
    let json = r#"{
        "name": "bad initial value",
        "filters": [
            { "filter": "CreateImageGeometry",
              "parameters": { "data_container": "Image", "cell_matrix": "Cells",
                              "dimensions": [2, 1, 1] } },
            { "filter": "CreateDataArray",
              "parameters": { "created_array": "Image|Cells|Phases",
                              "element_type": "u8", "initial_value": "-4" } }
        ]
    }"#;
    let registry = FilterRegistry::with_builtin();
    let mut pipeline = PipelineFile::from_json(json)
        .unwrap()
        .build(&registry)
        .unwrap();
    let (tx, rx) = message::channel();
    pipeline.set_observer(Some(tx));

    let err = pipeline.preflight_pipeline().unwrap_err();
    match &err {
        PipelineError::Fatal {
            label,
            index,
            property,
            ..
        } => {
            assert_eq!(label, "Create Data Array");
            assert_eq!(*index, 1);
            assert_eq!(property.as_deref(), Some("initial_value"));
        }
        other => panic!("expected a fatal error, got {:?}", other),
    }
    assert!(err.to_string().contains("parameter 'initial_value'"));

    let errors: Vec<_> = message::drain(&rx)
        .into_iter()
        .filter(|m| m.kind == MessageKind::Error)
        .collect();
    assert_eq!(errors[0].property.as_deref(), Some("initial_value"));
}

#[test]
fn test_rename_leaves_created_paths_alone() {
    let json = r#"{
        "name": "reuse renamed name",
        "filters": [
            { "filter": "CreateImageGeometry",
              "parameters": { "data_container": "Image", "cell_matrix": "Cells",
                              "dimensions": [2, 2, 1] } },
            { "filter": "CreateDataArray",
              "parameters": { "created_array": "Image|Cells|A",
                              "element_type": "u8", "initial_value": "1" } },
            { "filter": "RenameAttributeArray",
              "parameters": { "selected_array": "Image|Cells|A",
                              "new_array_name": "B" } },
            { "filter": "CreateDataArray",
              "parameters": { "created_array": "Image|Cells|A",
                              "element_type": "u8", "initial_value": "7" } }
        ]
    }"#;
    let registry = FilterRegistry::with_builtin();
    let mut pipeline = PipelineFile::from_json(json)
        .unwrap()
        .build(&registry)
        .unwrap();

    let dca = pipeline.run().unwrap();
    let a = dca
        .get_prereq_array::<u8>(&DataArrayPath::new("Image", "Cells", "A"), 1)
        .unwrap();
    let b = dca
        .get_prereq_array::<u8>(&DataArrayPath::new("Image", "Cells", "B"), 1)
        .unwrap();
    assert_eq!(a.as_slice(), &[7, 7, 7, 7]);
    assert_eq!(b.as_slice(), &[1, 1, 1, 1]);

    let saved = PipelineFile::from_pipeline(&pipeline);
    assert_eq!(
        saved.filters[3].parameters.get("created_array"),
        Some(&ParameterValue::Path(DataArrayPath::new("Image", "Cells", "A")))
    );
}

#[test]
fn test_pipeline_file_roundtrip_through_registry() {
    let registry = FilterRegistry::with_builtin();
    let original = PipelineFile::from_json(rename_pipeline_json()).unwrap();
    let mut first = original.build(&registry).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pipelines").join("rename.json");
    PipelineFile::from_pipeline(&first).save(&path).unwrap();

    let loaded = PipelineFile::load(&path).unwrap();
    assert_eq!(loaded.name, "rename broadcast");
    assert_eq!(loaded.filters.len(), 4);
    let mut second = loaded.build(&registry).unwrap();

    let a = first.run().unwrap();
    let b = second.run().unwrap();
    let mask = DataArrayPath::new("Image", "Cells", "Mask");
    assert_eq!(
        a.get_prereq_array::<bool>(&mask, 1).unwrap().as_slice(),
        b.get_prereq_array::<bool>(&mask, 1).unwrap().as_slice()
    );
}

#[test]
fn test_unknown_filter_in_file() {
    let registry = FilterRegistry::with_builtin();
    let file = PipelineFile::from_json(r#"{ "filters": [ { "filter": "Nope" } ] }"#).unwrap();
    assert!(matches!(
        file.build(&registry),
        Err(PipelineError::UnknownFilter(name)) if name == "Nope"
    ));
}

#[test]
fn test_feature_workflow_on_existing_data() {
    // Four features; feature 3 is the only one with volume 1 and gets removed.
    let mut dca = ImageBuilder::new([3, 2, 1])
        .cell_array("FeatureIds", vec![0i32, 1, 2, 2, 3, 1])
        .features(4)
        .build();
    dca.attribute_matrix_mut(&DataArrayPath::matrix("Image", "Features"))
        .unwrap()
        .add_attribute_array(voxelpipe::DataArray::from_vec(
            "Volume",
            vec![0.0f32, 2.0, 2.0, 1.0],
        ))
        .unwrap();

    let json = r#"{
        "filters": [
            { "filter": "ThresholdArray",
              "parameters": { "input_array": "Image|Features|Volume", "comparison": "==",
                              "value": 1.0, "output_array_name": "Small" } },
            { "filter": "RemoveFlaggedFeatures",
              "parameters": { "feature_ids": "Image|Cells|FeatureIds",
                              "flagged_features": "Image|Features|Small" } },
            { "filter": "CopyFeatureArrayToElementArray",
              "parameters": { "feature_ids": "Image|Cells|FeatureIds",
                              "selected_feature_array": "Image|Features|Volume",
                              "created_array_name": "CellVolume" } }
        ]
    }"#;
    let mut pipeline = PipelineFile::from_json(json)
        .unwrap()
        .build(&FilterRegistry::with_builtin())
        .unwrap();
    pipeline.execute_on(&mut dca).unwrap();

    let ids = dca
        .get_prereq_array::<i32>(&DataArrayPath::new("Image", "Cells", "FeatureIds"), 1)
        .unwrap();
    assert_eq!(ids.as_slice(), &[0, 1, 2, 2, 0, 1]);
    let volume = dca
        .get_prereq_array::<f32>(&DataArrayPath::new("Image", "Cells", "CellVolume"), 1)
        .unwrap();
    for (got, want) in volume.as_slice().iter().zip([0.0, 2.0, 2.0, 2.0, 0.0, 2.0]) {
        common::assert_float_eq(*got as f64, want, 1e-6);
    }
}
