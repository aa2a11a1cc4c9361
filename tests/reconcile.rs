mod common;

use common::{temp_layout, write_corpus};
use rhonet::records;
use rhonet::train::reconcile::{
    self, PaddingPolicy, PersistedBatchParams, AUX_FIELD_OFFSET, TRAIN_BATCH_SIZE,
};
use rhonet::types::{ModelRecord, SCHEMA_VERSION};
use std::fs;

#[test]
fn padding_is_the_maximum_over_corpora_and_report() {
    let (_dir, layout) = temp_layout();
    write_corpus(&layout.train, vec![40, 1200, 7]);
    write_corpus(&layout.vali, vec![900]);
    write_corpus(&layout.test, vec![1500, 2]);
    fs::write(
        layout.window_report_file(),
        "chr1:0-1000 500 2 100 700.0 1400\n",
    )
    .unwrap();

    let padding = reconcile::reconcile(&layout, &PaddingPolicy::FromCorpora).unwrap();
    assert_eq!(padding, 1500);
}

#[test]
fn report_maximum_wins_when_corpora_are_smaller() {
    let (_dir, layout) = temp_layout();
    write_corpus(&layout.train, vec![40, 1200]);
    write_corpus(&layout.vali, vec![900]);
    write_corpus(&layout.test, vec![1300]);
    fs::write(
        layout.window_report_file(),
        "chr1:0-1000 500 2 100 700.0 1400\n",
    )
    .unwrap();

    let padding = reconcile::reconcile(&layout, &PaddingPolicy::FromCorpora).unwrap();
    assert_eq!(padding, 1400);
}

#[test]
fn pretrained_width_overrides_the_computed_maximum() {
    let (_dir, layout) = temp_layout();
    write_corpus(&layout.train, vec![1200]);
    write_corpus(&layout.vali, vec![900]);
    write_corpus(&layout.test, vec![1500]);
    fs::write(
        layout.window_report_file(),
        "chr1:0-1000 500 2 100 700.0 1400\n",
    )
    .unwrap();

    let pre_model = layout.pre_model_dir();
    fs::create_dir_all(&pre_model).unwrap();
    let record = ModelRecord {
        schema: SCHEMA_VERSION,
        name: "GRU_TUNED84".to_string(),
        input_width: 1800,
    };
    records::write_json(&pre_model.join("model.json"), &record).unwrap();

    let policy = reconcile::padding_policy(&layout, true).unwrap();
    assert_eq!(policy, PaddingPolicy::FromPretrained { input_width: 1800 });
    let padding = reconcile::reconcile(&layout, &policy).unwrap();
    assert_eq!(padding, 1800 - AUX_FIELD_OFFSET);
    assert_eq!(padding, 1790);
}

#[test]
fn fresh_runs_never_touch_the_pretrained_record() {
    let (_dir, layout) = temp_layout();
    // No pre_model directory exists; policy resolution must not need it.
    let policy = reconcile::padding_policy(&layout, false).unwrap();
    assert_eq!(policy, PaddingPolicy::FromCorpora);
}

#[test]
fn stale_pretrained_records_are_rejected() {
    let (_dir, layout) = temp_layout();
    let pre_model = layout.pre_model_dir();
    fs::create_dir_all(&pre_model).unwrap();
    let record = ModelRecord {
        schema: SCHEMA_VERSION + 3,
        name: "GRU_TUNED84".to_string(),
        input_width: 1800,
    };
    records::write_json(&pre_model.join("model.json"), &record).unwrap();
    assert!(reconcile::padding_policy(&layout, true).is_err());
}

#[test]
fn batch_configurations_differ_only_where_specified() {
    let (_dir, layout) = temp_layout();
    write_corpus(&layout.train, vec![500; 12]);
    write_corpus(&layout.vali, vec![480; 6]);
    write_corpus(&layout.test, vec![510; 7]);

    let batches = reconcile::assemble_batches(&layout, 1500, Some(17)).unwrap();

    assert_eq!(batches.train.batch_size, TRAIN_BATCH_SIZE);
    assert_eq!(batches.train.batch_size, 64);
    assert!(batches.train.shuffle_examples);
    assert_eq!(batches.vali.batch_size, 64);
    assert!(batches.vali.shuffle_examples);

    // The test corpus is evaluated in one full, deterministic batch.
    assert_eq!(batches.test.batch_size, 7);
    assert!(!batches.test.shuffle_examples);

    for config in [&batches.train, &batches.vali, &batches.test] {
        assert_eq!(config.padding, 1500);
        assert_eq!(config.seed, Some(17));
        assert_eq!(config.encoding, batches.train.encoding);
    }
    assert_eq!(batches.train.trees_dir, layout.train);
    assert_eq!(batches.vali.trees_dir, layout.vali);
    assert_eq!(batches.test.trees_dir, layout.test);
}

#[test]
fn the_train_configuration_is_persisted_for_bootstrap() {
    let (_dir, layout) = temp_layout();
    write_corpus(&layout.train, vec![100]);
    write_corpus(&layout.vali, vec![100]);
    write_corpus(&layout.test, vec![100, 200]);

    let batches = reconcile::assemble_batches(&layout, 900, None).unwrap();
    let record: PersistedBatchParams = records::read_json(&layout.batch_params_file()).unwrap();
    assert_eq!(record.schema, SCHEMA_VERSION);
    assert_eq!(record.padding, 900);
    assert_eq!(record.train, batches.train);
}
