//! Element loading and saving tests
//!
//! Elements are stored as one YAML file each:
//! - `datasets/{name}.yaml`
//! - `groups/{name}.yaml`
//! - `unit-tests/{name}.yaml`
//! - `results/{unit test}/{run id}.yaml`

mod support;

use chrono::{Duration, Utc};
use data_testing_sdk::model::{ModelLoader, ModelSaver};
use data_testing_sdk::models::{
    DatabaseReplacement, FieldMapping, PipelineLocator, PipelineReference, SetLocation,
    TestRunRecord, TestTweak, TestType, TransUnitTest, UnitTestResult,
};
use data_testing_sdk::storage::{MemoryStorageBackend, StorageBackend};
use data_testing_sdk::testing::DataSetLookup;
use support::{golden_group, golden_out, runtime};
use uuid::Uuid;

fn full_unit_test() -> TransUnitTest {
    let reference = PipelineReference::filename("orders.hpl")
        .with(PipelineLocator::Id("42".to_string()));
    let mut test = TransUnitTest::new("orders/happy path", reference)
        .with_input(
            SetLocation::new("Read", "Customers")
                .with_mapping(FieldMapping::new("customer_id", "id"))
                .with_order_key("id"),
        )
        .with_golden(
            SetLocation::new("Output", "GoldenOut")
                .with_mapping(FieldMapping::identity("a"))
                .with_mapping(FieldMapping::identity("d").sorted(1)),
        )
        .with_tweak(TestTweak::bypass("Filter"))
        .with_database_replacement(DatabaseReplacement::new("prod", "test"))
        .with_test_type(TestType::Development);
    test.description = "Orders flow with a bypassed filter".to_string();
    test.persist_results = true;
    test
}

fn run_record(unit_test: &str, minutes_ago: i64, passed: bool) -> TestRunRecord {
    TestRunRecord {
        run_id: Uuid::new_v4(),
        unit_test_name: unit_test.to_string(),
        pipeline_name: "orders".to_string(),
        finished_at: Utc::now() - Duration::minutes(minutes_ago),
        passed,
        results: vec![UnitTestResult::passed(
            "orders",
            unit_test,
            "GoldenOut",
            "Output",
            "ok",
        )],
    }
}

#[test]
fn test_round_trip_in_memory() {
    runtime().block_on(async {
        let storage = MemoryStorageBackend::new();
        let saver = ModelSaver::new(&storage);
        let loader = ModelLoader::new(&storage);

        saver.save_group(&golden_group()).await.unwrap();
        saver.save_data_set(&golden_out()).await.unwrap();
        saver.save_unit_test(&full_unit_test()).await.unwrap();

        assert_eq!(
            loader.load_group("golden").await.unwrap(),
            Some(golden_group())
        );
        assert_eq!(
            loader.load_data_set("GoldenOut").await.unwrap(),
            Some(golden_out())
        );
        assert_eq!(
            loader.load_unit_test("orders/happy path").await.unwrap(),
            Some(full_unit_test())
        );
        assert!(storage
            .file_exists("unit-tests/orders%2Fhappy%20path.yaml")
            .await
            .unwrap());
    });
}

#[test]
fn test_load_catalog() {
    runtime().block_on(async {
        let storage = MemoryStorageBackend::new();
        let saver = ModelSaver::new(&storage);
        saver.save_group(&golden_group()).await.unwrap();
        saver.save_data_set(&golden_out()).await.unwrap();

        let catalog = ModelLoader::new(&storage).load_catalog().await.unwrap();
        assert_eq!(
            catalog.data_set("GoldenOut").await.unwrap(),
            Some(golden_out())
        );
        assert_eq!(catalog.group("golden").await.unwrap(), Some(golden_group()));
        assert!(catalog.data_set("Other").await.unwrap().is_none());
    });
}

#[test]
fn test_missing_elements_load_as_none() {
    runtime().block_on(async {
        let storage = MemoryStorageBackend::new();
        let loader = ModelLoader::new(&storage);

        assert!(loader.load_data_set("nope").await.unwrap().is_none());
        assert!(loader.list_groups().await.unwrap().is_empty());
    });
}

#[test]
fn test_broken_file_is_skipped_when_listing() {
    runtime().block_on(async {
        let storage = MemoryStorageBackend::new();
        let saver = ModelSaver::new(&storage);
        saver.save_data_set(&golden_out()).await.unwrap();
        storage
            .write_file("datasets/broken.yaml", b"name: [unclosed")
            .await
            .unwrap();
        storage
            .write_file("datasets/notes.txt", b"not an element")
            .await
            .unwrap();

        let loader = ModelLoader::new(&storage);
        let data_sets = loader.list_data_sets().await.unwrap();
        assert_eq!(data_sets.len(), 1);
        assert_eq!(data_sets[0].name, "GoldenOut");

        assert!(loader.load_data_set("broken").await.is_err());
    });
}

#[test]
fn test_similar_names_do_not_overwrite_each_other() {
    runtime().block_on(async {
        let storage = MemoryStorageBackend::new();
        let saver = ModelSaver::new(&storage);
        let reference = PipelineReference::filename("orders.hpl");
        saver
            .save_unit_test(&TransUnitTest::new("a/b", reference.clone()))
            .await
            .unwrap();
        saver
            .save_unit_test(&TransUnitTest::new("a_b", reference))
            .await
            .unwrap();

        let loader = ModelLoader::new(&storage);
        assert_eq!(loader.list_unit_tests().await.unwrap().len(), 2);
        assert_eq!(
            loader.load_unit_test("a/b").await.unwrap().map(|t| t.name),
            Some("a/b".to_string())
        );
    });
}

#[test]
fn test_delete_elements() {
    runtime().block_on(async {
        let storage = MemoryStorageBackend::new();
        let saver = ModelSaver::new(&storage);
        saver.save_group(&golden_group()).await.unwrap();
        saver.delete_group("golden").await.unwrap();

        let loader = ModelLoader::new(&storage);
        assert!(loader.load_group("golden").await.unwrap().is_none());
        assert!(saver.delete_group("golden").await.is_err());
    });
}

#[test]
fn test_find_unit_tests_for_pipeline() {
    runtime().block_on(async {
        let storage = MemoryStorageBackend::new();
        let saver = ModelSaver::new(&storage);
        saver.save_unit_test(&full_unit_test()).await.unwrap();
        saver
            .save_unit_test(&TransUnitTest::new(
                "other",
                PipelineReference::filename("billing.hpl"),
            ))
            .await
            .unwrap();

        let loader = ModelLoader::new(&storage);
        let by_id = loader.find_unit_tests_for_pipeline("42").await.unwrap();
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].name, "orders/happy path");
        assert_eq!(
            loader
                .find_unit_tests_for_pipeline("billing.hpl")
                .await
                .unwrap()
                .len(),
            1
        );
    });
}

#[test]
fn test_runs_listed_oldest_first() {
    runtime().block_on(async {
        let storage = MemoryStorageBackend::new();
        let saver = ModelSaver::new(&storage);
        let newest = run_record("happy", 1, true);
        let oldest = run_record("happy", 30, false);
        saver.save_run(&newest).await.unwrap();
        saver.save_run(&oldest).await.unwrap();
        saver.save_run(&run_record("other", 5, true)).await.unwrap();

        let runs = ModelLoader::new(&storage).list_runs("happy").await.unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].run_id, oldest.run_id);
        assert_eq!(runs[1], newest);
    });
}

#[cfg(feature = "native-fs")]
mod filesystem_tests {
    use super::*;
    use data_testing_sdk::storage::FileSystemStorageBackend;
    use tempfile::TempDir;

    #[test]
    fn test_round_trip_on_disk() {
        runtime().block_on(async {
            let temp = TempDir::new().unwrap();
            let saver = ModelSaver::new(FileSystemStorageBackend::new(temp.path()));
            saver.save_data_set(&golden_out()).await.unwrap();
            saver.save_unit_test(&full_unit_test()).await.unwrap();

            assert!(temp.path().join("datasets/GoldenOut.yaml").exists());

            let loader = ModelLoader::new(FileSystemStorageBackend::new(temp.path()));
            assert_eq!(
                loader.load_data_set("GoldenOut").await.unwrap(),
                Some(golden_out())
            );
            let tests = loader.list_unit_tests().await.unwrap();
            assert_eq!(tests, vec![full_unit_test()]);
        });
    }

    #[test]
    fn test_yaml_layout_is_readable() {
        runtime().block_on(async {
            let temp = TempDir::new().unwrap();
            let saver = ModelSaver::new(FileSystemStorageBackend::new(temp.path()));
            saver.save_data_set(&golden_out()).await.unwrap();

            let yaml = std::fs::read_to_string(temp.path().join("datasets/GoldenOut.yaml")).unwrap();
            assert!(yaml.contains("name: GoldenOut"));
            assert!(yaml.contains("field_type: INTEGER"));
            assert!(yaml.contains("column_name: COL_D"));
        });
    }
}
