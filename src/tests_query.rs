#[cfg(test)]
mod tests {
    use crate::testutil::RecordingFixture;
    use crate::types::{DataCell, EntityPath, TensorData};
    use crate::{
        ComponentFilter, PathFilter, Recording, list_entity_paths, query_action_entities,
        query_data_entities, query_meta_entities,
    };
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// A small recording with mixed component tags, two chunks for the
    /// gripper entity, a multi-timeline chunk, and a text annotation.
    fn sample_fixture() -> RecordingFixture {
        RecordingFixture::new()
            .chunk("/a/gripper", &["action", "tensor"], 3)
            .timeline("log_time", &[1, 2, 3])
            .tensors(
                "data",
                &[
                    (&[2], &[0.1, 0.2]),
                    (&[2], &[0.3, 0.4]),
                    (&[2], &[0.5, 0.6]),
                ],
            )
            .chunk("/a/camera", &["tensor"], 2)
            .timeline("log_time", &[10, 20])
            .tensors("data", &[(&[1], &[9.0]), (&[1], &[8.0])])
            .chunk("/a/joint", &["scalar"], 2)
            .timeline("log_time", &[5, 6])
            .timeline("sim_time", &[50, 60])
            .scalars("data", &[0.5, 0.6])
            .chunk("/notes", &["text"], 2)
            .timeline("log_time", &[1, 2])
            .texts("text", &["episode start", "episode end"])
            .texts("media_type", &["text/markdown", ""])
            .chunk("/a/gripper", &["action", "scalar"], 2)
            .timeline("log_time", &[4, 5])
            .scalars("data", &[0.7, 0.8])
    }

    fn write_sample(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("sample.rrq");
        sample_fixture().write_to(&path).expect("write fixture");
        path
    }

    #[test]
    fn entity_paths_are_unique_and_in_file_order() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_sample(&dir);
        let paths = list_entity_paths(&path).expect("list");
        let rendered: Vec<String> = paths.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["/a/gripper", "/a/camera", "/a/joint", "/notes"]);
    }

    #[test]
    fn action_query_aggregates_gripper_chunks() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_sample(&dir);
        let recording = Recording::open(&path).expect("open");

        let response = recording.query_actions(&PathFilter::All).expect("query");
        assert!(response.skipped.is_empty());
        assert_eq!(response.chunks.len(), 1, "only the gripper carries actions");

        let gripper = &response.chunks[0];
        assert_eq!(gripper.entity_path.to_string(), "/a/gripper");
        // Two chunks concatenated in file order: 3 tensor rows then 2 scalars.
        assert_eq!(gripper.data.len(), 5);
        assert_eq!(gripper.timelines["log_time"], vec![1, 2, 3, 4, 5]);
        assert_eq!(
            gripper.data[0],
            DataCell::Tensor(TensorData {
                shape: vec![2],
                values: vec![0.1, 0.2],
            })
        );
        assert_eq!(gripper.data[3], DataCell::Scalar(0.7));
    }

    #[test]
    fn timelines_and_data_have_matching_lengths() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_sample(&dir);
        let recording = Recording::open(&path).expect("open");

        let response = recording
            .query_data(&ComponentFilter::All, &PathFilter::All)
            .expect("query");
        for chunk in &response.chunks {
            for (name, timestamps) in &chunk.timelines {
                assert_eq!(
                    timestamps.len(),
                    chunk.data.len(),
                    "timeline {name} of {} out of step",
                    chunk.entity_path
                );
            }
        }
    }

    #[test]
    fn multiple_timelines_are_unioned_by_name() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_sample(&dir);
        let recording = Recording::open(&path).expect("open");

        let response = recording
            .query_data(&ComponentFilter::new("scalar"), &PathFilter::new("/a/joint"))
            .expect("query");
        let joint = response
            .entity(&EntityPath::parse("/a/joint"))
            .expect("joint present");
        assert_eq!(joint.timelines.len(), 2);
        assert_eq!(joint.timelines["log_time"], vec![5, 6]);
        assert_eq!(joint.timelines["sim_time"], vec![50, 60]);
    }

    #[test]
    fn component_filter_narrows_without_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_sample(&dir);
        let recording = Recording::open(&path).expect("open");

        let tensors = recording
            .query_data(&ComponentFilter::new("tensor"), &PathFilter::All)
            .expect("query");
        let tensor_paths: Vec<String> = tensors
            .chunks
            .iter()
            .map(|c| c.entity_path.to_string())
            .collect();
        assert_eq!(tensor_paths, ["/a/gripper", "/a/camera"]);

        // A filter matching nothing is an empty success.
        let none = recording
            .query_data(&ComponentFilter::new("imu"), &PathFilter::All)
            .expect("query");
        assert!(none.chunks.is_empty());
        assert!(none.skipped.is_empty());
    }

    #[test]
    fn unfiltered_results_are_a_superset_of_filtered() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_sample(&dir);
        let recording = Recording::open(&path).expect("open");

        let all = recording
            .query_data(&ComponentFilter::All, &PathFilter::All)
            .expect("query");
        let actions = recording.query_actions(&PathFilter::All).expect("query");
        for chunk in &actions.chunks {
            let superset = all.entity(&chunk.entity_path).expect("entity in superset");
            assert!(superset.data.len() >= chunk.data.len());
        }
    }

    #[test]
    fn queries_are_idempotent() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_sample(&dir);
        let recording = Recording::open(&path).expect("open");

        let filter = PathFilter::new("gripper");
        let first = recording.query_actions(&filter).expect("query");
        let second = recording.query_actions(&filter).expect("query");
        assert_eq!(first, second);
    }

    #[test]
    fn action_query_equals_data_query_with_action_tag() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_sample(&dir);
        let recording = Recording::open(&path).expect("open");

        let actions = recording.query_actions(&PathFilter::All).expect("query");
        let data = recording
            .query_data(&ComponentFilter::new("action"), &PathFilter::All)
            .expect("query");
        assert_eq!(actions, data);
    }

    #[test]
    fn substring_path_pattern_selects_one_entity() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_sample(&dir);
        let response = query_data_entities(&path, "", "gripper").expect("query");
        assert_eq!(response.chunks.len(), 1);
        assert_eq!(response.chunks[0].entity_path.to_string(), "/a/gripper");
    }

    #[test]
    fn meta_query_returns_annotations_with_media_type() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_sample(&dir);
        let response = query_meta_entities(&path, "").expect("query");
        assert!(response.skipped.is_empty());
        assert_eq!(response.chunks.len(), 2);
        assert_eq!(response.chunks[0].entity_path.to_string(), "/notes");
        assert_eq!(response.chunks[0].text, "episode start");
        assert_eq!(
            response.chunks[0].media_type.as_deref(),
            Some("text/markdown")
        );
        // An empty media type reads back as absent.
        assert_eq!(response.chunks[1].media_type, None);

        let none = query_meta_entities(&path, "gripper").expect("query");
        assert!(none.is_empty());
    }

    #[test]
    fn empty_container_lists_and_queries_cleanly() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("empty.rrq");
        RecordingFixture::new().write_to(&path).expect("write");

        let recording = Recording::open(&path).expect("open");
        assert!(recording.entity_paths().is_empty());
        let data = recording
            .query_data(&ComponentFilter::All, &PathFilter::All)
            .expect("query");
        assert!(data.chunks.is_empty() && data.skipped.is_empty());
        assert!(recording.query_meta(&PathFilter::All).expect("query").is_empty());
    }

    #[test]
    fn corrupt_chunk_is_skipped_and_reported() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("corrupt.rrq");
        let mut bytes = sample_fixture().to_bytes();
        // Damage the first chunk's first column (the payload starts at 64).
        bytes[64] ^= 0xFF;
        std::fs::write(&path, bytes).expect("write");

        let recording = Recording::open(&path).expect("open");
        let response = recording
            .query_data(&ComponentFilter::All, &PathFilter::All)
            .expect("query");

        assert_eq!(response.skipped.len(), 1);
        assert_eq!(response.skipped[0].ordinal, 0);
        assert_eq!(response.skipped[0].entity_path.to_string(), "/a/gripper");

        // The rest of the container still decodes, including the gripper's
        // healthy second chunk.
        let gripper = response
            .entity(&EntityPath::parse("/a/gripper"))
            .expect("gripper present");
        assert_eq!(gripper.data, vec![DataCell::Scalar(0.7), DataCell::Scalar(0.8)]);
        assert!(response.entity(&EntityPath::parse("/a/camera")).is_some());
        assert!(response.entity(&EntityPath::parse("/a/joint")).is_some());
    }

    #[test]
    fn unknown_encoding_tag_skips_only_that_chunk() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("tagged.rrq");
        RecordingFixture::new()
            .chunk("/future", &["scalar"], 1)
            .timeline("log_time", &[1])
            .raw_column("data", 250, 0, &[0u8; 8])
            .chunk("/a", &["scalar"], 1)
            .timeline("log_time", &[2])
            .scalars("data", &[1.0])
            .write_to(&path)
            .expect("write");

        let response = query_data_entities(&path, "", "").expect("query");
        assert_eq!(response.skipped.len(), 1);
        assert!(response.skipped[0].error.to_string().contains("250"));
        assert_eq!(response.chunks.len(), 1);
        assert_eq!(response.chunks[0].entity_path.to_string(), "/a");
    }

    #[test]
    fn lz4_column_decodes_identically_to_plain() {
        let dir = TempDir::new().expect("tempdir");
        let values = [1.0, 2.5, -3.25, 4.0];

        let plain = dir.path().join("plain.rrq");
        RecordingFixture::new()
            .chunk("/a", &["scalar"], 4)
            .timeline("log_time", &[1, 2, 3, 4])
            .scalars("data", &values)
            .write_to(&plain)
            .expect("write");

        let packed = dir.path().join("packed.rrq");
        RecordingFixture::new()
            .chunk("/a", &["scalar"], 4)
            .timeline("log_time", &[1, 2, 3, 4])
            .scalars("data", &values)
            .last_column_lz4()
            .write_to(&packed)
            .expect("write");

        let from_plain = query_data_entities(&plain, "", "").expect("query");
        let from_packed = query_data_entities(&packed, "", "").expect("query");
        assert_eq!(from_plain, from_packed);
    }

    #[test]
    fn multi_column_chunk_yields_composite_rows() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("composite.rrq");
        RecordingFixture::new()
            .chunk("/pose", &["scalar"], 2)
            .timeline("log_time", &[1, 2])
            .scalars("x", &[1.0, 2.0])
            .scalars("y", &[10.0, 20.0])
            .write_to(&path)
            .expect("write");

        let response = query_data_entities(&path, "", "").expect("query");
        let pose = &response.chunks[0];
        assert_eq!(
            pose.data[0],
            DataCell::Composite(vec![DataCell::Scalar(1.0), DataCell::Scalar(10.0)])
        );
        assert_eq!(
            pose.data[1],
            DataCell::Composite(vec![DataCell::Scalar(2.0), DataCell::Scalar(20.0)])
        );
    }

    #[test]
    fn action_free_function_matches_method() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_sample(&dir);
        let recording = Recording::open(&path).expect("open");

        let via_fn = query_action_entities(&path, "").expect("query");
        let via_method = recording.query_actions(&PathFilter::All).expect("query");
        assert_eq!(via_fn, via_method);
    }

    #[test]
    fn timeless_chunk_yields_empty_timelines() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("timeless.rrq");
        RecordingFixture::new()
            .chunk("/static", &["scalar"], 2)
            .scalars("data", &[1.0, 2.0])
            .write_to(&path)
            .expect("write");

        let response = query_data_entities(&path, "", "").expect("query");
        let chunk = &response.chunks[0];
        assert!(chunk.timelines.is_empty());
        assert_eq!(chunk.data.len(), 2);
    }

    #[test]
    fn meta_rows_are_grouped_by_entity() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("meta.rrq");
        // Text chunks for /a and /b interleave in file order.
        RecordingFixture::new()
            .chunk("/a", &["text"], 1)
            .texts("text", &["a one"])
            .chunk("/b", &["text"], 1)
            .texts("text", &["b one"])
            .chunk("/a", &["text"], 1)
            .texts("text", &["a two"])
            .write_to(&path)
            .expect("write");

        let response = query_meta_entities(&path, "").expect("query");
        let texts: Vec<&str> = response.chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["a one", "a two", "b one"]);
    }

    #[test]
    fn randomized_scalars_survive_storage_and_query() {
        fastrand::seed(7);
        let values: Vec<f64> = (0..256).map(|_| fastrand::f64() * 100.0 - 50.0).collect();
        let timestamps: Vec<i64> = (0..256).collect();

        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("random.rrq");
        RecordingFixture::new()
            .chunk("/signal", &["scalar"], 256)
            .timeline("log_time", &timestamps)
            .scalars("data", &values)
            .write_to(&path)
            .expect("write");

        let response = query_data_entities(&path, "scalar", "").expect("query");
        let signal = &response.chunks[0];
        assert_eq!(signal.timelines["log_time"], timestamps);
        let decoded: Vec<f64> = signal
            .data
            .iter()
            .map(|cell| match cell {
                DataCell::Scalar(value) => *value,
                other => panic!("expected scalar, got {other:?}"),
            })
            .collect();
        assert_eq!(decoded, values);
    }

    #[cfg(feature = "parallel_decode")]
    #[test]
    fn parallel_decode_matches_sequential_order() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_sample(&dir);

        let mut recording = Recording::open(&path).expect("open");
        recording.set_decode_workers(1);
        let sequential = recording
            .query_data(&ComponentFilter::All, &PathFilter::All)
            .expect("query");

        recording.set_decode_workers(4);
        let parallel = recording
            .query_data(&ComponentFilter::All, &PathFilter::All)
            .expect("query");

        assert_eq!(sequential, parallel);
    }
}
