//! End-to-end pipeline tests.
//!
//! Tests verify:
//! - Raw and cleaned artifacts are written with the expected names and formats
//! - The raw artifact covers every registry name, with null for absent tags
//! - The cleaned artifact drops absent keys and canonicalizes quantities
//! - Instrument keys take precedence over standard tags
//! - Halting errors write nothing

use std::path::Path;

use serde_json::Value;

use semmeta::{
    MetadataRecord, MetadataValue, Pipeline, PipelineConfig, PipelineError, TagRegistry,
};

use super::test_utils::{
    create_sem_tiff, instrument_lines, write_file, ByteOrderType, SemTiffBuilder,
};

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn read_record(path: &Path) -> MetadataRecord {
    MetadataRecord::from_json(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn text(s: &str) -> MetadataValue {
    MetadataValue::Text(s.to_string())
}

// =============================================================================
// Artifacts
// =============================================================================

#[tokio::test]
async fn test_full_run_writes_both_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_file(
        dir.path(),
        "sample.tif",
        &create_sem_tiff(ByteOrderType::LittleEndian),
    );
    let out = dir.path().join("output");
    std::fs::create_dir(&out).unwrap();

    let pipeline = Pipeline::new(PipelineConfig::new(&out));
    let output = pipeline.run(&image).await.unwrap();

    assert_eq!(output.raw_path, out.join("sample_raw.json"));
    assert_eq!(output.cleaned_path, out.join("sample_cleaned.json"));
    assert!(output.raw_path.exists());
    assert!(output.cleaned_path.exists());
    assert_eq!(output.instrument_pairs, 8);
    assert!(output.standard_tags_found >= 10);

    // Raw is compact, cleaned is indented by two spaces
    let raw_text = std::fs::read_to_string(&output.raw_path).unwrap();
    assert!(!raw_text.contains('\n'));
    let cleaned_text = std::fs::read_to_string(&output.cleaned_path).unwrap();
    assert!(cleaned_text.starts_with("{\n  \""));

    let cleaned = read_record(&output.cleaned_path);
    assert_eq!(output.cleaned_keys, cleaned.len());
}

#[tokio::test]
async fn test_raw_artifact_covers_every_registry_name() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_file(
        dir.path(),
        "sample.tif",
        &create_sem_tiff(ByteOrderType::BigEndian),
    );

    let output = Pipeline::new(PipelineConfig::new(dir.path()))
        .run(&image)
        .await
        .unwrap();
    let raw = read_json(&output.raw_path);
    let raw = raw.as_object().unwrap();

    let registry = TagRegistry::standard();
    for name in registry.names().filter(|n| *n != "ColorMap") {
        assert!(raw.contains_key(name), "raw artifact lacks {name}");
    }
    assert!(!raw.contains_key("ColorMap"));

    // Absent tags are null, present ones carry values
    assert_eq!(raw["Artist"], Value::Null);
    assert_eq!(raw["Make"], Value::String("Carl Zeiss".into()));
    assert_eq!(raw["ImageWidth"], Value::from(16));
    assert_eq!(raw["XResolution"], Value::from(72.0));

    // Instrument values are stored verbatim before cleaning
    assert_eq!(raw["AP_WD"], Value::String("WD =  3.18 mm".into()));
}

#[tokio::test]
async fn test_cleaned_artifact_is_normalized() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_file(
        dir.path(),
        "sample.tif",
        &create_sem_tiff(ByteOrderType::LittleEndian),
    );

    let output = Pipeline::new(PipelineConfig::new(dir.path()))
        .run(&image)
        .await
        .unwrap();
    let cleaned = read_record(&output.cleaned_path);

    assert_eq!(cleaned.get("AP_WD"), Some(&text("3.18 mm")));
    assert_eq!(cleaned.get("AP_BEAM_CURRENT"), Some(&text("100 pA")));
    assert_eq!(cleaned.get("AP_HOLDER_DIAMETER"), Some(&text("12.5 mm")));
    // Signed values pass through verbatim
    assert_eq!(cleaned.get("AP_STAGE_AT_T"), Some(&text("Stage at T = -12.5 deg")));
    // No quantity: unchanged
    assert_eq!(cleaned.get("Make"), Some(&text("Carl Zeiss")));
    assert_eq!(cleaned.get("ImageWidth"), Some(&MetadataValue::Integer(16)));

    // Absent keys are omitted entirely
    assert!(!cleaned.contains_key("Artist"));
    assert!(cleaned.iter().all(|(_, v)| !v.is_absent()));
}

#[tokio::test]
async fn test_cleaning_is_idempotent_on_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_file(
        dir.path(),
        "sample.tif",
        &create_sem_tiff(ByteOrderType::LittleEndian),
    );

    let output = Pipeline::new(PipelineConfig::new(dir.path()))
        .run(&image)
        .await
        .unwrap();
    let cleaned = read_record(&output.cleaned_path);
    assert_eq!(semmeta::clean_record(&cleaned), cleaned);
}

// =============================================================================
// Instrument block
// =============================================================================

#[tokio::test]
async fn test_image_without_instrument_block() {
    let dir = tempfile::tempdir().unwrap();
    let data = SemTiffBuilder::new()
        .grayscale_image(4, 4)
        .ascii(271, "JEOL")
        .build();
    let image = write_file(dir.path(), "plain.tif", &data);

    let output = Pipeline::new(PipelineConfig::new(dir.path()))
        .run(&image)
        .await
        .unwrap();

    assert_eq!(output.instrument_pairs, 0);
    let cleaned = read_record(&output.cleaned_path);
    assert_eq!(cleaned.get("Make"), Some(&text("JEOL")));
    assert!(cleaned.keys().all(|k| !k.starts_with("AP_")));
}

#[tokio::test]
async fn test_trailing_unpaired_line_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let mut lines = instrument_lines(&[]);
    lines.push("VoltageOnly".to_string());
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();

    let data = SemTiffBuilder::new()
        .grayscale_image(4, 4)
        .instrument_block(&lines)
        .build();
    let image = write_file(dir.path(), "odd.tif", &data);

    let output = Pipeline::new(PipelineConfig::new(dir.path()))
        .run(&image)
        .await
        .unwrap();

    assert_eq!(output.instrument_pairs, 0);
    let raw = read_record(&output.raw_path);
    assert!(!raw.contains_key("VoltageOnly"));
}

#[tokio::test]
async fn test_instrument_keys_take_precedence() {
    let dir = tempfile::tempdir().unwrap();
    let lines = instrument_lines(&[("Software", "Software = SmartSEM 6.0")]);
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();

    let data = SemTiffBuilder::new()
        .grayscale_image(4, 4)
        .ascii(305, "Generic Writer")
        .instrument_block(&lines)
        .build();
    let image = write_file(dir.path(), "collide.tif", &data);

    let output = Pipeline::new(PipelineConfig::new(dir.path()))
        .run(&image)
        .await
        .unwrap();

    let raw = read_record(&output.raw_path);
    assert_eq!(raw.get("Software"), Some(&text("Software = SmartSEM 6.0")));
    // A number with no unit after it is not a quantity
    let cleaned = read_record(&output.cleaned_path);
    assert_eq!(cleaned.get("Software"), Some(&text("Software = SmartSEM 6.0")));
}

#[tokio::test]
async fn test_non_text_instrument_block_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let data = SemTiffBuilder::new()
        .grayscale_image(4, 4)
        .ascii(271, "Carl Zeiss")
        .long(34118, &[1, 2, 3])
        .build();
    let image = write_file(dir.path(), "numeric.tif", &data);

    let output = Pipeline::new(PipelineConfig::new(dir.path()))
        .run(&image)
        .await
        .unwrap();

    assert_eq!(output.instrument_pairs, 0);
    let cleaned = read_record(&output.cleaned_path);
    assert_eq!(cleaned.get("Make"), Some(&text("Carl Zeiss")));
}

#[tokio::test]
async fn test_custom_header_lines() {
    let dir = tempfile::tempdir().unwrap();
    let data = SemTiffBuilder::new()
        .grayscale_image(4, 4)
        .instrument_block(&["banner", "AP_WD", "WD = 7 mm"])
        .build();
    let image = write_file(dir.path(), "short.tif", &data);

    let mut config = PipelineConfig::new(dir.path());
    config.header_lines = 1;
    let output = Pipeline::new(config).run(&image).await.unwrap();

    assert_eq!(output.instrument_pairs, 1);
    let cleaned = read_record(&output.cleaned_path);
    assert_eq!(cleaned.get("AP_WD"), Some(&text("7 mm")));
}

// =============================================================================
// Halting errors
// =============================================================================

#[tokio::test]
async fn test_unsupported_format_writes_no_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_file(
        dir.path(),
        "photo.png",
        &create_sem_tiff(ByteOrderType::LittleEndian),
    );
    let out = dir.path().join("output");
    std::fs::create_dir(&out).unwrap();

    let result = Pipeline::new(PipelineConfig::new(&out)).run(&image).await;
    assert!(matches!(result, Err(PipelineError::UnsupportedFormat { .. })));
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
}

#[tokio::test]
async fn test_missing_output_dir_is_output_error() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_file(
        dir.path(),
        "sample.tif",
        &create_sem_tiff(ByteOrderType::LittleEndian),
    );

    let result = Pipeline::new(PipelineConfig::new(dir.path().join("missing")))
        .run(&image)
        .await;
    assert!(matches!(result, Err(PipelineError::Output { .. })));
}
