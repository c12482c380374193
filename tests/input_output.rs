// 该文件是 Kuangxuan （框选） 项目的一部分。
// tests/input_output.rs - 输入输出集成测试
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::Path;

use kuangxuan::{
  FromUrl, PostprocessConfig, Postprocessor,
  geometry::Rect,
  input::{ImageSize, PredictionFileInput, PredictionFrame},
  label::{LabelError, Labels},
  model::{DetectResult, Detection},
  output::{OutputError, OutputWrapper, Render},
};
use tempfile::tempdir;
use url::Url;

fn url(scheme: &str, path: &Path) -> Url {
  Url::parse(&format!("{}://{}", scheme, path.display())).unwrap()
}

fn sample_result() -> DetectResult {
  DetectResult::from(vec![
    Detection {
      bbox: Rect {
        x: 540.0,
        y: 300.0,
        width: 200.0,
        height: 120.0,
      },
      score: 0.855,
      class_id: 0,
    },
    Detection {
      bbox: Rect {
        x: 10.0,
        y: 20.0,
        width: 30.0,
        height: 40.0,
      },
      score: 0.5,
      class_id: 2,
    },
  ])
}

fn frame() -> ImageSize {
  ImageSize {
    name: "street.jpg".to_string(),
    width: 1280,
    height: 720,
  }
}

#[test]
fn prediction_dump_runs_through_postprocessor() {
  let dir = tempdir().unwrap();
  let path = dir.path().join("predictions.json");
  std::fs::write(
    &path,
    r#"{
      "input_size": 640,
      "num_classes": 3,
      "images": [
        { "name": "street.jpg", "width": 1280, "height": 720,
          "prediction": [
            [320, 320, 100, 60, 0.9, 0.0, 0.95, 0.0],
            [322, 320, 100, 60, 0.9, 0.0, 0.90, 0.0],
            [100, 100, 20, 20, 0.2, 0.9, 0.0, 0.0]
          ] },
        { "width": 640, "height": 480, "prediction": [] }
      ]
    }"#,
  )
  .unwrap();

  let input = PredictionFileInput::from_url(&url("json", &path)).unwrap();
  assert_eq!(input.input_size(), 640);
  assert_eq!(input.num_classes(), 3);

  let frames: Vec<PredictionFrame> = input.collect::<Result<_, _>>().unwrap();
  assert_eq!(frames.len(), 2);
  assert_eq!(frames[1].size.name, "image-1");

  let postprocessor = Postprocessor::new(PostprocessConfig::default()).unwrap();
  let params: Vec<_> = frames
    .iter()
    .map(|frame| frame.size.letterbox(640).unwrap())
    .collect();
  let predictions: Vec<_> = frames
    .iter()
    .map(|frame| frame.prediction().unwrap())
    .collect();
  let results = postprocessor.process_batch(&params, &predictions).unwrap();

  assert_eq!(results[0].len(), 1);
  assert_eq!(results[0].items[0].class_id, 1);
  assert_eq!(results[0].items[0].bbox.center(), (640.0, 360.0));
  assert!(results[1].is_empty());
}

#[test]
fn missing_prediction_file_is_an_io_error() {
  let dir = tempdir().unwrap();
  let result = PredictionFileInput::from_url(&url("json", &dir.path().join("missing.json")));
  assert!(result.is_err());
}

#[test]
fn json_lines_output_writes_one_line_per_image() {
  let dir = tempdir().unwrap();
  let path = dir.path().join("out").join("detections.jsonl");

  let output = OutputWrapper::from_url(&url("jsonl", &path)).unwrap();
  output.render_result(&frame(), &sample_result()).unwrap();
  output
    .render_result(
      &ImageSize {
        name: "empty.jpg".to_string(),
        width: 10,
        height: 10,
      },
      &DetectResult::default(),
    )
    .unwrap();

  let text = std::fs::read_to_string(&path).unwrap();
  let lines: Vec<serde_json::Value> = text
    .lines()
    .map(|line| serde_json::from_str(line).unwrap())
    .collect();
  assert_eq!(lines.len(), 2);

  assert_eq!(lines[0]["image"], "street.jpg");
  assert_eq!(lines[0]["width"], 1280);
  assert_eq!(lines[0]["detections"][0]["label"], "person");
  assert_eq!(lines[0]["detections"][1]["label"], "car");
  assert_eq!(lines[0]["detections"][0]["bbox"]["width"], 200.0);
  assert_eq!(lines[1]["detections"].as_array().unwrap().len(), 0);
}

#[test]
fn record_output_uses_label_names_or_ids() {
  let dir = tempdir().unwrap();
  let labels = Labels::parse("cat\ndog\nbird\n");

  let by_name = OutputWrapper::from_url(&url("record", &dir.path().join("names")))
    .unwrap()
    .with_labels(labels.clone());
  by_name.render_result(&frame(), &sample_result()).unwrap();

  let text = std::fs::read_to_string(dir.path().join("names").join("street.txt")).unwrap();
  let lines: Vec<&str> = text.lines().collect();
  assert_eq!(
    lines,
    vec![
      "cat, 0.8550, 540.0000, 300.0000, 200.0000, 120.0000",
      "bird, 0.5000, 10.0000, 20.0000, 30.0000, 40.0000",
    ]
  );

  let ids_url = Url::parse(&format!(
    "record://{}?record=id",
    dir.path().join("ids").display()
  ))
  .unwrap();
  let by_id = OutputWrapper::from_url(&ids_url).unwrap().with_labels(labels);
  by_id.render_result(&frame(), &sample_result()).unwrap();

  let text = std::fs::read_to_string(dir.path().join("ids").join("street.txt")).unwrap();
  assert!(text.starts_with("0, 0.8550"));
  assert!(text.lines().nth(1).unwrap().starts_with("2, 0.5000"));
}

#[test]
fn log_output_accepts_any_result() {
  let output = OutputWrapper::from_url(&Url::parse("log://").unwrap())
    .unwrap()
    .with_labels(Labels::parse("cat\ndog\nbird\n"));
  assert!(matches!(output, OutputWrapper::Log(_)));
  output.render_result(&frame(), &sample_result()).unwrap();
  output
    .render_result(&frame(), &DetectResult::default())
    .unwrap();
}

#[test]
fn unknown_output_scheme_is_rejected() {
  let result = OutputWrapper::from_url(&Url::parse("rtsp://localhost/stream").unwrap());
  assert!(matches!(result, Err(OutputError::SchemeMismatch(scheme)) if scheme == "rtsp"));
}

#[test]
fn labels_file_is_read_line_by_line() {
  let dir = tempdir().unwrap();
  let path = dir.path().join("names.txt");
  std::fs::write(&path, "person\nbicycle\r\ncar\n").unwrap();

  let labels = Labels::from_file(&path).unwrap();
  assert_eq!(labels.len(), 3);
  assert_eq!(labels.name(1), "bicycle");
  assert_eq!(labels.name(3), "unknown");

  let empty = dir.path().join("empty.txt");
  std::fs::write(&empty, "").unwrap();
  assert!(matches!(Labels::from_file(&empty), Err(LabelError::Empty(_))));
}

#[cfg(feature = "read_image_file")]
#[test]
fn image_probe_reads_dimensions_only() {
  use kuangxuan::input::ImageFileInput;

  let dir = tempdir().unwrap();
  let path = dir.path().join("probe.png");
  image::RgbImage::new(37, 21).save(&path).unwrap();

  let sizes: Vec<ImageSize> = ImageFileInput::from_url(&url("image", &path))
    .unwrap()
    .collect();
  assert_eq!(
    sizes,
    vec![ImageSize {
      name: "probe.png".to_string(),
      width: 37,
      height: 21,
    }]
  );

  let params = sizes[0].letterbox(640).unwrap();
  assert_eq!(params.original_size, (37, 21));
}
