// 该文件是 Kuangxuan （框选） 项目的一部分。
// src/output/json_lines.rs - JSON Lines 检测结果输出
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

use std::{
  fs::File,
  io::{BufWriter, Write},
  path::Path,
  sync::Mutex,
};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  geometry::Rect,
  input::ImageSize,
  label::Labels,
  model::DetectResult,
  output::Render,
  url_path,
};

#[derive(Error, Debug)]
pub enum JsonLinesOutputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("路径解码错误: {0}")]
  PathError(#[from] std::string::FromUtf8Error),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("输出文件锁已损坏")]
  Poisoned,
}

#[derive(Serialize)]
struct DetectionLine<'a> {
  class_id: u32,
  label: &'a str,
  score: f32,
  bbox: Rect,
}

#[derive(Serialize)]
struct ImageLine<'a> {
  image: &'a str,
  width: u32,
  height: u32,
  detections: Vec<DetectionLine<'a>>,
}

/// 每张图像写一行 JSON
pub struct JsonLinesOutput {
  writer: Mutex<BufWriter<File>>,
  labels: Labels,
}

impl FromUrlWithScheme for JsonLinesOutput {
  const SCHEME: &'static str = "jsonl";
}

impl FromUrl for JsonLinesOutput {
  type Error = JsonLinesOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(JsonLinesOutputError::SchemeMismatch(format!(
        "期望输出方式 '{}', 实际输出方式 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    let path = url_path(url)?;
    if let Some(parent) = Path::new(&path).parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    info!("检测结果写入: {}", path);
    Ok(JsonLinesOutput {
      writer: Mutex::new(BufWriter::new(File::create(&path)?)),
      labels: Labels::default(),
    })
  }
}

impl JsonLinesOutput {
  pub fn with_labels(mut self, labels: Labels) -> Self {
    self.labels = labels;
    self
  }
}

impl Render<ImageSize, DetectResult> for JsonLinesOutput {
  type Error = JsonLinesOutputError;

  fn render_result(&self, frame: &ImageSize, result: &DetectResult) -> Result<(), Self::Error> {
    let line = ImageLine {
      image: &frame.name,
      width: frame.width,
      height: frame.height,
      detections: result
        .iter()
        .map(|det| DetectionLine {
          class_id: det.class_id,
          label: self.labels.name(det.class_id),
          score: det.score,
          bbox: det.bbox,
        })
        .collect(),
    };

    let mut writer = self
      .writer
      .lock()
      .map_err(|_| JsonLinesOutputError::Poisoned)?;
    serde_json::to_writer(&mut *writer, &line)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    debug!("写入图像 {} 的 {} 个检测结果", frame.name, result.len());
    Ok(())
  }
}
