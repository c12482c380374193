// 该文件是 Kuangxuan （框选） 项目的一部分。
// src/input/prediction_file.rs - 预测结果文件输入
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

use std::{fs::File, io::BufReader};

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  config::DEFAULT_INPUT_SIZE,
  error::PostprocessError,
  input::ImageSize,
  model::{CLASS_OFFSET, RawPrediction},
  url_path,
};

#[derive(Error, Debug)]
pub enum PredictionFileError {
  #[error("URI 方案不匹配: 期望 '{expected}', 实际 '{actual}'")]
  SchemeMismatch {
    expected: &'static str,
    actual: String,
  },
  #[error("路径解码错误: {0}")]
  PathError(#[from] std::string::FromUtf8Error),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 解析错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("图像 {image} 第 {row} 行长度为 {actual}, 期望 {expected}")]
  RaggedRow {
    image: String,
    row: usize,
    expected: usize,
    actual: usize,
  },
}

fn default_input_size() -> u32 {
  DEFAULT_INPUT_SIZE
}

/// 外部推理步骤导出的预测结果文件
///
/// ```json
/// { "input_size": 640, "num_classes": 80,
///   "images": [ { "name": "a.jpg", "width": 1280, "height": 720,
///                 "prediction": [[cx, cy, w, h, obj, c0, ...], ...] } ] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionDump {
  #[serde(default = "default_input_size")]
  pub input_size: u32,
  pub num_classes: usize,
  pub images: Vec<ImageRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
  #[serde(default)]
  pub name: Option<String>,
  pub width: u32,
  pub height: u32,
  pub prediction: Vec<Vec<f32>>,
}

/// 一张图像的尺寸与预测张量
#[derive(Debug, Clone)]
pub struct PredictionFrame {
  pub index: usize,
  pub size: ImageSize,
  num_classes: usize,
  data: Array2<f32>,
}

impl PredictionFrame {
  pub fn prediction(&self) -> Result<RawPrediction<'_>, PostprocessError> {
    RawPrediction::new(self.data.view(), self.num_classes)
  }
}

pub struct PredictionFileInput {
  input_size: u32,
  num_classes: usize,
  images: std::iter::Enumerate<std::vec::IntoIter<ImageRecord>>,
}

impl FromUrlWithScheme for PredictionFileInput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for PredictionFileInput {
  type Error = PredictionFileError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(PredictionFileError::SchemeMismatch {
        expected: Self::SCHEME,
        actual: url.scheme().to_string(),
      });
    }

    let path = url_path(url)?;
    info!("读取预测结果文件: {}", path);
    let reader = BufReader::new(File::open(&path)?);
    let dump: PredictionDump = serde_json::from_reader(reader)?;
    Ok(Self::from_dump(dump))
  }
}

impl PredictionFileInput {
  pub fn from_dump(dump: PredictionDump) -> Self {
    info!(
      "预测结果: {} 张图像, {} 个类别, 输入尺寸 {}",
      dump.images.len(),
      dump.num_classes,
      dump.input_size
    );
    PredictionFileInput {
      input_size: dump.input_size,
      num_classes: dump.num_classes,
      images: dump.images.into_iter().enumerate(),
    }
  }

  pub fn input_size(&self) -> u32 {
    self.input_size
  }

  pub fn num_classes(&self) -> usize {
    self.num_classes
  }
}

impl ImageRecord {
  fn into_frame(self, index: usize, num_classes: usize) -> Result<PredictionFrame, PredictionFileError> {
    let name = self.name.unwrap_or_else(|| format!("image-{}", index));
    let columns = CLASS_OFFSET + num_classes;

    let mut flat = Vec::with_capacity(self.prediction.len() * columns);
    for (row, values) in self.prediction.iter().enumerate() {
      if values.len() != columns {
        error!("图像 {} 第 {} 行长度不匹配", name, row);
        return Err(PredictionFileError::RaggedRow {
          image: name,
          row,
          expected: columns,
          actual: values.len(),
        });
      }
      flat.extend_from_slice(values);
    }

    let rows = self.prediction.len();
    let data = Array2::from_shape_vec((rows, columns), flat)
      .map_err(|_| PredictionFileError::RaggedRow {
        image: name.clone(),
        row: rows,
        expected: columns,
        actual: 0,
      })?;

    Ok(PredictionFrame {
      index,
      size: ImageSize {
        name,
        width: self.width,
        height: self.height,
      },
      num_classes,
      data,
    })
  }
}

impl Iterator for PredictionFileInput {
  type Item = Result<PredictionFrame, PredictionFileError>;

  fn next(&mut self) -> Option<Self::Item> {
    let num_classes = self.num_classes;
    self
      .images
      .next()
      .map(|(index, record)| record.into_frame(index, num_classes))
  }
}
