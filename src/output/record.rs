// 该文件是 Kuangxuan （框选） 项目的一部分。
// src/output/record.rs - 文本记录输出
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

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme, input::ImageSize, label::Labels, model::DetectResult,
  output::Render, url_path,
};

#[derive(Error, Debug)]
pub enum RecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("路径解码错误: {0}")]
  PathError(#[from] std::string::FromUtf8Error),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 每张图像在目录下写一个同名 `.txt` 文件
///
/// 每行一个检测：`名称, 分数, x, y, 宽, 高`。
/// URL 带 `?record=id` 时用类别号代替名称。
pub struct RecordOutput {
  directory: PathBuf,
  label_with_name: bool,
  labels: Labels,
}

impl FromUrlWithScheme for RecordOutput {
  const SCHEME: &'static str = "record";
}

impl FromUrl for RecordOutput {
  type Error = RecordOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(RecordOutputError::SchemeMismatch);
    }

    let label_with_name = !uri
      .query_pairs()
      .any(|(k, v)| k == "record" && v == "id");

    let directory = PathBuf::from(url_path(uri)?);
    std::fs::create_dir_all(&directory)?;

    Ok(RecordOutput {
      directory,
      label_with_name,
      labels: Labels::default(),
    })
  }
}

impl RecordOutput {
  pub fn with_labels(mut self, labels: Labels) -> Self {
    self.labels = labels;
    self
  }

  fn record_path(&self, name: &str) -> PathBuf {
    let stem = Path::new(name)
      .file_stem()
      .map(|stem| stem.to_string_lossy().into_owned())
      .unwrap_or_else(|| name.to_string());
    self.directory.join(format!("{}.txt", stem))
  }

  fn format_records(&self, result: &DetectResult) -> String {
    let mut records = Vec::with_capacity(result.len());
    for det in result {
      let name = if self.label_with_name {
        self.labels.name(det.class_id).to_string()
      } else {
        det.class_id.to_string()
      };
      records.push(format!(
        "{}, {:.4}, {:.4}, {:.4}, {:.4}, {:.4}",
        name, det.score, det.bbox.x, det.bbox.y, det.bbox.width, det.bbox.height
      ));
    }
    records.join("\n")
  }
}

impl Render<ImageSize, DetectResult> for RecordOutput {
  type Error = RecordOutputError;

  fn render_result(&self, frame: &ImageSize, result: &DetectResult) -> Result<(), Self::Error> {
    let path = self.record_path(&frame.name);
    std::fs::write(&path, self.format_records(result))?;
    debug!("记录写入: {}", path.display());
    Ok(())
  }
}
