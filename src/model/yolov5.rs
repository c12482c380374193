// 该文件是 Kuangxuan （框选） 项目的一部分。
// src/model/yolov5.rs - YOLOv5 输出解码
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

use ndarray::{ArrayView3, Axis};
use tracing::{debug, error};

use crate::{
  config::check_threshold,
  error::PostprocessError,
  geometry::xywh_to_xyxy,
  model::{CLASS_OFFSET, DetectItem, OBJECTNESS_COLUMN, RawPrediction},
};

/// 把单张图像的预测张量解码为候选框列表
///
/// 有效置信度为 objectness × 最高类别分数，低于 `conf_threshold` 的行被丢弃。
/// 类别取分数最高者，分数相同时取较小的类别号。输出按行号顺序排列。
pub fn extract_candidates(
  prediction: &RawPrediction,
  conf_threshold: f32,
) -> Result<Vec<DetectItem>, PostprocessError> {
  check_threshold("conf_threshold", conf_threshold)?;

  let mut items = Vec::new();

  for (index, row) in prediction.rows().enumerate() {
    let objectness = row[OBJECTNESS_COLUMN];

    // objectness 已经低于阈值时，乘积只会更低（类别分数不超过 1）
    if !objectness.is_finite() || objectness < conf_threshold {
      continue;
    }

    let (class_score, class_id) = {
      let mut max_score = f32::NEG_INFINITY;
      let mut cls_idx = 0usize;
      for (c, &score) in row.iter().skip(CLASS_OFFSET).enumerate() {
        if score > max_score {
          max_score = score;
          cls_idx = c;
        }
      }
      (max_score, cls_idx as u32)
    };

    let score = objectness * class_score;
    if !score.is_finite() || score < conf_threshold {
      continue;
    }

    let cx = row[0];
    let cy = row[1];
    let w = row[2];
    let h = row[3];

    items.push(DetectItem {
      class_id,
      score,
      bbox: xywh_to_xyxy(cx, cy, w, h),
      index,
    });
  }

  debug!(
    "解码 {} 行预测, 得到 {} 个候选框",
    prediction.num_rows(),
    items.len()
  );

  Ok(items)
}

/// 把形状为 `[N, anchors, 5 + C]` 的批量输出拆成每张图像一个视图
pub fn split_batch<'a>(
  batch: ArrayView3<'a, f32>,
  num_classes: usize,
) -> Result<Vec<RawPrediction<'a>>, PostprocessError> {
  let expected = CLASS_OFFSET + num_classes;
  let (_, _, columns) = batch.dim();
  if columns != expected {
    error!("批量输出列数不匹配: 期望 {}, 实际 {}", expected, columns);
    return Err(PostprocessError::shape(expected, columns));
  }

  (0..batch.len_of(Axis(0)))
    .map(|i| RawPrediction::new(batch.index_axis_move(Axis(0), i), num_classes))
    .collect()
}
