// 该文件是 Kuangxuan （框选） 项目的一部分。
// src/model.rs - 模型输出与检测结果定义
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

use ndarray::{ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::{
  error::PostprocessError,
  geometry::{BBox, Rect},
};

/// objectness 所在列
pub const OBJECTNESS_COLUMN: usize = 4;
/// 第一个类别分数所在列
pub const CLASS_OFFSET: usize = 5;

/// 单张图像的原始预测张量
///
/// 每行一个锚点：`[cx, cy, w, h, objectness, class_0 .. class_{C-1}]`，
/// 坐标位于推理帧中。只读视图，不会被修改。
#[derive(Debug, Clone)]
pub struct RawPrediction<'a> {
  data: ArrayView2<'a, f32>,
  num_classes: usize,
}

impl<'a> RawPrediction<'a> {
  pub fn new(data: ArrayView2<'a, f32>, num_classes: usize) -> Result<Self, PostprocessError> {
    let expected = CLASS_OFFSET + num_classes;
    if num_classes == 0 || data.ncols() != expected {
      return Err(PostprocessError::shape(expected, data.ncols()));
    }
    Ok(RawPrediction { data, num_classes })
  }

  /// 从按行展开的切片构造，长度必须是 `5 + C` 的整数倍
  pub fn from_slice(data: &'a [f32], num_classes: usize) -> Result<Self, PostprocessError> {
    let columns = CLASS_OFFSET + num_classes;
    if data.len() % columns != 0 {
      return Err(PostprocessError::shape(columns, data.len()));
    }
    let view = ArrayView2::from_shape((data.len() / columns, columns), data)
      .map_err(|_| PostprocessError::shape(columns, data.len()))?;
    Self::new(view, num_classes)
  }

  pub fn num_rows(&self) -> usize {
    self.data.nrows()
  }

  pub fn num_classes(&self) -> usize {
    self.num_classes
  }

  pub fn view(&self) -> ArrayView2<'_, f32> {
    self.data.view()
  }

  pub fn rows(&self) -> impl Iterator<Item = ndarray::ArrayView1<'_, f32>> {
    self.data.axis_iter(Axis(0))
  }
}

/// 推理帧中的候选框，NMS 的输入与输出
#[derive(Debug, Clone, PartialEq)]
pub struct DetectItem {
  pub class_id: u32,
  pub score: f32,
  pub bbox: BBox, // [x_min, y_min, x_max, y_max]
  /// 在原始预测张量中的行号，用于稳定排序
  pub index: usize,
}

/// 映射回原图后的检测结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
  pub bbox: Rect,
  pub score: f32,
  pub class_id: u32,
}

/// 单张图像的全部检测结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectResult {
  pub items: Box<[Detection]>,
}

impl DetectResult {
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Detection> {
    self.items.iter()
  }
}

impl From<Vec<Detection>> for DetectResult {
  fn from(items: Vec<Detection>) -> Self {
    DetectResult {
      items: items.into_boxed_slice(),
    }
  }
}

impl<'a> IntoIterator for &'a DetectResult {
  type Item = &'a Detection;
  type IntoIter = std::slice::Iter<'a, Detection>;

  fn into_iter(self) -> Self::IntoIter {
    self.items.iter()
  }
}

mod yolov5;
pub use self::yolov5::{extract_candidates, split_batch};

#[cfg(test)]
mod tests {
  use super::*;
  use ndarray::Array2;

  #[test]
  fn accepts_matching_column_count() {
    let data = Array2::<f32>::zeros((3, 7));
    let prediction = RawPrediction::new(data.view(), 2).unwrap();
    assert_eq!(prediction.num_rows(), 3);
    assert_eq!(prediction.num_classes(), 2);
  }

  #[test]
  fn rejects_mismatched_column_count() {
    let data = Array2::<f32>::zeros((3, 7));
    assert_eq!(
      RawPrediction::new(data.view(), 80).unwrap_err(),
      PostprocessError::InvalidTensorShape {
        expected: 85,
        actual: 7
      }
    );
  }

  #[test]
  fn rejects_zero_classes() {
    let data = Array2::<f32>::zeros((1, 5));
    assert!(RawPrediction::new(data.view(), 0).is_err());
  }

  #[test]
  fn builds_from_flat_slice() {
    let flat = vec![0.0f32; 14];
    let prediction = RawPrediction::from_slice(&flat, 2).unwrap();
    assert_eq!(prediction.num_rows(), 2);
    assert!(RawPrediction::from_slice(&flat[..13], 2).is_err());
  }

  #[test]
  fn empty_tensor_is_valid() {
    let prediction = RawPrediction::from_slice(&[], 3).unwrap();
    assert_eq!(prediction.num_rows(), 0);
  }
}
