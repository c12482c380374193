// 该文件是 Kuangxuan （框选） 项目的一部分。
// src/geometry.rs - 边界框几何工具
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

use serde::{Deserialize, Serialize};

use crate::letterbox::LetterboxParams;

/// 角点形式的边界框 [x_min, y_min, x_max, y_max]
pub type BBox = [f32; 4];

/// 原图像素坐标系下的矩形
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
  /// 左上角 x 坐标
  pub x: f32,
  /// 左上角 y 坐标
  pub y: f32,
  /// 宽度
  pub width: f32,
  /// 高度
  pub height: f32,
}

impl Rect {
  pub fn from_corners(bbox: &BBox) -> Self {
    Rect {
      x: bbox[0],
      y: bbox[1],
      width: bbox[2] - bbox[0],
      height: bbox[3] - bbox[1],
    }
  }

  pub fn corners(&self) -> BBox {
    [self.x, self.y, self.x + self.width, self.y + self.height]
  }

  pub fn center(&self) -> (f32, f32) {
    (self.x + self.width / 2.0, self.y + self.height / 2.0)
  }

  pub fn area(&self) -> f32 {
    self.width.max(0.0) * self.height.max(0.0)
  }
}

/// 中心点宽高 -> 角点
pub fn xywh_to_xyxy(cx: f32, cy: f32, w: f32, h: f32) -> BBox {
  let half_w = w / 2.0;
  let half_h = h / 2.0;
  [cx - half_w, cy - half_h, cx + half_w, cy + half_h]
}

pub fn area(bbox: &BBox) -> f32 {
  (bbox[2] - bbox[0]).max(0.0) * (bbox[3] - bbox[1]).max(0.0)
}

/// 计算两个角点框的 IoU，面积为零的框与任何框的 IoU 都是 0
pub fn iou(a: &BBox, b: &BBox) -> f32 {
  let x1 = a[0].max(b[0]);
  let y1 = a[1].max(b[1]);
  let x2 = a[2].min(b[2]);
  let y2 = a[3].min(b[3]);

  let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
  if intersection <= 0.0 {
    return 0.0;
  }

  let union = area(a) + area(b) - intersection;
  if union > 0.0 { intersection / union } else { 0.0 }
}

/// 把推理帧中的角点框映射回原图并裁剪到图像范围内
///
/// 裁剪后面积为零的框返回 `None`。
pub fn scale_coordinates(bbox: &BBox, params: &LetterboxParams) -> Option<Rect> {
  let (x_min, y_min) = params.to_original(bbox[0], bbox[1]);
  let (x_max, y_max) = params.to_original(bbox[2], bbox[3]);

  let width = params.original_width();
  let height = params.original_height();

  let clipped = [
    x_min.clamp(0.0, width),
    y_min.clamp(0.0, height),
    x_max.clamp(0.0, width),
    y_max.clamp(0.0, height),
  ];

  // NaN 坐标在这里也会被丢弃
  if clipped[2] > clipped[0] && clipped[3] > clipped[1] {
    Some(Rect::from_corners(&clipped))
  } else {
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::letterbox::plan_letterbox;

  fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
  }

  #[test]
  fn converts_center_form_to_corners() {
    assert_eq!(xywh_to_xyxy(320.0, 320.0, 100.0, 60.0), [270.0, 290.0, 370.0, 350.0]);
  }

  #[test]
  fn iou_of_identical_boxes_is_one() {
    let b = [0.0, 0.0, 10.0, 10.0];
    assert!(approx(iou(&b, &b), 1.0));
  }

  #[test]
  fn iou_of_disjoint_boxes_is_zero() {
    assert_eq!(iou(&[0.0, 0.0, 10.0, 10.0], &[20.0, 20.0, 30.0, 30.0]), 0.0);
  }

  #[test]
  fn iou_of_partial_overlap() {
    // 交集 25, 并集 175
    let value = iou(&[0.0, 0.0, 10.0, 10.0], &[5.0, 5.0, 15.0, 15.0]);
    assert!(approx(value, 25.0 / 175.0));
  }

  #[test]
  fn zero_area_box_has_zero_iou() {
    let degenerate = [5.0, 5.0, 5.0, 5.0];
    assert_eq!(iou(&degenerate, &degenerate), 0.0);
    assert_eq!(iou(&degenerate, &[0.0, 0.0, 10.0, 10.0]), 0.0);
  }

  #[test]
  fn maps_box_back_to_original_frame() {
    let params = plan_letterbox(1280, 720, 640).unwrap();
    let bbox = xywh_to_xyxy(320.0, 320.0, 100.0, 60.0);
    let rect = scale_coordinates(&bbox, &params).unwrap();
    assert_eq!(rect.center(), (640.0, 360.0));
    assert_eq!(rect.width, 200.0);
    assert_eq!(rect.height, 120.0);
  }

  #[test]
  fn clips_box_crossing_the_border() {
    let params = plan_letterbox(1280, 720, 640).unwrap();
    // 上边越过填充区
    let rect = scale_coordinates(&[-10.0, 100.0, 50.0, 200.0], &params).unwrap();
    assert_eq!(rect.x, 0.0);
    assert_eq!(rect.y, 0.0);
    assert_eq!(rect.width, 100.0);
    assert_eq!(rect.height, 120.0);
  }

  #[test]
  fn clips_box_crossing_right_and_bottom_edges() {
    let params = plan_letterbox(1280, 720, 640).unwrap();
    // 右边越过画面，下边越过下方填充区
    let rect = scale_coordinates(&[600.0, 450.0, 660.0, 520.0], &params).unwrap();
    assert_eq!(rect.x, 1200.0);
    assert_eq!(rect.y, 620.0);
    assert_eq!(rect.width, 80.0);
    assert_eq!(rect.height, 100.0);
    assert_eq!(rect.corners()[2], 1280.0);
    assert_eq!(rect.corners()[3], 720.0);
  }

  #[test]
  fn drops_box_inside_padding() {
    let params = plan_letterbox(1280, 720, 640).unwrap();
    // 完全位于上方填充区
    assert_eq!(scale_coordinates(&[10.0, 10.0, 100.0, 120.0], &params), None);
  }

  #[test]
  fn rect_round_trips_corners() {
    let rect = Rect::from_corners(&[1.0, 2.0, 4.0, 8.0]);
    assert_eq!(rect.width, 3.0);
    assert_eq!(rect.height, 6.0);
    assert_eq!(rect.corners(), [1.0, 2.0, 4.0, 8.0]);
    assert_eq!(rect.area(), 18.0);
  }
}
