// 该文件是 Kuangxuan （框选） 项目的一部分。
// src/nms.rs - 按类别的非极大值抑制
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

use std::{cmp::Ordering, collections::BTreeMap};

use rayon::prelude::*;
use tracing::debug;

use crate::{config::check_threshold, error::PostprocessError, geometry::iou, model::DetectItem};

/// 分数降序，分数相同时按行号升序
fn by_score(a: &DetectItem, b: &DetectItem) -> Ordering {
  b.score
    .total_cmp(&a.score)
    .then_with(|| a.index.cmp(&b.index))
}

/// 按类别分组，键有序，保证输出顺序稳定
fn group_by_class(candidates: Vec<DetectItem>) -> BTreeMap<u32, Vec<DetectItem>> {
  let mut groups: BTreeMap<u32, Vec<DetectItem>> = BTreeMap::new();
  for item in candidates {
    groups.entry(item.class_id).or_default().push(item);
  }
  groups
}

/// 对单一类别执行贪心 NMS
fn suppress_group(mut group: Vec<DetectItem>, iou_threshold: f32) -> Vec<DetectItem> {
  group.sort_by(by_score);

  let mut kept: Vec<DetectItem> = Vec::with_capacity(group.len());
  for item in group {
    let suppressed = kept
      .iter()
      .any(|best| iou(&best.bbox, &item.bbox) > iou_threshold);
    if !suppressed {
      kept.push(item);
    }
  }
  kept
}

/// 非极大值抑制
///
/// 每个类别独立处理，不同类别之间不会互相抑制。
/// 输出按类别号升序，同一类别内按保留顺序（分数降序）排列，
/// 且一定是输入的子集。各类别组在 rayon 线程池上并行处理。
pub fn non_max_suppression(
  candidates: Vec<DetectItem>,
  iou_threshold: f32,
) -> Result<Vec<DetectItem>, PostprocessError> {
  check_threshold("iou_threshold", iou_threshold)?;

  let total = candidates.len();
  let groups: Vec<Vec<DetectItem>> = group_by_class(candidates).into_values().collect();
  let num_groups = groups.len();

  let kept: Vec<DetectItem> = groups
    .into_par_iter()
    .map(|group| suppress_group(group, iou_threshold))
    .flatten()
    .collect();

  debug!(
    "NMS: {} 个候选框, {} 个类别, 保留 {} 个",
    total,
    num_groups,
    kept.len()
  );

  Ok(kept)
}

/// 只保留分数最高的 `max_detections` 个结果，保持原有顺序；0 表示不限制
pub fn keep_top_k(items: Vec<DetectItem>, max_detections: usize) -> Vec<DetectItem> {
  if max_detections == 0 || items.len() <= max_detections {
    return items;
  }

  let mut ranked: Vec<usize> = (0..items.len()).collect();
  ranked.sort_by(|&a, &b| by_score(&items[a], &items[b]));

  let mut keep = vec![false; items.len()];
  for &i in &ranked[..max_detections] {
    keep[i] = true;
  }

  debug!("检测数 {} 超过上限 {}, 截断", items.len(), max_detections);

  items
    .into_iter()
    .zip(keep)
    .filter_map(|(item, keep)| keep.then_some(item))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn item(class_id: u32, score: f32, bbox: [f32; 4], index: usize) -> DetectItem {
    DetectItem {
      class_id,
      score,
      bbox,
      index,
    }
  }

  #[test]
  fn suppresses_overlapping_same_class_box() {
    // IoU = 90 / 100
    let candidates = vec![
      item(0, 0.8, [0.0, 0.0, 10.0, 9.0], 0),
      item(0, 0.9, [0.0, 0.0, 10.0, 10.0], 1),
    ];
    let kept = non_max_suppression(candidates, 0.5).unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].score, 0.9);
  }

  #[test]
  fn never_suppresses_across_classes() {
    let candidates = vec![
      item(0, 0.9, [0.0, 0.0, 10.0, 10.0], 0),
      item(1, 0.8, [0.0, 0.0, 10.0, 10.0], 1),
    ];
    let kept = non_max_suppression(candidates, 0.5).unwrap();
    assert_eq!(kept.len(), 2);
  }

  #[test]
  fn keeps_boxes_below_iou_threshold() {
    let candidates = vec![
      item(0, 0.9, [0.0, 0.0, 10.0, 10.0], 0),
      item(0, 0.8, [5.0, 5.0, 15.0, 15.0], 1),
    ];
    assert_eq!(non_max_suppression(candidates, 0.5).unwrap().len(), 2);
  }

  #[test]
  fn iou_equal_to_threshold_is_kept() {
    let candidates = vec![
      item(0, 0.9, [0.0, 0.0, 10.0, 10.0], 0),
      item(0, 0.8, [0.0, 0.0, 10.0, 5.0], 1),
    ];
    assert_eq!(non_max_suppression(candidates, 0.5).unwrap().len(), 2);
  }

  #[test]
  fn equal_scores_break_ties_by_row_index() {
    let candidates = vec![
      item(0, 0.7, [1.0, 1.0, 11.0, 11.0], 5),
      item(0, 0.7, [0.0, 0.0, 10.0, 10.0], 2),
    ];
    let kept = non_max_suppression(candidates, 0.3).unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].index, 2);
  }

  #[test]
  fn output_is_ordered_by_class_then_score() {
    let candidates = vec![
      item(3, 0.5, [0.0, 0.0, 1.0, 1.0], 0),
      item(1, 0.6, [0.0, 0.0, 1.0, 1.0], 1),
      item(1, 0.9, [5.0, 5.0, 6.0, 6.0], 2),
      item(0, 0.4, [0.0, 0.0, 1.0, 1.0], 3),
    ];
    let kept = non_max_suppression(candidates, 0.5).unwrap();
    let order: Vec<(u32, usize)> = kept.iter().map(|d| (d.class_id, d.index)).collect();
    assert_eq!(order, vec![(0, 3), (1, 2), (1, 1), (3, 0)]);
  }

  #[test]
  fn empty_input_gives_empty_output() {
    assert!(non_max_suppression(Vec::new(), 0.5).unwrap().is_empty());
  }

  #[test]
  fn rejects_invalid_threshold() {
    assert!(non_max_suppression(Vec::new(), 2.0).is_err());
  }

  #[test]
  fn top_k_keeps_highest_scores_in_order() {
    let items = vec![
      item(0, 0.5, [0.0; 4], 0),
      item(0, 0.9, [0.0; 4], 1),
      item(1, 0.7, [0.0; 4], 2),
      item(2, 0.6, [0.0; 4], 3),
    ];
    let kept = keep_top_k(items, 2);
    let indices: Vec<usize> = kept.iter().map(|d| d.index).collect();
    assert_eq!(indices, vec![1, 2]);
  }

  #[test]
  fn top_k_zero_disables_cap() {
    let items = vec![item(0, 0.5, [0.0; 4], 0), item(0, 0.9, [0.0; 4], 1)];
    assert_eq!(keep_top_k(items, 0).len(), 2);
  }
}
