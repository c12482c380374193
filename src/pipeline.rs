// 该文件是 Kuangxuan （框选） 项目的一部分。
// src/pipeline.rs - 后处理流水线
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

use ndarray::ArrayView3;
use rayon::prelude::*;
use tracing::{debug, error, info};

use crate::{
  config::PostprocessConfig,
  error::PostprocessError,
  geometry::scale_coordinates,
  letterbox::LetterboxParams,
  model::{DetectResult, Detection, RawPrediction, extract_candidates, split_batch},
  nms::{keep_top_k, non_max_suppression},
};

/// 检测后处理器
///
/// 对每张图像依次执行：候选框解码 -> 按类别 NMS -> 映射回原图。
/// 不保存任何跨图像的状态，可以在多个线程间共享。
#[derive(Debug, Clone)]
pub struct Postprocessor {
  config: PostprocessConfig,
}

impl Postprocessor {
  pub fn new(config: PostprocessConfig) -> Result<Self, PostprocessError> {
    config.validate()?;
    info!(
      "后处理参数: 置信度阈值 {}, NMS 阈值 {}, 输入尺寸 {}, 最大检测数 {}",
      config.conf_threshold, config.iou_threshold, config.input_size, config.max_detections
    );
    Ok(Postprocessor { config })
  }

  pub fn config(&self) -> &PostprocessConfig {
    &self.config
  }

  /// 处理单张图像
  pub fn process_image(
    &self,
    params: &LetterboxParams,
    prediction: &RawPrediction,
  ) -> Result<DetectResult, PostprocessError> {
    let candidates = extract_candidates(prediction, self.config.conf_threshold)?;
    if candidates.is_empty() {
      debug!("没有候选框超过置信度阈值");
      return Ok(DetectResult::default());
    }

    let kept = non_max_suppression(candidates, self.config.iou_threshold)?;
    let kept = keep_top_k(kept, self.config.max_detections);

    let items: Vec<Detection> = kept
      .iter()
      .filter_map(|item| {
        scale_coordinates(&item.bbox, params).map(|bbox| Detection {
          bbox,
          score: item.score,
          class_id: item.class_id,
        })
      })
      .collect();

    if items.len() < kept.len() {
      debug!("{} 个检测框裁剪后面积为零, 已丢弃", kept.len() - items.len());
    }

    Ok(DetectResult::from(items))
  }

  /// 处理一个批次，结果顺序与输入顺序一致
  ///
  /// 各图像在 rayon 线程池上并行处理，每张图像只写入自己的结果槽位。
  pub fn process_batch(
    &self,
    params: &[LetterboxParams],
    predictions: &[RawPrediction],
  ) -> Result<Vec<DetectResult>, PostprocessError> {
    if params.len() != predictions.len() {
      error!(
        "批次长度不匹配: 参数 {}, 预测 {}",
        params.len(),
        predictions.len()
      );
      return Err(PostprocessError::BatchLengthMismatch {
        params: params.len(),
        predictions: predictions.len(),
      });
    }

    let results: Vec<DetectResult> = params
      .par_iter()
      .zip(predictions.par_iter())
      .map(|(params, prediction)| self.process_image(params, prediction))
      .collect::<Result<_, _>>()?;

    debug!(
      "批次处理完成: {} 张图像, 共 {} 个检测",
      results.len(),
      results.iter().map(DetectResult::len).sum::<usize>()
    );

    Ok(results)
  }

  /// 直接处理形状为 `[N, anchors, 5 + C]` 的批量输出
  pub fn process_tensor(
    &self,
    params: &[LetterboxParams],
    batch: ArrayView3<'_, f32>,
    num_classes: usize,
  ) -> Result<Vec<DetectResult>, PostprocessError> {
    let predictions = split_batch(batch, num_classes)?;
    self.process_batch(params, &predictions)
  }
}
