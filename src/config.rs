// 该文件是 Kuangxuan （框选） 项目的一部分。
// src/config.rs - 后处理配置
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
use tracing::error;

use crate::error::PostprocessError;

pub const DEFAULT_CONF_THRESHOLD: f32 = 0.4;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.5;
pub const DEFAULT_INPUT_SIZE: u32 = 640;
/// 默认不限制，保留 NMS 后的全部结果
pub const DEFAULT_MAX_DETECTIONS: usize = 0;

/// 后处理参数
///
/// 同一批次内所有图像共享，处理期间不可变。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostprocessConfig {
  /// 置信度阈值 (objectness × 类别分数)
  pub conf_threshold: f32,
  /// NMS IoU 阈值
  pub iou_threshold: f32,
  /// 推理帧边长
  pub input_size: u32,
  /// 每张图像最多保留的检测数，0 表示不限制
  pub max_detections: usize,
}

impl Default for PostprocessConfig {
  fn default() -> Self {
    Self {
      conf_threshold: DEFAULT_CONF_THRESHOLD,
      iou_threshold: DEFAULT_IOU_THRESHOLD,
      input_size: DEFAULT_INPUT_SIZE,
      max_detections: DEFAULT_MAX_DETECTIONS,
    }
  }
}

impl PostprocessConfig {
  pub fn conf_threshold(mut self, value: f32) -> Self {
    self.conf_threshold = value;
    self
  }

  pub fn iou_threshold(mut self, value: f32) -> Self {
    self.iou_threshold = value;
    self
  }

  pub fn input_size(mut self, value: u32) -> Self {
    self.input_size = value;
    self
  }

  pub fn max_detections(mut self, value: usize) -> Self {
    self.max_detections = value;
    self
  }

  pub fn validate(&self) -> Result<(), PostprocessError> {
    check_threshold("conf_threshold", self.conf_threshold)?;
    check_threshold("iou_threshold", self.iou_threshold)?;
    if self.input_size == 0 {
      error!("推理输入尺寸无效: {}", self.input_size);
      return Err(PostprocessError::InvalidInputSize(self.input_size));
    }
    Ok(())
  }
}

/// 阈值必须是 [0, 1] 内的有限值
pub fn check_threshold(name: &'static str, value: f32) -> Result<(), PostprocessError> {
  if (0.0..=1.0).contains(&value) {
    Ok(())
  } else {
    error!("阈值无效: {} = {}", name, value);
    Err(PostprocessError::InvalidThreshold { name, value })
  }
}
