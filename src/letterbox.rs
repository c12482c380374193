// 该文件是 Kuangxuan （框选） 项目的一部分。
// src/letterbox.rs - 信箱式缩放参数规划
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
use tracing::{debug, error};

use crate::error::PostprocessError;

/// 信箱式缩放参数
///
/// 在推理前按原始图像计算一次，推理后用于把检测框映射回原图。
/// `scale` 是两个方向共用的缩放系数；`pad_width` / `pad_height`
/// 是内容左上角在推理帧中的偏移（向下取整的那一侧）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LetterboxParams {
  pub scale: f32,
  pub pad_width: f32,
  pub pad_height: f32,
  /// 原图尺寸 (width, height)
  pub original_size: (u32, u32),
  /// 缩放后、填充前的尺寸 (width, height)
  pub resized_size: (u32, u32),
  /// 推理帧边长
  pub target_size: u32,
}

/// 四条边的填充像素数，供执行实际缩放的图像模块使用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Border {
  pub top: u32,
  pub bottom: u32,
  pub left: u32,
  pub right: u32,
}

/// 计算把 `width` x `height` 的图像放入 `target_size` 正方形推理帧所需的参数
///
/// 剩余的填充量为奇数时，左/上取较小的一半，右/下取较大的一半。
/// 反向映射只使用左/上偏移，因此两个方向的约定一致。
pub fn plan_letterbox(
  width: u32,
  height: u32,
  target_size: u32,
) -> Result<LetterboxParams, PostprocessError> {
  if width == 0 || height == 0 {
    error!("图像尺寸无效: {}x{}", width, height);
    return Err(PostprocessError::InvalidImage { width, height });
  }
  if target_size == 0 {
    error!("推理输入尺寸无效: {}", target_size);
    return Err(PostprocessError::InvalidInputSize(target_size));
  }

  let target = target_size as f64;
  let scale = (target / width as f64).min(target / height as f64);

  let resized_width = ((width as f64 * scale).round() as u32).clamp(1, target_size);
  let resized_height = ((height as f64 * scale).round() as u32).clamp(1, target_size);

  let pad_width = (target_size - resized_width) / 2;
  let pad_height = (target_size - resized_height) / 2;

  debug!(
    "信箱参数: {}x{} -> {}x{}, 缩放 {:.4}, 填充 ({}, {})",
    width, height, resized_width, resized_height, scale, pad_width, pad_height
  );

  Ok(LetterboxParams {
    scale: scale as f32,
    pad_width: pad_width as f32,
    pad_height: pad_height as f32,
    original_size: (width, height),
    resized_size: (resized_width, resized_height),
    target_size,
  })
}

impl LetterboxParams {
  pub fn original_width(&self) -> f32 {
    self.original_size.0 as f32
  }

  pub fn original_height(&self) -> f32 {
    self.original_size.1 as f32
  }

  pub fn border(&self) -> Border {
    let (resized_width, resized_height) = self.resized_size;
    let left = self.pad_width as u32;
    let top = self.pad_height as u32;
    Border {
      top,
      bottom: self.target_size - resized_height - top,
      left,
      right: self.target_size - resized_width - left,
    }
  }

  /// 原图坐标 -> 推理帧坐标
  pub fn to_inference(&self, x: f32, y: f32) -> (f32, f32) {
    (
      x * self.scale + self.pad_width,
      y * self.scale + self.pad_height,
    )
  }

  /// 推理帧坐标 -> 原图坐标（未裁剪）
  pub fn to_original(&self, x: f32, y: f32) -> (f32, f32) {
    (
      (x - self.pad_width) / self.scale,
      (y - self.pad_height) / self.scale,
    )
  }
}
