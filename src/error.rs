// 该文件是 Kuangxuan （框选） 项目的一部分。
// src/error.rs - 后处理错误定义
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

use thiserror::Error;

/// 后处理流水线的错误
///
/// 所有错误都表示调用方违反了约定，不做重试。
/// 没有检测结果不是错误。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PostprocessError {
  #[error("图像尺寸无效: {width}x{height}")]
  InvalidImage { width: u32, height: u32 },
  #[error("推理输入尺寸无效: {0}")]
  InvalidInputSize(u32),
  #[error("预测张量形状无效: 期望 {expected} 列, 实际 {actual} 列")]
  InvalidTensorShape { expected: usize, actual: usize },
  #[error("阈值无效: {name} = {value}, 必须位于 [0, 1] 区间")]
  InvalidThreshold { name: &'static str, value: f32 },
  #[error("批次长度不匹配: 预处理参数 {params} 个, 预测张量 {predictions} 个")]
  BatchLengthMismatch { params: usize, predictions: usize },
}

impl PostprocessError {
  pub fn shape(expected: usize, actual: usize) -> Self {
    PostprocessError::InvalidTensorShape { expected, actual }
  }
}
