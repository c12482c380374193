// 该文件是 Kuangxuan （框选） 项目的一部分。
// src/input.rs - 预测结果与图像尺寸输入
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

use crate::{
  error::PostprocessError,
  letterbox::{LetterboxParams, plan_letterbox},
};

/// 原始图像的名称与像素尺寸，后处理只需要这些信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
  pub name: String,
  pub width: u32,
  pub height: u32,
}

impl ImageSize {
  pub fn letterbox(&self, target_size: u32) -> Result<LetterboxParams, PostprocessError> {
    plan_letterbox(self.width, self.height, target_size)
  }
}

mod prediction_file;
pub use self::prediction_file::{
  ImageRecord, PredictionDump, PredictionFileError, PredictionFileInput, PredictionFrame,
};

#[cfg(feature = "read_image_file")]
mod read_image_file;
#[cfg(feature = "read_image_file")]
pub use self::read_image_file::{ImageFileInput, ImageFileInputError};
