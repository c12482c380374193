// 该文件是 Kuangxuan （框选） 项目的一部分。
// src/input/read_image_file.rs - 图像文件尺寸读取
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

use std::path::Path;

use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, input::ImageSize, url_path};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI 方案不匹配")]
  SchemaMismatch,
  #[error("路径解码错误: {0}")]
  PathError(#[from] std::string::FromUtf8Error),
  #[error("图像读取错误: {0}")]
  ImageLoadError(#[from] image::ImageError),
}

/// 只读取图像头部得到尺寸，不解码像素
pub struct ImageFileInput {
  size: Option<ImageSize>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch);
    }

    let path = url_path(url)?;
    let (width, height) = image::image_dimensions(&path)?;
    debug!("图像 {} 尺寸: {}x{}", path, width, height);

    let name = Path::new(&path)
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or(path);

    Ok(ImageFileInput {
      size: Some(ImageSize {
        name,
        width,
        height,
      }),
    })
  }
}

impl Iterator for ImageFileInput {
  type Item = ImageSize;

  fn next(&mut self) -> Option<Self::Item> {
    self.size.take()
  }
}
