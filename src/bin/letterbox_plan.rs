// 该文件是 Kuangxuan （框选） 项目的一部分。
// src/bin/letterbox_plan.rs - 信箱参数计算工具
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

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

use kuangxuan::{FromUrl, config::DEFAULT_INPUT_SIZE, input::ImageFileInput};

/// 读取图像尺寸并打印信箱缩放参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 图像路径 (image:///path/to/a.jpg)，可重复
  #[arg(long, value_name = "SOURCE", required = true)]
  pub input: Vec<Url>,
  /// 推理帧边长
  #[arg(long, default_value_t = DEFAULT_INPUT_SIZE, value_name = "SIZE")]
  pub input_size: u32,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let args = Args::parse();

  for url in &args.input {
    let input =
      ImageFileInput::from_url(url).with_context(|| format!("无法读取图像 {}", url))?;
    for size in input {
      let params = size.letterbox(args.input_size)?;
      let border = params.border();
      info!(
        "{}: {}x{} -> {}x{}, 缩放 {:.6}",
        size.name,
        size.width,
        size.height,
        params.resized_size.0,
        params.resized_size.1,
        params.scale
      );
      info!(
        "  填充: 上 {}, 下 {}, 左 {}, 右 {}",
        border.top, border.bottom, border.left, border.right
      );
      println!("{}", serde_json::to_string(&params)?);
    }
  }

  Ok(())
}
