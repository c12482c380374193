// 该文件是 Kuangxuan （框选） 项目的一部分。
// src/main.rs - 批量检测后处理程序
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

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

use kuangxuan::{
  FromUrl, LetterboxParams, PostprocessConfig, Postprocessor, RawPrediction,
  config::{DEFAULT_CONF_THRESHOLD, DEFAULT_IOU_THRESHOLD, DEFAULT_MAX_DETECTIONS},
  input::{PredictionFileInput, PredictionFrame},
  label::Labels,
  output::{OutputWrapper, Render},
};

/// Kuangxuan 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 预测结果文件 (json:///path/to/predictions.json)
  #[arg(long, value_name = "PREDICTIONS")]
  pub predictions: Url,
  /// 输出路径 (jsonl://、record:// 或 log://)
  #[arg(long, value_name = "OUTPUT", default_value = "log://")]
  pub output: Url,
  /// 类别名称文件，每行一个；缺省使用 COCO 类别
  #[arg(long, value_name = "FILE")]
  pub labels: Option<PathBuf>,
  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_CONF_THRESHOLD, value_name = "THRESHOLD")]
  pub conf_thresh: f32,
  /// NMS IoU 阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_IOU_THRESHOLD, value_name = "THRESHOLD")]
  pub iou_thresh: f32,
  /// 推理帧边长；缺省使用预测文件中的值
  #[arg(long, value_name = "SIZE")]
  pub input_size: Option<u32>,
  /// 每张图像最多保留的检测数，0 表示不限制
  #[arg(long, default_value_t = DEFAULT_MAX_DETECTIONS, value_name = "COUNT")]
  pub max_det: usize,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let args = Args::parse();

  info!("预测结果: {}", args.predictions);
  info!("输出路径: {}", args.output);

  let labels = match &args.labels {
    Some(path) => Labels::from_file(path)
      .with_context(|| format!("无法读取类别文件 {}", path.display()))?,
    None => Labels::coco(),
  };
  info!("类别数: {}", labels.len());

  let input = PredictionFileInput::from_url(&args.predictions)
    .with_context(|| format!("无法打开预测结果 {}", args.predictions))?;

  let config = PostprocessConfig::default()
    .conf_threshold(args.conf_thresh)
    .iou_threshold(args.iou_thresh)
    .input_size(args.input_size.unwrap_or(input.input_size()))
    .max_detections(args.max_det);
  let postprocessor = Postprocessor::new(config)?;

  let output = OutputWrapper::from_url(&args.output)
    .with_context(|| format!("无法创建输出 {}", args.output))?
    .with_labels(labels);

  let frames: Vec<PredictionFrame> = input.collect::<Result<_, _>>()?;
  let input_size = postprocessor.config().input_size;
  let params: Vec<LetterboxParams> = frames
    .iter()
    .map(|frame| frame.size.letterbox(input_size))
    .collect::<Result<_, _>>()?;
  let predictions: Vec<RawPrediction> = frames
    .iter()
    .map(|frame| frame.prediction())
    .collect::<Result<_, _>>()?;

  info!("开始后处理...");
  let now = std::time::Instant::now();
  let results = postprocessor.process_batch(&params, &predictions)?;
  info!("后处理完成，耗时: {:.2?}", now.elapsed());

  let mut total_detections = 0usize;
  for (frame, result) in frames.iter().zip(results.iter()) {
    total_detections += result.len();
    output.render_result(&frame.size, result)?;
  }

  info!("总图像数: {}", frames.len());
  info!("总检测数: {}", total_detections);

  Ok(())
}
