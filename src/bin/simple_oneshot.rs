// 该文件是 Shanan （山南西风） 项目的一部分。
// src/bin/simple_oneshot.rs - 单张图像检测
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

use anyhow::Result;
use clap::Parser;
use url::Url;

use shanan_yolov8::{
  FromUrl,
  input::InputWrapper,
  model::Yolov8Builder,
  output::OutputWrapper,
  task::{OneShotTask, Task},
};
use tracing::info;

/// 单张图像 YOLOv8 检测
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// ONNX 模型，如 yolov8:///models/yolov8n.onnx?conf=0.4
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入来源，如 image:///data/street.jpg
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径，如 json:///tmp/result.json 或 log://
  #[arg(long, value_name = "OUTPUT", default_value = "log://")]
  pub output: Url,
  /// 置信度阈值，覆盖模型 URL 中的设置
  #[arg(long, value_name = "THRESHOLD")]
  pub confidence: Option<f64>,
  /// NMS IoU 阈值，覆盖模型 URL 中的设置
  #[arg(long, value_name = "THRESHOLD")]
  pub iou: Option<f64>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型文件路径: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let mut builder = Yolov8Builder::from_url(&args.model)?;
  if let Some(confidence) = args.confidence {
    builder = builder.confidence_threshold(confidence);
  }
  if let Some(iou) = args.iou {
    builder = builder.iou_threshold(iou);
  }

  let input = InputWrapper::from_url(&args.input)?;
  let model = builder.build_onnx()?;
  let output = OutputWrapper::from_url(&args.output)?;

  let result = OneShotTask.run_task(input, model, output)?;
  for detection in result.iter() {
    println!("{detection}");
  }

  Ok(())
}
