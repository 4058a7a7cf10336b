// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model.rs - 模型与检测结果
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

use std::{fmt, time::Duration};

use serde::Serialize;
use thiserror::Error;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

impl<M: Model + ?Sized> Model for &M {
  type Input = M::Input;
  type Output = M::Output;
  type Error = M::Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    (**self).infer(input)
  }
}

/// 单次检测运行的错误，三种都会终止本次运行
#[derive(Error, Debug)]
pub enum DetectError {
  #[error("图像尺寸无效: {width}x{height}")]
  InvalidImage { width: u32, height: u32 },
  #[error("{what}不匹配: 期望 {expected:?}, 实际 {actual:?}")]
  ShapeMismatch {
    what: &'static str,
    expected: Vec<usize>,
    actual: Vec<usize>,
  },
  #[error("推理引擎错误")]
  Inference(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl DetectError {
  /// 出错的阶段
  pub fn stage(&self) -> &'static str {
    match self {
      DetectError::InvalidImage { .. } => "preprocess",
      DetectError::ShapeMismatch { .. } => "decode",
      DetectError::Inference(_) => "inference",
    }
  }
}

/// 检测结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
  /// 类别索引
  pub class_id: usize,
  /// 类别名称
  pub class_name: String,
  /// 置信度
  pub confidence: f64,
  /// 源图像像素坐标下的边界框
  pub bbox: BoundingBox,
}

impl Detection {
  pub fn color(&self) -> [u8; 3] {
    class_color(self.class_id)
  }
}

impl fmt::Display for Detection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {:.1}%", self.class_name, self.confidence * 100.0)
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Timing {
  /// 推理引擎耗时
  pub inference: Duration,
  /// 整次运行耗时
  pub total: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectResult {
  pub items: Box<[Detection]>,
  pub timing: Timing,
}

impl DetectResult {
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Detection> {
    self.items.iter()
  }
}

mod bbox;
mod config;
mod decode;
mod labels;
mod letterbox;
mod mapper;
mod nms;
mod yolov8;

pub use self::bbox::{BoundingBox, iou};
pub use self::config::DetectConfig;
pub use self::decode::{BOX_ATTRIBUTES, OutputContract, RawCandidate, RawOutputTensor, decode};
pub use self::labels::{COCO_CLASSES, ClassTaxonomy, PALETTE, class_color};
pub use self::letterbox::{LetterboxTransform, fit_within, letterbox_canvas};
pub use self::mapper::map_to_source;
pub use self::nms::non_max_suppression;
pub use self::yolov8::{Yolov8, Yolov8Builder, Yolov8Error, postprocess};
