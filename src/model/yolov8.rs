// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/yolov8.rs - YOLOv8 检测流水线
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

use std::{path::PathBuf, time::Instant};

use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  engine::InferenceEngine,
  frame::{ImageTensor, SourceImage},
  model::{
    ClassTaxonomy, DetectConfig, DetectError, DetectResult, Detection, LetterboxTransform, Model,
    RawOutputTensor, Timing, decode, map_to_source, non_max_suppression,
  },
};

#[derive(Error, Debug)]
pub enum Yolov8Error {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("参数无效: {key}={value}")]
  InvalidParameter { key: String, value: String },
  #[error("标签文件读取错误: {0}")]
  LabelFileError(#[from] std::io::Error),
  #[error("类别数量不匹配: 模型 {expected}, 标签表 {actual}")]
  TaxonomySize { expected: usize, actual: usize },
  #[cfg(feature = "onnx")]
  #[error("ONNX 引擎错误: {0}")]
  OnnxEngineError(#[from] crate::engine::OnnxEngineError),
}

/// 原始输出 -> 最终检测列表：校验形状、解码、映射回源图像、NMS
pub fn postprocess(
  raw: &RawOutputTensor,
  transform: &LetterboxTransform,
  config: &DetectConfig,
  taxonomy: &ClassTaxonomy,
) -> Result<Vec<Detection>, DetectError> {
  let candidates = decode(raw, &config.contract(), config.confidence_threshold)?;
  let detections = map_to_source(&candidates, transform, taxonomy, config.min_box_size);
  Ok(non_max_suppression(detections, config.iou_threshold))
}

pub struct Yolov8<E> {
  engine: E,
  config: DetectConfig,
  taxonomy: ClassTaxonomy,
}

impl<E> Yolov8<E> {
  pub fn config(&self) -> &DetectConfig {
    &self.config
  }

  pub fn taxonomy(&self) -> &ClassTaxonomy {
    &self.taxonomy
  }
}

impl<E: InferenceEngine> Model for Yolov8<E> {
  type Input = SourceImage;
  type Output = DetectResult;
  type Error = DetectError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let started = Instant::now();
    let (width, height) = input.dimensions();
    if width == 0 || height == 0 {
      return Err(DetectError::InvalidImage { width, height });
    }

    let transform = LetterboxTransform::new(width, height, self.config.input_size);
    let tensor = ImageTensor::letterboxed(input, &transform, self.config.fill)?;

    debug!("执行模型推理");
    let inference_started = Instant::now();
    let output = self
      .engine
      .run(&tensor)
      .map_err(|e| DetectError::Inference(Box::new(e)))?;
    let inference = inference_started.elapsed();
    drop(tensor);

    let raw = RawOutputTensor::from_shape(&output.shape, output.data)?;
    let items = postprocess(&raw, &transform, &self.config, &self.taxonomy)?;

    let timing = Timing {
      inference,
      total: started.elapsed(),
    };
    debug!(
      "检测到 {} 个物体, 推理 {:.2?}, 总计 {:.2?}",
      items.len(),
      timing.inference,
      timing.total
    );

    Ok(DetectResult {
      items: items.into_boxed_slice(),
      timing,
    })
  }
}

pub struct Yolov8Builder {
  model_path: PathBuf,
  config: DetectConfig,
  taxonomy: ClassTaxonomy,
}

impl FromUrlWithScheme for Yolov8Builder {
  const SCHEME: &'static str = "yolov8";
}

impl FromUrl for Yolov8Builder {
  type Error = Yolov8Error;

  /// `yolov8:///path/model.onnx?conf=0.4&iou=0.4&labels=/path/labels.txt`
  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(Yolov8Error::SchemeMismatch(format!(
        "模型路径必须使用 {} 方案, 实际为 {}",
        Self::SCHEME,
        url.scheme()
      )));
    }

    let config = DetectConfig::default().with_query(url)?;
    let taxonomy = match url.query_pairs().find(|(k, _)| k == "labels") {
      Some((_, path)) => ClassTaxonomy::load(path.into_owned())?,
      None => ClassTaxonomy::coco(),
    };

    Ok(Yolov8Builder {
      model_path: PathBuf::from(url.path()),
      config,
      taxonomy,
    })
  }
}

impl Default for Yolov8Builder {
  fn default() -> Self {
    Self {
      model_path: PathBuf::new(),
      config: DetectConfig::default(),
      taxonomy: ClassTaxonomy::coco(),
    }
  }
}

impl Yolov8Builder {
  pub fn model_path(&self) -> &std::path::Path {
    &self.model_path
  }

  pub fn config(mut self, config: DetectConfig) -> Self {
    self.config = config;
    self
  }

  pub fn confidence_threshold(mut self, threshold: f64) -> Self {
    self.config.confidence_threshold = threshold;
    self
  }

  pub fn iou_threshold(mut self, threshold: f64) -> Self {
    self.config.iou_threshold = threshold;
    self
  }

  pub fn taxonomy(mut self, taxonomy: ClassTaxonomy) -> Self {
    self.taxonomy = taxonomy;
    self
  }

  pub fn build<E: InferenceEngine>(self, engine: E) -> Result<Yolov8<E>, Yolov8Error> {
    if self.taxonomy.len() != self.config.num_classes {
      return Err(Yolov8Error::TaxonomySize {
        expected: self.config.num_classes,
        actual: self.taxonomy.len(),
      });
    }

    info!(
      "YOLOv8 检测器: 输入 {}x{}, {} 类, 置信度阈值 {}, NMS 阈值 {}",
      self.config.input_size,
      self.config.input_size,
      self.config.num_classes,
      self.config.confidence_threshold,
      self.config.iou_threshold
    );

    Ok(Yolov8 {
      engine,
      config: self.config,
      taxonomy: self.taxonomy,
    })
  }

  #[cfg(feature = "onnx")]
  pub fn build_onnx(self) -> Result<Yolov8<crate::engine::OnnxEngine>, Yolov8Error> {
    let engine = crate::engine::OnnxEngine::load(&self.model_path, self.config.input_size)?;
    self.build(engine)
  }
}
