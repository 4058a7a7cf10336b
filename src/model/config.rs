// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/config.rs - 检测参数
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

use std::str::FromStr;

use tracing::debug;
use url::Url;

use crate::model::{OutputContract, Yolov8Error};

const YOLOV8_INPUT_SIZE: u32 = 640;
const YOLOV8_NUM_CANDIDATES: usize = 8400;
const YOLOV8_CLASS_NUM: usize = 80;
const YOLOV8_OBJECT_THRESH: f64 = 0.4;
const YOLOV8_NMS_THRESH: f64 = 0.4;
const YOLOV8_MIN_BOX_SIZE: f64 = 10.0;
const YOLOV8_FILL: u8 = 128;

/// 检测流水线的全部可调参数
#[derive(Debug, Clone, PartialEq)]
pub struct DetectConfig {
  /// 模型输入边长
  pub input_size: u32,
  /// 输出候选数量
  pub num_candidates: usize,
  /// 类别数量
  pub num_classes: usize,
  /// 置信度阈值，严格大于才保留
  pub confidence_threshold: f64,
  /// NMS IoU 阈值
  pub iou_threshold: f64,
  /// 宽高不大于该值的框被丢弃
  pub min_box_size: f64,
  /// letterbox 填充灰度
  pub fill: u8,
}

impl Default for DetectConfig {
  fn default() -> Self {
    Self {
      input_size: YOLOV8_INPUT_SIZE,
      num_candidates: YOLOV8_NUM_CANDIDATES,
      num_classes: YOLOV8_CLASS_NUM,
      confidence_threshold: YOLOV8_OBJECT_THRESH,
      iou_threshold: YOLOV8_NMS_THRESH,
      min_box_size: YOLOV8_MIN_BOX_SIZE,
      fill: YOLOV8_FILL,
    }
  }
}

fn invalid(key: &str, value: impl ToString) -> Yolov8Error {
  Yolov8Error::InvalidParameter {
    key: key.to_string(),
    value: value.to_string(),
  }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, Yolov8Error> {
  value.parse().map_err(|_| invalid(key, value))
}

/// 阈值必须是 `[0, 1]` 内的有限值
fn unit_interval(key: &str, value: f64) -> Result<(), Yolov8Error> {
  if value.is_finite() && (0.0..=1.0).contains(&value) {
    Ok(())
  } else {
    Err(invalid(key, value))
  }
}

impl DetectConfig {
  pub fn contract(&self) -> OutputContract {
    OutputContract {
      num_classes: self.num_classes,
      num_candidates: self.num_candidates,
    }
  }

  /// 用 URL 查询参数覆盖默认值，未知参数被忽略
  ///
  /// `conf`、`iou`、`min_box`、`size`、`candidates`、`classes`、`fill`
  pub fn with_query(mut self, url: &Url) -> Result<Self, Yolov8Error> {
    for (key, value) in url.query_pairs() {
      match key.as_ref() {
        "conf" => self.confidence_threshold = parse(&key, &value)?,
        "iou" => self.iou_threshold = parse(&key, &value)?,
        "min_box" => self.min_box_size = parse(&key, &value)?,
        "size" => self.input_size = parse(&key, &value)?,
        "candidates" => self.num_candidates = parse(&key, &value)?,
        "classes" => self.num_classes = parse(&key, &value)?,
        "fill" => self.fill = parse(&key, &value)?,
        _ => {
          debug!("忽略未知参数: {}={}", key, value);
          continue;
        }
      }
      debug!("参数 {}={}", key, value);
    }

    if self.input_size == 0 {
      return Err(invalid("size", self.input_size));
    }
    unit_interval("conf", self.confidence_threshold)?;
    unit_interval("iou", self.iou_threshold)?;
    if !self.min_box_size.is_finite() || self.min_box_size < 0.0 {
      return Err(invalid("min_box", self.min_box_size));
    }

    Ok(self)
  }
}
