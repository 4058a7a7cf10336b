// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/bbox.rs - 边界框与 IoU
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

use serde::Serialize;

/// 轴对齐边界框，左上角 + 宽高
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
  /// 左上角 x 坐标
  pub x: f64,
  /// 左上角 y 坐标
  pub y: f64,
  /// 宽度
  pub width: f64,
  /// 高度
  pub height: f64,
}

impl BoundingBox {
  pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }

  /// 由左上角与右下角构建
  pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
    Self::new(x1, y1, x2 - x1, y2 - y1)
  }

  pub fn right(&self) -> f64 {
    self.x + self.width
  }

  pub fn bottom(&self) -> f64 {
    self.y + self.height
  }

  pub fn area(&self) -> f64 {
    self.width * self.height
  }

  pub fn iou(&self, other: &Self) -> f64 {
    iou(self, other)
  }
}

/// 两个框的交并比，并集为 0 时返回 0
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f64 {
  let inter_w = (a.right().min(b.right()) - a.x.max(b.x)).max(0.0);
  let inter_h = (a.bottom().min(b.bottom()) - a.y.max(b.y)).max(0.0);
  let intersection = inter_w * inter_h;

  let union = a.area() + b.area() - intersection;
  if union > 0.0 { intersection / union } else { 0.0 }
}
