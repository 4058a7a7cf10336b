// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/letterbox.rs - letterbox 几何变换
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

use image::{
  Rgba, RgbaImage,
  imageops::{self, FilterType},
};

/// 源图像与正方形模型输入之间的缩放/平移关系
///
/// 保持宽高比缩放后居中放置：
/// `scale = min(S / w, S / h)`，`pad = (S - scaled) / 2`。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxTransform {
  scale: f64,
  pad_x: f64,
  pad_y: f64,
  input_size: u32,
  source_width: u32,
  source_height: u32,
}

impl LetterboxTransform {
  /// 源图像宽高都必须大于 0，由调用方保证
  pub fn new(source_width: u32, source_height: u32, input_size: u32) -> Self {
    let size = input_size as f64;
    let (w, h) = (source_width as f64, source_height as f64);

    let scale = (size / w).min(size / h);
    let pad_x = (size - w * scale) / 2.0;
    let pad_y = (size - h * scale) / 2.0;

    Self {
      scale,
      pad_x,
      pad_y,
      input_size,
      source_width,
      source_height,
    }
  }

  pub fn scale(&self) -> f64 {
    self.scale
  }

  pub fn pad_x(&self) -> f64 {
    self.pad_x
  }

  pub fn pad_y(&self) -> f64 {
    self.pad_y
  }

  pub fn input_size(&self) -> u32 {
    self.input_size
  }

  pub fn source_width(&self) -> u32 {
    self.source_width
  }

  pub fn source_height(&self) -> u32 {
    self.source_height
  }

  /// 源图像坐标 -> 模型输入坐标
  pub fn forward(&self, x: f64, y: f64) -> (f64, f64) {
    (x * self.scale + self.pad_x, y * self.scale + self.pad_y)
  }

  /// 模型输入坐标 -> 源图像坐标
  pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
    ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
  }

  /// 缩放后图像在画布上所占的整像素尺寸
  pub fn scaled_dimensions(&self) -> (u32, u32) {
    let round = |v: f64| (v.round() as u32).clamp(1, self.input_size.max(1));
    (
      round(self.source_width as f64 * self.scale),
      round(self.source_height as f64 * self.scale),
    )
  }
}

/// 把源图像绘制到 `S × S` 的画布上，空白处先用 `(fill, fill, fill)` 填充
pub fn letterbox_canvas(image: &RgbaImage, transform: &LetterboxTransform, fill: u8) -> RgbaImage {
  let size = transform.input_size();
  let mut canvas = RgbaImage::from_pixel(size, size, Rgba([fill, fill, fill, 255]));

  let (width, height) = transform.scaled_dimensions();
  let left = transform.pad_x().round() as i64;
  let top = transform.pad_y().round() as i64;

  if image.dimensions() == (width, height) {
    imageops::overlay(&mut canvas, image, left, top);
  } else {
    let resized = imageops::resize(image, width, height, FilterType::Triangle);
    imageops::overlay(&mut canvas, &resized, left, top);
  }

  canvas
}

/// 保持宽高比，把 `width × height` 缩放到不超过 `max_size` 的显示尺寸
pub fn fit_within(width: u32, height: u32, max_size: u32) -> (u32, u32) {
  if width <= max_size && height <= max_size {
    return (width, height);
  }

  let ratio = (max_size as f64 / width as f64).min(max_size as f64 / height as f64);
  (
    (width as f64 * ratio).round() as u32,
    (height as f64 * ratio).round() as u32,
  )
}
