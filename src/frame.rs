// 该文件是 Shanan （山南西风） 项目的一部分。
// src/frame.rs - 源图像与 NCHW 输入张量定义
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

use image::RgbaImage;
use tracing::debug;

use crate::model::{DetectError, LetterboxTransform, letterbox_canvas};

const RGB_CHANNELS: usize = 3;

/// 源图像，解码后的 RGBA 像素
pub type SourceImage = RgbaImage;

/// 推理引擎输入张量
///
/// 布局为 NCHW（批次为 1），先是全部 R，再是全部 G，最后是全部 B，
/// 每个值都已除以 255 归一化到 `[0, 1]`。
#[derive(Debug, Clone)]
pub struct ImageTensor {
  data: Box<[f32]>,
  size: u32,
}

impl ImageTensor {
  /// 从正方形 RGBA 画布构建张量，alpha 通道被丢弃
  ///
  /// 画布不是非空正方形时返回 [`DetectError::InvalidImage`]。
  pub fn from_canvas(canvas: &RgbaImage) -> Result<Self, DetectError> {
    let (width, height) = canvas.dimensions();
    if width != height || width == 0 {
      return Err(DetectError::InvalidImage { width, height });
    }

    let plane = width as usize * height as usize;
    let mut data = vec![0f32; RGB_CHANNELS * plane];

    for (idx, pixel) in canvas.pixels().enumerate() {
      data[idx] = pixel[0] as f32 / 255.0;
      data[plane + idx] = pixel[1] as f32 / 255.0;
      data[2 * plane + idx] = pixel[2] as f32 / 255.0;
    }

    Ok(Self {
      data: data.into_boxed_slice(),
      size: width,
    })
  }

  /// 对源图像做 letterbox 并构建张量
  ///
  /// 源图像宽或高为 0 时返回 [`DetectError::InvalidImage`]。
  pub fn letterboxed(
    image: &SourceImage,
    transform: &LetterboxTransform,
    fill: u8,
  ) -> Result<Self, DetectError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
      return Err(DetectError::InvalidImage { width, height });
    }

    let canvas = letterbox_canvas(image, transform, fill);
    debug!(
      "letterbox 画布: {}x{} -> {}x{}, 缩放 {:.4}, 填充 ({:.1}, {:.1})",
      width,
      height,
      canvas.width(),
      canvas.height(),
      transform.scale(),
      transform.pad_x(),
      transform.pad_y()
    );

    Self::from_canvas(&canvas)
  }

  pub fn size(&self) -> u32 {
    self.size
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  /// `[1, 3, size, size]`
  pub fn shape(&self) -> [usize; 4] {
    let size = self.size as usize;
    [1, RGB_CHANNELS, size, size]
  }

  pub fn as_nchw(&self) -> &[f32] {
    &self.data
  }
}
