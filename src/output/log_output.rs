// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/log_output.rs - 日志输出
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

use std::convert::Infallible;

use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::SourceImage,
  model::DetectResult,
  output::{OutputError, Render},
};

/// 每个检测框打印一行日志
pub struct LogOutput;

impl FromUrlWithScheme for LogOutput {
  const SCHEME: &'static str = "log";
}

impl FromUrl for LogOutput {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(OutputError::SchemeMismatch);
    }
    Ok(LogOutput)
  }
}

impl Render<SourceImage, DetectResult> for LogOutput {
  type Error = Infallible;

  fn render_result(&self, frame: &SourceImage, result: &DetectResult) -> Result<(), Self::Error> {
    info!(
      "图像 {}x{}: 检测到 {} 个对象",
      frame.width(),
      frame.height(),
      result.len()
    );
    for det in result.iter() {
      info!(
        "  - {} at ({:.0}, {:.0}, {:.0}x{:.0})",
        det, det.bbox.x, det.bbox.y, det.bbox.width, det.bbox.height
      );
    }
    Ok(())
  }
}
