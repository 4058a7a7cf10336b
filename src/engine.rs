// 该文件是 Shanan （山南西风） 项目的一部分。
// src/engine.rs - 推理引擎接口
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

use crate::frame::ImageTensor;

/// 引擎原始输出，形状由流水线负责校验
#[derive(Debug, Clone, Default)]
pub struct EngineOutput {
  pub shape: Vec<usize>,
  pub data: Vec<f32>,
}

/// 推理引擎：`[1, 3, S, S]` 浮点张量进，单个输出张量出
pub trait InferenceEngine {
  type Error: std::error::Error + Send + Sync + 'static;

  fn run(&self, input: &ImageTensor) -> Result<EngineOutput, Self::Error>;
}

impl<E: InferenceEngine + ?Sized> InferenceEngine for Box<E> {
  type Error = E::Error;

  fn run(&self, input: &ImageTensor) -> Result<EngineOutput, Self::Error> {
    (**self).run(input)
  }
}

#[cfg(feature = "onnx")]
mod onnx;
#[cfg(feature = "onnx")]
pub use self::onnx::{OnnxEngine, OnnxEngineError};
