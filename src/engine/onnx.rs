// 该文件是 Shanan （山南西风） 项目的一部分。
// src/engine/onnx.rs - 基于 tract 的 ONNX 推理引擎
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

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};
use tract_onnx::prelude::*;

use crate::{
  engine::{EngineOutput, InferenceEngine},
  frame::ImageTensor,
};

type RunnableModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

#[derive(Error, Debug)]
pub enum OnnxEngineError {
  #[error("模型加载错误: {0}")]
  ModelLoadError(String),
  #[error("输入张量错误: {0}")]
  InputError(String),
  #[error("推理错误: {0}")]
  RunError(String),
  #[error("模型没有输出")]
  NoOutput,
}

pub struct OnnxEngine {
  runnable: RunnableModel,
  input_size: u32,
}

impl OnnxEngine {
  /// 加载 ONNX 模型并固定输入形状为 `[1, 3, S, S]`
  pub fn load(path: impl AsRef<Path>, input_size: u32) -> Result<Self, OnnxEngineError> {
    let path = path.as_ref();
    let size = input_size as usize;

    info!("加载模型文件: {}", path.display());
    let runnable = tract_onnx::onnx()
      .model_for_path(path)
      .and_then(|model| model.with_input_fact(0, f32::fact([1, 3, size, size]).into()))
      .and_then(|model| model.into_optimized())
      .and_then(|model| model.into_runnable())
      .map_err(|e| OnnxEngineError::ModelLoadError(format!("{}: {e:#}", path.display())))?;
    info!("模型加载完成");

    Ok(Self {
      runnable,
      input_size,
    })
  }
}

impl InferenceEngine for OnnxEngine {
  type Error = OnnxEngineError;

  fn run(&self, input: &ImageTensor) -> Result<EngineOutput, Self::Error> {
    let size = self.input_size as usize;
    let tensor = Tensor::from_shape(&[1, 3, size, size], input.as_nchw())
      .map_err(|e| OnnxEngineError::InputError(format!("{e:#}")))?;

    debug!("执行模型推理");
    let outputs = self
      .runnable
      .run(tvec!(tensor.into()))
      .map_err(|e| OnnxEngineError::RunError(format!("{e:#}")))?;

    let output = outputs.first().ok_or(OnnxEngineError::NoOutput)?;
    let view = output
      .to_array_view::<f32>()
      .map_err(|e| OnnxEngineError::RunError(format!("{e:#}")))?;
    debug!("模型输出形状: {:?}", view.shape());

    Ok(EngineOutput {
      shape: view.shape().to_vec(),
      data: view.iter().copied().collect(),
    })
  }
}
