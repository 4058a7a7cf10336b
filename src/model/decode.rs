// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/decode.rs - 稠密输出解码
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

use tracing::debug;

use crate::model::DetectError;

/// 每个候选框前 4 行为 (cx, cy, w, h)
pub const BOX_ATTRIBUTES: usize = 4;

/// 推理引擎输出，逻辑形状 `[num_attributes, num_candidates]`
///
/// 数据按行连续存放：第 `a` 个属性的全部候选值排在一起。
#[derive(Debug, Clone)]
pub struct RawOutputTensor {
  data: Box<[f32]>,
  num_attributes: usize,
  num_candidates: usize,
}

impl RawOutputTensor {
  /// 形状可以是 `[A, N]`，也可以带单批次维度 `[1, A, N]`
  pub fn from_shape(shape: &[usize], data: Vec<f32>) -> Result<Self, DetectError> {
    let (num_attributes, num_candidates) = match *shape {
      [attributes, candidates] => (attributes, candidates),
      [1, attributes, candidates] => (attributes, candidates),
      _ => {
        return Err(DetectError::ShapeMismatch {
          what: "输出张量维数",
          expected: vec![2],
          actual: vec![shape.len()],
        });
      }
    };

    let Some(expected_len) = num_attributes.checked_mul(num_candidates) else {
      return Err(DetectError::ShapeMismatch {
        what: "输出张量形状",
        expected: vec![data.len()],
        actual: shape.to_vec(),
      });
    };
    if data.len() != expected_len {
      return Err(DetectError::ShapeMismatch {
        what: "输出数据长度",
        expected: vec![expected_len],
        actual: vec![data.len()],
      });
    }

    Ok(Self {
      data: data.into_boxed_slice(),
      num_attributes,
      num_candidates,
    })
  }

  pub fn num_attributes(&self) -> usize {
    self.num_attributes
  }

  pub fn num_candidates(&self) -> usize {
    self.num_candidates
  }

  pub fn shape(&self) -> [usize; 2] {
    [self.num_attributes, self.num_candidates]
  }

  /// 第 `attribute` 行、第 `candidate` 列
  pub fn element(&self, attribute: usize, candidate: usize) -> f32 {
    debug_assert!(attribute < self.num_attributes && candidate < self.num_candidates);
    self.data[attribute * self.num_candidates + candidate]
  }
}

/// 模型输出约定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputContract {
  pub num_classes: usize,
  pub num_candidates: usize,
}

impl OutputContract {
  pub fn num_attributes(&self) -> usize {
    BOX_ATTRIBUTES + self.num_classes
  }

  /// 解码前一次性校验形状
  pub fn validate(&self, tensor: &RawOutputTensor) -> Result<(), DetectError> {
    let expected = [self.num_attributes(), self.num_candidates];
    if tensor.shape() != expected {
      return Err(DetectError::ShapeMismatch {
        what: "输出张量形状",
        expected: expected.to_vec(),
        actual: tensor.shape().to_vec(),
      });
    }
    Ok(())
  }
}

/// 模型输入空间中的候选框，中心点格式
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawCandidate {
  pub class_id: usize,
  pub confidence: f64,
  pub cx: f64,
  pub cy: f64,
  pub width: f64,
  pub height: f64,
}

/// 取每个候选的最高类别分数，丢弃 `score <= threshold` 的候选
pub fn decode(
  tensor: &RawOutputTensor,
  contract: &OutputContract,
  confidence_threshold: f64,
) -> Result<Vec<RawCandidate>, DetectError> {
  contract.validate(tensor)?;

  let mut candidates = Vec::new();
  for i in 0..contract.num_candidates {
    let mut max_score = f32::MIN;
    let mut class_id = 0usize;
    for c in 0..contract.num_classes {
      let score = tensor.element(BOX_ATTRIBUTES + c, i);
      if score > max_score {
        max_score = score;
        class_id = c;
      }
    }

    let confidence = f64::from(max_score);
    if confidence <= confidence_threshold {
      continue;
    }

    candidates.push(RawCandidate {
      class_id,
      confidence,
      cx: tensor.element(0, i) as f64,
      cy: tensor.element(1, i) as f64,
      width: tensor.element(2, i) as f64,
      height: tensor.element(3, i) as f64,
    });
  }

  debug!(
    "解码 {} 个候选, {} 个超过置信度阈值 {}",
    contract.num_candidates,
    candidates.len(),
    confidence_threshold
  );

  Ok(candidates)
}

#[cfg(test)]
mod tests {
  use super::*;

  const CONTRACT: OutputContract = OutputContract {
    num_classes: 3,
    num_candidates: 4,
  };

  fn tensor(columns: &[[f32; 7]]) -> RawOutputTensor {
    let n = columns.len();
    let mut data = vec![0f32; 7 * n];
    for (i, column) in columns.iter().enumerate() {
      for (a, value) in column.iter().enumerate() {
        data[a * n + i] = *value;
      }
    }
    RawOutputTensor::from_shape(&[7, n], data).unwrap()
  }

  #[test]
  fn element_follows_row_major_layout() {
    let t = RawOutputTensor::from_shape(&[1, 2, 3], vec![0., 1., 2., 10., 11., 12.]).unwrap();
    assert_eq!(t.shape(), [2, 3]);
    assert_eq!(t.element(0, 2), 2.0);
    assert_eq!(t.element(1, 0), 10.0);
  }

  #[test]
  fn data_length_must_match_shape() {
    let err = RawOutputTensor::from_shape(&[2, 3], vec![0.0; 5]).unwrap_err();
    assert!(matches!(err, DetectError::ShapeMismatch { .. }));

    let err = RawOutputTensor::from_shape(&[2, 1, 2, 3], vec![0.0; 12]).unwrap_err();
    assert!(matches!(err, DetectError::ShapeMismatch { .. }));
  }

  #[test]
  fn oversized_shape_is_a_mismatch() {
    let err = RawOutputTensor::from_shape(&[usize::MAX, 2], vec![0.0; 4]).unwrap_err();
    match err {
      DetectError::ShapeMismatch { actual, .. } => assert_eq!(actual, vec![usize::MAX, 2]),
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn picks_best_class_and_filters() {
    let t = tensor(&[
      [100., 100., 20., 30., 0.1, 0.9, 0.3],
      [10., 10., 5., 5., 0.2, 0.1, 0.3],
      [50., 60., 70., 80., 0.6, 0.2, 0.6],
      [1., 2., 3., 4., 0.0, 0.0, 0.0],
    ]);
    let out = decode(&t, &CONTRACT, 0.4).unwrap();

    assert_eq!(out.len(), 2);
    assert_eq!(out[0].class_id, 1);
    assert_eq!(out[0].confidence, f64::from(0.9f32));
    assert_eq!((out[0].cx, out[0].cy, out[0].width, out[0].height), (100., 100., 20., 30.));
    // 相同分数取最小的类别编号
    assert_eq!(out[1].class_id, 0);
    assert_eq!(out[1].confidence, f64::from(0.6f32));
  }

  #[test]
  fn threshold_is_strict() {
    let threshold = 0.5;
    let above = f32::from_bits(0.5f32.to_bits() + 1);
    let t = tensor(&[
      [1., 1., 1., 1., 0.5, 0., 0.],
      [1., 1., 1., 1., 0., above, 0.],
      [1., 1., 1., 1., 0., 0., 0.],
      [1., 1., 1., 1., 0., 0., 0.],
    ]);
    let out = decode(&t, &CONTRACT, threshold).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].class_id, 1);
  }

  #[test]
  fn f32_score_is_compared_in_f64() {
    // 0.4f32 实际为 0.4000000059604645，大于 f64 的 0.4
    let t = tensor(&[
      [1., 1., 1., 1., 0.4, 0., 0.],
      [1., 1., 1., 1., 0., 0., 0.],
      [1., 1., 1., 1., 0., 0., 0.],
      [1., 1., 1., 1., 0., 0., 0.],
    ]);
    let out = decode(&t, &CONTRACT, 0.4).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].confidence, f64::from(0.4f32));
  }

  #[test]
  fn wrong_attribute_count_is_rejected_before_decoding() {
    let contract = OutputContract {
      num_classes: 80,
      num_candidates: 8400,
    };
    let t = RawOutputTensor::from_shape(&[83, 8400], vec![1.0; 83 * 8400]).unwrap();
    match decode(&t, &contract, 0.4) {
      Err(DetectError::ShapeMismatch {
        expected,
        actual,
        ..
      }) => {
        assert_eq!(expected, vec![84, 8400]);
        assert_eq!(actual, vec![83, 8400]);
      }
      other => panic!("unexpected result: {other:?}"),
    }
  }

  #[test]
  fn wrong_candidate_count_is_rejected() {
    let t = tensor(&[[1., 1., 1., 1., 0.9, 0., 0.]; 3]);
    let err = decode(&t, &CONTRACT, 0.4).unwrap_err();
    assert!(matches!(err, DetectError::ShapeMismatch { .. }));
  }
}
