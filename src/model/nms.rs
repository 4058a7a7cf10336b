// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/nms.rs - 非极大值抑制
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

use std::cmp::Ordering;

use tracing::debug;

use crate::model::Detection;

/// 非极大值抑制
///
/// 按置信度降序稳定排序后逐个接受，凡与已接受框 IoU 大于 `iou_threshold`
/// 的后续框都被抑制。抑制不区分类别：不同类别的重叠框同样互相抑制。
/// 返回结果按置信度降序排列。
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f64) -> Vec<Detection> {
  let total = detections.len();
  detections.sort_by(|a, b| {
    b.confidence
      .partial_cmp(&a.confidence)
      .unwrap_or(Ordering::Equal)
  });

  let mut suppressed = vec![false; total];
  for i in 0..total {
    if suppressed[i] {
      continue;
    }
    for j in (i + 1)..total {
      if !suppressed[j] && detections[i].bbox.iou(&detections[j].bbox) > iou_threshold {
        suppressed[j] = true;
      }
    }
  }

  let kept: Vec<Detection> = detections
    .into_iter()
    .zip(suppressed)
    .filter_map(|(detection, suppressed)| (!suppressed).then_some(detection))
    .collect();

  debug!("NMS: {} 个检测框保留 {} 个", total, kept.len());

  kept
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::BoundingBox;

  fn det(class_id: usize, confidence: f64, x: f64, y: f64, w: f64, h: f64) -> Detection {
    Detection {
      class_id,
      class_name: format!("class-{class_id}"),
      confidence,
      bbox: BoundingBox::new(x, y, w, h),
    }
  }

  #[test]
  fn keeps_highest_of_overlapping_pair() {
    let out = non_max_suppression(
      vec![
        det(0, 0.7, 12.0, 12.0, 50.0, 50.0),
        det(0, 0.9, 10.0, 10.0, 50.0, 50.0),
      ],
      0.4,
    );
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].confidence, 0.9);
    assert_eq!(out[0].bbox, BoundingBox::new(10.0, 10.0, 50.0, 50.0));
  }

  #[test]
  fn suppresses_across_classes() {
    let out = non_max_suppression(
      vec![
        det(0, 0.9, 10.0, 10.0, 50.0, 50.0),
        det(16, 0.8, 11.0, 11.0, 50.0, 50.0),
      ],
      0.4,
    );
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].class_id, 0);
  }

  #[test]
  fn output_is_sorted_by_confidence() {
    let out = non_max_suppression(
      vec![
        det(0, 0.5, 0.0, 0.0, 20.0, 20.0),
        det(1, 0.95, 100.0, 0.0, 20.0, 20.0),
        det(2, 0.7, 200.0, 0.0, 20.0, 20.0),
      ],
      0.4,
    );
    let scores: Vec<f64> = out.iter().map(|d| d.confidence).collect();
    assert_eq!(scores, vec![0.95, 0.7, 0.5]);
  }

  #[test]
  fn equal_confidence_keeps_input_order() {
    let out = non_max_suppression(
      vec![
        det(3, 0.6, 0.0, 0.0, 20.0, 20.0),
        det(4, 0.6, 1.0, 1.0, 20.0, 20.0),
      ],
      0.4,
    );
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].class_id, 3);
  }

  #[test]
  fn suppressed_box_does_not_suppress_others() {
    // B 被 A 抑制，C 只与 B 重叠，因此保留
    let a = det(0, 0.9, 0.0, 0.0, 100.0, 100.0);
    let b = det(0, 0.8, 40.0, 0.0, 100.0, 100.0);
    let c = det(0, 0.7, 80.0, 0.0, 100.0, 100.0);
    assert!(a.bbox.iou(&b.bbox) > 0.4);
    assert!(b.bbox.iou(&c.bbox) > 0.4);
    assert!(a.bbox.iou(&c.bbox) <= 0.4);

    let out = non_max_suppression(vec![a, b, c], 0.4);
    let scores: Vec<f64> = out.iter().map(|d| d.confidence).collect();
    assert_eq!(scores, vec![0.9, 0.7]);
  }

  #[test]
  fn running_twice_changes_nothing() {
    let input = vec![
      det(0, 0.91, 10.0, 10.0, 60.0, 60.0),
      det(1, 0.85, 15.0, 12.0, 60.0, 55.0),
      det(2, 0.80, 200.0, 200.0, 40.0, 40.0),
      det(0, 0.75, 210.0, 205.0, 40.0, 40.0),
      det(5, 0.60, 400.0, 10.0, 30.0, 90.0),
      det(5, 0.55, 60.0, 60.0, 60.0, 60.0),
    ];
    let once = non_max_suppression(input, 0.4);
    let twice = non_max_suppression(once.clone(), 0.4);
    assert_eq!(once, twice);

    for (i, a) in once.iter().enumerate() {
      for b in once.iter().skip(i + 1) {
        assert!(a.bbox.iou(&b.bbox) <= 0.4);
      }
    }
  }

  #[test]
  fn empty_input() {
    assert!(non_max_suppression(Vec::new(), 0.4).is_empty());
  }
}
