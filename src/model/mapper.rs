// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/mapper.rs - 候选框映射回源图像坐标
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

use crate::model::{BoundingBox, ClassTaxonomy, Detection, LetterboxTransform, RawCandidate};

const UNKNOWN_LABEL: &str = "unknown";

/// 中心点格式 -> 角点格式，逆 letterbox，裁剪到源图像边界，
/// 丢弃坐标非有限值、宽或高不大于 `min_box_size` 的框
pub fn map_to_source(
  candidates: &[RawCandidate],
  transform: &LetterboxTransform,
  taxonomy: &ClassTaxonomy,
  min_box_size: f64,
) -> Vec<Detection> {
  let source_width = transform.source_width() as f64;
  let source_height = transform.source_height() as f64;

  let detections: Vec<Detection> = candidates
    .iter()
    .filter_map(|candidate| {
      let (x1, y1) = transform.inverse(
        candidate.cx - candidate.width / 2.0,
        candidate.cy - candidate.height / 2.0,
      );
      let (x2, y2) = transform.inverse(
        candidate.cx + candidate.width / 2.0,
        candidate.cy + candidate.height / 2.0,
      );

      if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
        return None;
      }

      let bbox = BoundingBox::from_corners(
        x1.max(0.0),
        y1.max(0.0),
        x2.min(source_width),
        y2.min(source_height),
      );
      if bbox.width <= min_box_size || bbox.height <= min_box_size {
        return None;
      }

      Some(Detection {
        class_id: candidate.class_id,
        class_name: taxonomy
          .name(candidate.class_id)
          .unwrap_or(UNKNOWN_LABEL)
          .to_string(),
        confidence: candidate.confidence,
        bbox,
      })
    })
    .collect();

  debug!(
    "{} 个候选映射回源图像 {}x{}, 保留 {} 个",
    candidates.len(),
    transform.source_width(),
    transform.source_height(),
    detections.len()
  );

  detections
}

#[cfg(test)]
mod tests {
  use super::*;

  fn candidate(cx: f64, cy: f64, width: f64, height: f64) -> RawCandidate {
    RawCandidate {
      class_id: 2,
      confidence: 0.8,
      cx,
      cy,
      width,
      height,
    }
  }

  #[test]
  fn identity_transform_converts_center_to_corner() {
    let t = LetterboxTransform::new(640, 640, 640);
    let out = map_to_source(
      &[candidate(320.0, 320.0, 100.0, 60.0)],
      &t,
      &ClassTaxonomy::coco(),
      10.0,
    );
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].class_name, "car");
    assert_eq!(out[0].bbox, BoundingBox::new(270.0, 290.0, 100.0, 60.0));
  }

  #[test]
  fn removes_padding_and_scale() {
    // 1280x720: scale 0.5, pad_y 140
    let t = LetterboxTransform::new(1280, 720, 640);
    let out = map_to_source(
      &[candidate(320.0, 320.0, 100.0, 60.0)],
      &t,
      &ClassTaxonomy::coco(),
      10.0,
    );
    let b = out[0].bbox;
    assert!((b.x - 540.0).abs() < 1e-9);
    assert!((b.y - 300.0).abs() < 1e-9);
    assert!((b.width - 200.0).abs() < 1e-9);
    assert!((b.height - 120.0).abs() < 1e-9);
  }

  #[test]
  fn drops_non_finite_candidates() {
    let t = LetterboxTransform::new(640, 480, 640);
    let out = map_to_source(
      &[
        candidate(f64::NAN, 100.0, 50.0, 50.0),
        candidate(320.0, 240.0, f64::INFINITY, 50.0),
        candidate(320.0, 240.0, 50.0, f64::NAN),
        candidate(320.0, 240.0, 50.0, 50.0),
      ],
      &t,
      &ClassTaxonomy::coco(),
      10.0,
    );
    assert_eq!(out.len(), 1);
    assert!(out[0].bbox.width.is_finite());
    assert!((out[0].bbox.width - 50.0).abs() < 1e-9);
  }

  #[test]
  fn clamps_to_image_bounds() {
    let t = LetterboxTransform::new(640, 640, 640);
    let out = map_to_source(
      &[candidate(10.0, 630.0, 60.0, 40.0)],
      &t,
      &ClassTaxonomy::coco(),
      10.0,
    );
    assert_eq!(out[0].bbox, BoundingBox::new(0.0, 610.0, 40.0, 30.0));
  }

  #[test]
  fn drops_small_boxes() {
    let t = LetterboxTransform::new(640, 640, 640);
    let out = map_to_source(
      &[
        candidate(100.0, 100.0, 10.0, 50.0),
        candidate(100.0, 100.0, 50.0, 10.0),
        candidate(100.0, 100.0, 10.5, 10.5),
        // 裁剪后只剩 5 像素宽
        candidate(-20.0, 100.0, 50.0, 50.0),
      ],
      &t,
      &ClassTaxonomy::coco(),
      10.0,
    );
    assert_eq!(out.len(), 1);
    assert!((out[0].bbox.width - 10.5).abs() < 1e-9);
  }

  #[test]
  fn unknown_class_gets_placeholder_name() {
    let t = LetterboxTransform::new(640, 640, 640);
    let taxonomy = ClassTaxonomy::from_lines("person\nbicycle");
    let out = map_to_source(&[candidate(100.0, 100.0, 50.0, 50.0)], &t, &taxonomy, 10.0);
    assert_eq!(out[0].class_name, "unknown");
  }
}
