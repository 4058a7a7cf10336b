// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/json_record.rs - JSON 检测记录输出
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

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::SourceImage,
  model::{DetectResult, Detection},
  output::Render,
};

#[derive(Error, Debug)]
pub enum JsonRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("序列化错误: {0}")]
  SerializeError(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct Record<'a> {
  timestamp: String,
  width: u32,
  height: u32,
  inference_ms: f64,
  total_ms: f64,
  detections: &'a [Detection],
}

/// 把检测结果写成 JSON 文件，`json:///path/result.json[?pretty]`
pub struct JsonRecordOutput {
  path: PathBuf,
  pretty: bool,
}

impl FromUrlWithScheme for JsonRecordOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for JsonRecordOutput {
  type Error = JsonRecordOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(JsonRecordOutputError::SchemeMismatch);
    }

    Ok(JsonRecordOutput {
      path: PathBuf::from(url.path()),
      pretty: url.query_pairs().any(|(k, _)| k == "pretty"),
    })
  }
}

impl JsonRecordOutput {
  pub fn path(&self) -> &Path {
    &self.path
  }

  fn to_json(&self, frame: &SourceImage, result: &DetectResult) -> Result<String, serde_json::Error> {
    let record = Record {
      timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
      width: frame.width(),
      height: frame.height(),
      inference_ms: result.timing.inference.as_secs_f64() * 1000.0,
      total_ms: result.timing.total.as_secs_f64() * 1000.0,
      detections: &result.items,
    };

    if self.pretty {
      serde_json::to_string_pretty(&record)
    } else {
      serde_json::to_string(&record)
    }
  }
}

impl Render<SourceImage, DetectResult> for JsonRecordOutput {
  type Error = JsonRecordOutputError;

  fn render_result(&self, frame: &SourceImage, result: &DetectResult) -> Result<(), Self::Error> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    std::fs::write(&self.path, self.to_json(frame, result)?)?;
    info!("保存 {} 个检测结果到: {}", result.len(), self.path.display());

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::BoundingBox;

  #[test]
  fn writes_detections_as_json() {
    let dir = std::env::temp_dir().join(format!("shanan-json-{}", std::process::id()));
    let path = dir.join("nested").join("result.json");
    let url = Url::parse(&format!("json://{}?pretty", path.display())).unwrap();
    let output = JsonRecordOutput::from_url(&url).unwrap();
    assert_eq!(output.path(), path.as_path());

    let result = DetectResult {
      items: vec![Detection {
        class_id: 2,
        class_name: "car".to_string(),
        confidence: 0.5,
        bbox: BoundingBox::new(270.0, 290.0, 100.0, 60.0),
      }]
      .into_boxed_slice(),
      ..Default::default()
    };
    output
      .render_result(&SourceImage::new(640, 480), &result)
      .unwrap();

    let value: serde_json::Value =
      serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["width"], 640);
    assert_eq!(value["height"], 480);
    assert_eq!(value["detections"][0]["class_name"], "car");
    assert_eq!(value["detections"][0]["confidence"], 0.5);
    assert_eq!(value["detections"][0]["bbox"]["x"], 270.0);
    assert_eq!(value["detections"][0]["bbox"]["height"], 60.0);

    std::fs::remove_dir_all(&dir).unwrap();
  }
}
