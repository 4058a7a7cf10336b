// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/labels.rs - 类别标签表
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

use std::{path::Path, sync::Arc};

use tracing::debug;

/// COCO 数据集类别名称
pub const COCO_CLASSES: [&str; 80] = [
  "person",
  "bicycle",
  "car",
  "motorcycle",
  "airplane",
  "bus",
  "train",
  "truck",
  "boat",
  "traffic light",
  "fire hydrant",
  "stop sign",
  "parking meter",
  "bench",
  "bird",
  "cat",
  "dog",
  "horse",
  "sheep",
  "cow",
  "elephant",
  "bear",
  "zebra",
  "giraffe",
  "backpack",
  "umbrella",
  "handbag",
  "tie",
  "suitcase",
  "frisbee",
  "skis",
  "snowboard",
  "sports ball",
  "kite",
  "baseball bat",
  "baseball glove",
  "skateboard",
  "surfboard",
  "tennis racket",
  "bottle",
  "wine glass",
  "cup",
  "fork",
  "knife",
  "spoon",
  "bowl",
  "banana",
  "apple",
  "sandwich",
  "orange",
  "broccoli",
  "carrot",
  "hot dog",
  "pizza",
  "donut",
  "cake",
  "chair",
  "couch",
  "potted plant",
  "bed",
  "dining table",
  "toilet",
  "tv",
  "laptop",
  "mouse",
  "remote",
  "keyboard",
  "cell phone",
  "microwave",
  "oven",
  "toaster",
  "sink",
  "refrigerator",
  "book",
  "clock",
  "vase",
  "scissors",
  "teddy bear",
  "hair drier",
  "toothbrush",
];

/// 检测框配色，按类别编号循环取用
pub const PALETTE: [[u8; 3]; 20] = [
  [0xFF, 0x6B, 0x6B],
  [0x4E, 0xCD, 0xC4],
  [0x45, 0xB7, 0xD1],
  [0x96, 0xCE, 0xB4],
  [0xFE, 0xCA, 0x57],
  [0xFF, 0x9F, 0xF3],
  [0x54, 0xA0, 0xFF],
  [0x5F, 0x27, 0xCD],
  [0x00, 0xD2, 0xD3],
  [0xFF, 0x9F, 0x43],
  [0x10, 0xAC, 0x84],
  [0xEE, 0x5A, 0x24],
  [0x09, 0x84, 0xE3],
  [0xB5, 0x54, 0x00],
  [0x00, 0xB8, 0x94],
  [0xFD, 0xCB, 0x6E],
  [0x6C, 0x5C, 0xE7],
  [0xA2, 0x9B, 0xFE],
  [0xFD, 0x79, 0xA8],
  [0xE1, 0x70, 0x55],
];

pub fn class_color(class_id: usize) -> [u8; 3] {
  PALETTE[class_id % PALETTE.len()]
}

/// 有序、只读的类别名称表，按类别编号索引
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTaxonomy {
  names: Arc<[String]>,
}

impl Default for ClassTaxonomy {
  fn default() -> Self {
    Self::coco()
  }
}

impl ClassTaxonomy {
  pub fn coco() -> Self {
    COCO_CLASSES.iter().map(|name| name.to_string()).collect()
  }

  /// 每行一个标签，忽略空行与首尾空白
  pub fn from_lines(text: &str) -> Self {
    text
      .lines()
      .map(str::trim)
      .filter(|line| !line.is_empty())
      .map(str::to_string)
      .collect()
  }

  pub fn load(path: impl AsRef<Path>) -> Result<Self, std::io::Error> {
    let path = path.as_ref();
    let taxonomy = Self::from_lines(&std::fs::read_to_string(path)?);
    debug!("从 {} 加载 {} 个类别标签", path.display(), taxonomy.len());
    Ok(taxonomy)
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  pub fn name(&self, class_id: usize) -> Option<&str> {
    self.names.get(class_id).map(String::as_str)
  }
}

impl FromIterator<String> for ClassTaxonomy {
  fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
    Self {
      names: iter.into_iter().collect(),
    }
  }
}
