//! SerpApi Key 轮换
//!
//! 所有使用 SerpApi 的客户端共享同一个 `Arc<KeyRotation>`，
//! 游标只能通过 `next_key` 推进。

use std::sync::Mutex;

use crate::error::{ApiError, AppResult};

/// 按顺序循环使用的 API Key 列表
#[derive(Debug)]
pub struct KeyRotation {
    keys: Vec<String>,
    cursor: Mutex<usize>,
}

impl KeyRotation {
    /// 创建 Key 轮换器，空白 Key 会被丢弃
    pub fn new(keys: impl IntoIterator<Item = String>) -> Self {
        let keys = keys
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        Self {
            keys,
            cursor: Mutex::new(0),
        }
    }

    /// 取下一个 Key
    ///
    /// # 返回
    /// 没有配置任何 Key 时返回 `ApiError::NoApiKey`
    pub fn next_key(&self) -> AppResult<String> {
        if self.keys.is_empty() {
            return Err(ApiError::NoApiKey.into());
        }
        let mut cursor = self.cursor.lock().unwrap_or_else(|e| e.into_inner());
        let key = self.keys[*cursor % self.keys.len()].clone();
        *cursor = (*cursor + 1) % self.keys.len();
        Ok(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
