//! 文档日志持久化
//!
//! DocumentStore 绑定数据目录，按 key（文件名）读写消息数组 JSON。
//! 写入为整文件替换：同目录临时文件 + fsync + rename，读者永远看不到写了一半的文件。

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::StorageError;
use crate::memory::Message;

/// 默认文档文件名
pub const DEFAULT_DOCUMENT_FILE: &str = "file.json";

/// 补全 `.json` 后缀
pub fn normalize_key(key: &str) -> String {
    let key = key.trim();
    if key.ends_with(".json") {
        key.to_string()
    } else {
        format!("{key}.json")
    }
}

/// 将消息序列编码为带缩进的 JSON 数组
pub fn encode_messages(messages: &[Message]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(messages)
}

/// 解码消息数组；顶层不是数组或元素不合法都视为 Decode 错误
pub fn decode_messages(path: &Path, data: &str) -> Result<Vec<Message>, StorageError> {
    let decode_err = |reason: String| StorageError::Decode {
        path: path.to_path_buf(),
        reason,
    };
    let value: serde_json::Value = serde_json::from_str(data).map_err(|e| decode_err(e.to_string()))?;
    if !value.is_array() {
        return Err(decode_err("file did not contain a list of messages".to_string()));
    }
    serde_json::from_value(value).map_err(|e| decode_err(e.to_string()))
}

/// 文件存储：所有 key 都解析到 root 下，禁止目录穿越
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// key 只能是单个文件名
    pub fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let key = normalize_key(key);
        let invalid = key == ".json"
            || key.starts_with("..")
            || key.contains(|c: char| c == '/' || c == '\\');
        if invalid {
            return Err(StorageError::InvalidKey(key));
        }
        Ok(self.root.join(key))
    }

    pub fn read(&self, key: &str) -> Result<Vec<Message>, StorageError> {
        let path = self.resolve(key)?;
        let data = std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound { path: path.clone() }
            } else {
                StorageError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        decode_messages(&path, &data)
    }

    /// 全量覆盖写入，返回最终路径
    pub fn write(&self, key: &str, messages: &[Message]) -> Result<PathBuf, StorageError> {
        let path = self.resolve(key)?;
        let write_err = |source: std::io::Error| StorageError::Write {
            path: path.clone(),
            source,
        };
        let json = encode_messages(messages)
            .map_err(|e| write_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

        std::fs::create_dir_all(&self.root).map_err(write_err)?;
        let mut temp = tempfile::NamedTempFile::new_in(&self.root).map_err(write_err)?;
        temp.write_all(json.as_bytes()).map_err(write_err)?;
        temp.as_file().sync_all().map_err(write_err)?;
        temp.persist(&path).map_err(|e| write_err(e.error))?;

        tracing::debug!(path = %path.display(), messages = messages.len(), "document written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ToolCall;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample() -> Vec<Message> {
        vec![
            Message::user("plan my week"),
            Message::assistant_tool_calls(
                "",
                vec![ToolCall::new("call_1", "create_plan", json!({"task_description": "week"}))],
            ),
            Message::tool_result("call_1", "Plan created successfully with 5 task chunks"),
            Message::assistant("\nPLAN: week\n\nCreated: 2026-10-19 09:00:00"),
        ]
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("notes"), "notes.json");
        assert_eq!(normalize_key("file.json"), "file.json");
    }

    #[test]
    fn test_write_then_read_preserves_order() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::new(dir.path());
        let messages = sample();

        store.write("file.json", &messages).unwrap();
        let fresh = DocumentStore::new(dir.path());
        assert_eq!(fresh.root(), dir.path());
        assert_eq!(fresh.read("file").unwrap(), messages);
    }

    #[test]
    fn test_write_replaces_whole_file_without_leftovers() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::new(dir.path());
        store.write("file.json", &sample()).unwrap();
        store.write("file.json", &[Message::user("only")]).unwrap();

        assert_eq!(store.read("file.json").unwrap(), vec![Message::user("only")]);
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::new(dir.path());
        assert!(matches!(store.read("absent"), Err(StorageError::NotFound { .. })));
    }

    #[test]
    fn test_read_corrupt_is_decode_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("file.json"), "{not json").unwrap();
        std::fs::write(dir.path().join("object.json"), r#"{"role": "user"}"#).unwrap();
        let store = DocumentStore::new(dir.path());

        assert!(matches!(store.read("file.json"), Err(StorageError::Decode { .. })));
        match store.read("object.json") {
            Err(StorageError::Decode { reason, .. }) => assert!(reason.contains("list of messages")),
            other => panic!("expected Decode, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_rejects_escaping_keys() {
        let store = DocumentStore::new("data");
        assert!(matches!(store.resolve("../secret"), Err(StorageError::InvalidKey(_))));
        assert!(matches!(store.resolve("a/b.json"), Err(StorageError::InvalidKey(_))));
        assert!(matches!(store.resolve(""), Err(StorageError::InvalidKey(_))));
        assert_eq!(store.resolve("history").unwrap(), Path::new("data").join("history.json"));
    }
}
