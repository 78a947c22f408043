use serde::{Deserialize, Serialize};

/// 内存存储的记录：需要可写入的 ID 和必填标题
pub trait Record: Clone + Send + Sync + 'static {
    /// 日志里的名字
    const KIND: &'static str;
    const NOT_FOUND: &'static str;
    const DELETED: &'static str;

    fn set_id(&mut self, id: String);
    fn title(&self) -> &str;
}

/// 笔记
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// 任务
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

impl Record for Note {
    const KIND: &'static str = "Note";
    const NOT_FOUND: &'static str = "Note not found";
    const DELETED: &'static str = "Note deleted";

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn title(&self) -> &str {
        &self.title
    }
}

impl Record for Task {
    const KIND: &'static str = "Task";
    const NOT_FOUND: &'static str = "Task not found";
    const DELETED: &'static str = "Task deleted";

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn title(&self) -> &str {
        &self.title
    }
}
