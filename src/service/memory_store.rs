use crate::models::Record;
use indexmap::IndexMap;
use rand::Rng;
use tokio::sync::RwLock;

/// 随机 ID：非负 63 位整数的十进制字符串，不检查冲突
pub fn generate_id() -> String {
    rand::thread_rng().gen_range(0..=i64::MAX).to_string()
}

/// 进程内记录存储，按插入顺序返回
///
/// 不持久化，重启即丢失
pub struct MemoryStore<T> {
    records: RwLock<IndexMap<String, T>>,
}

impl<T: Record> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(IndexMap::new()),
        }
    }

    pub async fn list(&self) -> Vec<T> {
        self.records.read().await.values().cloned().collect()
    }

    pub async fn get(&self, id: &str) -> Option<T> {
        self.records.read().await.get(id).cloned()
    }

    /// 分配新 ID 后写入，返回写入的记录
    pub async fn create(&self, mut record: T) -> T {
        let id = generate_id();
        record.set_id(id.clone());
        tracing::debug!("{} {} created", T::KIND, id);
        self.records.write().await.insert(id, record.clone());
        record
    }

    /// 整体替换，ID 保持不变；不存在时返回 None
    pub async fn update(&self, id: &str, mut record: T) -> Option<T> {
        let mut records = self.records.write().await;
        let slot = records.get_mut(id)?;
        record.set_id(id.to_string());
        *slot = record.clone();
        Some(record)
    }

    /// 删除并保持其余记录的顺序
    pub async fn delete(&self, id: &str) -> bool {
        self.records.write().await.shift_remove(id).is_some()
    }
}

impl<T: Record> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
