use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// 按键合并并发的首次未命中
///
/// 同一个键同时只有一个持有者；其余调用方在 `enter` 处等待，
/// 拿到闸门后应当先重新查一次缓存。持有者和等待者（包括中途被取消的）
/// 全部离开后闸门被移除。
pub struct FlightGroup<K> {
    gates: Mutex<HashMap<K, Gate>>,
}

struct Gate {
    lock: Arc<AsyncMutex<()>>,
    /// 持有者加等待者的数量，只在 `gates` 锁内修改
    users: usize,
}

impl<K> Default for FlightGroup<K> {
    fn default() -> Self {
        Self {
            gates: Mutex::new(HashMap::new()),
        }
    }
}

impl<K> FlightGroup<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn enter(&self, key: K) -> FlightGuard<'_, K> {
        let lock = {
            let mut gates = self.gates.lock();
            let gate = gates.entry(key.clone()).or_insert_with(|| Gate {
                lock: Arc::new(AsyncMutex::new(())),
                users: 0,
            });
            gate.users += 1;
            Arc::clone(&gate.lock)
        };
        // 等待期间 future 被丢弃时由 guard 的 Drop 归还计数
        let mut guard = FlightGuard {
            group: self,
            key,
            permit: None,
        };
        guard.permit = Some(lock.lock_owned().await);
        guard
    }

    /// 当前仍有持有者或等待者的键数量
    pub fn in_flight(&self) -> usize {
        self.gates.lock().len()
    }
}

pub struct FlightGuard<'a, K>
where
    K: Eq + Hash,
{
    group: &'a FlightGroup<K>,
    key: K,
    permit: Option<OwnedMutexGuard<()>>,
}

impl<K> Drop for FlightGuard<'_, K>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        self.permit.take();
        let mut gates = self.group.gates.lock();
        let remove = match gates.get_mut(&self.key) {
            Some(gate) => {
                gate.users -= 1;
                gate.users == 0
            }
            None => false,
        };
        if remove {
            gates.remove(&self.key);
        }
    }
}
