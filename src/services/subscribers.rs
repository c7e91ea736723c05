use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

pub type SubscriptionId = u64;

pub type Callback<T> = Box<dyn Fn(&T) + Send + Sync>;

/// Явный список подписок компонента с синхронной рассылкой.
///
/// Каждая подписка получает монотонно растущий идентификатор; рассылка
/// обходит подписчиков в порядке подписки.
pub struct SubscriberList<T> {
    next_id: AtomicU64,
    entries: DashMap<SubscriptionId, Callback<T>>,
}

impl<T> SubscriberList<T> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: DashMap::new(),
        }
    }

    pub fn subscribe(&self, callback: Callback<T>) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(id, callback);
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Синхронно уведомить всех подписчиков в порядке подписки
    pub fn notify(&self, payload: &T) {
        let mut ids: Vec<SubscriptionId> = self.entries.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();

        for id in ids {
            if let Some(callback) = self.entries.get(&id) {
                (callback.value())(payload);
            }
        }
    }

    /// Сбросить все подписки
    pub fn clear(&self) {
        self.entries.clear();
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<T> Default for SubscriberList<T> {
    fn default() -> Self {
        Self::new()
    }
}
