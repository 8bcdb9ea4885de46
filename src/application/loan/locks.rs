use crate::domain::value_objects::{BookId, CustomerId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// ロック対象のキー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum LockKey {
    Customer(CustomerId),
    Book(BookId),
}

type LockTable = HashMap<LockKey, Arc<AsyncMutex<()>>>;

/// 貸出操作の直列化ポイント
///
/// 同じ書籍（および同じ利用者）への変更操作をプロセス内で1本に並べる。
/// 取得順序は常に「利用者 → 書籍」。この順序を守る限りデッドロックしない。
///
/// 使われなくなったエントリはガード解放時に取り除かれる。
#[derive(Default)]
pub struct CirculationLocks {
    table: Arc<Mutex<LockTable>>,
}

impl CirculationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 利用者のロックを取得する
    pub async fn lock_customer(&self, customer_id: CustomerId) -> CirculationGuard {
        self.acquire(LockKey::Customer(customer_id)).await
    }

    /// 書籍のロックを取得する
    pub async fn lock_book(&self, book_id: BookId) -> CirculationGuard {
        self.acquire(LockKey::Book(book_id)).await
    }

    /// 現在テーブルに残っているエントリ数
    pub fn held_keys(&self) -> usize {
        lock_table(&self.table).len()
    }

    async fn acquire(&self, key: LockKey) -> CirculationGuard {
        let mutex = {
            let mut table = lock_table(&self.table);
            Arc::clone(table.entry(key).or_default())
        };

        let guard = mutex.lock_owned().await;

        CirculationGuard {
            key,
            table: Arc::clone(&self.table),
            guard: Some(guard),
        }
    }
}

/// ロック保持中を表すガード。dropで解放される。
pub struct CirculationGuard {
    key: LockKey,
    table: Arc<Mutex<LockTable>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for CirculationGuard {
    fn drop(&mut self) {
        // 先にロックを解放し、待機者がいなければエントリを消す
        self.guard.take();

        let mut table = lock_table(&self.table);
        let unused = table
            .get(&self.key)
            .is_some_and(|mutex| Arc::strong_count(mutex) == 1);
        if unused {
            table.remove(&self.key);
        }
    }
}

fn lock_table(table: &Mutex<LockTable>) -> std::sync::MutexGuard<'_, LockTable> {
    // 保持中にpanicしてもテーブル自体は壊れないため、poisonは無視する
    table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
