use crate::domain::value_objects::CustomerId;
use crate::ports::customer_directory::{CustomerDirectory as CustomerDirectoryTrait, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

/// CustomerDirectoryのインメモリ実装
///
/// 登録した利用者IDだけを「存在する」と答える。
pub struct CustomerDirectory {
    customers: Mutex<HashSet<CustomerId>>,
}

impl CustomerDirectory {
    pub fn new() -> Self {
        Self {
            customers: Mutex::new(HashSet::new()),
        }
    }

    /// 利用者を登録
    pub fn add_customer(&self, customer_id: CustomerId) {
        self.customers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(customer_id);
    }
}

impl Default for CustomerDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CustomerDirectoryTrait for CustomerDirectory {
    async fn exists(&self, customer_id: CustomerId) -> Result<bool> {
        let customers = self.customers.lock().map_err(|e| e.to_string())?;
        Ok(customers.contains(&customer_id))
    }
}
