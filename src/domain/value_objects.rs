use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 貸出ID - 貸出台帳の集約ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LoanId(Uuid);

impl LoanId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for LoanId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LoanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// 書籍ID - 蔵書カタログへの参照（1冊の物理的な本）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(Uuid);

impl BookId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// 利用者ID - 利用者名簿への参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(Uuid);

impl CustomerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for CustomerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// 更新済みエラー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadyRenewedError;

/// 貸出更新の状態
///
/// 不変条件：更新は貸出期間中に1回まで。
/// 一度`Renewed`になった値を`NotRenewed`へ戻す操作は存在しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "bool", into = "bool")]
pub enum Renewal {
    #[default]
    NotRenewed,
    Renewed,
}

impl Renewal {
    /// 更新する
    ///
    /// # エラー
    /// 既に更新済みの場合は`AlreadyRenewedError`を返す
    pub fn renew(self) -> Result<Self, AlreadyRenewedError> {
        match self {
            Renewal::NotRenewed => Ok(Renewal::Renewed),
            Renewal::Renewed => Err(AlreadyRenewedError),
        }
    }

    pub fn is_renewed(&self) -> bool {
        matches!(self, Renewal::Renewed)
    }
}

impl From<bool> for Renewal {
    fn from(renewed: bool) -> Self {
        if renewed {
            Renewal::Renewed
        } else {
            Renewal::NotRenewed
        }
    }
}

impl From<Renewal> for bool {
    fn from(renewal: Renewal) -> Self {
        renewal.is_renewed()
    }
}
