use crate::domain::error::DomainError;
use crate::domain::port::RepositoryError;

/// アプリケーション層のエラー型
/// ドメインエラー、リポジトリエラー、予約競合をラップする
#[derive(Debug)]
pub enum ApplicationError {
    /// ドメインエラー（ビジネスルール違反・入力値不正）
    DomainError(DomainError),
    /// リポジトリエラー（永続化の失敗）
    RepositoryError(RepositoryError),
    /// 予約期間の競合
    /// 入力値不正とは区別して返す。クライアントが代替日程を
    /// 提案できるようにするため
    Conflict(String),
    /// エンティティが見つからない
    NotFound(String),
}

impl std::fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplicationError::DomainError(err) => write!(f, "Domain error: {}", err),
            ApplicationError::RepositoryError(err) => write!(f, "Repository error: {}", err),
            ApplicationError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApplicationError::NotFound(msg) => write!(f, "Not found: {}", msg),
        }
    }
}

impl std::error::Error for ApplicationError {}

// From実装でエラー変換を簡潔に
impl From<DomainError> for ApplicationError {
    fn from(err: DomainError) -> Self {
        ApplicationError::DomainError(err)
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        ApplicationError::RepositoryError(err)
    }
}
