use sea_orm::*;
use serde::Serialize;

use crate::errors::AppError;

/// 1ページあたりの件数の上限
pub const MAX_PER_PAGE: u64 = 100;
pub const DEFAULT_PER_PAGE: u64 = 10;

/// ページ指定 (1始まり)。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    /// クエリ文字列の値から組み立てます。不正な数値は既定値に落とす。
    /// `page * limit` が SQL の OFFSET (i64) に収まらないページは `Validation` エラー。
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Result<Self, AppError> {
        let page = page.and_then(|p| p.trim().parse::<u64>().ok()).filter(|p| *p >= 1).unwrap_or(1);
        let limit = limit
            .and_then(|l| l.trim().parse::<u64>().ok())
            .filter(|l| *l >= 1)
            .unwrap_or(DEFAULT_PER_PAGE)
            .min(MAX_PER_PAGE);

        match page.checked_mul(limit) {
            Some(end) if end <= i64::MAX as u64 => Ok(Self { page, limit }),
            _ => Err(AppError::Validation(format!("Invalid page number {}", page))),
        }
    }

    /// 先頭から読み飛ばす行数
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.limit
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

/// 前後ページへのリンク情報
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct PageLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct PageRef {
    pub page: u64,
    pub limit: u64,
}

impl PageLinks {
    pub fn new(request: PageRequest, total: u64) -> Self {
        Self {
            next: (request.page * request.limit < total)
                .then_some(PageRef { page: request.page + 1, limit: request.limit }),
            prev: (request.page > 1).then_some(PageRef { page: request.page - 1, limit: request.limit }),
        }
    }
}

/// 許可されたカラムの中からソート列を選んで適用します。
/// `allowed` に無い名前は `Validation` エラー。
pub fn apply_sorting<E>(
    query: Select<E>,
    field: &str,
    order: Order,
    allowed: &[(&str, E::Column)],
) -> Result<Select<E>, AppError>
where
    E: EntityTrait,
{
    let column = allowed
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, col)| *col)
        .ok_or_else(|| AppError::Validation(format!("Cannot sort by '{}'", field)))?;

    Ok(query.order_by(column, order))
}

/// ページ分割して取得し、(該当ページの行, 総件数) を返します。
pub async fn fetch_page<E>(
    db: &DatabaseConnection,
    query: Select<E>,
    request: PageRequest,
) -> Result<(Vec<E::Model>, u64), AppError>
where
    E: EntityTrait,
    E::Model: Sync + Send + 'static,
{
    let total = query.clone().count(db).await?;
    if request.offset() >= total {
        return Ok((Vec::new(), total));
    }
    let items = query.offset(request.offset()).limit(request.limit).all(db).await?;
    Ok((items, total))
}
