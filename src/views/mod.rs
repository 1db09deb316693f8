//! API レスポンスの表現 (DTO)。
//! エンティティをそのまま返さず、ここで公開するフィールドと名前を決めます。

pub mod pagination;
pub mod task;
pub mod user;
