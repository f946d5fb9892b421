/*
 * Responsibility
 * - middleware の公開インターフェース
 * - http: 横断的な transport 関心事 (request id / trace / limit / timeout)
 * - error_boundary: エラー body に元の path を埋める
 * - security: policy の chain 選択 → 認証 (auth::bearer / auth::basic) → 認可
 * - audit: handler 単位の audit aspect
 */
pub mod audit;
pub mod auth;
pub mod error_boundary;
pub mod http;
pub mod security;
