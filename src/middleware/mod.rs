/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: route 単位の permission guard
 * - cors / http: Router 全体に掛ける横断的な layer
 */
pub mod auth;
pub mod cors;
pub mod http;
