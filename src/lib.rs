//! 视频分享后端的认证与授权核心
//! 凭据校验、会话令牌轮换、资源属主校验

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
