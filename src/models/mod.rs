//! 数据模型模块
//! 身份、会话令牌与带属主的资源

pub mod auth;
pub mod identity;
pub mod resource;
