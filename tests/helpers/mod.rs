// ==========================================
// 集成测试辅助模块
// ==========================================

#![allow(dead_code)]

pub mod in_memory_repo;
pub mod row_builder;
