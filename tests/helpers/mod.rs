// ==========================================
// 集成测试共享辅助模块
// ==========================================

#![allow(dead_code)]

pub mod api_test_helper;
pub mod memory_source;
pub mod mock_config;
pub mod test_data_builder;
