// ==========================================
// OEE 分析引擎 - 机台/产品领域模型
// ==========================================
// 计算窗口内视为不可变参考数据
// ==========================================

use crate::domain::types::MachineStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Machine - 机台
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub machine_id: String,     // 机台ID
    pub machine_name: String,   // 机台名称
    pub target_speed: f64,      // 目标速度 (件/小时)
    pub status: MachineStatus,  // 当前状态
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Machine {
    pub fn new(
        machine_id: impl Into<String>,
        machine_name: impl Into<String>,
        target_speed: f64,
        status: MachineStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            machine_id: machine_id.into(),
            machine_name: machine_name.into(),
            target_speed,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    /// 理想节拍 (分钟/件)
    ///
    /// 目标速度 <= 0 时返回 0
    pub fn ideal_cycle_time_minutes(&self) -> f64 {
        if self.target_speed > 0.0 {
            60.0 / self.target_speed
        } else {
            0.0
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == MachineStatus::Running
    }
}

// ==========================================
// Product - 产品
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub product_name: String,
}

impl Product {
    pub fn new(product_id: impl Into<String>, product_name: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
        }
    }
}
